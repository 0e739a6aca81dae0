//! Hook Pipeline Tests
//!
//! Hooks compose in attachment order at each of the four stages. Decode-side
//! chains stop at the first error token; encode-side hooks only transform.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rowcodec::{wrap, ErrorDesc, Flag, NumberMeta, Row, Schema, Value};

fn row(cells: &[Option<&str>]) -> Row {
    cells.iter().copied().collect()
}

// =============================================================================
// Decode-Side Hooks
// =============================================================================

/// A before-decode hook may prepend a cell, which the schema then consumes.
#[test]
fn test_before_decode_may_prepend() {
    let schema = Schema::real(NumberMeta::default()).before_decode(|row| {
        row.push_front(Some("1".to_string()));
        None
    });
    let mut input = row(&[Some("0")]);
    assert_eq!(schema.decode(&mut input), Ok(Value::Number(1.0)));
    // The original leading cell is still there for the next consumer.
    assert_eq!(input.take(), Some("0".to_string()));
}

/// A before-decode hook may consume cells.
#[test]
fn test_before_decode_may_consume() {
    let schema = Schema::real(NumberMeta::default()).before_decode(|row| {
        row.take();
        None
    });
    let mut input = row(&[Some("skipped"), Some("2")]);
    assert_eq!(schema.decode(&mut input), Ok(Value::Number(2.0)));
}

/// A before-decode error short-circuits without consuming the leading cell.
#[test]
fn test_before_decode_short_circuit() {
    let schema =
        Schema::real(NumberMeta::default()).before_decode(|_| Some(Flag::Valid.token()));
    let mut input = row(&[Some("1")]);
    assert_eq!(schema.decode(&mut input), Err(Flag::Valid.token()));
    assert_eq!(input.len(), 1);
}

/// After-decode hooks transform the decoded value in attachment order.
#[test]
fn test_after_decode_transforms_in_order() {
    let schema = Schema::real(NumberMeta::default())
        .after_decode(|v| Ok(Value::Number(v.as_number().unwrap_or(0.0) + 1.0)))
        .after_decode(|v| Ok(Value::Number(v.as_number().unwrap_or(0.0) * 10.0)));
    assert_eq!(schema.decode(&mut row(&[Some("0")])), Ok(Value::Number(10.0)));
}

/// The first rejecting after-decode hook wins; later hooks are skipped.
#[test]
fn test_after_decode_first_error_skips_later_hooks() {
    let ran = Arc::new(AtomicUsize::new(0));
    let ran_later = Arc::clone(&ran);
    let schema = Schema::real(NumberMeta::default())
        .after_decode(|_| Err(wrap(&ErrorDesc::Flag(Flag::BadInput))))
        .after_decode(move |v| {
            ran_later.fetch_add(1, Ordering::SeqCst);
            Ok(v)
        });
    assert_eq!(
        schema.decode(&mut row(&[Some("1")])),
        Err(Flag::BadInput.token())
    );
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

/// Hooks do not run for the missing-cell policy path's error.
#[test]
fn test_after_decode_skipped_on_missing() {
    let ran = Arc::new(AtomicUsize::new(0));
    let ran_probe = Arc::clone(&ran);
    let schema = Schema::real(NumberMeta::default()).after_decode(move |v| {
        ran_probe.fetch_add(1, Ordering::SeqCst);
        Ok(v)
    });
    assert_eq!(
        schema.decode(&mut row(&[None])),
        Err(Flag::ValueMissing.token())
    );
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Encode-Side Hooks
// =============================================================================

/// Before-encode hooks transform the value before the kind renders it.
#[test]
fn test_before_encode_transforms() {
    let schema = Schema::real(NumberMeta::default())
        .before_encode(|v| Value::Number(v.as_number().unwrap_or(0.0) + 1.0));
    let encoded = schema.encode(Value::Number(0.0));
    assert_eq!(encoded.get(0), Some(&Some("1".to_string())));
}

/// After-encode hooks mutate the produced fragment in place.
#[test]
fn test_after_encode_mutates_fragment() {
    let schema = Schema::real(NumberMeta::default()).after_encode(|row| {
        if let Some(cell) = row.get_mut(0) {
            *cell = cell.take().map(|text| format!("{text}!"));
        }
    });
    let encoded = schema.encode(Value::Number(7.0));
    assert_eq!(encoded.get(0), Some(&Some("7!".to_string())));
}

/// Encode-side hooks run even when the value is null.
#[test]
fn test_encode_hooks_run_for_null() {
    let schema = Schema::real(NumberMeta::default())
        .before_encode(|_| Value::Number(3.0))
        .after_encode(|row| row.push(Some("extra".to_string())));
    let mut encoded = schema.encode(Value::Null);
    assert_eq!(encoded.take(), Some("3".to_string()));
    assert_eq!(encoded.take(), Some("extra".to_string()));
}

// =============================================================================
// Composite Interaction
// =============================================================================

/// Hooks on an element schema fire once per element and aggregate normally.
#[test]
fn test_element_hooks_inside_vector() {
    let element = Schema::real(NumberMeta::default()).after_decode(|v| {
        if v.as_number() == Some(0.0) {
            Err(Flag::BadInput.token())
        } else {
            Ok(v)
        }
    });
    let schema = Schema::vector(element, rowcodec::VectorMeta::default());
    let err = schema
        .decode(&mut row(&[Some("2"), Some("1"), Some("0")]))
        .unwrap_err();
    assert_eq!(
        err.open(),
        ErrorDesc::Items(vec![None, Some(ErrorDesc::Flag(Flag::BadInput))])
    );
}
