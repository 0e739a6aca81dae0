//! Aggregate Error Tests
//!
//! Composite schemas report the full shape of all current failures at their
//! level in one decode attempt: index-aligned arrays for vectors and maps,
//! keyed objects for records. Any child failure discards all sibling
//! successes.

use std::collections::BTreeMap;

use rowcodec::{
    open, ErrorDesc, Flag, MapMeta, NumberMeta, RecordMeta, Row, Schema, TextKind, TextMeta,
    VectorMeta,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn row(cells: &[Option<&str>]) -> Row {
    cells.iter().copied().collect()
}

fn decode_err(schema: &Schema, cells: &[Option<&str>]) -> ErrorDesc {
    let mut input = row(cells);
    open(schema.decode(&mut input).unwrap_err())
}

fn flag(flag: Flag) -> Option<ErrorDesc> {
    Some(ErrorDesc::Flag(flag))
}

// =============================================================================
// Vector Aggregation
// =============================================================================

/// One malformed element out of three yields [null, "badInput", null], not
/// a partial value.
#[test]
fn test_vector_index_aligned_aggregate() {
    let schema = Schema::vector(Schema::uint(NumberMeta::default()), VectorMeta::default());
    let err = decode_err(&schema, &[Some("3"), Some("1"), Some("x"), Some("2")]);
    assert_eq!(err, ErrorDesc::Items(vec![None, flag(Flag::BadInput), None]));
}

/// Every failing element is present in the aggregate.
#[test]
fn test_vector_multiple_failures() {
    let schema = Schema::vector(
        Schema::uint(NumberMeta {
            min: None,
            max: Some(10.0),
            step: None,
        }),
        VectorMeta::default(),
    );
    let err = decode_err(&schema, &[Some("3"), Some("ff"), Some("1"), None]);
    assert_eq!(
        err,
        ErrorDesc::Items(vec![
            flag(Flag::RangeOverflow),
            None,
            flag(Flag::ValueMissing),
        ])
    );
}

/// The count cell must be canonical base-36.
#[test]
fn test_vector_count_must_be_canonical() {
    let schema = Schema::vector(Schema::uint(NumberMeta::default()), VectorMeta::default());
    for count in ["", " ", "02", "-1", "+1", "A", "1.5"] {
        let err = decode_err(&schema, &[Some(count)]);
        assert_eq!(err, ErrorDesc::Flag(Flag::BadInput), "count {count:?}");
    }
}

/// Count bounds use tooShort/tooLong, checked before elements are decoded.
#[test]
fn test_vector_count_bounds() {
    let schema = Schema::vector(
        Schema::uint(NumberMeta::default()),
        VectorMeta {
            min: Some(2),
            max: Some(3),
            unique: false,
        },
    );
    assert_eq!(
        decode_err(&schema, &[Some("1"), Some("1")]),
        ErrorDesc::Flag(Flag::TooShort)
    );
    assert_eq!(
        decode_err(&schema, &[Some("4")]),
        ErrorDesc::Flag(Flag::TooLong)
    );
}

/// A duplicate in a unique vector is one top-level typeMismatch.
#[test]
fn test_vector_uniqueness() {
    let schema = Schema::vector(
        Schema::uint(NumberMeta::default()),
        VectorMeta {
            min: None,
            max: None,
            unique: true,
        },
    );
    let err = decode_err(&schema, &[Some("3"), Some("1"), Some("2"), Some("1")]);
    assert_eq!(err, ErrorDesc::Flag(Flag::TypeMismatch));

    let mut distinct = row(&[Some("2"), Some("1"), Some("2")]);
    assert!(schema.decode(&mut distinct).is_ok());
}

/// Uniqueness is structural, so equal nested lists collide.
#[test]
fn test_vector_uniqueness_is_structural() {
    let schema = Schema::vector(
        Schema::vector(Schema::uint(NumberMeta::default()), VectorMeta::default()),
        VectorMeta {
            min: None,
            max: None,
            unique: true,
        },
    );
    let err = decode_err(
        &schema,
        &[Some("2"), Some("1"), Some("5"), Some("1"), Some("5")],
    );
    assert_eq!(err, ErrorDesc::Flag(Flag::TypeMismatch));
}

// =============================================================================
// Record Aggregation
// =============================================================================

fn pair_schema() -> Schema {
    Schema::record([
        ("name", Schema::text(TextKind::Char, TextMeta { min: Some(1), max: None, pattern: None })),
        ("age", Schema::uint(NumberMeta::default())),
    ])
}

/// The count cell must equal the declared arity exactly.
#[test]
fn test_record_exact_arity() {
    let schema = pair_schema();
    assert_eq!(
        decode_err(&schema, &[Some("3"), Some("a"), Some("1"), Some("x")]),
        ErrorDesc::Flag(Flag::TypeMismatch)
    );
    assert_eq!(
        decode_err(&schema, &[Some("1"), Some("a")]),
        ErrorDesc::Flag(Flag::TypeMismatch)
    );
}

/// Non-canonical arity cells are malformed, not mismatched.
#[test]
fn test_record_non_canonical_arity_is_bad_input() {
    let schema = pair_schema();
    for count in ["-1", "03", "", "+2"] {
        assert_eq!(
            decode_err(&schema, &[Some(count), Some("a"), Some("1")]),
            ErrorDesc::Flag(Flag::BadInput),
            "count {count:?}"
        );
    }
}

/// Every field decodes even after an earlier failure; only erroring field
/// names appear in the aggregate.
#[test]
fn test_record_keyed_aggregate() {
    let schema = pair_schema();
    let err = decode_err(&schema, &[Some("2"), Some(""), Some("zz!")]);
    assert_eq!(
        err,
        ErrorDesc::Fields(BTreeMap::from([
            ("name".to_string(), ErrorDesc::Flag(Flag::TooShort)),
            ("age".to_string(), ErrorDesc::Flag(Flag::BadInput)),
        ]))
    );
}

/// A single failing field discards the sibling successes.
#[test]
fn test_record_discards_partial_success() {
    let schema = pair_schema();
    let err = decode_err(&schema, &[Some("2"), Some("ada"), Some("x")]);
    assert_eq!(
        err,
        ErrorDesc::Fields(BTreeMap::from([(
            "age".to_string(),
            ErrorDesc::Flag(Flag::BadInput),
        )]))
    );
}

/// The min/max bound counts fields that decode non-null, so optional
/// fields left absent do not satisfy it.
#[test]
fn test_record_non_null_bounds() {
    let schema = Schema::record_bounded(
        [
            ("a", Schema::uint(NumberMeta::default()).optional()),
            ("b", Schema::uint(NumberMeta::default()).optional()),
            ("c", Schema::uint(NumberMeta::default()).optional()),
        ],
        RecordMeta {
            min: Some(1),
            max: Some(2),
        },
    );
    assert_eq!(
        decode_err(&schema, &[Some("3"), None, None, None]),
        ErrorDesc::Flag(Flag::TooShort)
    );
    let mut within = row(&[Some("3"), Some("1"), None, Some("2")]);
    assert!(schema.decode(&mut within).is_ok());
    assert_eq!(
        decode_err(&schema, &[Some("3"), Some("1"), Some("2"), Some("3")]),
        ErrorDesc::Flag(Flag::TooLong)
    );
}

/// Exceeding the non-null maximum stops the field loop at the violation,
/// leaving the remaining cells unconsumed.
#[test]
fn test_record_too_long_stops_decoding() {
    let schema = Schema::record_bounded(
        [
            ("a", Schema::uint(NumberMeta::default())),
            ("b", Schema::uint(NumberMeta::default())),
            ("c", Schema::uint(NumberMeta::default())),
        ],
        RecordMeta {
            min: None,
            max: Some(1),
        },
    );
    let mut input = row(&[Some("3"), Some("1"), Some("2"), Some("3")]);
    assert_eq!(
        schema.decode(&mut input).unwrap_err(),
        Flag::TooLong.token()
    );
    assert_eq!(input.take(), Some("3".to_string()));
}

/// Falling below the non-null minimum reports tooShort even when fields
/// also failed to decode.
#[test]
fn test_record_too_short_masks_field_errors() {
    let schema = Schema::record_bounded(
        [("a", Schema::uint(NumberMeta::default()))],
        RecordMeta {
            min: Some(1),
            max: None,
        },
    );
    assert_eq!(
        decode_err(&schema, &[Some("1"), Some("x")]),
        ErrorDesc::Flag(Flag::TooShort)
    );
}

/// Nested composite errors unwrap recursively inside the field aggregate.
#[test]
fn test_record_nested_composite_error() {
    let schema = Schema::record([(
        "xs",
        Schema::vector(Schema::uint(NumberMeta::default()), VectorMeta::default()),
    )]);
    let err = decode_err(&schema, &[Some("1"), Some("2"), Some("x"), Some("1")]);
    assert_eq!(
        err,
        ErrorDesc::Fields(BTreeMap::from([(
            "xs".to_string(),
            ErrorDesc::Items(vec![flag(Flag::BadInput), None]),
        )]))
    );
}

// =============================================================================
// Map Aggregation
// =============================================================================

/// A duplicate key is a typeMismatch at its index, and the colliding value
/// is never decoded.
#[test]
fn test_map_duplicate_key() {
    let schema = Schema::map(Schema::uint(NumberMeta::default()), MapMeta::default());
    let mut input = row(&[Some("2"), Some("k"), Some("1"), Some("k"), Some("1"), Some("tail")]);
    let err = open(schema.decode(&mut input).unwrap_err());
    assert_eq!(err, ErrorDesc::Items(vec![None, flag(Flag::TypeMismatch)]));
    // The colliding entry's value cell and the trailing cell are untouched.
    assert_eq!(input.len(), 2);
}

/// A failing value is paired with its key in the index's error object.
#[test]
fn test_map_value_error_pairs_with_key() {
    let schema = Schema::map(Schema::uint(NumberMeta::default()), MapMeta::default());
    let err = decode_err(
        &schema,
        &[Some("2"), Some("a"), Some("1"), Some("b"), Some("x")],
    );
    assert_eq!(
        err,
        ErrorDesc::Items(vec![
            None,
            Some(ErrorDesc::Fields(BTreeMap::from([(
                "b".to_string(),
                ErrorDesc::Flag(Flag::BadInput),
            )]))),
        ])
    );
}

/// A failing key is recorded at its index directly.
#[test]
fn test_map_key_error() {
    let schema = Schema::map(Schema::uint(NumberMeta::default()), MapMeta::default());
    let err = decode_err(&schema, &[Some("1"), None]);
    assert_eq!(err, ErrorDesc::Items(vec![flag(Flag::ValueMissing)]));
}

/// Map keys are always required, even when the supplied key schema was
/// optional.
#[test]
fn test_map_key_schema_forced_required() {
    let schema = Schema::map_keyed(
        Schema::text(TextKind::Char, TextMeta::default()).optional(),
        Schema::uint(NumberMeta::default()),
        MapMeta::default(),
    );
    let err = decode_err(&schema, &[Some("1"), None, Some("1")]);
    assert_eq!(err, ErrorDesc::Items(vec![flag(Flag::ValueMissing)]));
}

/// Map entry counts are bounded like vector counts.
#[test]
fn test_map_count_bounds() {
    let schema = Schema::map(
        Schema::uint(NumberMeta::default()),
        MapMeta {
            min: Some(1),
            max: Some(2),
        },
    );
    assert_eq!(decode_err(&schema, &[Some("0")]), ErrorDesc::Flag(Flag::TooShort));
    assert_eq!(decode_err(&schema, &[Some("3")]), ErrorDesc::Flag(Flag::TooLong));
}

// =============================================================================
// Determinism
// =============================================================================

/// The same malformed input reproduces the identical token.
#[test]
fn test_aggregate_errors_are_deterministic() {
    let schema = Schema::vector(Schema::uint(NumberMeta::default()), VectorMeta::default());
    let cells = [Some("2"), Some("x"), Some("1")];
    let first = schema.decode(&mut row(&cells)).unwrap_err();
    let second = schema.decode(&mut row(&cells)).unwrap_err();
    assert_eq!(first, second);
    assert!(std::ptr::eq(first.as_json(), second.as_json()));
}

/// Decoding a failing composite still consumes its declared cells, leaving
/// the row positioned after it.
#[test]
fn test_failed_composite_consumes_its_cells() {
    let schema = Schema::vector(Schema::uint(NumberMeta::default()), VectorMeta::default());
    let mut input = row(&[Some("2"), Some("x"), Some("1"), Some("rest")]);
    assert!(schema.decode(&mut input).is_err());
    assert_eq!(input.take(), Some("rest".to_string()));
}
