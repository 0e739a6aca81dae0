//! Composite schema codecs: vector, map, record
//!
//! Each composite consumes a leading count cell, then delegates to its
//! child schema(s) against the same row. Child failures generally do not
//! short-circuit the sibling loop: each declared position is decoded
//! (consuming its cells) so error indices stay aligned, and any failure
//! discards all sibling successes in favor of the structural aggregate.
//! Two exceptions: a map entry whose key fails or collides skips that
//! entry's value, and a record that exceeds its non-null bound stops
//! decoding fields at the violation.

use std::collections::{BTreeMap, HashSet};

use crate::flag::{open, wrap, ErrorDesc, ErrorToken, Flag};
use crate::row::Row;

use super::types::{clamp, format_base36, parse_base36, MapMeta, RecordMeta, Value, VectorMeta};
use super::Schema;

/// Absolute entry-count range for vectors and maps.
const COUNT_RANGE: (f64, f64) = (0.0, 0xfff as f64);

/// Homogeneous, length-prefixed sequence with optional uniqueness.
pub(crate) struct VectorCodec {
    element: Box<Schema>,
    min: u64,
    max: u64,
    unique: bool,
}

impl VectorCodec {
    pub(crate) fn new(element: Schema, meta: VectorMeta) -> VectorCodec {
        let (min, max) = clamp(
            COUNT_RANGE,
            meta.min.map(|v| v as f64),
            meta.max.map(|v| v as f64),
        );
        VectorCodec {
            element: Box::new(element),
            min: min as u64,
            max: max as u64,
            unique: meta.unique,
        }
    }

    pub(crate) fn decode(&self, text: &str, row: &mut Row) -> Result<Value, ErrorToken> {
        let count = parse_base36(text).ok_or_else(|| Flag::BadInput.token())?;
        if count < self.min {
            return Err(Flag::TooShort.token());
        }
        if count > self.max {
            return Err(Flag::TooLong.token());
        }
        let mut items = Vec::with_capacity(count as usize);
        let mut errors: Vec<Option<ErrorDesc>> = Vec::with_capacity(count as usize);
        let mut failed = false;
        for _ in 0..count {
            match self.element.decode(row) {
                Ok(item) => {
                    items.push(item);
                    errors.push(None);
                }
                Err(token) => {
                    items.push(Value::Null);
                    errors.push(Some(open(token)));
                    failed = true;
                }
            }
        }
        if failed {
            return Err(wrap(&ErrorDesc::Items(errors)));
        }
        if self.unique {
            let mut seen = HashSet::with_capacity(items.len());
            for item in &items {
                if !seen.insert(item.fingerprint()) {
                    return Err(Flag::TypeMismatch.token());
                }
            }
        }
        Ok(Value::List(items))
    }

    pub(crate) fn encode(&self, value: &Value, row: &mut Row) -> String {
        let items = value.as_list().unwrap_or_default();
        for item in items {
            row.append(self.element.encode(item.clone()));
        }
        format_base36(items.len() as u64)
    }
}

/// Dynamic keyed entries with homogeneous values.
///
/// Key uniqueness is structural for maps: a collision is recorded as a
/// `typeMismatch` at the colliding index and the entry's value is not
/// decoded.
pub(crate) struct MapCodec {
    key: Box<Schema>,
    value: Box<Schema>,
    min: u64,
    max: u64,
}

impl MapCodec {
    pub(crate) fn new(key: Schema, value: Schema, meta: MapMeta) -> MapCodec {
        let (min, max) = clamp(
            COUNT_RANGE,
            meta.min.map(|v| v as f64),
            meta.max.map(|v| v as f64),
        );
        MapCodec {
            // Keys are always required, whatever the supplied schema says.
            key: Box::new(key.required()),
            value: Box::new(value),
            min: min as u64,
            max: max as u64,
        }
    }

    pub(crate) fn decode(&self, text: &str, row: &mut Row) -> Result<Value, ErrorToken> {
        let count = parse_base36(text).ok_or_else(|| Flag::BadInput.token())?;
        if count < self.min {
            return Err(Flag::TooShort.token());
        }
        if count > self.max {
            return Err(Flag::TooLong.token());
        }
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(count as usize);
        let mut errors: Vec<Option<ErrorDesc>> = Vec::with_capacity(count as usize);
        let mut seen = HashSet::with_capacity(count as usize);
        let mut failed = false;
        for _ in 0..count {
            let key = match self.key.decode(row) {
                Ok(key) => key,
                Err(token) => {
                    errors.push(Some(open(token)));
                    failed = true;
                    continue;
                }
            };
            if !seen.insert(key.fingerprint()) {
                errors.push(Some(ErrorDesc::Flag(Flag::TypeMismatch)));
                failed = true;
                continue;
            }
            match self.value.decode(row) {
                Ok(value) => {
                    entries.push((key, value));
                    errors.push(None);
                }
                Err(token) => {
                    let paired = BTreeMap::from([(key.label(), open(token))]);
                    errors.push(Some(ErrorDesc::Fields(paired)));
                    failed = true;
                }
            }
        }
        if failed {
            return Err(wrap(&ErrorDesc::Items(errors)));
        }
        Ok(Value::Entries(entries))
    }

    pub(crate) fn encode(&self, value: &Value, row: &mut Row) -> String {
        let entries = value.as_entries().unwrap_or_default();
        for (key, value) in entries {
            row.append(self.key.encode(key.clone()));
            row.append(self.value.encode(value.clone()));
        }
        format_base36(entries.len() as u64)
    }
}

/// Fixed named fields in declaration order.
///
/// The count cell is not a bound here: it must equal the declared arity
/// exactly. The min/max bound instead counts the fields that decode to a
/// non-null value, so a record of optional fields can require that some of
/// them are actually present.
pub(crate) struct RecordCodec {
    fields: Vec<(String, Schema)>,
    min: u64,
    max: u64,
}

impl RecordCodec {
    pub(crate) fn new(fields: Vec<(String, Schema)>, meta: RecordMeta) -> RecordCodec {
        let (min, max) = clamp(
            COUNT_RANGE,
            meta.min.map(|v| v as f64),
            meta.max.map(|v| v as f64),
        );
        RecordCodec {
            fields,
            min: min as u64,
            max: max as u64,
        }
    }

    pub(crate) fn decode(&self, text: &str, row: &mut Row) -> Result<Value, ErrorToken> {
        let count = parse_base36(text).ok_or_else(|| Flag::BadInput.token())?;
        if count != self.fields.len() as u64 {
            return Err(Flag::TypeMismatch.token());
        }
        let mut record = Vec::with_capacity(self.fields.len());
        let mut errors = BTreeMap::new();
        let mut present = 0u64;
        for (name, schema) in &self.fields {
            match schema.decode(row) {
                Ok(value) => {
                    if !value.is_null() {
                        present += 1;
                        // Exceeding the bound aborts the field loop outright.
                        if present > self.max {
                            return Err(Flag::TooLong.token());
                        }
                    }
                    record.push((name.clone(), value));
                }
                Err(token) => {
                    errors.insert(name.clone(), open(token));
                }
            }
        }
        if present < self.min {
            return Err(Flag::TooShort.token());
        }
        if !errors.is_empty() {
            return Err(wrap(&ErrorDesc::Fields(errors)));
        }
        Ok(Value::Record(record))
    }

    pub(crate) fn encode(&self, value: &Value, row: &mut Row) -> String {
        let provided = value.as_record().unwrap_or_default();
        for (name, schema) in &self.fields {
            let field = provided
                .iter()
                .find(|(provided_name, _)| provided_name == name)
                .map(|(_, value)| value.clone())
                .unwrap_or(Value::Null);
            row.append(schema.encode(field));
        }
        format_base36(self.fields.len() as u64)
    }
}
