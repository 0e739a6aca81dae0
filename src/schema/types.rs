//! Value and kind definitions for the schema engine
//!
//! Decoded values are dynamic: every schema produces a [`Value`], and
//! composite schemas nest them. Kind descriptors carry the absolute ranges
//! each schema's bounds are clamped into.

use serde::Serialize;

/// A decoded domain value.
///
/// `Null` is what an optional schema decodes from an absent cell; every
/// other variant maps to one schema family. Maps and records keep their
/// insertion/declaration order, so equality is order-sensitive for both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    /// Absent (optional schemas only)
    Null,
    /// Numbers, moments, and timestamps
    Number(f64),
    /// Choice and text schemas
    Text(String),
    /// Binary and key schemas
    Bytes(Vec<u8>),
    /// Vector elements, in row order
    List(Vec<Value>),
    /// Map entries, in insertion order
    Entries(Vec<(Value, Value)>),
    /// Record fields, in declaration order
    Record(Vec<(String, Value)>),
}

impl Value {
    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the number, if this is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrows the text, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Borrows the bytes, if this is binary.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Borrows the elements, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrows the entries, if this is a map.
    pub fn as_entries(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Entries(entries) => Some(entries),
            _ => None,
        }
    }

    /// Borrows the fields, if this is a record.
    pub fn as_record(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Canonical structural serialization, used as an equality key for
    /// uniqueness checks and map key identity.
    pub(crate) fn fingerprint(&self) -> String {
        // Serializing Value cannot fail: no non-string map keys, no
        // non-serializable leaves.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// A key label for map error objects: the text itself for text keys,
    /// the fingerprint otherwise.
    pub(crate) fn label(&self) -> String {
        match self {
            Value::Text(t) => t.clone(),
            other => other.fingerprint(),
        }
    }
}

/// Numeric schema kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// 32-bit unsigned integer, rendered as unpadded lowercase hex
    Uint,
    /// 48-bit absolute milliseconds, rendered as 12 zero-padded hex digits
    /// so lexical and numeric order coincide
    Time,
    /// Finite double, rendered as default decimal text
    Real,
}

impl NumberKind {
    /// Absolute numeric range for this kind.
    pub(crate) fn range(&self) -> (f64, f64) {
        match self {
            NumberKind::Uint => (0.0, 0xffff_ffffu32 as f64),
            NumberKind::Time => (0.0, 0xffff_ffff_ffffu64 as f64),
            NumberKind::Real => (f64::MIN, f64::MAX),
        }
    }
}

/// Text schema kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// Short text, length capped at 255
    Char,
    /// Long text, length capped at 65535
    Text,
}

impl TextKind {
    /// Absolute length range for this kind.
    pub(crate) fn range(&self) -> (f64, f64) {
        match self {
            TextKind::Char => (0.0, 0xff as f64),
            TextKind::Text => (0.0, 0xffff as f64),
        }
    }
}

/// Binary schema kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    /// Fixed 32-byte key (43 encoded characters)
    Key,
    /// Variable-length blob, length capped at 65535 bytes
    Blob,
}

impl BinaryKind {
    /// Absolute byte-length range for this kind.
    pub(crate) fn range(&self) -> (f64, f64) {
        match self {
            BinaryKind::Key => (32.0, 32.0),
            BinaryKind::Blob => (0.0, 0xffff as f64),
        }
    }
}

/// Bounds for number schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberMeta {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// 0 (or `None`) leaves the value unconstrained.
    pub step: Option<f64>,
}

/// Bounds and pattern for text schemas.
#[derive(Debug, Clone, Default)]
pub struct TextMeta {
    pub min: Option<usize>,
    pub max: Option<usize>,
    /// Compiled at construction. An invalid pattern disables pattern
    /// checking instead of failing construction.
    pub pattern: Option<String>,
}

/// Bounds for binary schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryMeta {
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub step: Option<usize>,
}

/// Bounds for moment schemas, in milliseconds since the epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentMeta {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Bounds and uniqueness for vector schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorMeta {
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub unique: bool,
}

/// Bounds for map schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapMeta {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

/// Bounds for record schemas, counting decoded non-null fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMeta {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

/// Normalizes configured bounds into an absolute range: each bound defaults
/// to the range's end, the pair is reordered if inverted, and both ends are
/// clamped into the range. Misconfiguration never rejects.
pub(crate) fn clamp(range: (f64, f64), min: Option<f64>, max: Option<f64>) -> (f64, f64) {
    let (lo, hi) = range;
    let a = min.unwrap_or(lo).max(lo);
    let b = max.unwrap_or(hi).min(hi);
    (a.min(b).max(lo), a.max(b).min(hi))
}

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Renders a count in canonical lowercase base-36.
pub(crate) fn format_base36(value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = [0u8; 13];
    let mut at = digits.len();
    let mut rest = value;
    while rest > 0 {
        at -= 1;
        digits[at] = BASE36_DIGITS[(rest % 36) as usize];
        rest /= 36;
    }
    String::from_utf8_lossy(&digits[at..]).into_owned()
}

/// Parses a canonical lowercase base-36 count.
///
/// Rejects every non-canonical form: empty, signs, uppercase, leading
/// zeros.
pub(crate) fn parse_base36(text: &str) -> Option<u64> {
    let value = u64::from_str_radix(text, 36).ok()?;
    (format_base36(value) == text).then_some(value)
}
