//! Error flags, descriptions, and the interning table
//!
//! Validation failures travel through the same return channel as decoded
//! values: a decode yields `Result<Value, ErrorToken>`, and the token type is
//! structurally disjoint from every domain value type. A token is an interned
//! handle for a JSON-shaped [`ErrorDesc`]; two structurally equal
//! descriptions always intern to the identical token, so tokens compare by
//! value and can be matched against the pre-interned leaf flags.
//!
//! The interning table is process-wide and append-only. Interned strings are
//! leaked; the table grows with the number of distinct error shapes the
//! process produces, which is bounded by the schemas in use.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock};

/// The closed set of leaf validation flags.
///
/// These mirror form-validation semantics: missing, malformed, out-of-range,
/// wrong-multiple, too-long/short, wrong-type, pattern-mismatch, and a
/// generic "valid" tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Input is malformed for the schema's kind
    BadInput,
    /// Text does not match the schema's pattern
    PatternMismatch,
    /// Value is above the schema's maximum
    RangeOverflow,
    /// Value is below the schema's minimum
    RangeUnderflow,
    /// Value is not a multiple of the schema's step
    StepMismatch,
    /// Length or count is above the schema's maximum
    TooLong,
    /// Length or count is below the schema's minimum
    TooShort,
    /// Value has the wrong shape for the schema
    TypeMismatch,
    /// No failure
    Valid,
    /// A required cell was absent
    ValueMissing,
}

impl Flag {
    /// Every flag, in canonical order.
    pub const ALL: [Flag; 10] = [
        Flag::BadInput,
        Flag::PatternMismatch,
        Flag::RangeOverflow,
        Flag::RangeUnderflow,
        Flag::StepMismatch,
        Flag::TooLong,
        Flag::TooShort,
        Flag::TypeMismatch,
        Flag::Valid,
        Flag::ValueMissing,
    ];

    /// Returns the wire tag for this flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::BadInput => "badInput",
            Flag::PatternMismatch => "patternMismatch",
            Flag::RangeOverflow => "rangeOverflow",
            Flag::RangeUnderflow => "rangeUnderflow",
            Flag::StepMismatch => "stepMismatch",
            Flag::TooLong => "tooLong",
            Flag::TooShort => "tooShort",
            Flag::TypeMismatch => "typeMismatch",
            Flag::Valid => "valid",
            Flag::ValueMissing => "valueMissing",
        }
    }

    /// Parses a wire tag back into a flag.
    pub fn parse(text: &str) -> Option<Flag> {
        Flag::ALL.iter().copied().find(|flag| flag.as_str() == text)
    }

    /// Returns the interned token for this flag alone.
    pub fn token(self) -> ErrorToken {
        wrap(&ErrorDesc::Flag(self))
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A JSON-shaped error description.
///
/// Leaves are flags; aggregates are index-aligned arrays (a `None` marks a
/// position with no error) or keyed objects holding only the erroring keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDesc {
    /// A single leaf flag
    Flag(Flag),
    /// Index-aligned errors for a vector's or map's entries
    Items(Vec<Option<ErrorDesc>>),
    /// Keyed errors for a record's fields (erroring keys only)
    Fields(BTreeMap<String, ErrorDesc>),
}

impl ErrorDesc {
    /// Serializes to the canonical JSON form (objects in stable key order).
    fn to_json(&self) -> serde_json::Value {
        match self {
            ErrorDesc::Flag(flag) => serde_json::Value::String(flag.as_str().to_string()),
            ErrorDesc::Items(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Some(desc) => desc.to_json(),
                        None => serde_json::Value::Null,
                    })
                    .collect(),
            ),
            ErrorDesc::Fields(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(key, desc)| (key.clone(), desc.to_json()))
                    .collect(),
            ),
        }
    }

    fn from_json(value: &serde_json::Value) -> Option<ErrorDesc> {
        match value {
            serde_json::Value::String(tag) => Flag::parse(tag).map(ErrorDesc::Flag),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    serde_json::Value::Null => Some(None),
                    other => ErrorDesc::from_json(other).map(Some),
                })
                .collect::<Option<Vec<_>>>()
                .map(ErrorDesc::Items),
            serde_json::Value::Object(fields) => fields
                .iter()
                .map(|(key, desc)| ErrorDesc::from_json(desc).map(|d| (key.clone(), d)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(ErrorDesc::Fields),
            _ => None,
        }
    }
}

/// An opaque, interned handle for an [`ErrorDesc`].
///
/// Tokens produced from structurally equal descriptions are identical (they
/// share the same interned string), so `==` is both cheap and canonical. A
/// token is never a member of any domain value's representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorToken(&'static str);

impl ErrorToken {
    /// Returns the canonical JSON this token was interned from.
    pub fn as_json(&self) -> &'static str {
        self.0
    }

    /// Unwraps the description held in this token.
    pub fn open(self) -> ErrorDesc {
        open(self)
    }
}

impl fmt::Display for ErrorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn table() -> &'static RwLock<HashMap<String, &'static str>> {
    static TABLE: OnceLock<RwLock<HashMap<String, &'static str>>> = OnceLock::new();
    TABLE.get_or_init(|| {
        // Pre-intern the ten leaf flags.
        let mut map = HashMap::with_capacity(Flag::ALL.len());
        for flag in Flag::ALL {
            let json = serde_json::Value::String(flag.as_str().to_string()).to_string();
            let interned: &'static str = Box::leak(json.clone().into_boxed_str());
            map.insert(json, interned);
        }
        RwLock::new(map)
    })
}

/// Wraps an error description in an interned token.
///
/// Repeated calls with structurally equal descriptions return the identical
/// token. Insertion is synchronized; reads after population take the read
/// lock only.
pub fn wrap(desc: &ErrorDesc) -> ErrorToken {
    let json = desc.to_json().to_string();
    {
        let map = table().read().unwrap_or_else(PoisonError::into_inner);
        if let Some(&interned) = map.get(&json) {
            return ErrorToken(interned);
        }
    }
    let mut map = table().write().unwrap_or_else(PoisonError::into_inner);
    let interned = match map.entry(json) {
        std::collections::hash_map::Entry::Occupied(entry) => *entry.get(),
        std::collections::hash_map::Entry::Vacant(entry) => {
            let leaked: &'static str = Box::leak(entry.key().clone().into_boxed_str());
            tracing::trace!(desc = leaked, "interned error description");
            entry.insert(leaked);
            leaked
        }
    };
    ErrorToken(interned)
}

/// Unwraps the description held in a token.
///
/// Exact inverse of [`wrap`] for every token it produces. Tokens are only
/// minted by `wrap`, so the stored JSON always parses back; a foreign token
/// cannot be constructed outside this module.
pub fn open(token: ErrorToken) -> ErrorDesc {
    serde_json::from_str(token.0)
        .ok()
        .as_ref()
        .and_then(ErrorDesc::from_json)
        .unwrap_or(ErrorDesc::Flag(Flag::Valid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_descriptions_intern_to_identical_token() {
        let a = wrap(&ErrorDesc::Flag(Flag::BadInput));
        let b = wrap(&ErrorDesc::Flag(Flag::BadInput));
        assert_eq!(a, b);
        // Same interned string, not merely equal content.
        assert!(std::ptr::eq(a.as_json(), b.as_json()));
    }

    #[test]
    fn test_flag_tokens_are_pre_interned() {
        for flag in Flag::ALL {
            let token = flag.token();
            assert_eq!(open(token), ErrorDesc::Flag(flag));
        }
    }

    #[test]
    fn test_open_inverts_wrap_for_aggregates() {
        let desc = ErrorDesc::Items(vec![
            None,
            Some(ErrorDesc::Flag(Flag::BadInput)),
            Some(ErrorDesc::Fields(BTreeMap::from([
                ("name".to_string(), ErrorDesc::Flag(Flag::TooShort)),
                ("age".to_string(), ErrorDesc::Flag(Flag::RangeOverflow)),
            ]))),
        ]);
        assert_eq!(open(wrap(&desc)), desc);
    }

    #[test]
    fn test_object_keys_serialize_in_stable_order() {
        let forward = ErrorDesc::Fields(BTreeMap::from([
            ("a".to_string(), ErrorDesc::Flag(Flag::Valid)),
            ("b".to_string(), ErrorDesc::Flag(Flag::TooLong)),
        ]));
        let reverse = ErrorDesc::Fields(BTreeMap::from([
            ("b".to_string(), ErrorDesc::Flag(Flag::TooLong)),
            ("a".to_string(), ErrorDesc::Flag(Flag::Valid)),
        ]));
        assert_eq!(wrap(&forward), wrap(&reverse));
    }

    #[test]
    fn test_distinct_descriptions_get_distinct_tokens() {
        assert_ne!(Flag::TooShort.token(), Flag::TooLong.token());
        let items = wrap(&ErrorDesc::Items(vec![Some(ErrorDesc::Flag(Flag::Valid))]));
        assert_ne!(items, Flag::Valid.token());
    }

    #[test]
    fn test_flag_tags_round_trip() {
        for flag in Flag::ALL {
            assert_eq!(Flag::parse(flag.as_str()), Some(flag));
        }
        assert_eq!(Flag::parse("nonsense"), None);
    }
}
