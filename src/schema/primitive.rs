//! Primitive schema codecs: choice, number, text, binary, moment
//!
//! Each codec consumes exactly one cell. Validation order is fixed per
//! kind; primitive failures carry exactly one leaf flag.

use std::collections::HashSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use regex::Regex;

use crate::flag::{ErrorToken, Flag};
use crate::normalize::normalize;

use super::types::{
    clamp, BinaryKind, BinaryMeta, MomentMeta, NumberKind, NumberMeta, TextKind, TextMeta, Value,
};

/// Closed set of literal strings; membership is O(1).
pub(crate) struct ChoiceCodec {
    members: HashSet<String>,
}

impl ChoiceCodec {
    pub(crate) fn new<I, S>(options: I) -> ChoiceCodec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ChoiceCodec {
            members: options.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn decode(&self, text: &str) -> Result<Value, ErrorToken> {
        let text = normalize(text);
        if self.members.contains(&text) {
            Ok(Value::Text(text))
        } else {
            Err(Flag::BadInput.token())
        }
    }

    pub(crate) fn encode(&self, value: &Value) -> String {
        normalize(value.as_text().unwrap_or_default())
    }
}

/// Bounded number with optional step.
pub(crate) struct NumberCodec {
    kind: NumberKind,
    min: f64,
    max: f64,
    step: f64,
}

impl NumberCodec {
    pub(crate) fn new(kind: NumberKind, meta: NumberMeta) -> NumberCodec {
        let (min, max) = clamp(kind.range(), meta.min, meta.max);
        NumberCodec {
            kind,
            min,
            max,
            step: meta.step.unwrap_or(0.0),
        }
    }

    pub(crate) fn decode(&self, text: &str) -> Result<Value, ErrorToken> {
        if text.trim().is_empty() {
            return Err(Flag::BadInput.token());
        }
        let value = match self.kind {
            NumberKind::Real => {
                let value: f64 = text.trim().parse().map_err(|_| Flag::BadInput.token())?;
                if value.is_nan() {
                    return Err(Flag::BadInput.token());
                }
                if !value.is_finite() {
                    return Err(Flag::TypeMismatch.token());
                }
                value
            }
            // Integer kinds are hex on the wire. A cell that is numeric in
            // decimal but not an integral hex value is the wrong type; one
            // with surrounding whitespace, or numeric in neither form, is
            // malformed.
            NumberKind::Uint | NumberKind::Time => match i128::from_str_radix(text, 16) {
                Ok(value) => value as f64,
                Err(_) => {
                    let numeric = text.trim() == text
                        && text.parse::<f64>().map(|v| !v.is_nan()).unwrap_or(false);
                    let flag = if numeric { Flag::TypeMismatch } else { Flag::BadInput };
                    return Err(flag.token());
                }
            },
        };
        if value < self.min {
            return Err(Flag::RangeUnderflow.token());
        }
        if value > self.max {
            return Err(Flag::RangeOverflow.token());
        }
        if self.step != 0.0 && value % self.step != 0.0 {
            return Err(Flag::StepMismatch.token());
        }
        Ok(Value::Number(value))
    }

    pub(crate) fn encode(&self, value: &Value) -> String {
        let value = value.as_number().unwrap_or(0.0);
        match self.kind {
            NumberKind::Uint => format!("{:x}", value as u64),
            NumberKind::Time => format!("{:012x}", value as u64),
            NumberKind::Real => format!("{value}"),
        }
    }
}

/// Bounded text with an optional pattern.
pub(crate) struct TextCodec {
    min: usize,
    max: usize,
    pattern: Option<Regex>,
}

impl TextCodec {
    pub(crate) fn new(kind: TextKind, meta: TextMeta) -> TextCodec {
        let (min, max) = clamp(
            kind.range(),
            meta.min.map(|v| v as f64),
            meta.max.map(|v| v as f64),
        );
        let pattern = meta.pattern.as_deref().and_then(|source| {
            let compiled = Regex::new(source).ok();
            if compiled.is_none() {
                tracing::debug!(pattern = source, "invalid pattern; pattern checking disabled");
            }
            compiled
        });
        TextCodec {
            min: min as usize,
            max: max as usize,
            pattern,
        }
    }

    pub(crate) fn decode(&self, text: &str) -> Result<Value, ErrorToken> {
        let text = normalize(text);
        let length = text.chars().count();
        if length < self.min {
            return Err(Flag::TooShort.token());
        }
        if length > self.max {
            return Err(Flag::TooLong.token());
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(&text) {
                return Err(Flag::PatternMismatch.token());
            }
        }
        Ok(Value::Text(text))
    }

    pub(crate) fn encode(&self, value: &Value) -> String {
        normalize(value.as_text().unwrap_or_default())
    }
}

/// URL-safe unpadded base64 binary, fixed key or bounded blob.
pub(crate) struct BinaryCodec {
    min: usize,
    max: usize,
    step: usize,
}

impl BinaryCodec {
    pub(crate) fn new(kind: BinaryKind, meta: BinaryMeta) -> BinaryCodec {
        let (min, max) = clamp(
            kind.range(),
            meta.min.map(|v| v as f64),
            meta.max.map(|v| v as f64),
        );
        let step = match kind {
            // A fixed key has exactly one valid length; step adds nothing.
            BinaryKind::Key => 0,
            BinaryKind::Blob => meta.step.unwrap_or(0),
        };
        BinaryCodec {
            min: min as usize,
            max: max as usize,
            step,
        }
    }

    pub(crate) fn decode(&self, text: &str) -> Result<Value, ErrorToken> {
        let in_alphabet =
            |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
        if !text.chars().all(in_alphabet) {
            return Err(Flag::BadInput.token());
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(text)
            .map_err(|_| Flag::BadInput.token())?;
        if bytes.len() < self.min {
            return Err(Flag::TooShort.token());
        }
        if bytes.len() > self.max {
            return Err(Flag::TooLong.token());
        }
        if self.step != 0 && bytes.len() % self.step != 0 {
            return Err(Flag::StepMismatch.token());
        }
        Ok(Value::Bytes(bytes))
    }

    pub(crate) fn encode(&self, value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(value.as_bytes().unwrap_or_default())
    }
}

/// Milliseconds representable by an ISO-8601 calendar date.
const MOMENT_RANGE_MS: i64 = 8_640_000_000_000_000;

/// ISO-8601 (RFC 3339) moment, valued in epoch milliseconds.
pub(crate) struct MomentCodec {
    min: i64,
    max: i64,
}

impl MomentCodec {
    pub(crate) fn new(meta: MomentMeta) -> MomentCodec {
        let (min, max) = clamp(
            (-MOMENT_RANGE_MS as f64, MOMENT_RANGE_MS as f64),
            meta.min.map(|v| v as f64),
            meta.max.map(|v| v as f64),
        );
        MomentCodec {
            min: min as i64,
            max: max as i64,
        }
    }

    pub(crate) fn decode(&self, text: &str) -> Result<Value, ErrorToken> {
        let moment =
            DateTime::parse_from_rfc3339(text).map_err(|_| Flag::BadInput.token())?;
        let millis = moment.timestamp_millis();
        if millis < self.min {
            return Err(Flag::RangeUnderflow.token());
        }
        if millis > self.max {
            return Err(Flag::RangeOverflow.token());
        }
        Ok(Value::Number(millis as f64))
    }

    pub(crate) fn encode(&self, value: &Value) -> String {
        let millis = value.as_number().unwrap_or(0.0) as i64;
        let moment = Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH);
        moment.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
