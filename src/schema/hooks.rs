//! Hook pipeline over the four encode/decode lifecycle stages
//!
//! Hooks at a stage run in attachment order, oldest first. On the decode
//! side an error token stops the chain and propagates immediately; the
//! encode side is not a fallible boundary, so its hooks only transform.

use crate::flag::ErrorToken;
use crate::row::Row;

use super::types::Value;

/// Runs before the schema consumes its leading cell. May consume or
/// prepend cells, or short-circuit the decode with an error token.
pub type BeforeDecodeHook = Box<dyn Fn(&mut Row) -> Option<ErrorToken> + Send + Sync>;

/// Runs on the successfully decoded value. May transform it or reject it.
pub type AfterDecodeHook = Box<dyn Fn(Value) -> Result<Value, ErrorToken> + Send + Sync>;

/// Runs on the value before it is encoded. May transform it only.
pub type BeforeEncodeHook = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// Runs on the produced row fragment. May mutate it in place.
pub type AfterEncodeHook = Box<dyn Fn(&mut Row) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Hooks {
    pub(crate) before_decode: Vec<BeforeDecodeHook>,
    pub(crate) after_decode: Vec<AfterDecodeHook>,
    pub(crate) before_encode: Vec<BeforeEncodeHook>,
    pub(crate) after_encode: Vec<AfterEncodeHook>,
}

impl Hooks {
    pub(crate) fn run_before_decode(&self, row: &mut Row) -> Option<ErrorToken> {
        for hook in &self.before_decode {
            if let Some(token) = hook(row) {
                return Some(token);
            }
        }
        None
    }

    pub(crate) fn run_after_decode(&self, mut value: Value) -> Result<Value, ErrorToken> {
        for hook in &self.after_decode {
            value = hook(value)?;
        }
        Ok(value)
    }

    pub(crate) fn run_before_encode(&self, mut value: Value) -> Value {
        for hook in &self.before_encode {
            value = hook(value);
        }
        value
    }

    pub(crate) fn run_after_encode(&self, row: &mut Row) {
        for hook in &self.after_encode {
            hook(row);
        }
    }
}
