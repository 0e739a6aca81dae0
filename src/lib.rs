//! rowcodec - A strict, deterministic schema codec for delimited-text rows
//!
//! A row is an ordered sequence of optional text cells. A [`Schema`] is an
//! immutable decoder/encoder pair: decoding consumes cells from the front of
//! a row and yields either a strongly validated [`Value`] or an interned
//! [`ErrorToken`]; encoding turns a value back into a row fragment.
//!
//! # Design Principles
//!
//! - Errors travel through the return channel, never by panic
//! - Equal error descriptions intern to the identical token
//! - Composite failures aggregate structurally (no first-error reporting)
//! - Misconfigured bounds are normalized, never rejected
//! - Decoding is deterministic and synchronous

pub mod flag;
pub mod normalize;
pub mod packed;
pub mod row;
pub mod schema;

pub use flag::{open, wrap, ErrorDesc, ErrorToken, Flag};
pub use normalize::normalize;
pub use row::{Cell, Row};
pub use schema::{
    BinaryKind, BinaryMeta, MapMeta, MomentMeta, NumberKind, NumberMeta, RecordMeta, Schema,
    TextKind, TextMeta, Value, VectorMeta,
};
