//! Schema engine for rowcodec
//!
//! A [`Schema`] is an immutable decoder/encoder pair bound to a kind
//! descriptor and its bounds. Schemas compose by nesting into a tree;
//! decoding consumes cells from the front of a row (recursing into child
//! schemas against the same row) and yields either a [`Value`] or an
//! interned error token, and encoding produces a row fragment.
//!
//! # Design Principles
//!
//! - Constructed once, stateless thereafter; the optionality toggle and
//!   hook attachment complete before first use
//! - A row is exclusively owned by one call for its duration
//! - Recursion depth equals schema nesting depth; callers bound nesting
//! - No retry, no partial success: aggregates discard sibling successes

mod composite;
mod hooks;
mod primitive;
mod types;

pub use hooks::{AfterDecodeHook, AfterEncodeHook, BeforeDecodeHook, BeforeEncodeHook};
pub use types::{
    BinaryKind, BinaryMeta, MapMeta, MomentMeta, NumberKind, NumberMeta, RecordMeta, TextKind,
    TextMeta, Value, VectorMeta,
};

use crate::flag::{ErrorToken, Flag};
use crate::row::Row;

use composite::{MapCodec, RecordCodec, VectorCodec};
use hooks::Hooks;
use primitive::{BinaryCodec, ChoiceCodec, MomentCodec, NumberCodec, TextCodec};

enum Kind {
    Choice(ChoiceCodec),
    Number(NumberCodec),
    Text(TextCodec),
    Binary(BinaryCodec),
    Moment(MomentCodec),
    Vector(VectorCodec),
    Map(MapCodec),
    Record(RecordCodec),
}

/// An immutable decoder/encoder pair.
///
/// Built by the kind constructors below, then optionally toggled with
/// [`Schema::optional`] and extended with hooks before first use. Once
/// finalized a schema may be shared across independent calls.
pub struct Schema {
    kind: Kind,
    required: bool,
    hooks: Hooks,
}

impl Schema {
    fn new(kind: Kind) -> Schema {
        Schema {
            kind,
            required: true,
            hooks: Hooks::default(),
        }
    }

    /// A closed, non-empty list of literal strings.
    pub fn choice<I, S>(options: I) -> Schema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema::new(Kind::Choice(ChoiceCodec::new(options)))
    }

    /// A bounded number of the given kind.
    pub fn number(kind: NumberKind, meta: NumberMeta) -> Schema {
        Schema::new(Kind::Number(NumberCodec::new(kind, meta)))
    }

    /// An unsigned 32-bit integer, hex on the wire.
    pub fn uint(meta: NumberMeta) -> Schema {
        Schema::number(NumberKind::Uint, meta)
    }

    /// A 48-bit millisecond timestamp, fixed-width hex on the wire.
    pub fn time(meta: NumberMeta) -> Schema {
        Schema::number(NumberKind::Time, meta)
    }

    /// A finite double, decimal on the wire.
    pub fn real(meta: NumberMeta) -> Schema {
        Schema::number(NumberKind::Real, meta)
    }

    /// Bounded, optionally pattern-matched text of the given kind.
    pub fn text(kind: TextKind, meta: TextMeta) -> Schema {
        Schema::new(Kind::Text(TextCodec::new(kind, meta)))
    }

    /// A fixed 32-byte key.
    pub fn key() -> Schema {
        Schema::new(Kind::Binary(BinaryCodec::new(
            BinaryKind::Key,
            BinaryMeta::default(),
        )))
    }

    /// A variable-length binary blob.
    pub fn blob(meta: BinaryMeta) -> Schema {
        Schema::new(Kind::Binary(BinaryCodec::new(BinaryKind::Blob, meta)))
    }

    /// An ISO-8601 moment, valued in epoch milliseconds.
    pub fn moment(meta: MomentMeta) -> Schema {
        Schema::new(Kind::Moment(MomentCodec::new(meta)))
    }

    /// A homogeneous, length-prefixed vector of `element`.
    pub fn vector(element: Schema, meta: VectorMeta) -> Schema {
        Schema::new(Kind::Vector(VectorCodec::new(element, meta)))
    }

    /// Dynamic keyed entries of `value`, keyed by short text.
    pub fn map(value: Schema, meta: MapMeta) -> Schema {
        Schema::map_keyed(Schema::text(TextKind::Char, TextMeta::default()), value, meta)
    }

    /// Dynamic keyed entries with an explicit key schema. The key schema is
    /// always required.
    pub fn map_keyed(key: Schema, value: Schema, meta: MapMeta) -> Schema {
        Schema::new(Kind::Map(MapCodec::new(key, value, meta)))
    }

    /// Fixed named fields in declaration order.
    pub fn record<I, S>(fields: I) -> Schema
    where
        I: IntoIterator<Item = (S, Schema)>,
        S: Into<String>,
    {
        Schema::record_bounded(fields, RecordMeta::default())
    }

    /// Fixed named fields with a bound on how many may decode non-null.
    pub fn record_bounded<I, S>(fields: I, meta: RecordMeta) -> Schema
    where
        I: IntoIterator<Item = (S, Schema)>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, schema)| (name.into(), schema))
            .collect();
        Schema::new(Kind::Record(RecordCodec::new(fields, meta)))
    }

    /// Makes the schema optional: an absent cell decodes to null.
    pub fn optional(mut self) -> Schema {
        self.required = false;
        self
    }

    /// Makes the schema required (the default): an absent cell decodes to
    /// `valueMissing`.
    pub fn required(mut self) -> Schema {
        self.required = true;
        self
    }

    /// Attaches a hook that runs before the leading cell is consumed.
    pub fn before_decode<F>(mut self, hook: F) -> Schema
    where
        F: Fn(&mut Row) -> Option<ErrorToken> + Send + Sync + 'static,
    {
        self.hooks.before_decode.push(Box::new(hook));
        self
    }

    /// Attaches a hook that runs on the successfully decoded value.
    pub fn after_decode<F>(mut self, hook: F) -> Schema
    where
        F: Fn(Value) -> Result<Value, ErrorToken> + Send + Sync + 'static,
    {
        self.hooks.after_decode.push(Box::new(hook));
        self
    }

    /// Attaches a hook that transforms the value before encoding.
    pub fn before_encode<F>(mut self, hook: F) -> Schema
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.hooks.before_encode.push(Box::new(hook));
        self
    }

    /// Attaches a hook that post-processes the produced row fragment.
    pub fn after_encode<F>(mut self, hook: F) -> Schema
    where
        F: Fn(&mut Row) + Send + Sync + 'static,
    {
        self.hooks.after_encode.push(Box::new(hook));
        self
    }

    /// Decodes this schema's value from the front of `row`.
    ///
    /// Consumes the cells belonging to this schema (and, for composites,
    /// its children) whether or not validation succeeds.
    pub fn decode(&self, row: &mut Row) -> Result<Value, ErrorToken> {
        if let Some(token) = self.hooks.run_before_decode(row) {
            return Err(token);
        }
        let Some(text) = row.take() else {
            return if self.required {
                Err(Flag::ValueMissing.token())
            } else {
                Ok(Value::Null)
            };
        };
        let decoded = match &self.kind {
            Kind::Choice(codec) => codec.decode(&text),
            Kind::Number(codec) => codec.decode(&text),
            Kind::Text(codec) => codec.decode(&text),
            Kind::Binary(codec) => codec.decode(&text),
            Kind::Moment(codec) => codec.decode(&text),
            Kind::Vector(codec) => codec.decode(&text, row),
            Kind::Map(codec) => codec.decode(&text, row),
            Kind::Record(codec) => codec.decode(&text, row),
        };
        match decoded {
            Ok(value) => self.hooks.run_after_decode(value),
            Err(token) => {
                tracing::trace!(error = token.as_json(), "decode failed");
                Err(token)
            }
        }
    }

    /// Encodes `value` into a row fragment.
    ///
    /// Encode is data-driven only: a null value emits an absent cell
    /// regardless of the schema's required mode, and a value that does not
    /// match the schema's kind degrades to the kind's zero rendering rather
    /// than failing.
    pub fn encode(&self, value: Value) -> Row {
        let value = self.hooks.run_before_encode(value);
        let mut row = Row::new();
        if value.is_null() {
            row.push(None);
        } else {
            let lead = match &self.kind {
                Kind::Choice(codec) => codec.encode(&value),
                Kind::Number(codec) => codec.encode(&value),
                Kind::Text(codec) => codec.encode(&value),
                Kind::Binary(codec) => codec.encode(&value),
                Kind::Moment(codec) => codec.encode(&value),
                Kind::Vector(codec) => codec.encode(&value, &mut row),
                Kind::Map(codec) => codec.encode(&value, &mut row),
                Kind::Record(codec) => codec.encode(&value, &mut row),
            };
            row.push_front(Some(lead));
        }
        self.hooks.run_after_encode(&mut row);
        row
    }
}
