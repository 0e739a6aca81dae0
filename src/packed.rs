//! Fixed-width, bit-packed binary record codec
//!
//! Architecturally independent of the schema engine: a [`Layout`] maps an
//! ordered list of field widths onto a constant-width byte buffer, so every
//! record encoded through one layout has the same length. Variable-content
//! fields (text, key arrays, number arrays) reserve their full capacity and
//! carry a one-byte length prefix. Multi-byte scalars are big-endian.
//!
//! Unlike the schema engine, this codec is a fallible programming interface:
//! misuse (wrong arity, wrong field type, overlong content) is an error,
//! not a validation flag.

use thiserror::Error;

/// Result type for packed operations
pub type PackResult<T> = Result<T, PackError>;

/// Errors raised while packing or unpacking a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackError {
    /// The value list does not match the layout's field list
    #[error("expected {expected} fields, got {actual}")]
    WrongArity { expected: usize, actual: usize },

    /// A value's variant does not match its field's width
    #[error("field {index}: expected a {expected} value")]
    WrongType { index: usize, expected: &'static str },

    /// Variable content exceeds the field's reserved capacity
    #[error("field {index}: length {len} exceeds capacity {capacity}")]
    Oversize {
        index: usize,
        len: usize,
        capacity: usize,
    },

    /// A scalar is outside its field's representable range
    #[error("field {index}: value {value} out of range")]
    OutOfRange { index: usize, value: u64 },

    /// The buffer is not exactly the layout's total width
    #[error("encoded record must be {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    /// A byte holds a value the field cannot represent
    #[error("field {index}: invalid byte {byte:#04x}")]
    InvalidByte { index: usize, byte: u8 },

    /// A text field holds bytes that are not UTF-8
    #[error("field {index}: invalid UTF-8")]
    InvalidUtf8 { index: usize },
}

/// Largest representable 7-byte timestamp, in milliseconds.
const TIME_MAX_MS: u64 = 8_640_000_000_000_000;

/// Field widths a layout is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// 32-byte key
    Pkey,
    /// One-byte boolean
    Bool,
    /// 32-bit unsigned integer
    Uint,
    /// Millisecond timestamp in 7 bytes
    Time,
    /// 64-bit float
    Real,
    /// Enum ordinal below 32, one byte
    Enum,
    /// Set of bit indices below 32, four bytes
    Bits,
    /// Up to `capacity` 32-byte keys behind a length byte
    Keys { capacity: u8 },
    /// Up to `capacity` 64-bit floats behind a length byte
    Nums { capacity: u8 },
    /// Up to `capacity` UTF-8 bytes behind a length byte
    Text { capacity: u8 },
}

impl Width {
    /// Normalizes a misconfigured capacity instead of rejecting it.
    fn normalized(self) -> Width {
        match self {
            Width::Keys { capacity } => Width::Keys {
                capacity: capacity.clamp(1, 32),
            },
            Width::Nums { capacity } => Width::Nums {
                capacity: capacity.clamp(1, 32),
            },
            Width::Text { capacity } => Width::Text {
                capacity: capacity.clamp(1, 128),
            },
            fixed => fixed,
        }
    }

    /// Encoded byte size of this field.
    fn size(&self) -> usize {
        match self {
            Width::Pkey => 32,
            Width::Bool => 1,
            Width::Uint => 4,
            Width::Time => 7,
            Width::Real => 8,
            Width::Enum => 1,
            Width::Bits => 4,
            Width::Keys { capacity } => *capacity as usize * 32 + 1,
            Width::Nums { capacity } => *capacity as usize * 8 + 1,
            Width::Text { capacity } => *capacity as usize + 1,
        }
    }

    fn expects(&self) -> &'static str {
        match self {
            Width::Pkey => "pkey",
            Width::Bool => "bool",
            Width::Uint => "uint",
            Width::Time => "time",
            Width::Real => "real",
            Width::Enum => "enum",
            Width::Bits => "bits",
            Width::Keys { .. } => "keys",
            Width::Nums { .. } => "nums",
            Width::Text { .. } => "text",
        }
    }
}

/// One field of a packed record.
#[derive(Debug, Clone, PartialEq)]
pub enum Packed {
    Pkey([u8; 32]),
    Bool(bool),
    Uint(u32),
    /// Milliseconds, at most [`TIME_MAX_MS`]
    Time(u64),
    Real(f64),
    /// Ordinal below 32
    Enum(u8),
    /// Bit mask over indices 0..32
    Bits(u32),
    Keys(Vec<[u8; 32]>),
    Nums(Vec<f64>),
    Text(String),
}

/// A constant-width field layout.
pub struct Layout {
    fields: Vec<Width>,
    offsets: Vec<usize>,
    total: usize,
}

impl Layout {
    /// Builds a layout from ordered field widths. Capacities are clamped
    /// into their representable ranges; construction never fails.
    pub fn new<I: IntoIterator<Item = Width>>(fields: I) -> Layout {
        let fields: Vec<Width> = fields.into_iter().map(Width::normalized).collect();
        let mut offsets = Vec::with_capacity(fields.len());
        let mut total = 0;
        for field in &fields {
            offsets.push(total);
            total += field.size();
        }
        Layout {
            fields,
            offsets,
            total,
        }
    }

    /// Total encoded width in bytes. Constant per layout.
    pub fn total(&self) -> usize {
        self.total
    }

    /// The normalized field widths.
    pub fn fields(&self) -> &[Width] {
        &self.fields
    }

    /// Packs `values` into a buffer of exactly [`Layout::total`] bytes.
    pub fn encode(&self, values: &[Packed]) -> PackResult<Vec<u8>> {
        if values.len() != self.fields.len() {
            return Err(PackError::WrongArity {
                expected: self.fields.len(),
                actual: values.len(),
            });
        }
        let mut buf = vec![0u8; self.total];
        for (index, (field, value)) in self.fields.iter().zip(values).enumerate() {
            let at = self.offsets[index];
            let wrong_type = || PackError::WrongType {
                index,
                expected: field.expects(),
            };
            match (field, value) {
                (Width::Pkey, Packed::Pkey(key)) => buf[at..at + 32].copy_from_slice(key),
                (Width::Bool, Packed::Bool(flag)) => buf[at] = *flag as u8,
                (Width::Uint, Packed::Uint(value)) => {
                    buf[at..at + 4].copy_from_slice(&value.to_be_bytes());
                }
                (Width::Time, Packed::Time(millis)) => {
                    if *millis > TIME_MAX_MS {
                        return Err(PackError::OutOfRange {
                            index,
                            value: *millis,
                        });
                    }
                    buf[at..at + 7].copy_from_slice(&millis.to_be_bytes()[1..]);
                }
                (Width::Real, Packed::Real(value)) => {
                    buf[at..at + 8].copy_from_slice(&value.to_be_bytes());
                }
                (Width::Enum, Packed::Enum(ordinal)) => {
                    if *ordinal >= 32 {
                        return Err(PackError::OutOfRange {
                            index,
                            value: *ordinal as u64,
                        });
                    }
                    buf[at] = *ordinal;
                }
                (Width::Bits, Packed::Bits(mask)) => {
                    buf[at..at + 4].copy_from_slice(&mask.to_be_bytes());
                }
                (Width::Keys { capacity }, Packed::Keys(keys)) => {
                    if keys.len() > *capacity as usize {
                        return Err(PackError::Oversize {
                            index,
                            len: keys.len(),
                            capacity: *capacity as usize,
                        });
                    }
                    buf[at] = keys.len() as u8;
                    for (slot, key) in keys.iter().enumerate() {
                        let start = at + 1 + slot * 32;
                        buf[start..start + 32].copy_from_slice(key);
                    }
                }
                (Width::Nums { capacity }, Packed::Nums(nums)) => {
                    if nums.len() > *capacity as usize {
                        return Err(PackError::Oversize {
                            index,
                            len: nums.len(),
                            capacity: *capacity as usize,
                        });
                    }
                    buf[at] = nums.len() as u8;
                    for (slot, num) in nums.iter().enumerate() {
                        let start = at + 1 + slot * 8;
                        buf[start..start + 8].copy_from_slice(&num.to_be_bytes());
                    }
                }
                (Width::Text { capacity }, Packed::Text(text)) => {
                    if text.len() > *capacity as usize {
                        return Err(PackError::Oversize {
                            index,
                            len: text.len(),
                            capacity: *capacity as usize,
                        });
                    }
                    buf[at] = text.len() as u8;
                    buf[at + 1..at + 1 + text.len()].copy_from_slice(text.as_bytes());
                }
                _ => return Err(wrong_type()),
            }
        }
        Ok(buf)
    }

    /// Unpacks a buffer of exactly [`Layout::total`] bytes.
    pub fn decode(&self, bytes: &[u8]) -> PackResult<Vec<Packed>> {
        if bytes.len() != self.total {
            return Err(PackError::WrongLength {
                expected: self.total,
                actual: bytes.len(),
            });
        }
        let mut values = Vec::with_capacity(self.fields.len());
        for (index, field) in self.fields.iter().enumerate() {
            let at = self.offsets[index];
            let value = match field {
                Width::Pkey => {
                    let mut key = [0u8; 32];
                    key.copy_from_slice(&bytes[at..at + 32]);
                    Packed::Pkey(key)
                }
                Width::Bool => match bytes[at] {
                    0 => Packed::Bool(false),
                    1 => Packed::Bool(true),
                    byte => return Err(PackError::InvalidByte { index, byte }),
                },
                Width::Uint => {
                    let mut raw = [0u8; 4];
                    raw.copy_from_slice(&bytes[at..at + 4]);
                    Packed::Uint(u32::from_be_bytes(raw))
                }
                Width::Time => {
                    let mut raw = [0u8; 8];
                    raw[1..].copy_from_slice(&bytes[at..at + 7]);
                    let millis = u64::from_be_bytes(raw);
                    if millis > TIME_MAX_MS {
                        return Err(PackError::OutOfRange {
                            index,
                            value: millis,
                        });
                    }
                    Packed::Time(millis)
                }
                Width::Real => {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(&bytes[at..at + 8]);
                    Packed::Real(f64::from_be_bytes(raw))
                }
                Width::Enum => match bytes[at] {
                    ordinal if ordinal < 32 => Packed::Enum(ordinal),
                    byte => return Err(PackError::InvalidByte { index, byte }),
                },
                Width::Bits => {
                    let mut raw = [0u8; 4];
                    raw.copy_from_slice(&bytes[at..at + 4]);
                    Packed::Bits(u32::from_be_bytes(raw))
                }
                Width::Keys { capacity } => {
                    let count = bytes[at] as usize;
                    if count > *capacity as usize {
                        return Err(PackError::Oversize {
                            index,
                            len: count,
                            capacity: *capacity as usize,
                        });
                    }
                    let mut keys = Vec::with_capacity(count);
                    for slot in 0..count {
                        let start = at + 1 + slot * 32;
                        let mut key = [0u8; 32];
                        key.copy_from_slice(&bytes[start..start + 32]);
                        keys.push(key);
                    }
                    Packed::Keys(keys)
                }
                Width::Nums { capacity } => {
                    let count = bytes[at] as usize;
                    if count > *capacity as usize {
                        return Err(PackError::Oversize {
                            index,
                            len: count,
                            capacity: *capacity as usize,
                        });
                    }
                    let mut nums = Vec::with_capacity(count);
                    for slot in 0..count {
                        let start = at + 1 + slot * 8;
                        let mut raw = [0u8; 8];
                        raw.copy_from_slice(&bytes[start..start + 8]);
                        nums.push(f64::from_be_bytes(raw));
                    }
                    Packed::Nums(nums)
                }
                Width::Text { capacity } => {
                    let len = bytes[at] as usize;
                    if len > *capacity as usize {
                        return Err(PackError::Oversize {
                            index,
                            len,
                            capacity: *capacity as usize,
                        });
                    }
                    let text = std::str::from_utf8(&bytes[at + 1..at + 1 + len])
                        .map_err(|_| PackError::InvalidUtf8 { index })?;
                    Packed::Text(text.to_string())
                }
            };
            values.push(value);
        }
        Ok(values)
    }
}
