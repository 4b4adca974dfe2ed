//! Logical values: the per-cell boundary between host code and columns.
//!
//! Columns store data in typed vectors; a [`Value`] is only materialized at
//! the accessor/builder surface. Strings are arbitrary byte sequences.

use uuid::Uuid;

/// One logical cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    String(Vec<u8>),
    Uuid(Uuid),
    /// Days since 1970-01-01.
    Date(u16),
    /// Seconds since epoch.
    DateTime(u32),
    /// Ticks since epoch; the scale lives in the column type.
    DateTime64(i64),
    /// Fixed-point mantissa; precision lives in the column type.
    Decimal { mantissa: i128, scale: u8 },
    /// Enum label; validated against the column's dictionary on write.
    Enum(String),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Null,
}

impl Value {
    /// Short kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::UInt8(_) => "UInt8",
            Value::UInt16(_) => "UInt16",
            Value::UInt32(_) => "UInt32",
            Value::UInt64(_) => "UInt64",
            Value::UInt128(_) => "UInt128",
            Value::Int8(_) => "Int8",
            Value::Int16(_) => "Int16",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::Int128(_) => "Int128",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::Bool(_) => "Bool",
            Value::String(_) => "String",
            Value::Uuid(_) => "UUID",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "DateTime",
            Value::DateTime64(_) => "DateTime64",
            Value::Decimal { .. } => "Decimal",
            Value::Enum(_) => "Enum",
            Value::Array(_) => "Array",
            Value::Tuple(_) => "Tuple",
            Value::Map(_) => "Map",
            Value::Null => "Null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::UInt8(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::UInt128(v) => write!(f, "{v}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Int128(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => write!(f, "'{text}'"),
                Err(_) => write!(f, "<{} bytes>", bytes.len()),
            },
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "Date({v})"),
            Value::DateTime(v) => write!(f, "DateTime({v})"),
            Value::DateTime64(v) => write!(f, "DateTime64({v})"),
            Value::Decimal { mantissa, scale } => write!(f, "Decimal({mantissa}e-{scale})"),
            Value::Enum(label) => write!(f, "'{label}'"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                write!(f, "}}")
            }
            Value::Null => write!(f, "NULL"),
        }
    }
}
