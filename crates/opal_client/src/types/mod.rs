//! The server's column-type language.
//!
//! A [`Type`] is an immutable tagged tree; its `Display` form is the
//! canonical spelling the server uses, and `Type::parse` accepts anything
//! the server may emit. Round-tripping text through parse/emit is identity
//! on every supported type.

mod parser;

use std::fmt;

use crate::errors::Result;

/// Nesting bound for parsing and codec recursion.
pub(crate) const MAX_TYPE_DEPTH: usize = 32;

/// A column type as a structural tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Float32,
    Float64,
    /// Stored as UInt8 on the wire; reads surface 0/1.
    Bool,
    String,
    /// Exactly N bytes per value, zero-padded on write.
    FixedString(usize),
    Uuid,
    /// Days since 1970-01-01, unsigned 16-bit.
    Date,
    /// Seconds since epoch, unsigned 32-bit, optional server timezone.
    DateTime(Option<String>),
    /// Ticks since epoch at 10^-precision seconds, signed 64-bit.
    DateTime64(u8, Option<String>),
    /// Fixed-point: precision selects the 32/64/128-bit backing.
    Decimal(u8, u8),
    Enum8(Vec<(String, i8)>),
    Enum16(Vec<(String, i16)>),
    Array(Box<Type>),
    Nullable(Box<Type>),
    Tuple(Vec<Type>),
    Map(Box<Type>, Box<Type>),
    LowCardinality(Box<Type>),
    /// The element type of an all-null column.
    Nothing,
}

impl Type {
    /// Parse the server's textual spelling into a type tree.
    pub fn parse(text: &str) -> Result<Type> {
        parser::parse(text)
    }

    /// Bytes backing one decimal value of precision `p`.
    pub(crate) fn decimal_width(p: u8) -> usize {
        match p {
            0..=9 => 4,
            10..=18 => 8,
            _ => 16,
        }
    }

    pub(crate) fn is_nullable(&self) -> bool {
        matches!(self, Type::Nullable(_))
    }
}

/// Escape a quoted literal: backslash and single-quote.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'")?;
    for c in s.chars() {
        match c {
            '\\' => write!(f, "\\\\")?,
            '\'' => write!(f, "\\'")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "'")
}

impl fmt::Display for Type {
    /// Canonical emission: spaces appear only inside string literals and
    /// enum lists.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::UInt8 => write!(f, "UInt8"),
            Type::UInt16 => write!(f, "UInt16"),
            Type::UInt32 => write!(f, "UInt32"),
            Type::UInt64 => write!(f, "UInt64"),
            Type::UInt128 => write!(f, "UInt128"),
            Type::Int8 => write!(f, "Int8"),
            Type::Int16 => write!(f, "Int16"),
            Type::Int32 => write!(f, "Int32"),
            Type::Int64 => write!(f, "Int64"),
            Type::Int128 => write!(f, "Int128"),
            Type::Float32 => write!(f, "Float32"),
            Type::Float64 => write!(f, "Float64"),
            Type::Bool => write!(f, "Bool"),
            Type::String => write!(f, "String"),
            Type::FixedString(n) => write!(f, "FixedString({n})"),
            Type::Uuid => write!(f, "UUID"),
            Type::Date => write!(f, "Date"),
            Type::DateTime(None) => write!(f, "DateTime"),
            Type::DateTime(Some(tz)) => {
                write!(f, "DateTime(")?;
                write_quoted(f, tz)?;
                write!(f, ")")
            }
            Type::DateTime64(p, None) => write!(f, "DateTime64({p})"),
            Type::DateTime64(p, Some(tz)) => {
                write!(f, "DateTime64({p},")?;
                write_quoted(f, tz)?;
                write!(f, ")")
            }
            Type::Decimal(p, s) => write!(f, "Decimal({p},{s})"),
            Type::Enum8(entries) => {
                write!(f, "Enum8(")?;
                for (i, (label, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_quoted(f, label)?;
                    write!(f, " = {value}")?;
                }
                write!(f, ")")
            }
            Type::Enum16(entries) => {
                write!(f, "Enum16(")?;
                for (i, (label, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_quoted(f, label)?;
                    write!(f, " = {value}")?;
                }
                write!(f, ")")
            }
            Type::Array(inner) => write!(f, "Array({inner})"),
            Type::Nullable(inner) => write!(f, "Nullable({inner})"),
            Type::Tuple(items) => {
                write!(f, "Tuple(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Type::Map(k, v) => write!(f, "Map({k},{v})"),
            Type::LowCardinality(inner) => write!(f, "LowCardinality({inner})"),
            Type::Nothing => write!(f, "Nothing"),
        }
    }
}
