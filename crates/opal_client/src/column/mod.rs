//! Typed columnar storage and the per-cell accessor/builder surface.
//!
//! Each leaf kind keeps a contiguous `Vec`; composites keep masks, offsets,
//! or element columns. `LowCardinality` stores materialized inner values —
//! the dictionary only exists on the wire, built fresh by the writer and
//! resolved away by the reader.

mod read;
mod write;

pub(crate) use read::read_column;
pub(crate) use write::write_column;

use uuid::Uuid;

use crate::convert::{decimal_limit, rescale_decimal};
use crate::errors::{Result, ValidationError};
use crate::types::Type;
use crate::value::Value;

/// Column body storage for one type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    UInt128(Vec<u128>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int128(Vec<i128>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    /// String and FixedString; fixed values are stored already padded.
    String(Vec<Vec<u8>>),
    Uuid(Vec<Uuid>),
    Date(Vec<u16>),
    DateTime(Vec<u32>),
    DateTime64(Vec<i64>),
    /// Mantissas; the wire width is derived from the type's precision.
    Decimal(Vec<i128>),
    Enum8(Vec<i8>),
    Enum16(Vec<i16>),
    /// One placeholder row exists in `values` for every null position.
    Nullable { mask: Vec<u8>, values: Box<ColumnData> },
    /// Cumulative end offsets into the flat `values` column.
    Array { offsets: Vec<u64>, values: Box<ColumnData> },
    Tuple(Vec<ColumnData>),
    Map { offsets: Vec<u64>, keys: Box<ColumnData>, values: Box<ColumnData> },
    /// Materialized inner column (Nullable-shaped when the inner type is).
    LowCardinality(Box<ColumnData>),
    /// All-null unit column; only the row count is stored.
    Nothing(usize),
}

impl ColumnData {
    /// Empty storage shaped for `ty`.
    pub(crate) fn new_for(ty: &Type) -> ColumnData {
        match ty {
            Type::UInt8 | Type::Bool => ColumnData::UInt8(Vec::new()),
            Type::UInt16 => ColumnData::UInt16(Vec::new()),
            Type::UInt32 => ColumnData::UInt32(Vec::new()),
            Type::UInt64 => ColumnData::UInt64(Vec::new()),
            Type::UInt128 => ColumnData::UInt128(Vec::new()),
            Type::Int8 => ColumnData::Int8(Vec::new()),
            Type::Int16 => ColumnData::Int16(Vec::new()),
            Type::Int32 => ColumnData::Int32(Vec::new()),
            Type::Int64 => ColumnData::Int64(Vec::new()),
            Type::Int128 => ColumnData::Int128(Vec::new()),
            Type::Float32 => ColumnData::Float32(Vec::new()),
            Type::Float64 => ColumnData::Float64(Vec::new()),
            Type::String | Type::FixedString(_) => ColumnData::String(Vec::new()),
            Type::Uuid => ColumnData::Uuid(Vec::new()),
            Type::Date => ColumnData::Date(Vec::new()),
            Type::DateTime(_) => ColumnData::DateTime(Vec::new()),
            Type::DateTime64(_, _) => ColumnData::DateTime64(Vec::new()),
            Type::Decimal(_, _) => ColumnData::Decimal(Vec::new()),
            Type::Enum8(_) => ColumnData::Enum8(Vec::new()),
            Type::Enum16(_) => ColumnData::Enum16(Vec::new()),
            Type::Nullable(inner) => ColumnData::Nullable {
                mask: Vec::new(),
                values: Box::new(ColumnData::new_for(inner)),
            },
            Type::Array(inner) => ColumnData::Array {
                offsets: Vec::new(),
                values: Box::new(ColumnData::new_for(inner)),
            },
            Type::Tuple(items) => {
                ColumnData::Tuple(items.iter().map(ColumnData::new_for).collect())
            }
            Type::Map(k, v) => ColumnData::Map {
                offsets: Vec::new(),
                keys: Box::new(ColumnData::new_for(k)),
                values: Box::new(ColumnData::new_for(v)),
            },
            Type::LowCardinality(inner) => {
                ColumnData::LowCardinality(Box::new(ColumnData::new_for(inner)))
            }
            Type::Nothing => ColumnData::Nothing(0),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::UInt8(v) => v.len(),
            ColumnData::UInt16(v) => v.len(),
            ColumnData::UInt32(v) => v.len(),
            ColumnData::UInt64(v) => v.len(),
            ColumnData::UInt128(v) => v.len(),
            ColumnData::Int8(v) => v.len(),
            ColumnData::Int16(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Int128(v) => v.len(),
            ColumnData::Float32(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::String(v) => v.len(),
            ColumnData::Uuid(v) => v.len(),
            ColumnData::Date(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
            ColumnData::DateTime64(v) => v.len(),
            ColumnData::Decimal(v) => v.len(),
            ColumnData::Enum8(v) => v.len(),
            ColumnData::Enum16(v) => v.len(),
            ColumnData::Nullable { mask, .. } => mask.len(),
            ColumnData::Array { offsets, .. } => offsets.len(),
            ColumnData::Tuple(items) => items.first().map_or(0, ColumnData::len),
            ColumnData::Map { offsets, .. } => offsets.len(),
            ColumnData::LowCardinality(values) => values.len(),
            ColumnData::Nothing(rows) => *rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical value at `row`, or `None` when out of bounds.
    ///
    /// The type supplies what storage does not carry: enum dictionaries and
    /// decimal scales. Bool columns surface as 0/1.
    pub fn value_at(&self, ty: &Type, row: usize) -> Option<Value> {
        if row >= self.len() {
            return None;
        }
        let value = match (self, ty) {
            (ColumnData::UInt8(v), _) => Value::UInt8(v[row]),
            (ColumnData::UInt16(v), _) => Value::UInt16(v[row]),
            (ColumnData::UInt32(v), _) => Value::UInt32(v[row]),
            (ColumnData::UInt64(v), _) => Value::UInt64(v[row]),
            (ColumnData::UInt128(v), _) => Value::UInt128(v[row]),
            (ColumnData::Int8(v), _) => Value::Int8(v[row]),
            (ColumnData::Int16(v), _) => Value::Int16(v[row]),
            (ColumnData::Int32(v), _) => Value::Int32(v[row]),
            (ColumnData::Int64(v), _) => Value::Int64(v[row]),
            (ColumnData::Int128(v), _) => Value::Int128(v[row]),
            (ColumnData::Float32(v), _) => Value::Float32(v[row]),
            (ColumnData::Float64(v), _) => Value::Float64(v[row]),
            (ColumnData::String(v), _) => Value::String(v[row].clone()),
            (ColumnData::Uuid(v), _) => Value::Uuid(v[row]),
            (ColumnData::Date(v), _) => Value::Date(v[row]),
            (ColumnData::DateTime(v), _) => Value::DateTime(v[row]),
            (ColumnData::DateTime64(v), _) => Value::DateTime64(v[row]),
            (ColumnData::Decimal(v), Type::Decimal(_, scale)) => {
                Value::Decimal { mantissa: v[row], scale: *scale }
            }
            (ColumnData::Decimal(v), _) => Value::Decimal { mantissa: v[row], scale: 0 },
            (ColumnData::Enum8(v), Type::Enum8(entries)) => entries
                .iter()
                .find(|(_, ev)| *ev == v[row])
                .map(|(label, _)| Value::Enum(label.clone()))
                .unwrap_or(Value::Int8(v[row])),
            (ColumnData::Enum8(v), _) => Value::Int8(v[row]),
            (ColumnData::Enum16(v), Type::Enum16(entries)) => entries
                .iter()
                .find(|(_, ev)| *ev == v[row])
                .map(|(label, _)| Value::Enum(label.clone()))
                .unwrap_or(Value::Int16(v[row])),
            (ColumnData::Enum16(v), _) => Value::Int16(v[row]),
            (ColumnData::Nullable { mask, values }, _) => {
                let inner_ty = match ty {
                    Type::Nullable(inner) => inner.as_ref(),
                    _ => ty,
                };
                if mask[row] != 0 {
                    Value::Null
                } else {
                    values.value_at(inner_ty, row)?
                }
            }
            (ColumnData::Array { offsets, values }, _) => {
                let inner_ty = match ty {
                    Type::Array(inner) => inner.as_ref(),
                    _ => ty,
                };
                let start = if row == 0 { 0 } else { offsets[row - 1] as usize };
                let end = offsets[row] as usize;
                let mut items = Vec::with_capacity(end - start);
                for i in start..end {
                    items.push(values.value_at(inner_ty, i)?);
                }
                Value::Array(items)
            }
            (ColumnData::Tuple(cols), Type::Tuple(item_types)) => {
                let mut items = Vec::with_capacity(cols.len());
                for (col, item_ty) in cols.iter().zip(item_types) {
                    items.push(col.value_at(item_ty, row)?);
                }
                Value::Tuple(items)
            }
            (ColumnData::Map { offsets, keys, values }, Type::Map(key_ty, value_ty)) => {
                let start = if row == 0 { 0 } else { offsets[row - 1] as usize };
                let end = offsets[row] as usize;
                let mut pairs = Vec::with_capacity(end - start);
                for i in start..end {
                    pairs.push((keys.value_at(key_ty, i)?, values.value_at(value_ty, i)?));
                }
                Value::Map(pairs)
            }
            (ColumnData::LowCardinality(values), Type::LowCardinality(inner)) => {
                return values.value_at(inner, row)
            }
            (ColumnData::LowCardinality(values), _) => return values.value_at(ty, row),
            (ColumnData::Nothing(_), _) => Value::Null,
            _ => return None,
        };
        Some(value)
    }

    /// Append one logical value, validating it against `ty`.
    pub fn push(&mut self, ty: &Type, value: Value) -> Result<()> {
        match (self, ty) {
            (ColumnData::UInt8(v), Type::Bool) => match value {
                Value::Bool(b) => v.push(b as u8),
                Value::UInt8(b @ (0 | 1)) => v.push(b),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::UInt8(v), _) => match value {
                Value::UInt8(x) => v.push(x),
                Value::Bool(b) => v.push(b as u8),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::UInt16(v), _) => match value {
                Value::UInt16(x) => v.push(x),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::UInt32(v), _) => match value {
                Value::UInt32(x) => v.push(x),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::UInt64(v), _) => match value {
                Value::UInt64(x) => v.push(x),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::UInt128(v), _) => match value {
                Value::UInt128(x) => v.push(x),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Int8(v), _) => match value {
                Value::Int8(x) => v.push(x),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Int16(v), _) => match value {
                Value::Int16(x) => v.push(x),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Int32(v), _) => match value {
                Value::Int32(x) => v.push(x),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Int64(v), _) => match value {
                Value::Int64(x) => v.push(x),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Int128(v), _) => match value {
                Value::Int128(x) => v.push(x),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Float32(v), _) => match value {
                Value::Float32(x) => v.push(x),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Float64(v), _) => match value {
                Value::Float64(x) => v.push(x),
                Value::Float32(x) => v.push(x.into()),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::String(v), Type::FixedString(n)) => match value {
                Value::String(mut bytes) => {
                    if bytes.len() > *n {
                        return Err(ValidationError::ValueOutOfRange {
                            type_name: ty.to_string(),
                            value: format!("{} bytes", bytes.len()),
                        }
                        .into());
                    }
                    bytes.resize(*n, 0);
                    v.push(bytes);
                }
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::String(v), _) => match value {
                Value::String(bytes) => v.push(bytes),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Uuid(v), _) => match value {
                Value::Uuid(u) => v.push(u),
                // Canonical dashed text is accepted on write.
                Value::String(bytes) => {
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|_| type_mismatch(ty, &Value::String(bytes.clone())))?;
                    let u = Uuid::parse_str(text).map_err(|_| {
                        ValidationError::ValueOutOfRange {
                            type_name: ty.to_string(),
                            value: text.to_string(),
                        }
                    })?;
                    v.push(u);
                }
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Date(v), _) => match value {
                Value::Date(d) => v.push(d),
                Value::UInt16(d) => v.push(d),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::DateTime(v), _) => match value {
                Value::DateTime(t) => v.push(t),
                Value::UInt32(t) => v.push(t),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::DateTime64(v), _) => match value {
                Value::DateTime64(t) => v.push(t),
                Value::Int64(t) => v.push(t),
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Decimal(v), Type::Decimal(precision, scale)) => match value {
                Value::Decimal { mantissa, scale: got } => {
                    let mantissa = rescale_decimal(mantissa, got, *scale)?;
                    if mantissa.unsigned_abs() >= decimal_limit(*precision) as u128 {
                        return Err(ValidationError::ValueOutOfRange {
                            type_name: ty.to_string(),
                            value: mantissa.to_string(),
                        }
                        .into());
                    }
                    v.push(mantissa);
                }
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Enum8(v), Type::Enum8(entries)) => {
                v.push(enum_value(entries, value)?)
            }
            (ColumnData::Enum16(v), Type::Enum16(entries)) => {
                v.push(enum_value(entries, value)?)
            }
            (ColumnData::Nullable { mask, values }, Type::Nullable(inner)) => match value {
                Value::Null => {
                    mask.push(1);
                    values.push(inner, default_value(inner))?;
                }
                other => {
                    values.push(inner, other)?;
                    mask.push(0);
                }
            },
            (ColumnData::Array { offsets, values }, Type::Array(inner)) => match value {
                Value::Array(items) => {
                    for item in items {
                        values.push(inner, item)?;
                    }
                    offsets.push(values.len() as u64);
                }
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Tuple(cols), Type::Tuple(item_types)) => match value {
                Value::Tuple(items) if items.len() == cols.len() => {
                    for ((col, item_ty), item) in cols.iter_mut().zip(item_types).zip(items) {
                        col.push(item_ty, item)?;
                    }
                }
                other => return Err(type_mismatch(ty, &other)),
            },
            (ColumnData::Map { offsets, keys, values }, Type::Map(key_ty, value_ty)) => {
                match value {
                    Value::Map(pairs) => {
                        for (k, v) in pairs {
                            keys.push(key_ty, k)?;
                            values.push(value_ty, v)?;
                        }
                        offsets.push(keys.len() as u64);
                    }
                    other => return Err(type_mismatch(ty, &other)),
                }
            }
            (ColumnData::LowCardinality(values), Type::LowCardinality(inner)) => {
                values.push(inner, value)?;
            }
            (ColumnData::Nothing(rows), _) => match value {
                Value::Null => *rows += 1,
                other => return Err(type_mismatch(ty, &other)),
            },
            (_, _) => return Err(type_mismatch(ty, &value)),
        }
        Ok(())
    }
}

fn type_mismatch(ty: &Type, value: &Value) -> crate::errors::Error {
    ValidationError::ValueTypeMismatch {
        type_name: ty.to_string(),
        value: value.to_string(),
    }
    .into()
}

/// Resolve a label or raw integer against the declared enum entries.
fn enum_value<T: Copy + Into<i64>>(entries: &[(String, T)], value: Value) -> Result<T> {
    match value {
        Value::Enum(label) => entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| *v)
            .ok_or_else(|| ValidationError::UnknownEnumLabel { label }.into()),
        Value::String(bytes) => {
            let label = String::from_utf8_lossy(&bytes).into_owned();
            entries
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, v)| *v)
                .ok_or_else(|| ValidationError::UnknownEnumLabel { label }.into())
        }
        Value::Int8(raw) => entries
            .iter()
            .find(|(_, v)| (*v).into() == i64::from(raw))
            .map(|(_, v)| *v)
            .ok_or_else(|| ValidationError::UnknownEnumValue(raw.into()).into()),
        Value::Int16(raw) => entries
            .iter()
            .find(|(_, v)| (*v).into() == i64::from(raw))
            .map(|(_, v)| *v)
            .ok_or_else(|| ValidationError::UnknownEnumValue(raw.into()).into()),
        other => Err(ValidationError::UnknownEnumLabel { label: other.to_string() }.into()),
    }
}

/// Placeholder written at null positions and dictionary slot zero.
pub(crate) fn default_value(ty: &Type) -> Value {
    match ty {
        Type::UInt8 => Value::UInt8(0),
        Type::UInt16 => Value::UInt16(0),
        Type::UInt32 => Value::UInt32(0),
        Type::UInt64 => Value::UInt64(0),
        Type::UInt128 => Value::UInt128(0),
        Type::Int8 => Value::Int8(0),
        Type::Int16 => Value::Int16(0),
        Type::Int32 => Value::Int32(0),
        Type::Int64 => Value::Int64(0),
        Type::Int128 => Value::Int128(0),
        Type::Float32 => Value::Float32(0.0),
        Type::Float64 => Value::Float64(0.0),
        Type::Bool => Value::Bool(false),
        Type::String | Type::FixedString(_) => Value::String(Vec::new()),
        Type::Uuid => Value::Uuid(Uuid::nil()),
        Type::Date => Value::Date(0),
        Type::DateTime(_) => Value::DateTime(0),
        Type::DateTime64(_, _) => Value::DateTime64(0),
        Type::Decimal(_, scale) => Value::Decimal { mantissa: 0, scale: *scale },
        Type::Enum8(entries) => entries
            .first()
            .map(|(label, _)| Value::Enum(label.clone()))
            .unwrap_or(Value::Null),
        Type::Enum16(entries) => entries
            .first()
            .map(|(label, _)| Value::Enum(label.clone()))
            .unwrap_or(Value::Null),
        Type::Nullable(_) | Type::Nothing => Value::Null,
        Type::Array(_) => Value::Array(Vec::new()),
        Type::Tuple(items) => Value::Tuple(items.iter().map(default_value).collect()),
        Type::Map(_, _) => Value::Map(Vec::new()),
        Type::LowCardinality(inner) => default_value(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(ty: &str, values: Vec<Value>) -> (Type, ColumnData) {
        let ty = Type::parse(ty).unwrap();
        let mut data = ColumnData::new_for(&ty);
        for value in values {
            data.push(&ty, value).unwrap();
        }
        (ty, data)
    }

    #[test]
    fn push_then_read_back() {
        let (ty, data) = build(
            "Array(Nullable(String))",
            vec![
                Value::Array(vec![Value::from("a"), Value::Null]),
                Value::Array(vec![]),
                Value::Array(vec![Value::from("b")]),
            ],
        );
        assert_eq!(data.len(), 3);
        assert_eq!(
            data.value_at(&ty, 0).unwrap(),
            Value::Array(vec![Value::from("a"), Value::Null])
        );
        assert_eq!(data.value_at(&ty, 1).unwrap(), Value::Array(vec![]));
        assert_eq!(data.value_at(&ty, 2).unwrap(), Value::Array(vec![Value::from("b")]));
        assert!(data.value_at(&ty, 3).is_none());
    }

    #[test]
    fn fixed_string_pads_and_bounds() {
        let (ty, data) = build("FixedString(4)", vec![Value::from("ab")]);
        assert_eq!(data.value_at(&ty, 0).unwrap(), Value::String(b"ab\0\0".to_vec()));
        let ty = Type::parse("FixedString(2)").unwrap();
        let mut col = ColumnData::new_for(&ty);
        assert!(col.push(&ty, Value::from("toolong")).is_err());
    }

    #[test]
    fn enum_rejects_undeclared_labels() {
        let ty = Type::parse("Enum8('on' = 1, 'off' = 0)").unwrap();
        let mut col = ColumnData::new_for(&ty);
        col.push(&ty, Value::Enum("on".into())).unwrap();
        col.push(&ty, Value::Int8(0)).unwrap();
        assert!(col.push(&ty, Value::Enum("paused".into())).is_err());
        assert!(col.push(&ty, Value::Int8(3)).is_err());
        assert_eq!(col.value_at(&ty, 0).unwrap(), Value::Enum("on".into()));
        assert_eq!(col.value_at(&ty, 1).unwrap(), Value::Enum("off".into()));
    }

    #[test]
    fn decimal_rescales_on_push() {
        let ty = Type::parse("Decimal(9,3)").unwrap();
        let mut col = ColumnData::new_for(&ty);
        col.push(&ty, Value::Decimal { mantissa: 15, scale: 1 }).unwrap();
        assert_eq!(
            col.value_at(&ty, 0).unwrap(),
            Value::Decimal { mantissa: 1_500, scale: 3 }
        );
        // Overflowing the declared precision is rejected.
        assert!(col.push(&ty, Value::Decimal { mantissa: 1_000_000_000, scale: 3 }).is_err());
    }

    #[test]
    fn bool_column_surfaces_as_u8() {
        let (ty, data) = build("Bool", vec![Value::Bool(true), Value::UInt8(0)]);
        assert_eq!(data.value_at(&ty, 0).unwrap(), Value::UInt8(1));
        assert_eq!(data.value_at(&ty, 1).unwrap(), Value::UInt8(0));
        let mut col = ColumnData::new_for(&ty);
        assert!(col.push(&ty, Value::UInt8(2)).is_err());
    }

    #[test]
    fn uuid_accepts_canonical_text() {
        let (ty, data) = build(
            "UUID",
            vec![Value::from("8f9d2b4e-7a31-4c88-b0d5-1e2f3a4b5c6d")],
        );
        let Value::Uuid(u) = data.value_at(&ty, 0).unwrap() else {
            panic!("expected uuid value");
        };
        assert_eq!(u.to_string(), "8f9d2b4e-7a31-4c88-b0d5-1e2f3a4b5c6d");
    }

    #[test]
    fn map_keeps_duplicate_keys() {
        let (ty, data) = build(
            "Map(String,UInt8)",
            vec![Value::Map(vec![
                (Value::from("k"), Value::UInt8(1)),
                (Value::from("k"), Value::UInt8(2)),
            ])],
        );
        let Value::Map(pairs) = data.value_at(&ty, 0).unwrap() else {
            panic!("expected map value");
        };
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn mismatched_kind_is_rejected() {
        let ty = Type::parse("UInt64").unwrap();
        let mut col = ColumnData::new_for(&ty);
        let err = col.push(&ty, Value::from("text")).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::Error::Validation(ValidationError::ValueTypeMismatch { .. })
        ));
    }
}
