//! Storage-to-wire column encoding. Purely in-memory; the connection layer
//! decides whether the resulting bytes travel raw or inside envelopes.

use std::collections::HashMap;

use super::{default_value, ColumnData};
use crate::binary::Encoder;
use crate::errors::{Result, ValidationError};
use crate::types::Type;
use crate::value::Value;

const LC_HAS_ADDITIONAL_KEYS: u64 = 1 << 9;
const LC_SERIALIZATION_VERSION: u64 = 1;

/// Encode a column body; symmetric with `read_column` on logical values.
pub(crate) fn write_column(enc: &mut Encoder, ty: &Type, data: &ColumnData) -> Result<()> {
    match (ty, data) {
        (Type::UInt8 | Type::Bool, ColumnData::UInt8(v)) => enc.raw(v),
        (Type::UInt16, ColumnData::UInt16(v)) => v.iter().for_each(|x| enc.u16(*x)),
        (Type::UInt32, ColumnData::UInt32(v)) => v.iter().for_each(|x| enc.u32(*x)),
        (Type::UInt64, ColumnData::UInt64(v)) => v.iter().for_each(|x| enc.u64(*x)),
        (Type::UInt128, ColumnData::UInt128(v)) => v.iter().for_each(|x| enc.u128(*x)),
        (Type::Int8, ColumnData::Int8(v)) => v.iter().for_each(|x| enc.i8(*x)),
        (Type::Int16, ColumnData::Int16(v)) => v.iter().for_each(|x| enc.i16(*x)),
        (Type::Int32, ColumnData::Int32(v)) => v.iter().for_each(|x| enc.i32(*x)),
        (Type::Int64, ColumnData::Int64(v)) => v.iter().for_each(|x| enc.i64(*x)),
        (Type::Int128, ColumnData::Int128(v)) => v.iter().for_each(|x| enc.i128(*x)),
        (Type::Float32, ColumnData::Float32(v)) => v.iter().for_each(|x| enc.f32(*x)),
        (Type::Float64, ColumnData::Float64(v)) => v.iter().for_each(|x| enc.f64(*x)),
        (Type::String, ColumnData::String(v)) => v.iter().for_each(|x| enc.string(x)),
        (Type::FixedString(n), ColumnData::String(v)) => {
            // Push already padded to exactly `n`; re-pad defensively.
            v.iter().for_each(|x| enc.fixed_string(x, *n));
        }
        (Type::Uuid, ColumnData::Uuid(v)) => v.iter().for_each(|x| enc.uuid(x)),
        (Type::Date, ColumnData::Date(v)) => v.iter().for_each(|x| enc.u16(*x)),
        (Type::DateTime(_), ColumnData::DateTime(v)) => v.iter().for_each(|x| enc.u32(*x)),
        (Type::DateTime64(_, _), ColumnData::DateTime64(v)) => {
            v.iter().for_each(|x| enc.i64(*x))
        }
        (Type::Decimal(precision, _), ColumnData::Decimal(v)) => {
            match Type::decimal_width(*precision) {
                4 => v.iter().for_each(|x| enc.i32(*x as i32)),
                8 => v.iter().for_each(|x| enc.i64(*x as i64)),
                _ => v.iter().for_each(|x| enc.i128(*x)),
            }
        }
        (Type::Enum8(_), ColumnData::Enum8(v)) => v.iter().for_each(|x| enc.i8(*x)),
        (Type::Enum16(_), ColumnData::Enum16(v)) => v.iter().for_each(|x| enc.i16(*x)),
        (Type::Nullable(inner), ColumnData::Nullable { mask, values }) => {
            enc.raw(mask);
            write_column(enc, inner, values)?;
        }
        (Type::Array(inner), ColumnData::Array { offsets, values }) => {
            offsets.iter().for_each(|o| enc.u64(*o));
            write_column(enc, inner, values)?;
        }
        (Type::Tuple(items), ColumnData::Tuple(cols)) if items.len() == cols.len() => {
            for (item_ty, col) in items.iter().zip(cols) {
                write_column(enc, item_ty, col)?;
            }
        }
        (Type::Map(key_ty, value_ty), ColumnData::Map { offsets, keys, values }) => {
            offsets.iter().for_each(|o| enc.u64(*o));
            write_column(enc, key_ty, keys)?;
            write_column(enc, value_ty, values)?;
        }
        (Type::LowCardinality(inner), ColumnData::LowCardinality(values)) => {
            write_low_cardinality(enc, inner, values)?;
        }
        (Type::Nothing, ColumnData::Nothing(rows)) => {
            for _ in 0..*rows {
                enc.u8(0);
            }
        }
        (ty, data) => {
            return Err(ValidationError::ValueTypeMismatch {
                type_name: ty.to_string(),
                value: format!("column storage of {} rows", data.len()),
            }
            .into())
        }
    }
    Ok(())
}

/// Dictionary-encode the materialized inner column.
///
/// Slot zero always holds the sentinel: null for a Nullable inner, the
/// type's default otherwise (values equal to the default share the slot).
/// Deduplication is stable, so dictionary order follows first occurrence.
fn write_low_cardinality(enc: &mut Encoder, inner: &Type, values: &ColumnData) -> Result<()> {
    let nullable_inner = inner.is_nullable();
    let plain = match inner {
        Type::Nullable(t) => t.as_ref(),
        t => t,
    };
    let rows = values.len();
    let sentinel = default_value(plain);

    let mut dict = ColumnData::new_for(plain);
    dict.push(plain, sentinel.clone())?;
    let mut seen: HashMap<Vec<u8>, u64> = HashMap::new();
    let mut indices = Vec::with_capacity(rows);

    for row in 0..rows {
        let value = values
            .value_at(inner, row)
            .unwrap_or_else(|| default_value(inner));
        if value.is_null() {
            indices.push(0);
            continue;
        }
        if !nullable_inner && value == sentinel {
            indices.push(0);
            continue;
        }
        let key = value_key(plain, &value)?;
        if let Some(index) = seen.get(&key) {
            indices.push(*index);
        } else {
            dict.push(plain, value)?;
            let index = (dict.len() - 1) as u64;
            seen.insert(key, index);
            indices.push(index);
        }
    }

    // Narrowest width that can index the whole dictionary.
    let max_index = (dict.len() - 1) as u64;
    let (width_code, width) = match max_index {
        0..=0xff => (0u64, 1usize),
        0x100..=0xffff => (1, 2),
        0x1_0000..=0xffff_ffff => (2, 4),
        _ => (3, 8),
    };

    enc.u64(LC_SERIALIZATION_VERSION);
    enc.u64(width_code | LC_HAS_ADDITIONAL_KEYS);
    enc.u64(dict.len() as u64);
    write_column(enc, plain, &dict)?;
    enc.u64(rows as u64);
    for index in indices {
        match width {
            1 => enc.u8(index as u8),
            2 => enc.u16(index as u16),
            4 => enc.u32(index as u32),
            _ => enc.u64(index),
        }
    }
    Ok(())
}

/// Wire bytes of a single value, used as the dictionary dedup key.
fn value_key(ty: &Type, value: &Value) -> Result<Vec<u8>> {
    let mut single = ColumnData::new_for(ty);
    single.push(ty, value.clone())?;
    let mut enc = Encoder::new();
    write_column(&mut enc, ty, &single)?;
    Ok(enc.take().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{MemoryInput, PacketInput};
    use crate::column::read_column;

    /// Encode, then decode, then compare logical values row by row.
    async fn round_trip(type_text: &str, values: Vec<Value>) {
        let ty = Type::parse(type_text).unwrap();
        let mut data = ColumnData::new_for(&ty);
        for value in &values {
            data.push(&ty, value.clone()).unwrap();
        }

        let mut enc = Encoder::new();
        write_column(&mut enc, &ty, &data).unwrap();
        let mut input = PacketInput::Memory(MemoryInput::new(enc.take().to_vec()));
        let decoded = read_column(&mut input, &ty, values.len()).await.unwrap();

        for (row, expected) in values.iter().enumerate() {
            let got = decoded.value_at(&ty, row).unwrap();
            assert_eq!(&got, expected, "{type_text} row {row}");
        }
        if let PacketInput::Memory(mem) = input {
            assert_eq!(mem.remaining(), 0, "{type_text} left residue");
        }
    }

    #[tokio::test]
    async fn scalars_round_trip() {
        round_trip("UInt64", vec![Value::UInt64(0), Value::UInt64(u64::MAX)]).await;
        round_trip("Int8", vec![Value::Int8(-128), Value::Int8(127)]).await;
        round_trip("UInt128", vec![Value::UInt128(u128::MAX)]).await;
        round_trip("Float64", vec![Value::Float64(-0.5), Value::Float64(1e300)]).await;
        round_trip("Date", vec![Value::Date(0), Value::Date(20_000)]).await;
        round_trip("DateTime", vec![Value::DateTime(1_600_000_000)]).await;
        round_trip("DateTime64(3)", vec![Value::DateTime64(-1), Value::DateTime64(7)]).await;
    }

    #[tokio::test]
    async fn empty_columns_round_trip() {
        round_trip("UInt32", vec![]).await;
        round_trip("String", vec![]).await;
        round_trip("Array(UInt8)", vec![]).await;
        round_trip("LowCardinality(String)", vec![]).await;
    }

    #[tokio::test]
    async fn strings_round_trip() {
        round_trip(
            "String",
            vec![
                Value::from(""),
                Value::from("plain"),
                Value::String(vec![0xff, 0x00, 0x7f]),
            ],
        )
        .await;
        // Trailing zeros are data for fixed strings.
        round_trip(
            "FixedString(4)",
            vec![Value::String(b"abcd".to_vec()), Value::String(b"x\0\0\0".to_vec())],
        )
        .await;
    }

    #[tokio::test]
    async fn uuid_round_trip() {
        round_trip(
            "UUID",
            vec![
                Value::Uuid(uuid::Uuid::nil()),
                Value::Uuid("8f9d2b4e-7a31-4c88-b0d5-1e2f3a4b5c6d".parse().unwrap()),
            ],
        )
        .await;
    }

    #[tokio::test]
    async fn decimals_round_trip_all_widths() {
        round_trip(
            "Decimal(9,3)",
            vec![Value::Decimal { mantissa: -1_500, scale: 3 }],
        )
        .await;
        round_trip(
            "Decimal(18,6)",
            vec![Value::Decimal { mantissa: 123_456_789_012, scale: 6 }],
        )
        .await;
        round_trip(
            "Decimal(38,10)",
            vec![Value::Decimal { mantissa: -(1i128 << 100), scale: 10 }],
        )
        .await;
    }

    #[tokio::test]
    async fn enums_round_trip() {
        round_trip(
            "Enum8('red' = -1, 'blue' = 1)",
            vec![Value::Enum("red".into()), Value::Enum("blue".into())],
        )
        .await;
        round_trip("Enum16('big' = 1000)", vec![Value::Enum("big".into())]).await;
    }

    #[tokio::test]
    async fn nullable_round_trip() {
        round_trip(
            "Nullable(UInt32)",
            vec![Value::UInt32(5), Value::Null, Value::UInt32(0)],
        )
        .await;
        round_trip("Nullable(String)", vec![Value::Null, Value::Null]).await;
    }

    #[tokio::test]
    async fn arrays_round_trip() {
        round_trip(
            "Array(Int32)",
            vec![
                Value::Array(vec![Value::Int32(1), Value::Int32(2)]),
                Value::Array(vec![]),
                Value::Array(vec![Value::Int32(-3)]),
            ],
        )
        .await;
        round_trip(
            "Array(Array(String))",
            vec![Value::Array(vec![
                Value::Array(vec![Value::from("deep")]),
                Value::Array(vec![]),
            ])],
        )
        .await;
    }

    #[tokio::test]
    async fn tuples_and_maps_round_trip() {
        round_trip(
            "Tuple(UInt8,String)",
            vec![
                Value::Tuple(vec![Value::UInt8(1), Value::from("one")]),
                Value::Tuple(vec![Value::UInt8(2), Value::from("two")]),
            ],
        )
        .await;
        round_trip(
            "Map(String,UInt64)",
            vec![
                Value::Map(vec![
                    (Value::from("a"), Value::UInt64(1)),
                    (Value::from("a"), Value::UInt64(2)),
                ]),
                Value::Map(vec![]),
            ],
        )
        .await;
    }

    #[tokio::test]
    async fn low_cardinality_round_trip() {
        round_trip(
            "LowCardinality(String)",
            vec![
                Value::from("apple"),
                Value::from("banana"),
                Value::from("apple"),
                Value::from(""),
            ],
        )
        .await;
        round_trip(
            "LowCardinality(Nullable(String))",
            vec![
                Value::from("apple"),
                Value::Null,
                // A real empty string must not collapse into the null slot.
                Value::from(""),
                Value::from("apple"),
            ],
        )
        .await;
    }

    #[tokio::test]
    async fn low_cardinality_sentinel_only_dictionary() {
        // Every value equals the type default, so the dictionary holds just
        // the sentinel and every index is zero.
        let ty = Type::parse("LowCardinality(String)").unwrap();
        let mut data = ColumnData::new_for(&ty);
        for _ in 0..4 {
            data.push(&ty, Value::from("")).unwrap();
        }
        let mut enc = Encoder::new();
        write_column(&mut enc, &ty, &data).unwrap();
        let bytes = enc.take().to_vec();
        let dict_size = u64::from_le_bytes(bytes[16..24].try_into().unwrap());
        assert_eq!(dict_size, 1);
        let mut input = PacketInput::Memory(MemoryInput::new(bytes));
        let decoded = read_column(&mut input, &ty, 4).await.unwrap();
        assert_eq!(decoded.value_at(&ty, 3).unwrap(), Value::from(""));
    }

    #[tokio::test]
    async fn low_cardinality_nested_in_array() {
        round_trip(
            "Array(LowCardinality(Nullable(String)))",
            vec![
                Value::Array(vec![Value::from("apple"), Value::Null, Value::from("banana")]),
                Value::Array(vec![Value::Null, Value::from("apple"), Value::from("cherry")]),
            ],
        )
        .await;
    }

    #[tokio::test]
    async fn low_cardinality_wide_dictionary_uses_u32_indices() {
        // Dictionary larger than u16 forces the 4-byte index width.
        let values: Vec<Value> = (0..=0x1_0000u32).map(|i| Value::from(format!("v{i}"))).collect();
        let ty = Type::parse("LowCardinality(String)").unwrap();
        let mut data = ColumnData::new_for(&ty);
        for value in &values {
            data.push(&ty, value.clone()).unwrap();
        }
        let mut enc = Encoder::new();
        write_column(&mut enc, &ty, &data).unwrap();
        let bytes = enc.take().to_vec();
        // flags live in the second u64 of the header
        let flags = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        assert_eq!(flags & 0xff, 2);
        let mut input = PacketInput::Memory(MemoryInput::new(bytes));
        let decoded = read_column(&mut input, &ty, values.len()).await.unwrap();
        assert_eq!(decoded.value_at(&ty, 0x1_0000).unwrap(), values[0x1_0000]);
    }

    #[tokio::test]
    async fn million_element_array_round_trip() {
        let ty = Type::parse("Array(UInt64)").unwrap();
        let mut data = ColumnData::new_for(&ty);
        let items: Vec<Value> = (0..1_000_000u64).map(Value::UInt64).collect();
        data.push(&ty, Value::Array(items)).unwrap();
        data.push(&ty, Value::Array(vec![])).unwrap();

        let mut enc = Encoder::new();
        write_column(&mut enc, &ty, &data).unwrap();
        let mut input = PacketInput::Memory(MemoryInput::new(enc.take().to_vec()));
        let decoded = read_column(&mut input, &ty, 2).await.unwrap();

        let Some(Value::Array(items)) = decoded.value_at(&ty, 0) else {
            panic!("expected array value");
        };
        assert_eq!(items.len(), 1_000_000);
        assert_eq!(items[999_999], Value::UInt64(999_999));
        assert_eq!(decoded.value_at(&ty, 1).unwrap(), Value::Array(vec![]));
    }

    #[tokio::test]
    async fn nothing_round_trip() {
        round_trip("Nullable(Nothing)", vec![Value::Null, Value::Null]).await;
    }

    #[tokio::test]
    async fn bad_lc_flags_rejected() {
        let ty = Type::parse("LowCardinality(String)").unwrap();
        let mut enc = Encoder::new();
        enc.u64(1);
        enc.u64(0); // additional-keys bit missing
        let mut input = PacketInput::Memory(MemoryInput::new(enc.take().to_vec()));
        let err = read_column(&mut input, &ty, 0).await.unwrap_err();
        assert!(matches!(
            err,
            crate::errors::Error::Protocol(
                crate::errors::ProtocolError::BadLowCardinalityFlags { .. }
            )
        ));
    }

    #[tokio::test]
    async fn future_lc_version_is_unimplemented() {
        let ty = Type::parse("LowCardinality(String)").unwrap();
        let mut enc = Encoder::new();
        enc.u64(2);
        let mut input = PacketInput::Memory(MemoryInput::new(enc.take().to_vec()));
        let err = read_column(&mut input, &ty, 0).await.unwrap_err();
        assert!(matches!(err, crate::errors::Error::Unimplemented(_)));
    }

    #[tokio::test]
    async fn lc_index_out_of_dictionary_rejected() {
        let ty = Type::parse("LowCardinality(String)").unwrap();
        let mut enc = Encoder::new();
        enc.u64(1);
        enc.u64(LC_HAS_ADDITIONAL_KEYS); // u8 indices
        enc.u64(1); // dictionary: sentinel only
        enc.string("");
        enc.u64(1); // one row
        enc.u8(5); // points past the dictionary
        let mut input = PacketInput::Memory(MemoryInput::new(enc.take().to_vec()));
        let err = read_column(&mut input, &ty, 1).await.unwrap_err();
        assert!(matches!(
            err,
            crate::errors::Error::Protocol(
                crate::errors::ProtocolError::BadLowCardinalityIndex { .. }
            )
        ));
    }

    #[tokio::test]
    async fn truncated_column_is_unexpected_eof() {
        let ty = Type::parse("UInt64").unwrap();
        let mut input = PacketInput::Memory(MemoryInput::new(vec![1, 2, 3]));
        let err = read_column(&mut input, &ty, 1).await.unwrap_err();
        assert!(matches!(
            err,
            crate::errors::Error::Protocol(crate::errors::ProtocolError::UnexpectedEof)
        ));
    }
}
