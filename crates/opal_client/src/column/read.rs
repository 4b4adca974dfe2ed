//! Wire-to-storage column decoding.
//!
//! Recursion follows the (already depth-limited) type tree; the composite
//! cases re-enter through a boxed future.

use std::future::Future;
use std::pin::Pin;

use super::{default_value, ColumnData};
use crate::binary::PacketInput;
use crate::errors::{Error, ProtocolError, Result};
use crate::types::Type;

/// Dictionary encoding flag: indices refer to a per-column dictionary.
const LC_HAS_ADDITIONAL_KEYS: u64 = 1 << 9;
/// Set by servers that stream dictionary updates; carries no payload here.
const LC_NEED_UPDATE_DICTIONARY: u64 = 1 << 10;
const LC_WIDTH_MASK: u64 = 0xff;
const LC_SERIALIZATION_VERSION: u64 = 1;

/// Largest element count accepted for a single nested column.
const MAX_NESTED_ELEMENTS: u64 = 1 << 32;

macro_rules! read_scalar_vec {
    ($input:expr, $rows:expr, $t:ty) => {{
        const WIDTH: usize = std::mem::size_of::<$t>();
        let raw = $input.read_bytes($rows * WIDTH).await?;
        raw.chunks_exact(WIDTH)
            .map(|chunk| <$t>::from_le_bytes(chunk.try_into().unwrap()))
            .collect::<Vec<$t>>()
    }};
}

/// Decode a column body of `rows` values of `ty`.
pub(crate) async fn read_column(
    input: &mut PacketInput<'_>,
    ty: &Type,
    rows: usize,
) -> Result<ColumnData> {
    let data = match ty {
        Type::UInt8 | Type::Bool => ColumnData::UInt8(input.read_bytes(rows).await?),
        Type::UInt16 => ColumnData::UInt16(read_scalar_vec!(input, rows, u16)),
        Type::UInt32 => ColumnData::UInt32(read_scalar_vec!(input, rows, u32)),
        Type::UInt64 => ColumnData::UInt64(read_scalar_vec!(input, rows, u64)),
        Type::UInt128 => ColumnData::UInt128(read_scalar_vec!(input, rows, u128)),
        Type::Int8 => ColumnData::Int8(read_scalar_vec!(input, rows, i8)),
        Type::Int16 => ColumnData::Int16(read_scalar_vec!(input, rows, i16)),
        Type::Int32 => ColumnData::Int32(read_scalar_vec!(input, rows, i32)),
        Type::Int64 => ColumnData::Int64(read_scalar_vec!(input, rows, i64)),
        Type::Int128 => ColumnData::Int128(read_scalar_vec!(input, rows, i128)),
        Type::Float32 => ColumnData::Float32(read_scalar_vec!(input, rows, f32)),
        Type::Float64 => ColumnData::Float64(read_scalar_vec!(input, rows, f64)),
        Type::String => {
            let mut values = Vec::with_capacity(rows);
            for _ in 0..rows {
                values.push(input.read_string().await?);
            }
            ColumnData::String(values)
        }
        Type::FixedString(n) => {
            if (rows as u64).saturating_mul(*n as u64) > MAX_NESTED_ELEMENTS {
                return Err(ProtocolError::OversizedBlock(rows as u64 * *n as u64).into());
            }
            let raw = input.read_bytes(rows * n).await?;
            ColumnData::String(raw.chunks_exact(*n).map(<[u8]>::to_vec).collect())
        }
        Type::Uuid => {
            let mut values = Vec::with_capacity(rows);
            for _ in 0..rows {
                let hi = input.read_u64().await?;
                let lo = input.read_u64().await?;
                values.push(uuid::Uuid::from_u64_pair(hi, lo));
            }
            ColumnData::Uuid(values)
        }
        Type::Date => ColumnData::Date(read_scalar_vec!(input, rows, u16)),
        Type::DateTime(_) => ColumnData::DateTime(read_scalar_vec!(input, rows, u32)),
        Type::DateTime64(_, _) => ColumnData::DateTime64(read_scalar_vec!(input, rows, i64)),
        Type::Decimal(precision, _) => {
            let mut values = Vec::with_capacity(rows);
            match Type::decimal_width(*precision) {
                4 => {
                    for v in read_scalar_vec!(input, rows, i32) {
                        values.push(i128::from(v));
                    }
                }
                8 => {
                    for v in read_scalar_vec!(input, rows, i64) {
                        values.push(i128::from(v));
                    }
                }
                _ => values = read_scalar_vec!(input, rows, i128),
            }
            ColumnData::Decimal(values)
        }
        Type::Enum8(_) => ColumnData::Enum8(read_scalar_vec!(input, rows, i8)),
        Type::Enum16(_) => ColumnData::Enum16(read_scalar_vec!(input, rows, i16)),
        Type::Nullable(inner) => {
            let mask = input.read_bytes(rows).await?;
            let values = read_column_boxed(input, inner, rows).await?;
            ColumnData::Nullable { mask, values: Box::new(values) }
        }
        Type::Array(inner) => {
            let offsets = read_offsets(input, rows).await?;
            let nested = offsets.last().copied().unwrap_or(0) as usize;
            let values = read_column_boxed(input, inner, nested).await?;
            ColumnData::Array { offsets, values: Box::new(values) }
        }
        Type::Tuple(items) => {
            let mut cols = Vec::with_capacity(items.len());
            for item in items {
                cols.push(read_column_boxed(input, item, rows).await?);
            }
            ColumnData::Tuple(cols)
        }
        Type::Map(key_ty, value_ty) => {
            // Wire-identical to Array(Tuple(K,V)).
            let offsets = read_offsets(input, rows).await?;
            let nested = offsets.last().copied().unwrap_or(0) as usize;
            let keys = read_column_boxed(input, key_ty, nested).await?;
            let values = read_column_boxed(input, value_ty, nested).await?;
            ColumnData::Map {
                offsets,
                keys: Box::new(keys),
                values: Box::new(values),
            }
        }
        Type::LowCardinality(inner) => read_low_cardinality(input, inner, rows).await?,
        Type::Nothing => {
            // One placeholder byte per row on the wire.
            input.read_bytes(rows).await?;
            ColumnData::Nothing(rows)
        }
    };
    Ok(data)
}

/// Boxed re-entry point that breaks the recursive future cycle.
fn read_column_boxed<'a, 'b: 'a>(
    input: &'a mut PacketInput<'b>,
    ty: &'a Type,
    rows: usize,
) -> Pin<Box<dyn Future<Output = Result<ColumnData>> + Send + 'a>> {
    Box::pin(read_column(input, ty, rows))
}

/// Cumulative end offsets; each must not decrease and the total is bounded.
async fn read_offsets(input: &mut PacketInput<'_>, rows: usize) -> Result<Vec<u64>> {
    let mut offsets = Vec::with_capacity(rows);
    let mut previous = 0u64;
    for row in 0..rows {
        let offset = input.read_u64().await?;
        if offset < previous {
            return Err(ProtocolError::NonMonotonicOffsets { row }.into());
        }
        previous = offset;
        offsets.push(offset);
    }
    if previous > MAX_NESTED_ELEMENTS {
        return Err(ProtocolError::OversizedBlock(previous).into());
    }
    Ok(offsets)
}

async fn read_low_cardinality(
    input: &mut PacketInput<'_>,
    inner: &Type,
    rows: usize,
) -> Result<ColumnData> {
    let version = input.read_u64().await?;
    if version != LC_SERIALIZATION_VERSION {
        return Err(Error::Unimplemented(format!(
            "low cardinality serialization version {version}"
        )));
    }

    let flags = input.read_u64().await?;
    if flags & LC_HAS_ADDITIONAL_KEYS == 0
        || flags & !(LC_WIDTH_MASK | LC_HAS_ADDITIONAL_KEYS | LC_NEED_UPDATE_DICTIONARY) != 0
    {
        return Err(ProtocolError::BadLowCardinalityFlags { flags }.into());
    }
    let index_width = match flags & LC_WIDTH_MASK {
        0 => 1usize,
        1 => 2,
        2 => 4,
        3 => 8,
        _ => return Err(ProtocolError::BadLowCardinalityFlags { flags }.into()),
    };

    let nullable_inner = inner.is_nullable();
    let plain = match inner {
        Type::Nullable(t) => t.as_ref(),
        t => t,
    };

    let dict_size = input.read_u64().await?;
    if dict_size > MAX_NESTED_ELEMENTS {
        return Err(ProtocolError::OversizedBlock(dict_size).into());
    }
    let dict = read_column_boxed(input, plain, dict_size as usize).await?;

    let index_count = input.read_u64().await?;
    if index_count != rows as u64 {
        return Err(ProtocolError::IndexCountMismatch { got: index_count, rows }.into());
    }

    let mut values = ColumnData::new_for(inner);
    for _ in 0..rows {
        let index = match index_width {
            1 => u64::from(input.read_u8().await?),
            2 => u64::from(input.read_u16().await?),
            4 => u64::from(input.read_u32().await?),
            _ => input.read_u64().await?,
        };
        if index >= dict_size {
            return Err(ProtocolError::BadLowCardinalityIndex { index, dict_size }.into());
        }
        if nullable_inner && index == 0 {
            values.push(inner, crate::value::Value::Null)?;
            continue;
        }
        let value = dict
            .value_at(plain, index as usize)
            .unwrap_or_else(|| default_value(plain));
        values.push(inner, value)?;
    }
    Ok(ColumnData::LowCardinality(Box::new(values)))
}
