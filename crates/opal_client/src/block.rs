//! Blocks: the unit of data exchange.
//!
//! A block is a set of named, equally-long, typed columns plus a small info
//! header. The empty block (zero columns) doubles as a protocol sentinel:
//! the server's INSERT schema template and the client's end-of-data marker.

use crate::binary::{Encoder, PacketInput};
use crate::column::{read_column, write_column, ColumnData};
use crate::errors::{ProtocolError, Result, ValidationError};
use crate::types::Type;
use crate::value::Value;

/// Row-count sanity bound for decoded headers.
const MAX_ROWS: u64 = 1 << 27;
/// Column-count sanity bound for decoded headers.
const MAX_COLUMNS: u64 = 1 << 20;

const INFO_FIELD_OVERFLOWS: u64 = 1;
const INFO_FIELD_BUCKET: u64 = 2;
const INFO_FIELD_END: u64 = 0;

/// Block info header; both fields are emitted even at their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub is_overflows: bool,
    pub bucket_num: i32,
}

impl Default for BlockInfo {
    fn default() -> Self {
        Self { is_overflows: false, bucket_num: -1 }
    }
}

/// One named, typed column inside a block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockColumn {
    name: String,
    column_type: Type,
    data: ColumnData,
}

impl BlockColumn {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &Type {
        &self.column_type
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Logical value at `row`, or `None` out of bounds.
    pub fn value(&self, row: usize) -> Option<Value> {
        self.data.value_at(&self.column_type, row)
    }
}

/// Named, typed columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    info: BlockInfo,
    columns: Vec<BlockColumn>,
}

impl Block {
    pub fn new() -> Block {
        Block::default()
    }

    /// Append a column, inferring the type from the values.
    ///
    /// Inference covers scalars, strings, UUIDs, dates, and their
    /// Array/Tuple/Map/Nullable compositions; ambiguous kinds (decimals,
    /// enums, DateTime64, all-null columns) need [`Block::column_typed`].
    pub fn column<T: Into<Value>>(
        self,
        name: impl Into<String>,
        values: Vec<T>,
    ) -> Result<Block> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let column_type = infer_type(&values)?;
        self.column_typed(name, column_type, values)
    }

    /// Append a column with an explicit type; values are validated.
    pub fn column_typed(
        mut self,
        name: impl Into<String>,
        column_type: Type,
        values: Vec<Value>,
    ) -> Result<Block> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.row_count() {
            return Err(ValidationError::ColumnLengthMismatch {
                name,
                len: values.len(),
                rows: self.row_count(),
            }
            .into());
        }
        let mut data = ColumnData::new_for(&column_type);
        for value in values {
            data.push(&column_type, value)?;
        }
        self.columns.push(BlockColumn { name, column_type, data });
        Ok(self)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, BlockColumn::len)
    }

    /// A block with no columns is the protocol sentinel.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn info(&self) -> BlockInfo {
        self.info
    }

    pub fn columns(&self) -> &[BlockColumn] {
        &self.columns
    }

    pub fn column_at(&self, index: usize) -> Option<&BlockColumn> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&BlockColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Value at (`row`, `column name`).
    pub fn value(&self, row: usize, name: &str) -> Option<Value> {
        self.column_by_name(name)?.value(row)
    }

    /// Row-oriented view over the columns.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.row_count()).map(move |index| Row { block: self, index })
    }

    /// Encode to the wire layout, enforcing the equal-length invariant.
    pub(crate) fn write(&self, enc: &mut Encoder) -> Result<()> {
        enc.uvarint(INFO_FIELD_OVERFLOWS);
        enc.u8(self.info.is_overflows as u8);
        enc.uvarint(INFO_FIELD_BUCKET);
        enc.i32(self.info.bucket_num);
        enc.uvarint(INFO_FIELD_END);

        let rows = self.row_count();
        enc.uvarint(self.columns.len() as u64);
        enc.uvarint(rows as u64);
        for column in &self.columns {
            if column.len() != rows {
                return Err(ValidationError::ColumnLengthMismatch {
                    name: column.name.clone(),
                    len: column.len(),
                    rows,
                }
                .into());
            }
            enc.string(&column.name);
            enc.string(column.column_type.to_string());
            write_column(enc, &column.column_type, &column.data)?;
        }
        Ok(())
    }

    /// Decode one block from a packet body.
    pub(crate) async fn read(input: &mut PacketInput<'_>) -> Result<Block> {
        let mut info = BlockInfo::default();
        loop {
            match input.read_uvarint().await? {
                INFO_FIELD_END => break,
                INFO_FIELD_OVERFLOWS => info.is_overflows = input.read_u8().await? != 0,
                INFO_FIELD_BUCKET => info.bucket_num = input.read_i32().await?,
                unknown => {
                    return Err(ProtocolError::UnknownBlockInfoField(unknown).into());
                }
            }
        }

        let n_columns = input.read_uvarint().await?;
        let n_rows = input.read_uvarint().await?;
        if n_columns > MAX_COLUMNS || n_rows > MAX_ROWS {
            return Err(ProtocolError::OversizedBlock(n_columns.max(n_rows)).into());
        }

        let mut columns = Vec::with_capacity(n_columns as usize);
        for _ in 0..n_columns {
            let name = input.read_utf8_string("column name").await?;
            let type_text = input.read_utf8_string("column type").await?;
            let column_type = Type::parse(&type_text)?;
            let data = read_column(input, &column_type, n_rows as usize).await?;
            columns.push(BlockColumn { name, column_type, data });
        }
        Ok(Block { info, columns })
    }
}

/// One row of a block.
pub struct Row<'a> {
    block: &'a Block,
    index: usize,
}

impl Row<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.block.value(self.index, name)
    }

    /// All cells of this row as `(column name, value)` pairs.
    pub fn values(&self) -> Vec<(&str, Value)> {
        self.block
            .columns()
            .iter()
            .filter_map(|c| c.value(self.index).map(|v| (c.name(), v)))
            .collect()
    }
}

/// Infer a column type from a value sequence.
fn infer_type(values: &[Value]) -> Result<Type> {
    let mut saw_null = false;
    let mut base = None;
    for value in values {
        if value.is_null() {
            saw_null = true;
            continue;
        }
        base = Some(infer_value_type(value)?);
        break;
    }
    let Some(base) = base else {
        return Err(ValidationError::BadTypeArgs {
            type_name: "<inferred>".into(),
            reason: "all values are null, provide an explicit type".into(),
        }
        .into());
    };
    Ok(if saw_null || values.iter().any(Value::is_null) {
        Type::Nullable(Box::new(base))
    } else {
        base
    })
}

fn infer_value_type(value: &Value) -> Result<Type> {
    let ambiguous = |what: &str| -> crate::errors::Error {
        ValidationError::BadTypeArgs {
            type_name: "<inferred>".into(),
            reason: format!("{what} needs an explicit column type"),
        }
        .into()
    };
    let ty = match value {
        Value::UInt8(_) => Type::UInt8,
        Value::UInt16(_) => Type::UInt16,
        Value::UInt32(_) => Type::UInt32,
        Value::UInt64(_) => Type::UInt64,
        Value::UInt128(_) => Type::UInt128,
        Value::Int8(_) => Type::Int8,
        Value::Int16(_) => Type::Int16,
        Value::Int32(_) => Type::Int32,
        Value::Int64(_) => Type::Int64,
        Value::Int128(_) => Type::Int128,
        Value::Float32(_) => Type::Float32,
        Value::Float64(_) => Type::Float64,
        Value::Bool(_) => Type::Bool,
        Value::String(_) => Type::String,
        Value::Uuid(_) => Type::Uuid,
        Value::Date(_) => Type::Date,
        Value::DateTime(_) => Type::DateTime(None),
        Value::Array(items) => {
            let inner = items
                .iter()
                .find(|v| !v.is_null())
                .map(infer_value_type)
                .transpose()?
                .ok_or_else(|| ambiguous("an empty or all-null array"))?;
            if items.iter().any(Value::is_null) {
                Type::Array(Box::new(Type::Nullable(Box::new(inner))))
            } else {
                Type::Array(Box::new(inner))
            }
        }
        Value::Tuple(items) => {
            let mut item_types = Vec::with_capacity(items.len());
            for item in items {
                item_types.push(infer_value_type(item)?);
            }
            Type::Tuple(item_types)
        }
        Value::Map(pairs) => {
            let (k, v) = pairs.first().ok_or_else(|| ambiguous("an empty map"))?;
            Type::Map(Box::new(infer_value_type(k)?), Box::new(infer_value_type(v)?))
        }
        Value::DateTime64(_) => return Err(ambiguous("DateTime64")),
        Value::Decimal { .. } => return Err(ambiguous("Decimal")),
        Value::Enum(_) => return Err(ambiguous("Enum")),
        Value::Null => return Err(ambiguous("null")),
    };
    Ok(ty)
}
