//! Coercions between host types and logical values.
//!
//! Date-like types lower to days/seconds since 1970-01-01 UTC, booleans to
//! 0/1, decimals rescale only when lossless. Extraction back out goes
//! through `TryFrom<Value>` and fails with `Validation` on a kind mismatch.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::errors::{Error, Result, ValidationError};
use crate::value::Value;

macro_rules! value_from_scalar {
    ($($host:ty => $variant:ident),+ $(,)?) => {
        $(impl From<$host> for Value {
            fn from(v: $host) -> Self {
                Value::$variant(v)
            }
        })+
    };
}

value_from_scalar! {
    u8 => UInt8, u16 => UInt16, u32 => UInt32, u64 => UInt64, u128 => UInt128,
    i8 => Int8, i16 => Int16, i32 => Int32, i64 => Int64, i128 => Int128,
    f32 => Float32, f64 => Float64, bool => Bool, Uuid => Uuid,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v.into_bytes())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDate> for Value {
    /// Days since epoch, clamped to the column range (1970..2149).
    fn from(v: NaiveDate) -> Self {
        Value::Date(epoch_days(v).clamp(0, u16::MAX as i64) as u16)
    }
}

impl From<DateTime<Utc>> for Value {
    /// Seconds since epoch, clamped to the unsigned 32-bit column range.
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v.timestamp().clamp(0, u32::MAX as i64) as u32)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

/// Days between `date` and 1970-01-01.
pub(crate) fn epoch_days(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - i64::from(epoch().num_days_from_ce())
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch date")
}

/// Rescale a decimal mantissa, failing when digits would be lost.
pub(crate) fn rescale_decimal(mantissa: i128, from_scale: u8, to_scale: u8) -> Result<i128> {
    if from_scale == to_scale {
        return Ok(mantissa);
    }
    if from_scale < to_scale {
        let factor = pow10((to_scale - from_scale) as u32)?;
        return mantissa.checked_mul(factor).ok_or_else(|| {
            ValidationError::ValueOutOfRange {
                type_name: "Decimal".to_string(),
                value: mantissa.to_string(),
            }
            .into()
        });
    }
    let factor = pow10((from_scale - to_scale) as u32)?;
    if mantissa % factor != 0 {
        return Err(ValidationError::ScaleMismatch { got: from_scale, want: to_scale }.into());
    }
    Ok(mantissa / factor)
}

/// Largest mantissa magnitude for a given decimal precision.
pub(crate) fn decimal_limit(precision: u8) -> i128 {
    let mut limit: i128 = 1;
    for _ in 0..precision.min(38) {
        limit *= 10;
    }
    limit
}

fn pow10(exp: u32) -> Result<i128> {
    10i128.checked_pow(exp).ok_or_else(|| {
        ValidationError::ValueOutOfRange {
            type_name: "Decimal".to_string(),
            value: format!("scale shift 10^{exp}"),
        }
        .into()
    })
}

fn mismatch(want: &'static str, value: &Value) -> Error {
    ValidationError::ValueTypeMismatch {
        type_name: want.to_string(),
        value: value.to_string(),
    }
    .into()
}

macro_rules! try_from_int_value {
    ($($host:ty),+ $(,)?) => {
        $(impl TryFrom<Value> for $host {
            type Error = Error;

            /// Accepts any integer variant that fits the host type.
            fn try_from(value: Value) -> Result<Self> {
                let wide: i128 = match value {
                    Value::UInt8(v) => v.into(),
                    Value::UInt16(v) => v.into(),
                    Value::UInt32(v) => v.into(),
                    Value::UInt64(v) => v.into(),
                    Value::Int8(v) => v.into(),
                    Value::Int16(v) => v.into(),
                    Value::Int32(v) => v.into(),
                    Value::Int64(v) => v.into(),
                    Value::Int128(v) => v,
                    Value::UInt128(v) => {
                        return <$host>::try_from(v).map_err(|_| mismatch(stringify!($host), &Value::UInt128(v)))
                    }
                    Value::Date(v) => v.into(),
                    Value::DateTime(v) => v.into(),
                    Value::DateTime64(v) => v.into(),
                    other => return Err(mismatch(stringify!($host), &other)),
                };
                <$host>::try_from(wide).map_err(|_| mismatch(stringify!($host), &Value::Int128(wide)))
            }
        })+
    };
}

try_from_int_value!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Float32(v) => Ok(v.into()),
            Value::Float64(v) => Ok(v),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl TryFrom<Value> for f32 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Float32(v) => Ok(v),
            other => Err(mismatch("f32", &other)),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = Error;

    /// Bool columns surface as UInt8 0/1 on read.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::UInt8(v) => Ok(v != 0),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl TryFrom<Value> for Vec<u8> {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(bytes) => Ok(bytes),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(bytes) => {
                String::from_utf8(bytes).map_err(|e| mismatch("utf-8 string", &Value::String(e.into_bytes())))
            }
            Value::Enum(label) => Ok(label),
            other => Err(mismatch("utf-8 string", &other)),
        }
    }
}

impl TryFrom<Value> for Uuid {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(v) => Ok(v),
            other => Err(mismatch("UUID", &other)),
        }
    }
}

impl TryFrom<Value> for NaiveDate {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Date(days) => epoch()
                .checked_add_days(chrono::Days::new(days.into()))
                .ok_or_else(|| mismatch("date", &Value::Date(days))),
            other => Err(mismatch("date", &other)),
        }
    }
}

impl TryFrom<Value> for DateTime<Utc> {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(secs) => DateTime::<Utc>::from_timestamp(secs.into(), 0)
                .ok_or_else(|| mismatch("datetime", &Value::DateTime(secs))),
            other => Err(mismatch("datetime", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_lower_to_epoch_days() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(Value::from(date), Value::Date(1));
        let back: NaiveDate = Value::Date(1).try_into().unwrap();
        assert_eq!(back, date);
    }

    #[test]
    fn datetimes_lower_to_epoch_seconds() {
        let ts = DateTime::<Utc>::from_timestamp(1_600_000_000, 0).unwrap();
        assert_eq!(Value::from(ts), Value::DateTime(1_600_000_000));
        let back: DateTime<Utc> = Value::DateTime(1_600_000_000).try_into().unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn bool_reads_accept_uint8() {
        assert!(bool::try_from(Value::UInt8(1)).unwrap());
        assert!(!bool::try_from(Value::UInt8(0)).unwrap());
    }

    #[test]
    fn option_lowers_to_null() {
        assert_eq!(Value::from(None::<u64>), Value::Null);
        assert_eq!(Value::from(Some(3u64)), Value::UInt64(3));
    }

    #[test]
    fn rescale_multiplies_when_widening() {
        assert_eq!(rescale_decimal(125, 2, 4).unwrap(), 12_500);
    }

    #[test]
    fn rescale_narrows_only_when_lossless() {
        assert_eq!(rescale_decimal(12_500, 4, 2).unwrap(), 125);
        let err = rescale_decimal(12_501, 4, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::ScaleMismatch { got: 4, want: 2 })
        ));
    }

    #[test]
    fn integer_extraction_checks_range() {
        assert_eq!(u8::try_from(Value::UInt64(200)).unwrap(), 200);
        assert!(u8::try_from(Value::UInt64(300)).is_err());
        assert_eq!(i64::try_from(Value::Int8(-5)).unwrap(), -5);
    }

    #[test]
    fn decimal_limits() {
        assert_eq!(decimal_limit(1), 10);
        assert_eq!(decimal_limit(9), 1_000_000_000);
    }
}
