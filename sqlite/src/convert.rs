//! Conversion between wire values and SQLite storage values.
//!
//! SQLite has five storage classes, so most wire kinds share one. The
//! mapping is fixed per kind:
//!
//! | Wire kinds | Storage | Form |
//! |---|---|---|
//! | integers, `bit` | `INTEGER` | value, `bit` as 0/1 |
//! | `decimal`, `money`, `smallmoney` | `TEXT` | exact decimal string |
//! | `float`, `real` | `REAL` | value |
//! | `date`, `datetime`, `datetime2` | `TEXT` | ISO 8601 |
//! | `datetimeoffset` | `TEXT` | RFC 3339 |
//! | `time` | `INTEGER` | nanoseconds since midnight |
//! | `uniqueidentifier` | `BLOB` | 16 bytes |
//! | text kinds | `TEXT` | value |
//! | binary kinds | `BLOB` | value |
//!
//! `structured` columns have no storage form and are rejected.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use rusqlite::types::Value;
use rust_decimal::Decimal;
use tabmap_core::{WireKind, WireValue};
use uuid::Uuid;

use crate::error::{Result, SqliteError};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Converts a wire value into the SQLite value stored for it.
///
/// # Errors
///
/// Returns [`SqliteError::UnsupportedKind`] for table values and
/// [`SqliteError::ConversionError`] for a time of day that does not fit in
/// nanoseconds.
pub fn to_sql_value(column: &str, value: &WireValue) -> Result<Value> {
    let stored = match value {
        WireValue::Null => Value::Null,
        WireValue::Text(v) => Value::Text(v.clone()),
        WireValue::Binary(v) => Value::Blob(v.clone()),
        WireValue::TinyInt(v) => Value::Integer(i64::from(*v)),
        WireValue::SmallInt(v) => Value::Integer(i64::from(*v)),
        WireValue::Int(v) => Value::Integer(i64::from(*v)),
        WireValue::BigInt(v) => Value::Integer(*v),
        WireValue::Bit(v) => Value::Integer(i64::from(*v)),
        WireValue::Decimal(v) => Value::Text(v.to_string()),
        WireValue::Float(v) => Value::Real(*v),
        WireValue::Real(v) => Value::Real(f64::from(*v)),
        WireValue::Date(v) => Value::Text(v.format(DATE_FORMAT).to_string()),
        WireValue::DateTime(v) => Value::Text(v.format(DATETIME_FORMAT).to_string()),
        WireValue::DateTimeOffset(v) => Value::Text(v.to_rfc3339()),
        WireValue::Time(v) => Value::Integer(v.num_nanoseconds().ok_or_else(|| {
            SqliteError::conversion(column, "time of day overflows nanoseconds")
        })?),
        WireValue::Guid(v) => Value::Blob(v.as_bytes().to_vec()),
        WireValue::Table(_) => {
            return Err(SqliteError::UnsupportedKind {
                column: column.to_string(),
                kind: WireKind::Structured,
            });
        }
    };
    Ok(stored)
}

/// Converts a stored SQLite value back into a wire value of `kind`.
///
/// `NULL` reads as [`WireValue::Null`] for every kind. Integer storage is
/// accepted for the floating and decimal kinds since SQLite may hand back
/// whole numbers that way.
///
/// # Errors
///
/// Returns [`SqliteError::ConversionError`] when the storage class does not
/// match the kind, an integer is out of range, or stored text does not parse.
pub fn from_sql_value(column: &str, value: Value, kind: WireKind) -> Result<WireValue> {
    let parse_failed = |reason: String| SqliteError::conversion(column, reason);

    match (kind, value) {
        (WireKind::Structured, _) => Err(SqliteError::UnsupportedKind {
            column: column.to_string(),
            kind,
        }),
        (_, Value::Null) => Ok(WireValue::Null),
        (k, Value::Text(v)) if k.is_text() => Ok(WireValue::Text(v)),
        (k, Value::Blob(v)) if k.is_binary() => Ok(WireValue::Binary(v)),
        (WireKind::TinyInt, Value::Integer(v)) => narrow(column, v, WireValue::TinyInt),
        (WireKind::SmallInt, Value::Integer(v)) => narrow(column, v, WireValue::SmallInt),
        (WireKind::Int, Value::Integer(v)) => narrow(column, v, WireValue::Int),
        (WireKind::BigInt, Value::Integer(v)) => Ok(WireValue::BigInt(v)),
        (WireKind::Bit, Value::Integer(v)) => Ok(WireValue::Bit(v != 0)),
        (WireKind::Decimal | WireKind::Money | WireKind::SmallMoney, Value::Text(v)) => {
            Decimal::from_str(&v)
                .map(WireValue::Decimal)
                .map_err(|e| parse_failed(format!("'{v}' is not a decimal: {e}")))
        }
        (WireKind::Decimal | WireKind::Money | WireKind::SmallMoney, Value::Integer(v)) => {
            Ok(WireValue::Decimal(Decimal::from(v)))
        }
        (WireKind::Decimal | WireKind::Money | WireKind::SmallMoney, Value::Real(v)) => {
            Decimal::try_from(v)
                .map(WireValue::Decimal)
                .map_err(|e| parse_failed(format!("{v} is not a decimal: {e}")))
        }
        (WireKind::Float, Value::Real(v)) => Ok(WireValue::Float(v)),
        (WireKind::Float, Value::Integer(v)) => Ok(WireValue::Float(v as f64)),
        (WireKind::Real, Value::Real(v)) => Ok(WireValue::Real(v as f32)),
        (WireKind::Real, Value::Integer(v)) => Ok(WireValue::Real(v as f32)),
        (WireKind::Date, Value::Text(v)) => NaiveDate::parse_from_str(&v, DATE_FORMAT)
            .map(WireValue::Date)
            .map_err(|e| parse_failed(format!("'{v}' is not a date: {e}"))),
        (WireKind::DateTime | WireKind::DateTime2, Value::Text(v)) => {
            NaiveDateTime::parse_from_str(&v, DATETIME_FORMAT)
                .map(WireValue::DateTime)
                .map_err(|e| parse_failed(format!("'{v}' is not a timestamp: {e}")))
        }
        (WireKind::DateTimeOffset, Value::Text(v)) => DateTime::parse_from_rfc3339(&v)
            .map(WireValue::DateTimeOffset)
            .map_err(|e| parse_failed(format!("'{v}' is not an RFC 3339 timestamp: {e}"))),
        (WireKind::Time, Value::Integer(v)) => Ok(WireValue::Time(TimeDelta::nanoseconds(v))),
        (WireKind::UniqueIdentifier, Value::Blob(v)) => Uuid::from_slice(&v)
            .map(WireValue::Guid)
            .map_err(|e| parse_failed(format!("blob is not a uuid: {e}"))),
        (WireKind::UniqueIdentifier, Value::Text(v)) => Uuid::parse_str(&v)
            .map(WireValue::Guid)
            .map_err(|e| parse_failed(format!("'{v}' is not a uuid: {e}"))),
        (kind, other) => Err(parse_failed(format!(
            "cannot read {} storage as {kind}",
            other.data_type()
        ))),
    }
}

fn narrow<T: TryFrom<i64>>(
    column: &str,
    value: i64,
    wrap: fn(T) -> WireValue,
) -> Result<WireValue> {
    T::try_from(value)
        .map(wrap)
        .map_err(|_| SqliteError::conversion(column, format!("{value} is out of range")))
}
