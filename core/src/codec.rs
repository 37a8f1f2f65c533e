//! Per-wire-kind encode/decode dispatch.
//!
//! The compiler resolves one [`Encoder`] and one [`Decoder`] per field from
//! the field's wire kind, never from its Rust type. Values arrive here already
//! adapted to a [`Primitive`] and already past the sentinel policy, so no
//! codec handles absence or enums.
//!
//! Encoders enforce the column's declared shape:
//!
//! - text and binary kinds check the declared length (`-1` skips the check)
//! - `decimal` rounds to the declared scale and rejects precision overflow
//! - `money` and `smallmoney` round to four places and enforce their range
//! - `float` and `real` reject infinities and NaN
//! - `datetime` rejects dates before 1753-01-01
//! - `time` requires a non-negative interval shorter than a day

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::schema::ColumnSchema;
use crate::value::Primitive;
use crate::wire::{WireKind, WireValue};

/// Encodes a present primitive for one column; errors carry a reason.
pub type Encoder = fn(&ColumnSchema, Primitive) -> Result<WireValue, String>;

/// Decodes a non-null wire value; errors carry the actual wire kind name.
pub type Decoder = fn(WireValue) -> Result<Primitive, &'static str>;

/// Returns the encoder for `kind`.
pub fn encoder(kind: WireKind) -> Encoder {
    match kind {
        WireKind::Char | WireKind::VarChar => encode_narrow_text,
        WireKind::NChar | WireKind::NVarChar => encode_wide_text,
        WireKind::Binary | WireKind::VarBinary => encode_binary,
        WireKind::TinyInt => |_, p| match p {
            Primitive::UInt8(v) => Ok(WireValue::TinyInt(v)),
            other => Err(mismatch(&other)),
        },
        WireKind::SmallInt => |_, p| match p {
            Primitive::Int16(v) => Ok(WireValue::SmallInt(v)),
            other => Err(mismatch(&other)),
        },
        WireKind::Int => |_, p| match p {
            Primitive::Int32(v) => Ok(WireValue::Int(v)),
            other => Err(mismatch(&other)),
        },
        WireKind::BigInt => |_, p| match p {
            Primitive::Int64(v) => Ok(WireValue::BigInt(v)),
            other => Err(mismatch(&other)),
        },
        WireKind::Bit => |_, p| match p {
            Primitive::Bool(v) => Ok(WireValue::Bit(v)),
            other => Err(mismatch(&other)),
        },
        WireKind::Decimal => encode_decimal,
        WireKind::Money => |_, p| encode_money(p, money_range()),
        WireKind::SmallMoney => |_, p| encode_money(p, small_money_range()),
        WireKind::Float => |_, p| match p {
            Primitive::Float64(v) if v.is_finite() => Ok(WireValue::Float(v)),
            Primitive::Float64(v) => Err(format!("{v} is not a finite number")),
            other => Err(mismatch(&other)),
        },
        WireKind::Real => |_, p| match p {
            Primitive::Float32(v) if v.is_finite() => Ok(WireValue::Real(v)),
            Primitive::Float32(v) => Err(format!("{v} is not a finite number")),
            other => Err(mismatch(&other)),
        },
        WireKind::Date => |_, p| match p {
            Primitive::Date(v) => Ok(WireValue::Date(v)),
            other => Err(mismatch(&other)),
        },
        WireKind::DateTime => encode_legacy_datetime,
        WireKind::DateTime2 => |_, p| match p {
            Primitive::DateTime(v) => Ok(WireValue::DateTime(v)),
            other => Err(mismatch(&other)),
        },
        WireKind::DateTimeOffset => |_, p| match p {
            Primitive::DateTimeOffset(v) => Ok(WireValue::DateTimeOffset(v)),
            other => Err(mismatch(&other)),
        },
        WireKind::Time => encode_time,
        WireKind::UniqueIdentifier => |_, p| match p {
            Primitive::Guid(v) => Ok(WireValue::Guid(v)),
            other => Err(mismatch(&other)),
        },
        WireKind::Structured => |_, _| {
            Err("structured values are encoded through their element plan".to_string())
        },
    }
}

/// Returns the decoder for `kind`.
pub fn decoder(kind: WireKind) -> Decoder {
    match kind {
        WireKind::Char | WireKind::VarChar | WireKind::NChar | WireKind::NVarChar => {
            |w| match w {
                WireValue::Text(v) => Ok(Primitive::Text(v)),
                other => Err(other.kind_name()),
            }
        }
        WireKind::Binary | WireKind::VarBinary => |w| match w {
            WireValue::Binary(v) => Ok(Primitive::Binary(v)),
            other => Err(other.kind_name()),
        },
        WireKind::TinyInt => |w| match w {
            WireValue::TinyInt(v) => Ok(Primitive::UInt8(v)),
            other => Err(other.kind_name()),
        },
        WireKind::SmallInt => |w| match w {
            WireValue::SmallInt(v) => Ok(Primitive::Int16(v)),
            other => Err(other.kind_name()),
        },
        WireKind::Int => |w| match w {
            WireValue::Int(v) => Ok(Primitive::Int32(v)),
            other => Err(other.kind_name()),
        },
        WireKind::BigInt => |w| match w {
            WireValue::BigInt(v) => Ok(Primitive::Int64(v)),
            other => Err(other.kind_name()),
        },
        WireKind::Bit => |w| match w {
            WireValue::Bit(v) => Ok(Primitive::Bool(v)),
            other => Err(other.kind_name()),
        },
        WireKind::Decimal | WireKind::Money | WireKind::SmallMoney => |w| match w {
            WireValue::Decimal(v) => Ok(Primitive::Decimal(v)),
            other => Err(other.kind_name()),
        },
        WireKind::Float => |w| match w {
            WireValue::Float(v) => Ok(Primitive::Float64(v)),
            other => Err(other.kind_name()),
        },
        WireKind::Real => |w| match w {
            WireValue::Real(v) => Ok(Primitive::Float32(v)),
            other => Err(other.kind_name()),
        },
        WireKind::Date => |w| match w {
            WireValue::Date(v) => Ok(Primitive::Date(v)),
            other => Err(other.kind_name()),
        },
        WireKind::DateTime | WireKind::DateTime2 => |w| match w {
            WireValue::DateTime(v) => Ok(Primitive::DateTime(v)),
            other => Err(other.kind_name()),
        },
        WireKind::DateTimeOffset => |w| match w {
            WireValue::DateTimeOffset(v) => Ok(Primitive::DateTimeOffset(v)),
            other => Err(other.kind_name()),
        },
        WireKind::Time => |w| match w {
            WireValue::Time(v) => Ok(Primitive::Time(v)),
            other => Err(other.kind_name()),
        },
        WireKind::UniqueIdentifier => |w| match w {
            WireValue::Guid(v) => Ok(Primitive::Guid(v)),
            other => Err(other.kind_name()),
        },
        WireKind::Structured => |w| Err(w.kind_name()),
    }
}

fn mismatch(found: &Primitive) -> String {
    format!("unexpected {:?} value", found.repr())
}

fn check_length(column: &ColumnSchema, actual: usize, unit: &str) -> Result<(), String> {
    match column.length {
        Some(limit) if limit >= 0 && actual > limit as usize => Err(format!(
            "{actual} {unit} exceeds declared length {limit}"
        )),
        _ => Ok(()),
    }
}

fn encode_narrow_text(column: &ColumnSchema, p: Primitive) -> Result<WireValue, String> {
    match p {
        Primitive::Text(s) => {
            check_length(column, s.len(), "bytes")?;
            Ok(WireValue::Text(s))
        }
        other => Err(mismatch(&other)),
    }
}

fn encode_wide_text(column: &ColumnSchema, p: Primitive) -> Result<WireValue, String> {
    match p {
        Primitive::Text(s) => {
            check_length(column, s.chars().count(), "characters")?;
            Ok(WireValue::Text(s))
        }
        other => Err(mismatch(&other)),
    }
}

fn encode_binary(column: &ColumnSchema, p: Primitive) -> Result<WireValue, String> {
    match p {
        Primitive::Binary(b) => {
            check_length(column, b.len(), "bytes")?;
            Ok(WireValue::Binary(b))
        }
        other => Err(mismatch(&other)),
    }
}

fn encode_decimal(column: &ColumnSchema, p: Primitive) -> Result<WireValue, String> {
    let Primitive::Decimal(value) = p else {
        return Err(mismatch(&p));
    };
    let scale = column.scale.unwrap_or(0);
    let rounded = if value.scale() > u32::from(scale) {
        value.round_dp_with_strategy(u32::from(scale), RoundingStrategy::MidpointAwayFromZero)
    } else {
        value
    };
    if let Some(precision) = column.precision {
        let integer_digits = u32::from(precision.saturating_sub(scale));
        if let Some(limit) = 10_i128
            .checked_pow(integer_digits)
            .and_then(|n| Decimal::try_from_i128_with_scale(n, 0).ok())
            && rounded.abs().trunc() >= limit
        {
            return Err(format!(
                "{rounded} exceeds precision {precision} with scale {scale}"
            ));
        }
    }
    Ok(WireValue::Decimal(rounded))
}

fn money_range() -> (Decimal, Decimal) {
    (Decimal::new(i64::MIN, 4), Decimal::new(i64::MAX, 4))
}

fn small_money_range() -> (Decimal, Decimal) {
    (
        Decimal::new(i64::from(i32::MIN), 4),
        Decimal::new(i64::from(i32::MAX), 4),
    )
}

fn encode_money(p: Primitive, (min, max): (Decimal, Decimal)) -> Result<WireValue, String> {
    let Primitive::Decimal(value) = p else {
        return Err(mismatch(&p));
    };
    let rounded = value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    if rounded < min || rounded > max {
        return Err(format!("{rounded} is outside the range {min} to {max}"));
    }
    Ok(WireValue::Decimal(rounded))
}

fn legacy_datetime_floor() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1753, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn encode_legacy_datetime(_: &ColumnSchema, p: Primitive) -> Result<WireValue, String> {
    match p {
        Primitive::DateTime(v) => match legacy_datetime_floor() {
            Some(floor) if v < floor => Err(format!("{v} is before {floor}")),
            _ => Ok(WireValue::DateTime(v)),
        },
        other => Err(mismatch(&other)),
    }
}

fn encode_time(_: &ColumnSchema, p: Primitive) -> Result<WireValue, String> {
    match p {
        Primitive::Time(v) if v >= TimeDelta::zero() && v < TimeDelta::days(1) => {
            Ok(WireValue::Time(v))
        }
        Primitive::Time(v) => Err(format!("{v} is not a time of day")),
        other => Err(mismatch(&other)),
    }
}
