//! Wire kinds and wire values.
//!
//! A [`WireKind`] names the relational encoding a field maps to. A
//! [`WireValue`] is one encoded slot in a parameter set, row, or result; the
//! null marker is [`WireValue::Null`], distinct from every real value.
//!
//! [`Repr`] classifies the in-memory representation a kind accepts, which is
//! what descriptor validation compares against.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::container::RowSet;

/// Relational encoding of a mapped field.
///
/// # Examples
///
/// ```
/// use tabmap_core::{Repr, WireKind};
///
/// assert!(WireKind::NVarChar.accepts(Repr::Text));
/// assert!(!WireKind::Int.accepts(Repr::Int64));
/// assert_eq!(WireKind::Money.implied_precision(), Some((19, 4)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireKind {
    /// Fixed-length single-byte text.
    Char,
    /// Variable-length single-byte text.
    VarChar,
    /// Fixed-length Unicode text.
    NChar,
    /// Variable-length Unicode text.
    NVarChar,
    /// Fixed-length binary.
    Binary,
    /// Variable-length binary.
    VarBinary,
    /// Unsigned 8-bit integer.
    TinyInt,
    /// 16-bit integer.
    SmallInt,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// Boolean.
    Bit,
    /// Exact numeric with declared precision and scale.
    Decimal,
    /// Currency, precision 19 scale 4.
    Money,
    /// Currency, precision 10 scale 4.
    SmallMoney,
    /// 64-bit floating point.
    Float,
    /// 32-bit floating point.
    Real,
    /// Calendar date.
    Date,
    /// Date and time, legacy range.
    DateTime,
    /// Date and time with higher precision and range.
    DateTime2,
    /// Date and time with UTC offset.
    DateTimeOffset,
    /// Time of day as an interval since midnight.
    Time,
    /// 128-bit unique identifier.
    UniqueIdentifier,
    /// Table-valued (structured) parameter.
    Structured,
}

impl WireKind {
    /// Returns `true` for the four text kinds.
    pub fn is_text(self) -> bool {
        matches!(self, Self::Char | Self::VarChar | Self::NChar | Self::NVarChar)
    }

    /// Returns `true` for the two binary kinds.
    pub fn is_binary(self) -> bool {
        matches!(self, Self::Binary | Self::VarBinary)
    }

    /// Returns `true` for the four integer kinds.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::TinyInt | Self::SmallInt | Self::Int | Self::BigInt
        )
    }

    /// Returns `true` for fixed-width text and binary kinds.
    pub fn is_fixed_length(self) -> bool {
        matches!(self, Self::Char | Self::NChar | Self::Binary)
    }

    /// Returns `true` if the kind needs a declared length.
    pub fn requires_length(self) -> bool {
        self.is_text() || self.is_binary()
    }

    /// Precision and scale implied by the kind itself, if any.
    pub fn implied_precision(self) -> Option<(u8, u8)> {
        match self {
            Self::Money => Some((19, 4)),
            Self::SmallMoney => Some((10, 4)),
            _ => None,
        }
    }

    /// Representation class this kind carries in memory.
    pub fn repr(self) -> Repr {
        match self {
            Self::Char | Self::VarChar | Self::NChar | Self::NVarChar => Repr::Text,
            Self::Binary | Self::VarBinary => Repr::Binary,
            Self::TinyInt => Repr::UInt8,
            Self::SmallInt => Repr::Int16,
            Self::Int => Repr::Int32,
            Self::BigInt => Repr::Int64,
            Self::Bit => Repr::Bool,
            Self::Decimal | Self::Money | Self::SmallMoney => Repr::Decimal,
            Self::Float => Repr::Float64,
            Self::Real => Repr::Float32,
            Self::Date => Repr::Date,
            Self::DateTime | Self::DateTime2 => Repr::DateTime,
            Self::DateTimeOffset => Repr::DateTimeOffset,
            Self::Time => Repr::Time,
            Self::UniqueIdentifier => Repr::Guid,
            Self::Structured => Repr::Table,
        }
    }

    /// Returns `true` if a value of representation `repr` can map to this kind.
    pub fn accepts(self, repr: Repr) -> bool {
        self.repr() == repr
    }

    /// Lower-case relational type name, e.g. `nvarchar`.
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::VarChar => "varchar",
            Self::NChar => "nchar",
            Self::NVarChar => "nvarchar",
            Self::Binary => "binary",
            Self::VarBinary => "varbinary",
            Self::TinyInt => "tinyint",
            Self::SmallInt => "smallint",
            Self::Int => "int",
            Self::BigInt => "bigint",
            Self::Bit => "bit",
            Self::Decimal => "decimal",
            Self::Money => "money",
            Self::SmallMoney => "smallmoney",
            Self::Float => "float",
            Self::Real => "real",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::DateTime2 => "datetime2",
            Self::DateTimeOffset => "datetimeoffset",
            Self::Time => "time",
            Self::UniqueIdentifier => "uniqueidentifier",
            Self::Structured => "structured",
        }
    }
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// In-memory representation class of a mapped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Repr {
    Text,
    Binary,
    UInt8,
    Int16,
    Int32,
    Int64,
    Bool,
    Decimal,
    Float64,
    Float32,
    Date,
    DateTime,
    DateTimeOffset,
    Time,
    Guid,
    Table,
}

/// One encoded slot.
///
/// Each variant corresponds to a family of [`WireKind`]s; [`WireValue::Null`]
/// is the null marker for every kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WireValue {
    /// The null marker.
    #[default]
    Null,
    Text(String),
    Binary(Vec<u8>),
    TinyInt(u8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Bit(bool),
    /// Decimal, money, and small money.
    Decimal(Decimal),
    Float(f64),
    Real(f32),
    Date(NaiveDate),
    /// Both datetime kinds.
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Time(TimeDelta),
    Guid(Uuid),
    /// Rows of a structured (table-valued) slot.
    Table(RowSet),
}

impl WireValue {
    /// Returns `true` for the null marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short variant name used in kind-mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::TinyInt(_) => "tinyint",
            Self::SmallInt(_) => "smallint",
            Self::Int(_) => "int",
            Self::BigInt(_) => "bigint",
            Self::Bit(_) => "bit",
            Self::Decimal(_) => "decimal",
            Self::Float(_) => "float",
            Self::Real(_) => "real",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::DateTimeOffset(_) => "datetimeoffset",
            Self::Time(_) => "time",
            Self::Guid(_) => "uniqueidentifier",
            Self::Table(_) => "structured",
        }
    }

    /// Returns `true` if this value may occupy a slot declared as `kind`.
    ///
    /// The null marker fits every kind.
    pub fn fits(&self, kind: WireKind) -> bool {
        match self {
            Self::Null => true,
            Self::Text(_) => kind.is_text(),
            Self::Binary(_) => kind.is_binary(),
            Self::TinyInt(_) => kind == WireKind::TinyInt,
            Self::SmallInt(_) => kind == WireKind::SmallInt,
            Self::Int(_) => kind == WireKind::Int,
            Self::BigInt(_) => kind == WireKind::BigInt,
            Self::Bit(_) => kind == WireKind::Bit,
            Self::Decimal(_) => matches!(
                kind,
                WireKind::Decimal | WireKind::Money | WireKind::SmallMoney
            ),
            Self::Float(_) => kind == WireKind::Float,
            Self::Real(_) => kind == WireKind::Real,
            Self::Date(_) => kind == WireKind::Date,
            Self::DateTime(_) => matches!(kind, WireKind::DateTime | WireKind::DateTime2),
            Self::DateTimeOffset(_) => kind == WireKind::DateTimeOffset,
            Self::Time(_) => kind == WireKind::Time,
            Self::Guid(_) => kind == WireKind::UniqueIdentifier,
            Self::Table(_) => kind == WireKind::Structured,
        }
    }
}
