//! In-memory field values and their adaptation to a shared representation.
//!
//! Every mapped Rust type implements [`FieldValue`], which converts it to and
//! from a [`Primitive`]. The codec for a wire kind only ever sees primitives,
//! so an enum and its underlying integer share one encoder. Enums opt in via
//! [`WireEnum`] and the [`wire_enum!`](crate::wire_enum) macro.
//!
//! `Option<T>` is the explicit optional wrapper: `None` is the only form of
//! absence it adds. Sentinel absence (nil GUID, NaN) is decided by the
//! [`Absence`](crate::Absence) policy, not here.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::wire::Repr;

/// A field value after enum/newtype adaptation.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Text(String),
    Binary(Vec<u8>),
    UInt8(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Bool(bool),
    Decimal(Decimal),
    Float64(f64),
    Float32(f32),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Time(TimeDelta),
    Guid(Uuid),
}

impl Primitive {
    /// Representation class of this value.
    pub fn repr(&self) -> Repr {
        match self {
            Self::Text(_) => Repr::Text,
            Self::Binary(_) => Repr::Binary,
            Self::UInt8(_) => Repr::UInt8,
            Self::Int16(_) => Repr::Int16,
            Self::Int32(_) => Repr::Int32,
            Self::Int64(_) => Repr::Int64,
            Self::Bool(_) => Repr::Bool,
            Self::Decimal(_) => Repr::Decimal,
            Self::Float64(_) => Repr::Float64,
            Self::Float32(_) => Repr::Float32,
            Self::Date(_) => Repr::Date,
            Self::DateTime(_) => Repr::DateTime,
            Self::DateTimeOffset(_) => Repr::DateTimeOffset,
            Self::Time(_) => Repr::Time,
            Self::Guid(_) => Repr::Guid,
        }
    }

    /// Zero value of a representation, used when the null marker reaches a
    /// slot that has no absent form.
    ///
    /// Returns `None` for [`Repr::Table`], which has no primitive form.
    pub fn zero(repr: Repr) -> Option<Self> {
        Some(match repr {
            Repr::Text => Self::Text(String::new()),
            Repr::Binary => Self::Binary(Vec::new()),
            Repr::UInt8 => Self::UInt8(0),
            Repr::Int16 => Self::Int16(0),
            Repr::Int32 => Self::Int32(0),
            Repr::Int64 => Self::Int64(0),
            Repr::Bool => Self::Bool(false),
            Repr::Decimal => Self::Decimal(Decimal::ZERO),
            Repr::Float64 => Self::Float64(0.0),
            Repr::Float32 => Self::Float32(0.0),
            Repr::Date => Self::Date(NaiveDate::default()),
            Repr::DateTime => Self::DateTime(NaiveDateTime::default()),
            Repr::DateTimeOffset => Self::DateTimeOffset(DateTime::<FixedOffset>::default()),
            Repr::Time => Self::Time(TimeDelta::zero()),
            Repr::Guid => Self::Guid(Uuid::nil()),
            Repr::Table => return None,
        })
    }
}

/// Static description of a field's Rust type, checked against its wire kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceType {
    /// Rust type name for diagnostics.
    pub name: &'static str,
    /// Representation the type adapts to.
    pub repr: Repr,
    /// Wrapped in `Option`.
    pub optional: bool,
    /// An enum adapted through [`WireEnum`].
    pub enumeration: bool,
}

impl SourceType {
    /// Describes a plain (non-optional, non-enum) type.
    pub const fn plain(name: &'static str, repr: Repr) -> Self {
        Self {
            name,
            repr,
            optional: false,
            enumeration: false,
        }
    }
}

/// A Rust type that can occupy a mapped field.
///
/// `to_primitive` returns `None` only when an `Option` wrapper is empty.
/// `from_primitive` receives `None` only for wrapper types; the sentinel policy
/// substitutes a concrete value for every other slot.
pub trait FieldValue: Sized + Send + Sync + 'static {
    /// Describes the type for descriptor validation.
    fn source_type() -> SourceType;

    /// Adapts the value to its primitive representation.
    fn to_primitive(&self) -> Option<Primitive>;

    /// Rebuilds the value from its primitive representation.
    fn from_primitive(value: Option<Primitive>) -> Result<Self, String>;
}

fn unexpected(expected: Repr, found: Option<&Primitive>) -> String {
    match found {
        Some(p) => format!("expected {expected:?} primitive, found {:?}", p.repr()),
        None => format!("expected {expected:?} primitive, found absent"),
    }
}

macro_rules! primitive_field {
    ($($ty:ty => $variant:ident, $repr:ident;)*) => {
        $(
            impl FieldValue for $ty {
                fn source_type() -> SourceType {
                    SourceType::plain(std::any::type_name::<$ty>(), Repr::$repr)
                }

                fn to_primitive(&self) -> Option<Primitive> {
                    Some(Primitive::$variant(self.clone()))
                }

                fn from_primitive(value: Option<Primitive>) -> Result<Self, String> {
                    match value {
                        Some(Primitive::$variant(v)) => Ok(v),
                        other => Err(unexpected(Repr::$repr, other.as_ref())),
                    }
                }
            }
        )*
    };
}

primitive_field! {
    String => Text, Text;
    Vec<u8> => Binary, Binary;
    u8 => UInt8, UInt8;
    i16 => Int16, Int16;
    i32 => Int32, Int32;
    i64 => Int64, Int64;
    bool => Bool, Bool;
    Decimal => Decimal, Decimal;
    f64 => Float64, Float64;
    f32 => Float32, Float32;
    NaiveDate => Date, Date;
    NaiveDateTime => DateTime, DateTime;
    DateTime<FixedOffset> => DateTimeOffset, DateTimeOffset;
    TimeDelta => Time, Time;
    Uuid => Guid, Guid;
}

impl FieldValue for char {
    fn source_type() -> SourceType {
        SourceType::plain("char", Repr::Text)
    }

    fn to_primitive(&self) -> Option<Primitive> {
        Some(Primitive::Text(self.to_string()))
    }

    fn from_primitive(value: Option<Primitive>) -> Result<Self, String> {
        match value {
            Some(Primitive::Text(s)) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    (None, _) => Ok('\0'),
                    _ => Err(format!("expected a single character, found {s:?}")),
                }
            }
            other => Err(unexpected(Repr::Text, other.as_ref())),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn source_type() -> SourceType {
        SourceType {
            optional: true,
            ..T::source_type()
        }
    }

    fn to_primitive(&self) -> Option<Primitive> {
        self.as_ref().and_then(T::to_primitive)
    }

    fn from_primitive(value: Option<Primitive>) -> Result<Self, String> {
        match value {
            None => Ok(None),
            some => T::from_primitive(some).map(Some),
        }
    }
}

/// An enum carried on the wire as its underlying integer or text value.
///
/// Implement this and invoke [`wire_enum!`](crate::wire_enum) to make the enum
/// a [`FieldValue`].
///
/// # Examples
///
/// ```
/// use tabmap_core::{FieldValue, WireEnum, wire_enum};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Status { Open, Closed }
///
/// impl WireEnum for Status {
///     type Repr = i16;
///     fn to_repr(&self) -> i16 { *self as i16 }
///     fn from_repr(repr: i16) -> Option<Self> {
///         match repr { 0 => Some(Self::Open), 1 => Some(Self::Closed), _ => None }
///     }
/// }
/// wire_enum!(Status);
///
/// assert!(Status::source_type().enumeration);
/// ```
pub trait WireEnum: Sized + Send + Sync + 'static {
    /// Underlying representation, an integer or `String`.
    type Repr: FieldValue;

    /// Converts to the underlying value.
    fn to_repr(&self) -> Self::Repr;

    /// Converts back, returning `None` for unknown values.
    fn from_repr(repr: Self::Repr) -> Option<Self>;
}

/// Implements [`FieldValue`] for a type implementing [`WireEnum`].
#[macro_export]
macro_rules! wire_enum {
    ($ty:ty) => {
        impl $crate::FieldValue for $ty {
            fn source_type() -> $crate::SourceType {
                $crate::SourceType {
                    name: ::std::any::type_name::<$ty>(),
                    enumeration: true,
                    ..<<$ty as $crate::WireEnum>::Repr as $crate::FieldValue>::source_type()
                }
            }

            fn to_primitive(&self) -> ::std::option::Option<$crate::Primitive> {
                $crate::FieldValue::to_primitive(&$crate::WireEnum::to_repr(self))
            }

            fn from_primitive(
                value: ::std::option::Option<$crate::Primitive>,
            ) -> ::std::result::Result<Self, ::std::string::String> {
                let repr =
                    <<$ty as $crate::WireEnum>::Repr as $crate::FieldValue>::from_primitive(value)?;
                <$ty as $crate::WireEnum>::from_repr(repr)
                    .ok_or_else(|| format!("no {} variant for the stored value", stringify!($ty)))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Color {
        Red,
        Green,
    }

    impl WireEnum for Color {
        type Repr = i32;

        fn to_repr(&self) -> i32 {
            *self as i32
        }

        fn from_repr(repr: i32) -> Option<Self> {
            match repr {
                0 => Some(Self::Red),
                1 => Some(Self::Green),
                _ => None,
            }
        }
    }

    crate::wire_enum!(Color);

    #[test]
    fn test_option_source_type_is_optional() {
        let source = Option::<i32>::source_type();
        assert!(source.optional);
        assert_eq!(source.repr, Repr::Int32);
    }

    #[test]
    fn test_empty_option_has_no_primitive() {
        assert_eq!(Option::<String>::None.to_primitive(), None);
        assert_eq!(Option::<String>::from_primitive(None), Ok(None));
    }

    #[test]
    fn test_enum_adapts_to_underlying_repr() {
        let source = Color::source_type();
        assert!(source.enumeration);
        assert_eq!(source.repr, Repr::Int32);
        assert_eq!(Color::Green.to_primitive(), Some(Primitive::Int32(1)));
        assert_eq!(
            Color::from_primitive(Some(Primitive::Int32(0))),
            Ok(Color::Red)
        );
        assert!(Color::from_primitive(Some(Primitive::Int32(7))).is_err());
    }

    #[test]
    fn test_char_rejects_multi_character_text() {
        assert_eq!(
            char::from_primitive(Some(Primitive::Text("x".into()))),
            Ok('x')
        );
        assert!(char::from_primitive(Some(Primitive::Text("xy".into()))).is_err());
    }

    #[test]
    fn test_plain_type_rejects_wrong_primitive() {
        assert!(i64::from_primitive(Some(Primitive::Int32(1))).is_err());
        assert!(i64::from_primitive(None).is_err());
    }
}
