//! Null/sentinel policy.
//!
//! Decides, per field, what "absent" means in memory and how it maps to the
//! wire null marker. The rule is derived once from the field's
//! [`SourceType`] at compile time:
//!
//! | Slot | Absent test | Absent in-memory form |
//! |---|---|---|
//! | `Option<String>` / `Option<Vec<u8>>` | `None` | `None` |
//! | any other `Option<T>` | `None` | `None` |
//! | `Uuid` | equals `Uuid::nil()` | `Uuid::nil()` |
//! | `f64` / `f32` | is NaN | NaN |
//! | any other scalar | never absent | n/a |
//!
//! All functions here are pure, and decoding the null marker never fails.

use serde::Serialize;
use uuid::Uuid;

use crate::value::{Primitive, SourceType};
use crate::wire::{Repr, WireValue};

/// Absence rule for one field.
///
/// # Examples
///
/// ```
/// use tabmap_core::{Absence, Primitive, Repr, SourceType};
///
/// let rule = Absence::for_source(&SourceType::plain("f64", Repr::Float64));
/// assert_eq!(rule, Absence::NotANumber);
/// assert!(rule.is_absent(Some(&Primitive::Float64(f64::NAN))));
/// assert!(!rule.is_absent(Some(&Primitive::Float64(1.5))));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Absence {
    /// Reference-like kind (text, binary) behind an `Option`.
    NullReference,
    /// Any other kind behind an `Option`.
    EmptyWrapper,
    /// Non-optional unique identifier; nil means absent.
    EmptyGuid,
    /// Non-optional floating point; NaN means absent.
    NotANumber,
    /// Always present.
    Never,
}

impl Absence {
    /// Derives the rule for a field's source type.
    pub fn for_source(source: &SourceType) -> Self {
        if source.optional {
            return match source.repr {
                Repr::Text | Repr::Binary => Self::NullReference,
                _ => Self::EmptyWrapper,
            };
        }
        match source.repr {
            Repr::Guid => Self::EmptyGuid,
            Repr::Float64 | Repr::Float32 => Self::NotANumber,
            _ => Self::Never,
        }
    }

    /// Returns `true` if `value` is this rule's absent form.
    ///
    /// `None` is the empty wrapper.
    pub fn is_absent(self, value: Option<&Primitive>) -> bool {
        match (self, value) {
            (_, None) => true,
            (Self::EmptyGuid, Some(Primitive::Guid(id))) => id.is_nil(),
            (Self::NotANumber, Some(Primitive::Float64(v))) => v.is_nan(),
            (Self::NotANumber, Some(Primitive::Float32(v))) => v.is_nan(),
            _ => false,
        }
    }

    /// Canonical absent in-memory form for a slot of representation `repr`.
    ///
    /// Wrapper rules yield `None`; sentinel rules yield the sentinel; slots
    /// that are never absent yield the representation's zero value.
    pub fn absent_form(self, repr: Repr) -> Option<Primitive> {
        match self {
            Self::NullReference | Self::EmptyWrapper => None,
            Self::EmptyGuid => Some(Primitive::Guid(Uuid::nil())),
            Self::NotANumber => match repr {
                Repr::Float32 => Some(Primitive::Float32(f32::NAN)),
                _ => Some(Primitive::Float64(f64::NAN)),
            },
            Self::Never => Primitive::zero(repr),
        }
    }
}

/// Outcome of applying the policy to an in-memory value before encoding.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    /// Write the null marker; the scalar encoder is not invoked.
    Null,
    /// Hand the value to the scalar encoder.
    Present(Primitive),
}

/// Applies `rule` to an adapted value on the way out.
pub(crate) fn encode_slot(rule: Absence, value: Option<Primitive>) -> Slot {
    match value {
        Some(p) if !rule.is_absent(Some(&p)) => Slot::Present(p),
        _ => Slot::Null,
    }
}

/// Outcome of applying the policy to a wire value before decoding.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Incoming {
    /// The null marker, already resolved to the rule's absent form.
    Absent(Option<Primitive>),
    /// A real value for the scalar decoder.
    Value(WireValue),
}

/// Resolves a wire value on the way in.
pub(crate) fn decode_slot(rule: Absence, repr: Repr, wire: WireValue) -> Incoming {
    match wire {
        WireValue::Null => Incoming::Absent(rule.absent_form(repr)),
        other => Incoming::Value(other),
    }
}
