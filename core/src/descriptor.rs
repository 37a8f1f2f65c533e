//! Mapping descriptors: static per-field wire metadata.
//!
//! A [`MappingDescriptor`] is created by the [`ModelMap`](crate::ModelMap)
//! builder when a model describes itself and never changes afterwards. It
//! records which property maps to which target name and wire kind, plus any
//! length, precision, scale, or table type name the kind needs.
//!
//! Target names are sigil-normalized: callers may write `"@Name"` or `"Name"`
//! and both map to the same target.

use crate::error::{MappingError, Result};
use crate::schema::ColumnSchema;
use crate::value::SourceType;
use crate::wire::{Repr, WireKind};

/// Characters accepted as a leading parameter sigil.
pub const SIGILS: [char; 3] = ['@', ':', '$'];

/// Removes any leading parameter sigil from `name`.
///
/// # Examples
///
/// ```
/// use tabmap_core::strip_sigil;
///
/// assert_eq!(strip_sigil("@Name"), "Name");
/// assert_eq!(strip_sigil("Name"), "Name");
/// ```
pub fn strip_sigil(name: &str) -> &str {
    name.trim_start_matches(SIGILS)
}

/// Returns `name` with exactly one leading `sigil`.
///
/// # Examples
///
/// ```
/// use tabmap_core::with_sigil;
///
/// assert_eq!(with_sigil("Name", '@'), "@Name");
/// assert_eq!(with_sigil("@Name", '@'), "@Name");
/// assert_eq!(with_sigil(":Name", '@'), "@Name");
/// ```
pub fn with_sigil(name: &str, sigil: char) -> String {
    format!("{sigil}{}", strip_sigil(name))
}

/// Static wire metadata for one mapped property.
///
/// # Examples
///
/// ```
/// use tabmap_core::{FieldValue, MappingDescriptor, WireKind};
///
/// let source = Option::<String>::source_type();
/// let mut desc = MappingDescriptor::new("name", "@Name", WireKind::NVarChar, source);
/// desc.length(255);
/// assert_eq!(desc.target, "Name");
/// assert!(desc.validate());
///
/// let wrong = MappingDescriptor::new("id", "Id", WireKind::BigInt, i32::source_type());
/// assert!(!wrong.validate());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MappingDescriptor {
    /// Rust property path (dotted for embedded models).
    pub property: String,
    /// Target name without sigil.
    pub target: String,
    /// Wire kind.
    pub kind: WireKind,
    /// Declared length; `-1` means unbounded.
    pub length: Option<i32>,
    /// Decimal precision.
    pub precision: Option<u8>,
    /// Decimal scale.
    pub scale: Option<u8>,
    /// Member of a composite group whose absence makes the group absent.
    pub required: bool,
    /// Table type name for structured kinds.
    pub type_name: Option<String>,
    /// Rust type of the property.
    pub source: SourceType,
}

impl MappingDescriptor {
    /// Creates a descriptor; `target` may carry a sigil.
    pub fn new(property: &str, target: &str, kind: WireKind, source: SourceType) -> Self {
        Self {
            property: property.to_string(),
            target: strip_sigil(target).to_string(),
            kind,
            length: None,
            precision: None,
            scale: None,
            required: true,
            type_name: None,
            source,
        }
    }

    /// Sets the declared length (`-1` for unbounded).
    pub fn length(&mut self, length: i32) -> &mut Self {
        self.length = Some(length);
        self
    }

    /// Sets decimal precision and scale.
    pub fn precision(&mut self, precision: u8, scale: u8) -> &mut Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Marks a composite member as optional.
    pub fn not_required(&mut self) -> &mut Self {
        self.required = false;
        self
    }

    /// Sets the table type name of a structured field.
    pub fn type_name(&mut self, type_name: &str) -> &mut Self {
        self.type_name = Some(type_name.to_string());
        self
    }

    /// Returns `true` if the source type may map to the wire kind.
    ///
    /// Accepts an exact representation match, an `Option` of one, or an enum
    /// adapted to a compatible integer or text representation.
    pub fn validate(&self) -> bool {
        if self.source.enumeration && !(self.kind.is_integer() || self.kind.is_text()) {
            return false;
        }
        self.kind.accepts(self.source.repr)
    }

    /// Validates the descriptor for `model`, returning the compile fault that
    /// names the offending property and kind.
    pub fn check(&self, model: &'static str) -> Result<()> {
        if !self.validate() {
            return Err(MappingError::InvalidSourceType {
                model,
                property: self.property.clone(),
                kind: self.kind,
                source_type: self.source.name,
            });
        }
        self.check_shape()
            .map_err(|reason| MappingError::InvalidDescriptor {
                model,
                property: self.property.clone(),
                kind: self.kind,
                reason,
            })
    }

    fn check_shape(&self) -> std::result::Result<(), String> {
        if self.target.is_empty() {
            return Err("target name is empty".to_string());
        }
        if self.kind.requires_length() {
            match self.length {
                None => return Err("a length is required".to_string()),
                Some(-1) if self.kind.is_fixed_length() => {
                    return Err("fixed-length kinds cannot be unbounded".to_string());
                }
                Some(n) if n == 0 || n < -1 => {
                    return Err(format!("length {n} is not positive"));
                }
                _ => {}
            }
        }
        if self.kind == WireKind::Decimal {
            match (self.precision, self.scale) {
                (Some(p), Some(s)) if (1..=38).contains(&p) && s <= p => {}
                (Some(p), Some(s)) => {
                    return Err(format!("precision {p} with scale {s} is out of range"));
                }
                _ => return Err("precision and scale are required".to_string()),
            }
        }
        if self.kind == WireKind::Structured && self.type_name.is_none() {
            return Err("a table type name is required".to_string());
        }
        Ok(())
    }

    /// Column schema for this descriptor.
    ///
    /// Money kinds report their implied precision and scale.
    pub fn column(&self) -> ColumnSchema {
        let (precision, scale) = match self.kind.implied_precision() {
            Some((p, s)) => (Some(p), Some(s)),
            None => (self.precision, self.scale),
        };
        ColumnSchema {
            name: self.target.clone(),
            kind: self.kind,
            length: self.length,
            precision,
            scale,
            type_name: self.type_name.clone(),
        }
    }

    /// Returns `true` if the field holds nested rows.
    pub fn is_structured(&self) -> bool {
        self.source.repr == Repr::Table
    }
}
