//! Error types for plan compilation and execution.
//!
//! Provides a unified error type covering the three fault families a caller
//! can observe:
//!
//! - **compile faults**, raised the first time a plan is built for a model
//!   type and raised again on every retry until the model is fixed
//! - **encode/decode faults**, scoped to the single call that hit them
//! - **configuration faults**, from loading a [`MapperConfig`](crate::MapperConfig)
//!
//! Absent data is never an error; it is resolved by the
//! [`Absence`](crate::Absence) policy.

use thiserror::Error;

use crate::wire::WireKind;

/// Errors that can occur while compiling or executing a mapping plan.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The field's Rust type cannot be carried by the declared wire kind.
    #[error("{model}.{property}: type `{source_type}` cannot map to wire kind {kind}")]
    InvalidSourceType {
        model: &'static str,
        property: String,
        kind: WireKind,
        source_type: &'static str,
    },

    /// Length, precision, scale, or type name is missing or out of range.
    #[error("{model}.{property}: invalid {kind} descriptor: {reason}")]
    InvalidDescriptor {
        model: &'static str,
        property: String,
        kind: WireKind,
        reason: String,
    },

    /// A composite group declares the wrong number of members.
    #[error("{model}.{group}: composite group expects {expected} members, found {actual}")]
    MalformedGroup {
        model: &'static str,
        group: String,
        expected: usize,
        actual: usize,
    },

    /// Two fields target the same name and the config rejects duplicates.
    #[error("{model}: target '{target}' is declared by both {first} and {duplicate}")]
    DuplicateTarget {
        model: &'static str,
        target: String,
        first: String,
        duplicate: String,
    },

    /// A model embeds itself, directly or through another model.
    #[error("{model}: {nested} is embedded recursively")]
    RecursiveModel {
        model: &'static str,
        nested: &'static str,
    },

    /// The plan has a column that row construction cannot carry.
    #[error("{model}.{property}: wire kind {kind} cannot be used in row construction")]
    UnsupportedInRows {
        model: &'static str,
        property: String,
        kind: WireKind,
    },

    /// A present value could not be encoded under its declared kind.
    #[error("{field}: cannot encode as {kind}: {reason}")]
    Encode {
        field: String,
        kind: WireKind,
        reason: String,
    },

    /// The wire value does not match the column's declared kind.
    #[error("{field}: expected {expected} value, found {actual}")]
    KindMismatch {
        field: String,
        expected: WireKind,
        actual: &'static str,
    },

    /// A recomposed composite value carries the wrong origin discriminator.
    #[error("{field}: composite origin mismatch, expected '{expected}', found '{actual}'")]
    OriginMismatch {
        field: String,
        expected: char,
        actual: char,
    },

    /// A wire value could not be turned back into the field's Rust type.
    #[error("{field}: {reason}")]
    Decode { field: String, reason: String },

    /// The parameter source has no slot for a planned field.
    #[error("no parameter slot named '{0}'")]
    MissingSlot(String),

    /// The result being read has no column for a planned field.
    #[error("column '{0}' is not present in the result")]
    MissingColumn(String),

    /// A row write referenced an ordinal past the fixed column count.
    #[error("ordinal {ordinal} is out of range for a row of {width} columns")]
    OrdinalOutOfRange { ordinal: usize, width: usize },

    /// Failure reported by an external container implementation.
    #[error("container error: {0}")]
    Container(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// File I/O failure while loading or saving configuration.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl MappingError {
    /// Returns `true` for faults raised while compiling a plan.
    ///
    /// Compile faults are never cached; every later request for the same type
    /// compiles again and reports the same fault.
    pub fn is_compile_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidSourceType { .. }
                | Self::InvalidDescriptor { .. }
                | Self::MalformedGroup { .. }
                | Self::DuplicateTarget { .. }
                | Self::RecursiveModel { .. }
                | Self::UnsupportedInRows { .. }
        )
    }
}

/// Convenience alias for results with [`MappingError`].
pub type Result<T> = std::result::Result<T, MappingError>;
