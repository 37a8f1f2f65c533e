//! Error types for the SQLite adapter.

use tabmap_core::{MappingError, WireKind};
use thiserror::Error;

/// Errors raised while moving mapped values through SQLite.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Failure inside the core mapper.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// A stored value could not be converted to or from its wire kind.
    #[error("conversion error in '{column}': {reason}")]
    ConversionError { column: String, reason: String },

    /// The wire kind has no SQLite storage form.
    #[error("column '{column}' has kind {kind}, which SQLite cannot store")]
    UnsupportedKind { column: String, kind: WireKind },

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only alphanumeric characters and underscores")]
    InvalidPrefix(String),

    /// Table name contains invalid characters.
    #[error("invalid table name '{0}': must contain only alphanumeric characters and underscores")]
    InvalidTableName(String),
}

impl SqliteError {
    pub(crate) fn conversion(column: &str, reason: impl Into<String>) -> Self {
        Self::ConversionError {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

/// Readers hand adapter failures back to the core as container errors.
impl From<SqliteError> for MappingError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Mapping(inner) => inner,
            other => MappingError::Container(Box::new(other)),
        }
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
