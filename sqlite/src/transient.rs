//! Retry classification for SQLite failures.

use rusqlite::ErrorCode;

use crate::error::SqliteError;

/// Returns `true` if `err` reports a busy or locked database.
///
/// Both clear once the competing connection finishes, so the same call is
/// expected to succeed when retried.
pub fn is_transient_sqlite(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

impl SqliteError {
    /// Returns `true` if this is a database error [`is_transient_sqlite`] accepts.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DatabaseError(err) if is_transient_sqlite(err))
    }
}
