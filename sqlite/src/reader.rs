//! [`RecordReader`] over SQLite query results.

use rusqlite::types::Value;
use rusqlite::{Connection, Params, Statement};
use tabmap_core::{MappingError, ParameterSet, RecordReader, WireKind, WireValue};

use crate::convert::from_sql_value;
use crate::error::Result;
use crate::params::bind_parameters;

/// Buffered result of one SQLite query.
///
/// Rows are fetched up front so the reader does not hold a statement borrow
/// while a plan decodes it. Column lookups try an exact name first and fall
/// back to an ASCII case-insensitive match, as SQLite identifiers are.
#[derive(Debug, Clone)]
pub struct SqliteReader {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
}

fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(str::to_string).collect()
}

fn read_row(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<Value>> {
    (0..width).map(|i| row.get::<_, Value>(i)).collect()
}

impl SqliteReader {
    /// Runs `sql` with positional or named `params` and buffers the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use rusqlite::Connection;
    /// use tabmap_core::{RecordReader, WireKind, WireValue};
    /// use tabmap_sqlite::SqliteReader;
    ///
    /// let conn = Connection::open_in_memory().unwrap();
    /// let mut reader = SqliteReader::query(&conn, "SELECT 7 AS Id", []).unwrap();
    /// assert!(reader.advance().unwrap());
    /// assert_eq!(reader.get(0, WireKind::Int).unwrap(), WireValue::Int(7));
    /// ```
    pub fn query<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Self> {
        let mut stmt = conn.prepare(sql)?;
        let columns = column_names(&stmt);
        let width = columns.len();
        let rows = stmt
            .query_map(params, |row| read_row(row, width))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Self::new(columns, rows))
    }

    /// Binds `params` to `stmt` by name, runs it, and buffers the result.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`bind_parameters`].
    pub fn with_parameters(stmt: &mut Statement<'_>, params: &ParameterSet) -> Result<Self> {
        bind_parameters(stmt, params)?;
        let columns = column_names(stmt);
        let width = columns.len();
        let mut buffered = Vec::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            buffered.push(read_row(row, width)?);
        }
        Ok(Self::new(columns, buffered))
    }

    fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        tracing::trace!(columns = columns.len(), rows = rows.len(), "Buffered query result");
        Self {
            columns,
            rows,
            position: None,
        }
    }

    /// Result column names in select order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of buffered rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn current(&self, ordinal: usize) -> tabmap_core::Result<&Value> {
        let row = self
            .position
            .and_then(|p| self.rows.get(p))
            .ok_or(MappingError::OrdinalOutOfRange { ordinal, width: 0 })?;
        row.get(ordinal).ok_or(MappingError::OrdinalOutOfRange {
            ordinal,
            width: row.len(),
        })
    }
}

impl RecordReader for SqliteReader {
    fn ordinal(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }

    fn advance(&mut self) -> tabmap_core::Result<bool> {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
    }

    fn is_null(&self, ordinal: usize) -> tabmap_core::Result<bool> {
        Ok(matches!(self.current(ordinal)?, Value::Null))
    }

    fn get(&self, ordinal: usize, kind: WireKind) -> tabmap_core::Result<WireValue> {
        let value = self.current(ordinal)?.clone();
        let column = self.columns.get(ordinal).map_or("", String::as_str);
        Ok(from_sql_value(column, value, kind)?)
    }
}
