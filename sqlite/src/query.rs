//! Table-level access for one mapped model.
//!
//! [`MappedTable`] ties a compiled plan to a prefixed SQLite table whose
//! columns are the plan's output schema. Writes go through the plan's row
//! builder, reads through [`CompiledPlan::read`], so the table and the model
//! always agree on ordinal order.

use std::sync::Arc;

use rusqlite::{Connection, params_from_iter};
use tabmap_core::{CompiledPlan, Mapped, PlanCache, RowSet};
use tracing::debug;

use crate::convert::to_sql_value;
use crate::error::Result;
use crate::reader::SqliteReader;
use crate::schema::{create_table_sql, insert_sql, select_sql, validate_prefix, validate_table};

/// A prefixed SQLite table holding rows of `M`.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use tabmap_core::{Mapped, ModelMap, WireKind};
/// use tabmap_sqlite::MappedTable;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Tag {
///     id: i32,
///     label: Option<String>,
/// }
///
/// impl Mapped for Tag {
///     fn describe(map: &mut ModelMap<Self>) {
///         map.scalar("id", "Id", WireKind::Int, |m| &m.id, |m| &mut m.id);
///         map.scalar("label", "Label", WireKind::NVarChar, |m| &m.label, |m| &mut m.label)
///             .length(40);
///     }
/// }
///
/// let conn = Connection::open_in_memory().unwrap();
/// let tags = MappedTable::<Tag>::new(&conn, "app_", "tags").unwrap();
/// tags.create().unwrap();
/// tags.insert(&[Tag { id: 1, label: None }]).unwrap();
/// assert_eq!(tags.select_all().unwrap(), vec![Tag { id: 1, label: None }]);
/// ```
pub struct MappedTable<'a, M: Mapped> {
    conn: &'a Connection,
    prefix: String,
    table: String,
    plan: Arc<CompiledPlan<M>>,
}

impl<'a, M: Mapped> MappedTable<'a, M> {
    /// Opens `{prefix}{table}` using the plan from [`PlanCache::global`].
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix or table name is invalid, or the model
    /// fails to compile or cannot be laid out as rows.
    pub fn new(conn: &'a Connection, prefix: &str, table: &str) -> Result<Self> {
        let plan = PlanCache::global().plan::<M>()?;
        Self::with_plan(conn, prefix, table, plan)
    }

    /// Opens `{prefix}{table}` using an already compiled plan.
    pub fn with_plan(
        conn: &'a Connection,
        prefix: &str,
        table: &str,
        plan: Arc<CompiledPlan<M>>,
    ) -> Result<Self> {
        validate_prefix(prefix)?;
        validate_table(table)?;
        plan.row_builder()?;

        Ok(Self {
            conn,
            prefix: prefix.to_string(),
            table: table.to_string(),
            plan,
        })
    }

    /// Full table name including the prefix.
    pub fn name(&self) -> String {
        format!("{}{}", self.prefix, self.table)
    }

    pub fn plan(&self) -> &CompiledPlan<M> {
        &self.plan
    }

    /// Creates the table if it does not exist.
    pub fn create(&self) -> Result<()> {
        let sql = create_table_sql(&self.prefix, &self.table, self.plan.schema())?;
        self.conn.execute_batch(&sql)?;
        debug!(table = %self.name(), columns = self.plan.len(), "Created mapped table");
        Ok(())
    }

    /// Drops the table if it exists.
    pub fn drop_table(&self) -> Result<()> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {};", self.name()))?;
        Ok(())
    }

    /// Encodes `models` with the plan and inserts them in one transaction.
    ///
    /// Returns the number of rows inserted. Nothing is written if any model
    /// fails to encode.
    pub fn insert(&self, models: &[M]) -> Result<usize> {
        let rows = self.plan.to_rows(models)?;
        self.insert_rows(&rows)
    }

    /// Inserts prebuilt rows in one transaction.
    pub fn insert_rows(&self, rows: &RowSet) -> Result<usize> {
        let name = self.name();
        let columns = rows.schema().columns();
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&insert_sql(&name, rows.schema()))?;
            for row in rows.rows() {
                let values = row
                    .values()
                    .iter()
                    .zip(columns)
                    .map(|(value, column)| to_sql_value(&column.name, value))
                    .collect::<Result<Vec<_>>>()?;
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;

        debug!(table = %name, rows = rows.len(), "Inserted rows");
        Ok(rows.len())
    }

    /// Reads every row back into models, in storage order.
    pub fn select_all(&self) -> Result<Vec<M>> {
        let sql = select_sql(&self.name(), self.plan.schema());
        let mut reader = SqliteReader::query(self.conn, &sql, [])?;
        Ok(self.plan.read(&mut reader)?)
    }

    /// Number of rows in the table.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.name()), [], |row| {
                row.get(0)
            })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Deletes every row and returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn.execute(&format!("DELETE FROM {}", self.name()), [])?)
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        self.conn
    }
}
