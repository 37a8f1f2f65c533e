//! SQL generation for mapped tables with customizable table prefixes.
//!
//! A plan's [`OutputSchema`] is rendered as a plain SQLite table: one column
//! per schema column, in ordinal order, named exactly as the schema names it.
//! The declared type is the storage class chosen in [`crate::convert`].
//!
//! # Custom prefix
//!
//! Prefixes must contain only alphanumeric characters and underscores.
//! This enables multiple isolated table sets (e.g., `prod_`, `test_`)
//! within the same SQLite database.

use tabmap_core::{OutputSchema, WireKind};

use crate::error::{Result, SqliteError};

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Validates that a table prefix contains only alphanumeric characters and underscores.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if !is_identifier(prefix) {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_table(table: &str) -> Result<()> {
    if !is_identifier(table) {
        return Err(SqliteError::InvalidTableName(table.to_string()));
    }
    Ok(())
}

/// Quotes a column name as an SQLite identifier.
pub(crate) fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite column type used to store `kind`, or `None` for `structured`.
pub fn sqlite_type(kind: WireKind) -> Option<&'static str> {
    match kind {
        WireKind::TinyInt
        | WireKind::SmallInt
        | WireKind::Int
        | WireKind::BigInt
        | WireKind::Bit
        | WireKind::Time => Some("INTEGER"),
        WireKind::Float | WireKind::Real => Some("REAL"),
        WireKind::Char
        | WireKind::VarChar
        | WireKind::NChar
        | WireKind::NVarChar
        | WireKind::Decimal
        | WireKind::Money
        | WireKind::SmallMoney
        | WireKind::Date
        | WireKind::DateTime
        | WireKind::DateTime2
        | WireKind::DateTimeOffset => Some("TEXT"),
        WireKind::Binary | WireKind::VarBinary | WireKind::UniqueIdentifier => Some("BLOB"),
        WireKind::Structured => None,
    }
}

/// Generates a `CREATE TABLE IF NOT EXISTS` statement for `schema`.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] or [`SqliteError::InvalidTableName`]
/// for names with characters other than alphanumerics and underscores, and
/// [`SqliteError::UnsupportedKind`] if a column is `structured`.
///
/// # Examples
///
/// ```
/// use tabmap_core::{ColumnSchema, OutputSchema, WireKind};
/// use tabmap_sqlite::create_table_sql;
///
/// let schema = OutputSchema::new(vec![
///     ColumnSchema::new("Id", WireKind::Int),
///     ColumnSchema::new("Name", WireKind::NVarChar),
/// ]);
/// let sql = create_table_sql("app_", "contacts", &schema).unwrap();
/// assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS app_contacts ("));
/// assert!(sql.contains("\"Name\" TEXT"));
/// ```
pub fn create_table_sql(prefix: &str, table: &str, schema: &OutputSchema) -> Result<String> {
    validate_prefix(prefix)?;
    validate_table(table)?;

    let columns = schema
        .columns()
        .iter()
        .map(|column| {
            let ty = sqlite_type(column.kind).ok_or_else(|| SqliteError::UnsupportedKind {
                column: column.name.clone(),
                kind: column.kind,
            })?;
            Ok(format!("    {} {ty}", quote(&column.name)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {prefix}{table} (\n{}\n);\n",
        columns.join(",\n")
    ))
}

/// Generates a positional `INSERT` covering every column of `schema`.
pub(crate) fn insert_sql(table: &str, schema: &OutputSchema) -> String {
    let names: Vec<String> = schema.columns().iter().map(|c| quote(&c.name)).collect();
    let slots: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        names.join(", "),
        slots.join(", ")
    )
}

/// Generates a `SELECT` of every column of `schema` in ordinal order.
pub(crate) fn select_sql(table: &str, schema: &OutputSchema) -> String {
    let names: Vec<String> = schema.columns().iter().map(|c| quote(&c.name)).collect();
    format!("SELECT {} FROM {table}", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabmap_core::ColumnSchema;

    fn schema() -> OutputSchema {
        OutputSchema::new(vec![
            ColumnSchema::new("Id", WireKind::Int),
            ColumnSchema::new("Price", WireKind::Money),
            ColumnSchema::new("At", WireKind::Time),
            ColumnSchema::new("Key", WireKind::UniqueIdentifier),
        ])
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("app_").is_ok());
        assert!(validate_prefix("v2").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("a-b").is_err());
        assert!(validate_prefix("x; DROP TABLE y").is_err());
    }

    #[test]
    fn test_create_table_sql_uses_storage_classes() {
        let sql = create_table_sql("t_", "items", &schema()).unwrap();
        assert!(sql.contains("\"Id\" INTEGER"));
        assert!(sql.contains("\"Price\" TEXT"));
        assert!(sql.contains("\"At\" INTEGER"));
        assert!(sql.contains("\"Key\" BLOB"));
    }

    #[test]
    fn test_create_table_sql_rejects_bad_names() {
        assert!(matches!(
            create_table_sql("t_", "bad name", &schema()),
            Err(SqliteError::InvalidTableName(_))
        ));
        assert!(matches!(
            create_table_sql("t-", "items", &schema()),
            Err(SqliteError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_create_table_sql_rejects_structured() {
        let schema = OutputSchema::new(vec![ColumnSchema::new("Lines", WireKind::Structured)]);
        assert!(matches!(
            create_table_sql("t_", "orders", &schema),
            Err(SqliteError::UnsupportedKind { .. })
        ));
    }

    #[test]
    fn test_insert_and_select_follow_ordinals() {
        assert_eq!(
            insert_sql("t_items", &schema()),
            "INSERT INTO t_items (\"Id\", \"Price\", \"At\", \"Key\") VALUES (?1, ?2, ?3, ?4)"
        );
        assert_eq!(
            select_sql("t_items", &schema()),
            "SELECT \"Id\", \"Price\", \"At\", \"Key\" FROM t_items"
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b"), "\"a\"\"b\"");
    }
}
