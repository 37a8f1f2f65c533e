//! SQLite adapter for tabmap compiled plans.
//!
//! The core crate stays free of I/O and talks to storage through three
//! contracts: parameter sets, row sets, and [`RecordReader`]. This crate
//! implements them over `rusqlite`:
//!
//! - **`convert`**: wire value ↔ SQLite storage value, per wire kind
//! - **`params`**: binding a [`ParameterSet`] to a prepared statement by name
//! - **`reader`**: [`SqliteReader`], a buffered [`RecordReader`]
//! - **`schema`**: `CREATE TABLE` generation with customizable table prefixes
//! - **`query`**: [`MappedTable`], insert and select for one model
//!
//! # Quick start: tables
//!
//! ```no_run
//! use rusqlite::Connection;
//! use tabmap_core::{Mapped, ModelMap, WireKind};
//! use tabmap_sqlite::MappedTable;
//!
//! #[derive(Default)]
//! struct Visit {
//!     id: i64,
//!     page: Option<String>,
//! }
//!
//! impl Mapped for Visit {
//!     fn describe(map: &mut ModelMap<Self>) {
//!         map.scalar("id", "Id", WireKind::BigInt, |m| &m.id, |m| &mut m.id);
//!         map.scalar("page", "Page", WireKind::NVarChar, |m| &m.page, |m| &mut m.page)
//!             .length(-1);
//!     }
//! }
//!
//! let conn = Connection::open("visits.db").unwrap();
//! let visits = MappedTable::<Visit>::new(&conn, "web_", "visits").unwrap();
//! visits.create().unwrap();
//! visits.insert(&[Visit { id: 1, page: Some("/".into()) }]).unwrap();
//! println!("{} visits", visits.count().unwrap());
//! ```
//!
//! # Quick start: parameters
//!
//! ```no_run
//! use rusqlite::Connection;
//! # use tabmap_core::{Mapped, ModelMap, WireKind};
//! use tabmap_core::PlanCache;
//! use tabmap_sqlite::execute_parameters;
//! # #[derive(Default)]
//! # struct Visit { id: i64 }
//! # impl Mapped for Visit {
//! #     fn describe(map: &mut ModelMap<Self>) {
//! #         map.scalar("id", "@Id", WireKind::BigInt, |m| &m.id, |m| &mut m.id);
//! #     }
//! # }
//!
//! let conn = Connection::open("visits.db").unwrap();
//! let plan = PlanCache::global().plan::<Visit>().unwrap();
//! let params = plan.to_parameters(&Visit { id: 1 }).unwrap();
//! let mut stmt = conn.prepare("DELETE FROM web_visits WHERE Id = @Id").unwrap();
//! execute_parameters(&mut stmt, &params).unwrap();
//! ```
//!
//! # Table prefix customization
//!
//! All table names are prefixed with a configurable string, allowing multiple
//! isolated table sets within the same SQLite database. Prefixes must contain
//! only alphanumeric characters and underscores.
//!
//! [`RecordReader`]: tabmap_core::RecordReader
//! [`ParameterSet`]: tabmap_core::ParameterSet

mod convert;
mod error;
mod params;
mod query;
mod reader;
mod schema;
mod transient;

pub use convert::{from_sql_value, to_sql_value};
pub use error::{Result, SqliteError};
pub use params::{bind_parameters, execute_parameters};
pub use query::MappedTable;
pub use reader::SqliteReader;
pub use schema::{create_table_sql, sqlite_type};
pub use transient::is_transient_sqlite;
