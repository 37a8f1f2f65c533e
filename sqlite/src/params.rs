//! Binding parameter sets to prepared statements.
//!
//! SQLite accepts `@name`, `:name` and `$name` parameters, which covers every
//! sigil a plan can be configured with. A set built under one sigil binds to
//! statements written with the same sigil.

use std::collections::HashSet;

use rusqlite::Statement;
use tabmap_core::{Direction, MappingError, ParameterSet};
use tracing::{debug, trace};

use crate::convert::to_sql_value;
use crate::error::Result;

/// Binds every input slot of `params` to the statement parameter of the same
/// name and returns how many were bound.
///
/// Output-only slots and slots the statement does not mention are skipped.
///
/// # Errors
///
/// Returns [`MappingError::MissingSlot`] (wrapped in
/// [`SqliteError::Mapping`](crate::SqliteError::Mapping)) if the statement
/// has a parameter that no slot fills, so nothing is silently bound as
/// `NULL`. Conversion and SQLite failures are returned as-is.
pub fn bind_parameters(stmt: &mut Statement<'_>, params: &ParameterSet) -> Result<usize> {
    let mut bound = HashSet::new();
    for parameter in params {
        if parameter.direction == Direction::Output {
            continue;
        }
        let Some(index) = stmt.parameter_index(&parameter.name)? else {
            trace!(parameter = %parameter.name, "Statement has no slot for parameter");
            continue;
        };
        let value = to_sql_value(&parameter.column.name, &parameter.value)?;
        stmt.raw_bind_parameter(index, value)?;
        bound.insert(index);
    }

    for index in 1..=stmt.parameter_count() {
        if !bound.contains(&index) {
            let name = stmt
                .parameter_name(index)
                .map_or_else(|| format!("?{index}"), str::to_string);
            return Err(MappingError::MissingSlot(name).into());
        }
    }

    debug!(bound = bound.len(), slots = params.len(), "Bound parameters");
    Ok(bound.len())
}

/// Binds `params` and executes a statement that returns no rows.
///
/// Returns the number of rows changed.
pub fn execute_parameters(stmt: &mut Statement<'_>, params: &ParameterSet) -> Result<usize> {
    bind_parameters(stmt, params)?;
    Ok(stmt.raw_execute()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteError;
    use rusqlite::Connection;
    use tabmap_core::{ColumnSchema, Parameter, ParameterSink, WireKind, WireValue};

    fn set(entries: &[(&str, Direction, WireValue)]) -> ParameterSet {
        let mut set = ParameterSet::new('@');
        for (name, direction, value) in entries {
            set.push_parameter(Parameter::new(
                (*name).to_string(),
                ColumnSchema::new(name.trim_start_matches('@'), WireKind::Int),
                *direction,
                value.clone(),
            ))
            .unwrap();
        }
        set
    }

    #[test]
    fn test_binds_by_name_in_any_order() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT @B - @A").unwrap();
        let params = set(&[
            ("@A", Direction::Input, WireValue::Int(2)),
            ("@B", Direction::Input, WireValue::Int(10)),
        ]);
        assert_eq!(bind_parameters(&mut stmt, &params).unwrap(), 2);
        let mut rows = stmt.raw_query();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row.get::<_, i64>(0).unwrap(), 8);
    }

    #[test]
    fn test_skips_output_and_unused_slots() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT @A").unwrap();
        let params = set(&[
            ("@A", Direction::InputOutput, WireValue::Int(1)),
            ("@Out", Direction::Output, WireValue::Null),
            ("@Unused", Direction::Input, WireValue::Int(3)),
        ]);
        assert_eq!(bind_parameters(&mut stmt, &params).unwrap(), 1);
    }

    #[test]
    fn test_unfilled_statement_parameter_is_missing_slot() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT @A, @B").unwrap();
        let params = set(&[("@A", Direction::Input, WireValue::Int(1))]);
        let err = bind_parameters(&mut stmt, &params).unwrap_err();
        assert!(matches!(
            err,
            SqliteError::Mapping(MappingError::MissingSlot(name)) if name == "@B"
        ));
    }
}
