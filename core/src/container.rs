//! Parameter and row containers.
//!
//! Plans write into and read from these shapes:
//!
//! - [`ParameterSet`]: named, ordered parameter slots with a direction
//! - [`RowSet`]: rows of fixed width over a shared [`OutputSchema`]
//! - [`RecordReader`]: a forward-only result cursor
//!
//! External driver adapters implement [`ParameterSink`], [`ParameterSource`],
//! and [`RecordReader`] over their own types.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::descriptor::{SIGILS, strip_sigil, with_sigil};
use crate::error::{MappingError, Result};
use crate::schema::{ColumnSchema, OutputSchema};
use crate::wire::{WireKind, WireValue};

/// Direction of a parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
    InputOutput,
}

/// One named parameter slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Name including the sigil, e.g. `@Name`.
    pub name: String,
    pub column: ColumnSchema,
    pub direction: Direction,
    pub value: WireValue,
}

impl Parameter {
    pub fn new(name: String, column: ColumnSchema, direction: Direction, value: WireValue) -> Self {
        Self {
            name,
            column,
            direction,
            value,
        }
    }
}

/// Receives parameters produced by a plan.
pub trait ParameterSink {
    fn push_parameter(&mut self, parameter: Parameter) -> Result<()>;
}

/// Supplies populated slots to a plan.
///
/// Lookups receive the bare target name; implementations decide how sigils
/// and case are matched.
pub trait ParameterSource {
    fn parameter_value(&self, name: &str) -> Option<&WireValue>;
}

fn slot_key(name: &str) -> String {
    strip_sigil(name).to_ascii_lowercase()
}

/// Ordered collection of parameters, addressable by name.
///
/// Names are matched without their sigil and without regard to ASCII case.
///
/// # Examples
///
/// ```
/// use tabmap_core::{
///     ColumnSchema, Direction, Parameter, ParameterSet, ParameterSink, WireKind, WireValue,
/// };
///
/// let mut set = ParameterSet::new('@');
/// set.push_parameter(Parameter::new(
///     "@Id".to_string(),
///     ColumnSchema::new("Id", WireKind::Int),
///     Direction::Input,
///     WireValue::Int(7),
/// )).unwrap();
///
/// assert_eq!(set.get("id").map(|p| &p.value), Some(&WireValue::Int(7)));
/// assert_eq!(set.get(":Id").map(|p| p.name.as_str()), Some("@Id"));
/// ```
#[derive(Debug, Clone)]
pub struct ParameterSet {
    sigil: char,
    parameters: Vec<Parameter>,
    index: HashMap<String, usize>,
}

impl Default for ParameterSet {
    /// Empty set naming its slots with the default `@` sigil.
    fn default() -> Self {
        Self::new(SIGILS[0])
    }
}

impl ParameterSet {
    pub fn new(sigil: char) -> Self {
        Self::with_capacity(sigil, 0)
    }

    pub fn with_capacity(sigil: char, capacity: usize) -> Self {
        Self {
            sigil,
            parameters: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Sigil used for names of parameters added by plans.
    pub fn sigil(&self) -> char {
        self.sigil
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(&slot_key(name)).map(|&i| &self.parameters[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.index
            .get(&slot_key(name))
            .map(|&i| &mut self.parameters[i])
    }

    /// Populates a slot, e.g. with a value returned by the database.
    ///
    /// The value must fit the slot's declared kind.
    pub fn set_value(&mut self, name: &str, value: WireValue) -> Result<()> {
        let parameter = self
            .get_mut(name)
            .ok_or_else(|| MappingError::MissingSlot(name.to_string()))?;
        if !value.fits(parameter.column.kind) {
            return Err(MappingError::KindMismatch {
                field: parameter.name.clone(),
                expected: parameter.column.kind,
                actual: value.kind_name(),
            });
        }
        parameter.value = value;
        Ok(())
    }

    /// Parameters in plan order.
    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }

    pub fn into_vec(self) -> Vec<Parameter> {
        self.parameters
    }
}

impl ParameterSink for ParameterSet {
    /// Appends a parameter. A parameter with the same name replaces the
    /// earlier one in place.
    fn push_parameter(&mut self, mut parameter: Parameter) -> Result<()> {
        parameter.name = with_sigil(&parameter.name, self.sigil);
        let key = slot_key(&parameter.name);
        match self.index.get(&key) {
            Some(&i) => self.parameters[i] = parameter,
            None => {
                self.index.insert(key, self.parameters.len());
                self.parameters.push(parameter);
            }
        }
        Ok(())
    }
}

impl ParameterSource for ParameterSet {
    fn parameter_value(&self, name: &str) -> Option<&WireValue> {
        self.get(name).map(|p| &p.value)
    }
}

/// Plain name-to-value map; keys may carry a sigil.
impl ParameterSource for HashMap<String, WireValue> {
    fn parameter_value(&self, name: &str) -> Option<&WireValue> {
        let key = strip_sigil(name);
        self.iter()
            .find(|(k, _)| strip_sigil(k).eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

/// One row of a [`RowSet`]; every slot starts as the null marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: Arc<OutputSchema>,
    values: Box<[WireValue]>,
}

impl Row {
    fn new(schema: Arc<OutputSchema>) -> Self {
        let values = vec![WireValue::Null; schema.len()].into_boxed_slice();
        Self { schema, values }
    }

    /// Sets the slot at `ordinal`. The value must fit the column's kind.
    pub fn set(&mut self, ordinal: usize, value: WireValue) -> Result<()> {
        let column = self
            .schema
            .get(ordinal)
            .ok_or(MappingError::OrdinalOutOfRange {
                ordinal,
                width: self.values.len(),
            })?;
        if !value.fits(column.kind) {
            return Err(MappingError::KindMismatch {
                field: column.name.clone(),
                expected: column.kind,
                actual: value.kind_name(),
            });
        }
        self.values[ordinal] = value;
        Ok(())
    }

    pub fn set_null(&mut self, ordinal: usize) -> Result<()> {
        self.set(ordinal, WireValue::Null)
    }

    pub fn get(&self, ordinal: usize) -> Option<&WireValue> {
        self.values.get(ordinal)
    }

    pub fn values(&self) -> &[WireValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows sharing one column schema.
///
/// Column order follows plan ordinal order and never changes once the set is
/// created.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    schema: Arc<OutputSchema>,
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new(schema: Arc<OutputSchema>) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    /// Creates an all-null row shaped for this set. It is not added until
    /// [`push`](Self::push) is called.
    pub fn new_row(&self) -> Row {
        Row::new(Arc::clone(&self.schema))
    }

    /// Appends a row created by [`new_row`](Self::new_row) on a set with the
    /// same schema.
    pub fn push(&mut self, row: Row) -> Result<()> {
        if row.schema != self.schema {
            return Err(MappingError::OrdinalOutOfRange {
                ordinal: row.len(),
                width: self.schema.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn reader(&self) -> RowSetReader<'_> {
        RowSetReader::new(self)
    }

    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub(crate) fn from_rows(schema: Arc<OutputSchema>, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }
}

/// Forward-only cursor over a result.
///
/// The cursor starts before the first record; call [`advance`](Self::advance)
/// before reading.
pub trait RecordReader {
    /// Ordinal of the column called `name`, if present.
    fn ordinal(&self, name: &str) -> Option<usize>;

    /// Moves to the next record; `false` once exhausted.
    fn advance(&mut self) -> Result<bool>;

    fn is_null(&self, ordinal: usize) -> Result<bool>;

    /// Reads the current record's value at `ordinal` as `kind`.
    fn get(&self, ordinal: usize, kind: WireKind) -> Result<WireValue>;
}

/// [`RecordReader`] over an in-memory [`RowSet`].
#[derive(Debug)]
pub struct RowSetReader<'a> {
    set: &'a RowSet,
    position: Option<usize>,
}

impl<'a> RowSetReader<'a> {
    pub fn new(set: &'a RowSet) -> Self {
        Self {
            set,
            position: None,
        }
    }

    fn current(&self, ordinal: usize) -> Result<&'a WireValue> {
        let set: &'a RowSet = self.set;
        let row = self
            .position
            .and_then(|p| set.rows.get(p))
            .ok_or(MappingError::OrdinalOutOfRange {
                ordinal,
                width: 0,
            })?;
        row.get(ordinal).ok_or(MappingError::OrdinalOutOfRange {
            ordinal,
            width: row.len(),
        })
    }
}

impl RecordReader for RowSetReader<'_> {
    fn ordinal(&self, name: &str) -> Option<usize> {
        self.set.schema.position(name)
    }

    fn advance(&mut self) -> Result<bool> {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next.min(self.set.rows.len()));
        Ok(next < self.set.rows.len())
    }

    fn is_null(&self, ordinal: usize) -> Result<bool> {
        Ok(self.current(ordinal)?.is_null())
    }

    fn get(&self, ordinal: usize, kind: WireKind) -> Result<WireValue> {
        let value = self.current(ordinal)?;
        if !value.fits(kind) {
            return Err(MappingError::KindMismatch {
                field: self.set.schema.get(ordinal).map_or_else(String::new, |c| c.name.clone()),
                expected: kind,
                actual: value.kind_name(),
            });
        }
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<OutputSchema> {
        Arc::new(OutputSchema::new(vec![
            ColumnSchema::new("Id", WireKind::Int),
            ColumnSchema::new("Name", WireKind::NVarChar),
        ]))
    }

    fn param(name: &str, value: WireValue) -> Parameter {
        Parameter::new(
            name.to_string(),
            ColumnSchema::new(strip_sigil(name), WireKind::Int),
            Direction::Input,
            value,
        )
    }

    #[test]
    fn test_parameter_set_normalizes_sigil() {
        let mut set = ParameterSet::new('@');
        set.push_parameter(param("Id", WireValue::Int(1))).unwrap();
        set.push_parameter(param(":Other", WireValue::Null)).unwrap();

        let names: Vec<_> = set.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["@Id", "@Other"]);
        assert!(set.get("$ID").is_some());
    }

    #[test]
    fn test_default_set_uses_at_sigil() {
        let mut set = ParameterSet::default();
        assert_eq!(set.sigil(), '@');
        set.push_parameter(param("Id", WireValue::Int(1))).unwrap();
        assert_eq!(set.iter().next().map(|p| p.name.as_str()), Some("@Id"));
    }

    #[test]
    fn test_parameter_set_replaces_same_name() {
        let mut set = ParameterSet::new('@');
        set.push_parameter(param("@Id", WireValue::Int(1))).unwrap();
        set.push_parameter(param("@id", WireValue::Int(2))).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.parameter_value("Id"), Some(&WireValue::Int(2)));
    }

    #[test]
    fn test_set_value_checks_kind() {
        let mut set = ParameterSet::new('@');
        set.push_parameter(param("@Id", WireValue::Null)).unwrap();
        assert!(set.set_value("@Id", WireValue::Int(5)).is_ok());
        assert!(matches!(
            set.set_value("@Id", WireValue::Text("x".into())),
            Err(MappingError::KindMismatch { .. })
        ));
        assert!(matches!(
            set.set_value("@Missing", WireValue::Int(1)),
            Err(MappingError::MissingSlot(_))
        ));
    }

    #[test]
    fn test_hash_map_source_matches_without_sigil() {
        let mut map = HashMap::new();
        map.insert("@Total".to_string(), WireValue::BigInt(3));
        assert_eq!(map.parameter_value("total"), Some(&WireValue::BigInt(3)));
        assert_eq!(map.parameter_value("Other"), None);
    }

    #[test]
    fn test_row_set_enforces_kind_and_width() {
        let set = RowSet::new(schema());
        let mut row = set.new_row();
        assert_eq!(row.values(), &[WireValue::Null, WireValue::Null]);

        row.set(0, WireValue::Int(4)).unwrap();
        assert!(matches!(
            row.set(0, WireValue::BigInt(4)),
            Err(MappingError::KindMismatch { .. })
        ));
        assert!(matches!(
            row.set(2, WireValue::Int(1)),
            Err(MappingError::OrdinalOutOfRange { ordinal: 2, width: 2 })
        ));
        row.set_null(0).unwrap();
        assert_eq!(row.get(0), Some(&WireValue::Null));
    }

    #[test]
    fn test_push_rejects_foreign_row() {
        let mut set = RowSet::new(schema());
        let other = RowSet::new(Arc::new(OutputSchema::new(vec![ColumnSchema::new(
            "Id",
            WireKind::Int,
        )])));
        assert!(set.push(other.new_row()).is_err());
        assert!(set.push(set.new_row()).is_ok());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_row_set_reader_walks_rows() {
        let mut set = RowSet::new(schema());
        for id in 1..=2 {
            let mut row = set.new_row();
            row.set(0, WireValue::Int(id)).unwrap();
            set.push(row).unwrap();
        }

        let mut reader = set.reader();
        assert_eq!(reader.ordinal("Name"), Some(1));
        assert!(reader.advance().unwrap());
        assert_eq!(reader.get(0, WireKind::Int).unwrap(), WireValue::Int(1));
        assert!(reader.is_null(1).unwrap());
        assert!(reader.advance().unwrap());
        assert_eq!(reader.get(0, WireKind::Int).unwrap(), WireValue::Int(2));
        assert!(!reader.advance().unwrap());
        assert!(!reader.advance().unwrap());
    }

    #[test]
    fn test_reader_get_checks_kind() {
        let mut set = RowSet::new(schema());
        let mut row = set.new_row();
        row.set(0, WireValue::Int(1)).unwrap();
        set.push(row).unwrap();

        let mut reader = set.reader();
        reader.advance().unwrap();
        assert!(reader.get(0, WireKind::BigInt).is_err());
    }
}
