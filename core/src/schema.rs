//! Output schema: the ordered column layout a compiled plan produces.
//!
//! The schema is what a caller uses to allocate parameter sets and row
//! containers. Its order is the compiler's ordinal order and never changes
//! after publication.

use serde::{Deserialize, Serialize};

use crate::wire::WireKind;

/// One physical column (or parameter slot) of a plan.
///
/// `name` is stored without a parameter sigil; see
/// [`MapperConfig::parameter_sigil`](crate::MapperConfig::parameter_sigil).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name without sigil.
    pub name: String,
    /// Wire kind.
    pub kind: WireKind,
    /// Declared length; `-1` means unbounded.
    pub length: Option<i32>,
    /// Decimal precision.
    pub precision: Option<u8>,
    /// Decimal scale.
    pub scale: Option<u8>,
    /// Table type name for structured columns.
    pub type_name: Option<String>,
}

impl ColumnSchema {
    /// Creates a column with no size information.
    pub fn new(name: impl Into<String>, kind: WireKind) -> Self {
        Self {
            name: name.into(),
            kind,
            length: None,
            precision: None,
            scale: None,
            type_name: None,
        }
    }

    /// Returns `true` when the declared length is the unbounded marker.
    pub fn is_unbounded(&self) -> bool {
        self.length == Some(-1)
    }
}

/// Ordered columns of a compiled plan.
///
/// # Examples
///
/// ```
/// use tabmap_core::{ColumnSchema, OutputSchema, WireKind};
///
/// let schema = OutputSchema::new(vec![
///     ColumnSchema::new("Id", WireKind::Int),
///     ColumnSchema::new("Name", WireKind::NVarChar),
/// ]);
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.position("Name"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutputSchema {
    columns: Vec<ColumnSchema>,
}

impl OutputSchema {
    /// Wraps an ordered column list.
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column at `ordinal`.
    pub fn get(&self, ordinal: usize) -> Option<&ColumnSchema> {
        self.columns.get(ordinal)
    }

    /// Ordinal of the column named `name` (exact, case-sensitive).
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Columns in ordinal order.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Iterates columns in ordinal order.
    pub fn iter(&self) -> std::slice::Iter<'_, ColumnSchema> {
        self.columns.iter()
    }
}

impl<'a> IntoIterator for &'a OutputSchema {
    type Item = &'a ColumnSchema;
    type IntoIter = std::slice::Iter<'a, ColumnSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
