//! Execution modes over a compiled plan.
//!
//! - **Input materialization**: [`CompiledPlan::to_parameters`] and
//!   [`CompiledPlan::write_parameters`] emit one slot per field, null marker
//!   for absent values
//! - **Output extraction**: [`CompiledPlan::output_parameters`] declares the
//!   slots and [`CompiledPlan::from_parameters`] reads them back into a model
//! - **Row construction**: [`CompiledPlan::to_rows`] (and `to_rows_par` with
//!   the `parallel` feature) build a [`RowSet`]
//! - **Result reading**: [`CompiledPlan::read`] decodes every record of a
//!   [`RecordReader`]
//!
//! Every mode walks the same operations in ordinal order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;

use crate::container::{
    Direction, Parameter, ParameterSet, ParameterSink, ParameterSource, RecordReader, Row, RowSet,
};
use crate::descriptor::with_sigil;
use crate::error::{MappingError, Result};
use crate::model::Mapped;
use crate::ops::{Emit, Fetch};
use crate::plan::CompiledPlan;
use crate::wire::WireValue;

impl<M: Mapped> CompiledPlan<M> {
    /// Encodes `model` into a new [`ParameterSet`] of input slots.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabmap_core::{Mapped, ModelMap, PlanCache, WireKind, WireValue};
    ///
    /// #[derive(Default)]
    /// struct Lookup {
    ///     id: i64,
    ///     name: Option<String>,
    /// }
    ///
    /// impl Mapped for Lookup {
    ///     fn describe(map: &mut ModelMap<Self>) {
    ///         map.scalar("id", "Id", WireKind::BigInt, |m| &m.id, |m| &mut m.id);
    ///         map.scalar("name", "Name", WireKind::NVarChar, |m| &m.name, |m| &mut m.name)
    ///             .length(40);
    ///     }
    /// }
    ///
    /// let plan = PlanCache::global().plan::<Lookup>().unwrap();
    /// let params = plan.to_parameters(&Lookup { id: 9, name: None }).unwrap();
    /// assert_eq!(params.get("@Id").unwrap().value, WireValue::BigInt(9));
    /// assert_eq!(params.get("@Name").unwrap().value, WireValue::Null);
    /// ```
    pub fn to_parameters(&self, model: &M) -> Result<ParameterSet> {
        let mut set = ParameterSet::with_capacity(self.sigil, self.operations.len());
        self.write_parameters(model, &mut set)?;
        Ok(set)
    }

    /// Encodes `model` into an external parameter container.
    pub fn write_parameters<S: ParameterSink + ?Sized>(
        &self,
        model: &M,
        sink: &mut S,
    ) -> Result<()> {
        let mut values = self.encode_values(model)?;
        for op in &self.operations {
            sink.push_parameter(Parameter::new(
                self.parameter_name(op),
                op.column().clone(),
                Direction::Input,
                std::mem::take(&mut values[op.ordinal()]),
            ))?;
        }
        trace!(model = self.model, parameters = self.operations.len(), "Wrote parameters");
        Ok(())
    }

    /// Declares one output slot per field, each holding the null marker, for
    /// an external call to populate.
    pub fn output_parameters(&self) -> Result<ParameterSet> {
        let mut set = ParameterSet::with_capacity(self.sigil, self.operations.len());
        for op in &self.operations {
            set.push_parameter(Parameter::new(
                self.parameter_name(op),
                op.column().clone(),
                Direction::Output,
                WireValue::Null,
            ))?;
        }
        Ok(set)
    }

    /// Decodes a fresh model from populated slots.
    ///
    /// # Errors
    ///
    /// Returns [`MissingSlot`](MappingError::MissingSlot) if the source has no
    /// slot for a planned field, or a decode fault for a value that does not
    /// match its declared kind.
    pub fn from_parameters<S: ParameterSource + ?Sized>(&self, source: &S) -> Result<M> {
        let mut fetch = |ordinal: usize| -> Result<WireValue> {
            let column = self.column(ordinal)?;
            source
                .parameter_value(&column.name)
                .cloned()
                .ok_or_else(|| MappingError::MissingSlot(with_sigil(&column.name, self.sigil)))
        };
        self.decode_with(&mut fetch)
    }

    /// Returns a builder for row construction.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedInRows`](MappingError::UnsupportedInRows) if the
    /// plan has a structured column, before any row is built.
    pub fn row_builder(&self) -> Result<RowBuilder<'_, M>> {
        if let Some((property, kind)) = &self.row_conflict {
            return Err(MappingError::UnsupportedInRows {
                model: self.model,
                property: property.clone(),
                kind: *kind,
            });
        }
        Ok(RowBuilder { plan: self })
    }

    /// Encodes `models` into rows, one per model, in order.
    pub fn to_rows(&self, models: &[M]) -> Result<RowSet> {
        let builder = self.row_builder()?;
        let mut set = builder.new_set();
        for model in models {
            builder.append(&mut set, model)?;
        }
        trace!(model = self.model, rows = set.len(), "Built rows");
        Ok(set)
    }

    /// Like [`to_rows`](Self::to_rows), encoding rows on the rayon pool.
    #[cfg(feature = "parallel")]
    pub fn to_rows_par(&self, models: &[M]) -> Result<RowSet> {
        let builder = self.row_builder()?;
        let template = builder.new_set();
        let rows = models
            .par_iter()
            .map(|model| builder.row(&template, model))
            .collect::<Result<Vec<_>>>()?;
        trace!(model = self.model, rows = rows.len(), "Built rows in parallel");
        Ok(RowSet::from_rows(self.shared_schema(), rows))
    }

    /// Decodes a model from a row of this plan's shape, by position.
    pub fn decode_row(&self, row: &Row) -> Result<M> {
        let mut fetch = |ordinal: usize| -> Result<WireValue> {
            row.get(ordinal)
                .cloned()
                .ok_or(MappingError::OrdinalOutOfRange {
                    ordinal,
                    width: row.len(),
                })
        };
        self.decode_with(&mut fetch)
    }

    /// Decodes every remaining record of `reader`.
    ///
    /// Column positions are resolved by name once, before the first record.
    ///
    /// # Errors
    ///
    /// Returns [`MissingColumn`](MappingError::MissingColumn) if the result
    /// lacks a planned column.
    pub fn read<R: RecordReader + ?Sized>(&self, reader: &mut R) -> Result<Vec<M>> {
        let positions = self
            .schema
            .iter()
            .map(|c| {
                reader
                    .ordinal(&c.name)
                    .ok_or_else(|| MappingError::MissingColumn(c.name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut models = Vec::new();
        while reader.advance()? {
            let current: &R = &*reader;
            let mut fetch = |ordinal: usize| -> Result<WireValue> {
                let column = self.column(ordinal)?;
                let position = positions[ordinal];
                if current.is_null(position)? {
                    return Ok(WireValue::Null);
                }
                current.get(position, column.kind)
            };
            models.push(self.decode_with(&mut fetch)?);
        }
        trace!(model = self.model, rows = models.len(), "Read records");
        Ok(models)
    }

    /// Encodes every field of `model` once, indexed by ordinal.
    fn encode_values(&self, model: &M) -> Result<Vec<WireValue>> {
        let mut values = vec![WireValue::Null; self.schema.len()];
        self.encode_with(model, &mut |ordinal: usize, value: WireValue| {
            let width = values.len();
            let slot = values
                .get_mut(ordinal)
                .ok_or(MappingError::OrdinalOutOfRange { ordinal, width })?;
            *slot = value;
            Ok(())
        })?;
        Ok(values)
    }

    fn encode_with(&self, model: &M, emit: &mut Emit<'_>) -> Result<()> {
        for op in &self.operations {
            op.codec.encode(model, emit)?;
        }
        Ok(())
    }

    fn decode_with(&self, fetch: &mut Fetch<'_>) -> Result<M> {
        let mut model = M::default();
        for op in &self.operations {
            op.codec.decode(&mut model, fetch)?;
        }
        Ok(model)
    }
}

/// Row encoder for a plan known to be row-compatible.
pub struct RowBuilder<'p, M> {
    plan: &'p CompiledPlan<M>,
}

impl<M: Mapped> RowBuilder<'_, M> {
    /// Empty row set with the plan's schema.
    pub fn new_set(&self) -> RowSet {
        RowSet::new(self.plan.shared_schema())
    }

    /// Encodes one model into a row shaped like `set`.
    pub fn row(&self, set: &RowSet, model: &M) -> Result<Row> {
        let mut row = set.new_row();
        self.plan
            .encode_with(model, &mut |ordinal: usize, value: WireValue| {
                row.set(ordinal, value)
            })?;
        Ok(row)
    }

    /// Encodes one model and appends it to `set`.
    pub fn append(&self, set: &mut RowSet, model: &M) -> Result<()> {
        let row = self.row(set, model)?;
        set.push(row)
    }
}
