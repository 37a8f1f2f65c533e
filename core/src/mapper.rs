//! Convenience facade over a [`PlanCache`].

use std::sync::Arc;

use crate::cache::PlanCache;
use crate::container::{ParameterSet, ParameterSink, ParameterSource, RecordReader, RowSet};
use crate::error::Result;
use crate::model::Mapped;
use crate::plan::CompiledPlan;

/// Looks up the plan for each call's model type and runs one execution mode.
///
/// # Examples
///
/// ```
/// use tabmap_core::{Mapped, Mapper, ModelMap, WireKind};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Mapped for Point {
///     fn describe(map: &mut ModelMap<Self>) {
///         map.scalar("x", "X", WireKind::Int, |m| &m.x, |m| &mut m.x);
///         map.scalar("y", "Y", WireKind::Int, |m| &m.y, |m| &mut m.y);
///     }
/// }
///
/// let mapper = Mapper::global();
/// let params = mapper.to_parameters(&Point { x: 1, y: 2 }).unwrap();
/// let back: Point = mapper.from_parameters(&params).unwrap();
/// assert_eq!(back, Point { x: 1, y: 2 });
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Mapper<'c> {
    cache: &'c PlanCache,
}

impl Mapper<'static> {
    /// Mapper over [`PlanCache::global`].
    pub fn global() -> Self {
        Self {
            cache: PlanCache::global(),
        }
    }
}

impl<'c> Mapper<'c> {
    pub fn new(cache: &'c PlanCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &'c PlanCache {
        self.cache
    }

    pub fn plan<M: Mapped>(&self) -> Result<Arc<CompiledPlan<M>>> {
        self.cache.plan::<M>()
    }

    pub fn to_parameters<M: Mapped>(&self, model: &M) -> Result<ParameterSet> {
        self.plan::<M>()?.to_parameters(model)
    }

    pub fn write_parameters<M: Mapped, S: ParameterSink + ?Sized>(
        &self,
        model: &M,
        sink: &mut S,
    ) -> Result<()> {
        self.plan::<M>()?.write_parameters(model, sink)
    }

    pub fn output_parameters<M: Mapped>(&self) -> Result<ParameterSet> {
        self.plan::<M>()?.output_parameters()
    }

    pub fn from_parameters<M: Mapped, S: ParameterSource + ?Sized>(&self, source: &S) -> Result<M> {
        self.plan::<M>()?.from_parameters(source)
    }

    pub fn to_rows<M: Mapped>(&self, models: &[M]) -> Result<RowSet> {
        self.plan::<M>()?.to_rows(models)
    }

    pub fn read<M: Mapped, R: RecordReader + ?Sized>(&self, reader: &mut R) -> Result<Vec<M>> {
        self.plan::<M>()?.read(reader)
    }
}
