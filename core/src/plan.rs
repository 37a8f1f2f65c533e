//! Plan compiler.
//!
//! Walks a model's declarations in order and produces a [`CompiledPlan`]: one
//! [`FieldOperation`] per physical column plus the [`OutputSchema`] they
//! occupy. Ordinals are assigned as columns are emitted and are the only
//! source of physical order for every execution mode.
//!
//! Embedded models are flattened with dotted property paths and continue the
//! parent's ordinal numbering. Table element plans are compiled alongside the
//! parent with their own ordinals. Embedding a type inside itself, directly or
//! through a table, is a compile fault.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::codec::{decoder, encoder};
use crate::composite::{GroupLayout, MemberLayout};
use crate::config::{DuplicatePolicy, MapperConfig};
use crate::descriptor::{MappingDescriptor, with_sigil};
use crate::error::{MappingError, Result};
use crate::model::{Entry, Mapped, ModelMap};
use crate::ops::{ColumnCodec, ScalarLayout};
use crate::schema::{ColumnSchema, OutputSchema};
use crate::sentinel::Absence;
use crate::wire::WireKind;

/// One physical column of a compiled plan.
pub struct FieldOperation<M> {
    ordinal: usize,
    property: String,
    column: ColumnSchema,
    absence: Absence,
    pub(crate) codec: Arc<dyn ColumnCodec<M>>,
}

impl<M> FieldOperation<M> {
    fn new(layout: &ScalarLayout, codec: Arc<dyn ColumnCodec<M>>) -> Self {
        Self {
            ordinal: layout.ordinal,
            property: layout.field.clone(),
            column: layout.column.clone(),
            absence: layout.absence,
            codec,
        }
    }

    /// Position in the plan's output schema.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Dotted property path, e.g. `address.city` or `key.1`.
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn column(&self) -> &ColumnSchema {
        &self.column
    }

    /// Absence rule derived for the field's Rust type.
    pub fn absence(&self) -> Absence {
        self.absence
    }

    pub(crate) fn map_codec<P>(
        self,
        wrap: impl FnOnce(Arc<dyn ColumnCodec<M>>) -> Arc<dyn ColumnCodec<P>>,
    ) -> FieldOperation<P> {
        FieldOperation {
            ordinal: self.ordinal,
            property: self.property,
            column: self.column,
            absence: self.absence,
            codec: wrap(self.codec),
        }
    }
}

impl<M> fmt::Debug for FieldOperation<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOperation")
            .field("ordinal", &self.ordinal)
            .field("property", &self.property)
            .field("column", &self.column)
            .field("absence", &self.absence)
            .finish_non_exhaustive()
    }
}

/// Immutable mapping plan for one model type.
///
/// Built once per type by a [`PlanCache`](crate::PlanCache) and shared behind
/// `Arc`. All execution modes (see [`exec`](crate::exec)) use the same
/// operations and never re-derive ordinals.
pub struct CompiledPlan<M> {
    pub(crate) model: &'static str,
    pub(crate) operations: Vec<FieldOperation<M>>,
    pub(crate) schema: Arc<OutputSchema>,
    pub(crate) row_conflict: Option<(String, WireKind)>,
    pub(crate) sigil: char,
}

impl<M> CompiledPlan<M> {
    /// Rust type name of the model.
    pub fn model(&self) -> &'static str {
        self.model
    }

    /// Operations in ordinal order.
    pub fn operations(&self) -> &[FieldOperation<M>] {
        &self.operations
    }

    pub fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    /// Shared handle to the schema, for allocating row containers.
    pub fn shared_schema(&self) -> Arc<OutputSchema> {
        Arc::clone(&self.schema)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns `false` if the plan has a column row construction cannot
    /// carry.
    pub fn supports_rows(&self) -> bool {
        self.row_conflict.is_none()
    }

    /// Parameter name for `op`, with the configured sigil.
    pub fn parameter_name(&self, op: &FieldOperation<M>) -> String {
        with_sigil(&op.column.name, self.sigil)
    }

    pub(crate) fn column(&self, ordinal: usize) -> Result<&ColumnSchema> {
        self.schema.get(ordinal).ok_or(MappingError::OrdinalOutOfRange {
            ordinal,
            width: self.schema.len(),
        })
    }
}

impl<M> fmt::Debug for CompiledPlan<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPlan")
            .field("model", &self.model)
            .field("operations", &self.operations)
            .field("sigil", &self.sigil)
            .finish_non_exhaustive()
    }
}

/// Compiles a plan for `M` under `config`.
///
/// Compile faults are returned as-is; nothing is cached here.
pub fn compile<M: Mapped>(config: &MapperConfig) -> Result<CompiledPlan<M>> {
    compile_with::<M>(config, Vec::new())
}

fn compile_with<M: Mapped>(config: &MapperConfig, stack: Vec<TypeId>) -> Result<CompiledPlan<M>> {
    let model = type_name::<M>();
    debug!(model, "Compiling mapping plan");

    let mut state = CompileState::new(config, model, stack);
    let operations = state.model::<M>()?;
    let plan = CompiledPlan {
        model,
        operations,
        schema: Arc::new(OutputSchema::new(state.columns)),
        row_conflict: state.row_conflict,
        sigil: config.parameter_sigil,
    };

    debug!(
        model,
        columns = plan.schema.len(),
        rows = plan.supports_rows(),
        "Compiled mapping plan"
    );
    Ok(plan)
}

/// Mutable state of one compilation: claimed names, emitted columns, the
/// current property prefix, and the chain of models being expanded.
pub(crate) struct CompileState<'c> {
    config: &'c MapperConfig,
    model: &'static str,
    claimed: HashMap<String, String>,
    columns: Vec<ColumnSchema>,
    prefix: Vec<String>,
    stack: Vec<TypeId>,
    row_conflict: Option<(String, WireKind)>,
}

impl<'c> CompileState<'c> {
    fn new(config: &'c MapperConfig, model: &'static str, stack: Vec<TypeId>) -> Self {
        Self {
            config,
            model,
            claimed: HashMap::new(),
            columns: Vec::new(),
            prefix: Vec::new(),
            stack,
            row_conflict: None,
        }
    }

    /// Expands the declarations of `N` into operations at the current prefix.
    pub(crate) fn model<N: Mapped>(&mut self) -> Result<Vec<FieldOperation<N>>> {
        let id = TypeId::of::<N>();
        if self.stack.contains(&id) {
            return Err(MappingError::RecursiveModel {
                model: self.model,
                nested: type_name::<N>(),
            });
        }

        let mut map = ModelMap::<N>::new();
        N::describe(&mut map);

        self.stack.push(id);
        let operations = self.expand(map);
        self.stack.pop();
        operations
    }

    /// Compiles the element plan of a table field.
    pub(crate) fn element_plan<R: Mapped>(&self) -> Result<Arc<CompiledPlan<R>>> {
        let plan = compile_with::<R>(self.config, self.stack.clone())?;
        if let Some((property, kind)) = plan.row_conflict.clone() {
            return Err(MappingError::UnsupportedInRows {
                model: plan.model,
                property,
                kind,
            });
        }
        Ok(Arc::new(plan))
    }

    fn expand<N: Mapped>(&mut self, map: ModelMap<N>) -> Result<Vec<FieldOperation<N>>> {
        let mut operations = Vec::with_capacity(map.entries.len());

        for entry in map.entries {
            match entry {
                Entry::Field {
                    mut descriptor,
                    binding,
                } => {
                    descriptor.property = self.qualify(&descriptor.property);
                    descriptor.check(self.model)?;
                    if !self.claim(&descriptor)? {
                        continue;
                    }
                    if descriptor.kind == WireKind::Structured && self.row_conflict.is_none() {
                        self.row_conflict = Some((descriptor.property.clone(), descriptor.kind));
                    }
                    let layout = self.allocate(&descriptor);
                    let codec = binding.bind(layout.clone(), self)?;
                    operations.push(FieldOperation::new(&layout, codec));
                }
                Entry::Embedded { property, binding } => {
                    let path = self.qualify(&property);
                    trace!(model = self.model, path = %path, "Expanding embedded model");
                    self.prefix.push(path);
                    let nested = binding.compile(self);
                    self.prefix.pop();
                    operations.extend(nested?);
                }
                Entry::Group { mut group, binding } => {
                    group.label = self.qualify(&group.label);
                    for member in &mut group.members {
                        member.property = self.qualify(&member.property);
                    }
                    group.check(self.model)?;

                    let taken = group
                        .members
                        .iter()
                        .filter(|m| self.claimed.contains_key(&claim_key(&m.target)))
                        .count();
                    if taken > 0 && self.config.duplicate_targets == DuplicatePolicy::FirstWins {
                        return Err(self.malformed(&group.label, group.arity, group.arity - taken));
                    }
                    for member in &group.members {
                        if !self.claim(member)? {
                            return Err(self.malformed(&group.label, group.arity, group.arity - 1));
                        }
                    }

                    let layouts: Vec<ScalarLayout> =
                        group.members.iter().map(|m| self.allocate(m)).collect();
                    let members = layouts
                        .iter()
                        .zip(&group.members)
                        .map(|(layout, m)| MemberLayout {
                            ordinal: layout.ordinal,
                            column: layout.column.clone(),
                            absence: layout.absence,
                            repr: layout.repr,
                            required: m.required,
                            encoder: layout.encoder,
                            decoder: layout.decoder,
                        })
                        .collect();
                    let codecs = binding.bind(GroupLayout {
                        field: group.label.clone(),
                        origin: group.origin,
                        members,
                    });
                    operations.extend(
                        layouts
                            .iter()
                            .zip(codecs)
                            .map(|(layout, codec)| FieldOperation::new(layout, codec)),
                    );
                }
            }
        }

        Ok(operations)
    }

    fn qualify(&self, property: &str) -> String {
        match self.prefix.last() {
            Some(prefix) => format!("{prefix}.{property}"),
            None => property.to_string(),
        }
    }

    /// Records the descriptor's target. Returns `false` if an earlier field
    /// already holds it and the duplicate is dropped.
    fn claim(&mut self, descriptor: &MappingDescriptor) -> Result<bool> {
        let key = claim_key(&descriptor.target);
        let Some(first) = self.claimed.get(&key) else {
            self.claimed.insert(key, descriptor.property.clone());
            return Ok(true);
        };
        match self.config.duplicate_targets {
            DuplicatePolicy::FirstWins => {
                warn!(
                    model = self.model,
                    target = %descriptor.target,
                    kept = %first,
                    dropped = %descriptor.property,
                    "Dropping duplicate target"
                );
                Ok(false)
            }
            DuplicatePolicy::Reject => Err(MappingError::DuplicateTarget {
                model: self.model,
                target: descriptor.target.clone(),
                first: first.clone(),
                duplicate: descriptor.property.clone(),
            }),
        }
    }

    /// Emits the next column for `descriptor` and resolves its codecs.
    fn allocate(&mut self, descriptor: &MappingDescriptor) -> ScalarLayout {
        let ordinal = self.columns.len();
        let column = descriptor.column();
        self.columns.push(column.clone());
        ScalarLayout {
            field: descriptor.property.clone(),
            ordinal,
            column,
            absence: Absence::for_source(&descriptor.source),
            repr: descriptor.source.repr,
            encoder: encoder(descriptor.kind),
            decoder: decoder(descriptor.kind),
        }
    }

    fn malformed(&self, group: &str, expected: usize, actual: usize) -> MappingError {
        MappingError::MalformedGroup {
            model: self.model,
            group: group.to_string(),
            expected,
            actual,
        }
    }
}

/// Target names are matched without regard to ASCII case.
fn claim_key(target: &str) -> String {
    target.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::ShardKey;

    #[derive(Default)]
    struct Address {
        city: String,
        zip: Option<String>,
    }

    impl Mapped for Address {
        fn describe(map: &mut ModelMap<Self>) {
            map.scalar("city", "City", WireKind::NVarChar, |m| &m.city, |m| &mut m.city)
                .length(50);
            map.scalar("zip", "Zip", WireKind::VarChar, |m| &m.zip, |m| &mut m.zip)
                .length(10);
        }
    }

    #[derive(Default)]
    struct Person {
        id: i32,
        address: Address,
        key: Option<ShardKey<i64>>,
    }

    impl Mapped for Person {
        fn describe(map: &mut ModelMap<Self>) {
            map.scalar("id", "@Id", WireKind::Int, |m| &m.id, |m| &mut m.id);
            map.embed("address", |m| &m.address, |m| &mut m.address);
            map.composite("key", 'p', |m| &m.key, |m| &mut m.key)
                .member("ShardId", WireKind::SmallInt)
                .member("RecordId", WireKind::BigInt);
        }
    }

    #[derive(Default)]
    struct Looping {
        inner: Vec<Looping>,
    }

    impl Mapped for Looping {
        fn describe(map: &mut ModelMap<Self>) {
            map.table("inner", "Inner", "dbo.Looping", |m| &m.inner, |m| &mut m.inner);
        }
    }

    #[derive(Default)]
    struct Clash {
        a: i32,
        b: i32,
        key: Option<ShardKey<i64>>,
    }

    impl Mapped for Clash {
        fn describe(map: &mut ModelMap<Self>) {
            map.scalar("a", "Value", WireKind::Int, |m| &m.a, |m| &mut m.a);
            map.scalar("b", "@value", WireKind::Int, |m| &m.b, |m| &mut m.b);
            map.composite("key", 'c', |m| &m.key, |m| &mut m.key)
                .member("ShardId", WireKind::SmallInt)
                .member("RecordId", WireKind::BigInt);
        }
    }

    #[derive(Default)]
    struct MemberClash {
        shard: i16,
        key: Option<ShardKey<i64>>,
    }

    impl Mapped for MemberClash {
        fn describe(map: &mut ModelMap<Self>) {
            map.scalar("shard", "ShardId", WireKind::SmallInt, |m| &m.shard, |m| &mut m.shard);
            map.composite("key", 'c', |m| &m.key, |m| &mut m.key)
                .member("ShardId", WireKind::SmallInt)
                .member("RecordId", WireKind::BigInt);
        }
    }

    #[test]
    fn test_ordinals_follow_declaration_order() {
        let plan = compile::<Person>(&MapperConfig::default()).unwrap();
        let names: Vec<_> = plan.schema().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "City", "Zip", "ShardId", "RecordId"]);

        let properties: Vec<_> = plan.operations().iter().map(|op| op.property()).collect();
        assert_eq!(
            properties,
            vec!["id", "address.city", "address.zip", "key.0", "key.1"]
        );
        for (i, op) in plan.operations().iter().enumerate() {
            assert_eq!(op.ordinal(), i);
        }
    }

    #[test]
    fn test_absence_rules_are_resolved() {
        let plan = compile::<Person>(&MapperConfig::default()).unwrap();
        assert_eq!(plan.operations()[0].absence(), Absence::Never);
        assert_eq!(plan.operations()[2].absence(), Absence::NullReference);
    }

    #[test]
    fn test_recursive_table_is_rejected() {
        let err = compile::<Looping>(&MapperConfig::default()).unwrap_err();
        assert!(matches!(err, MappingError::RecursiveModel { .. }));
        assert!(err.is_compile_fault());
    }

    #[test]
    fn test_duplicate_collapses_to_first() {
        let plan = compile::<Clash>(&MapperConfig::default()).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.operations()[0].property(), "a");
        assert_eq!(plan.operations()[1].ordinal(), 1);
        assert_eq!(plan.operations()[1].column().name, "ShardId");
    }

    #[test]
    fn test_duplicate_rejected_by_policy() {
        let config = MapperConfig {
            duplicate_targets: DuplicatePolicy::Reject,
            ..MapperConfig::default()
        };
        let err = compile::<Clash>(&config).unwrap_err();
        match err {
            MappingError::DuplicateTarget {
                first, duplicate, ..
            } => {
                assert_eq!(first, "a");
                assert_eq!(duplicate, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_member_collision_is_malformed_group() {
        let err = compile::<MemberClash>(&MapperConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            MappingError::MalformedGroup { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_parameter_name_uses_configured_sigil() {
        let config = MapperConfig {
            parameter_sigil: ':',
            ..MapperConfig::default()
        };
        let plan = compile::<Person>(&config).unwrap();
        assert_eq!(plan.parameter_name(&plan.operations()[0]), ":Id");
    }
}
