//! Declarative descriptor surface.
//!
//! A model type implements [`Mapped`] and lists its fields in
//! [`Mapped::describe`]. The compiler calls `describe` once per plan build and
//! turns the collected entries into field operations, in declaration order.
//!
//! # Examples
//!
//! ```
//! use tabmap_core::{Mapped, ModelMap, WireKind};
//!
//! #[derive(Default)]
//! struct Customer {
//!     id: i32,
//!     name: Option<String>,
//! }
//!
//! impl Mapped for Customer {
//!     fn describe(map: &mut ModelMap<Self>) {
//!         map.scalar("id", "@Id", WireKind::Int, |m| &m.id, |m| &mut m.id);
//!         map.scalar("name", "@Name", WireKind::NVarChar, |m| &m.name, |m| &mut m.name)
//!             .length(100);
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::composite::{CompositeFieldGroup, CompositeValue, GroupLayout};
use crate::descriptor::MappingDescriptor;
use crate::error::Result;
use crate::ops::{
    ColumnCodec, GroupCodec, MemberCodec, Nested, ScalarCodec, ScalarLayout, TableCodec,
};
use crate::plan::{CompileState, FieldOperation};
use crate::value::{FieldValue, SourceType};
use crate::wire::{Repr, WireKind};

/// A type whose fields map to database parameters and columns.
///
/// `Default` supplies the starting value when a plan decodes into a fresh
/// instance.
pub trait Mapped: Default + Send + Sync + 'static {
    /// Declares every mapped field, in order.
    fn describe(map: &mut ModelMap<Self>);
}

pub(crate) trait BindField<M> {
    fn bind(
        &self,
        layout: ScalarLayout,
        state: &mut CompileState<'_>,
    ) -> Result<Arc<dyn ColumnCodec<M>>>;
}

pub(crate) trait BindEmbedded<M> {
    fn compile(&self, state: &mut CompileState<'_>) -> Result<Vec<FieldOperation<M>>>;
}

pub(crate) trait BindGroup<M> {
    fn bind(&self, layout: GroupLayout) -> Vec<Arc<dyn ColumnCodec<M>>>;
}

pub(crate) enum Entry<M> {
    Field {
        descriptor: MappingDescriptor,
        binding: Box<dyn BindField<M>>,
    },
    Embedded {
        property: String,
        binding: Box<dyn BindEmbedded<M>>,
    },
    Group {
        group: CompositeFieldGroup,
        binding: Box<dyn BindGroup<M>>,
    },
}

/// Field declarations collected from [`Mapped::describe`].
pub struct ModelMap<M> {
    pub(crate) entries: Vec<Entry<M>>,
}

impl<M: Mapped> ModelMap<M> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declares a scalar field. Chain descriptor setters on the result to
    /// supply a length or precision.
    pub fn scalar<T: FieldValue>(
        &mut self,
        property: &str,
        target: &str,
        kind: WireKind,
        get: fn(&M) -> &T,
        get_mut: fn(&mut M) -> &mut T,
    ) -> &mut MappingDescriptor {
        let descriptor = MappingDescriptor::new(property, target, kind, T::source_type());
        self.push_field(descriptor, Box::new(ScalarAccess { get, get_mut }))
    }

    /// Declares an embedded model whose fields are flattened into this one.
    pub fn embed<N: Mapped>(
        &mut self,
        property: &str,
        get: fn(&M) -> &N,
        get_mut: fn(&mut M) -> &mut N,
    ) -> &mut Self {
        self.entries.push(Entry::Embedded {
            property: property.to_string(),
            binding: Box::new(EmbedAccess { get, get_mut }),
        });
        self
    }

    /// Declares a structured (table-valued) field carrying rows of `R`.
    pub fn table<R: Mapped>(
        &mut self,
        property: &str,
        target: &str,
        type_name: &str,
        get: fn(&M) -> &Vec<R>,
        get_mut: fn(&mut M) -> &mut Vec<R>,
    ) -> &mut MappingDescriptor {
        let source = SourceType::plain(std::any::type_name::<Vec<R>>(), Repr::Table);
        let mut descriptor = MappingDescriptor::new(property, target, WireKind::Structured, source);
        descriptor.type_name(type_name);
        self.push_field(descriptor, Box::new(TableAccess { get, get_mut }))
    }

    /// Declares a composite group stored as `Option<K>`. Add its physical
    /// members with [`CompositeFieldGroup::member`].
    pub fn composite<K: CompositeValue>(
        &mut self,
        property: &str,
        origin: char,
        get: fn(&M) -> &Option<K>,
        get_mut: fn(&mut M) -> &mut Option<K>,
    ) -> &mut CompositeFieldGroup {
        self.entries.push(Entry::Group {
            group: CompositeFieldGroup::new(property, origin, K::member_types()),
            binding: Box::new(GroupAccess { get, get_mut }),
        });
        match self.entries.last_mut() {
            Some(Entry::Group { group, .. }) => group,
            _ => unreachable!("group entry was just pushed"),
        }
    }

    /// Number of declarations so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push_field(
        &mut self,
        descriptor: MappingDescriptor,
        binding: Box<dyn BindField<M>>,
    ) -> &mut MappingDescriptor {
        self.entries.push(Entry::Field { descriptor, binding });
        match self.entries.last_mut() {
            Some(Entry::Field { descriptor, .. }) => descriptor,
            _ => unreachable!("field entry was just pushed"),
        }
    }
}

struct ScalarAccess<M, T> {
    get: fn(&M) -> &T,
    get_mut: fn(&mut M) -> &mut T,
}

impl<M: 'static, T: FieldValue> BindField<M> for ScalarAccess<M, T> {
    fn bind(
        &self,
        layout: ScalarLayout,
        _state: &mut CompileState<'_>,
    ) -> Result<Arc<dyn ColumnCodec<M>>> {
        Ok(Arc::new(ScalarCodec {
            layout,
            get: self.get,
            get_mut: self.get_mut,
        }))
    }
}

struct TableAccess<M, R> {
    get: fn(&M) -> &Vec<R>,
    get_mut: fn(&mut M) -> &mut Vec<R>,
}

impl<M: 'static, R: Mapped> BindField<M> for TableAccess<M, R> {
    fn bind(
        &self,
        layout: ScalarLayout,
        state: &mut CompileState<'_>,
    ) -> Result<Arc<dyn ColumnCodec<M>>> {
        let plan = state.element_plan::<R>()?;
        Ok(Arc::new(TableCodec {
            layout,
            plan,
            get: self.get,
            get_mut: self.get_mut,
        }))
    }
}

struct EmbedAccess<M, N> {
    get: fn(&M) -> &N,
    get_mut: fn(&mut M) -> &mut N,
}

impl<M: 'static, N: Mapped> BindEmbedded<M> for EmbedAccess<M, N> {
    fn compile(&self, state: &mut CompileState<'_>) -> Result<Vec<FieldOperation<M>>> {
        let inner = state.model::<N>()?;
        Ok(inner
            .into_iter()
            .map(|op| {
                op.map_codec(|codec| {
                    Arc::new(Nested {
                        get: self.get,
                        get_mut: self.get_mut,
                        inner: codec,
                    }) as Arc<dyn ColumnCodec<M>>
                })
            })
            .collect())
    }
}

struct GroupAccess<M, K> {
    get: fn(&M) -> &Option<K>,
    get_mut: fn(&mut M) -> &mut Option<K>,
}

impl<M: 'static, K: CompositeValue> BindGroup<M> for GroupAccess<M, K> {
    fn bind(&self, layout: GroupLayout) -> Vec<Arc<dyn ColumnCodec<M>>> {
        let width = layout.members.len();
        let group = Arc::new(GroupCodec {
            layout,
            get: self.get,
            get_mut: self.get_mut,
        });
        (0..width)
            .map(|index| {
                Arc::new(MemberCodec {
                    group: Arc::clone(&group),
                    index,
                }) as Arc<dyn ColumnCodec<M>>
            })
            .collect()
    }
}
