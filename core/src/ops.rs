//! Runtime codecs attached to field operations.
//!
//! Each compiled [`FieldOperation`](crate::FieldOperation) carries one
//! [`ColumnCodec`] that reads its value out of a model and writes it back.
//! Codecs are built once by the compiler and shared behind `Arc`; they hold
//! only plain accessors and resolved encoder/decoder functions, so executing
//! them needs no locking.

use std::sync::Arc;

use crate::codec::{Decoder, Encoder};
use crate::composite::{CompositeValue, GroupLayout};
use crate::error::{MappingError, Result};
use crate::model::Mapped;
use crate::plan::CompiledPlan;
use crate::schema::ColumnSchema;
use crate::sentinel::{Absence, Incoming, Slot, decode_slot, encode_slot};
use crate::value::{FieldValue, Primitive};
use crate::wire::{Repr, WireValue};

/// Looks up the wire value for a plan ordinal in whatever container is being
/// decoded.
pub(crate) type Fetch<'a> = dyn FnMut(usize) -> Result<WireValue> + 'a;

/// Stores an encoded wire value at a plan ordinal.
pub(crate) type Emit<'a> = dyn FnMut(usize, WireValue) -> Result<()> + 'a;

pub(crate) trait ColumnCodec<M>: Send + Sync {
    fn encode(&self, model: &M, emit: &mut Emit<'_>) -> Result<()>;

    fn decode(&self, model: &mut M, fetch: &mut Fetch<'_>) -> Result<()>;
}

/// Resolved layout of one physical column.
#[derive(Clone)]
pub(crate) struct ScalarLayout {
    pub field: String,
    pub ordinal: usize,
    pub column: ColumnSchema,
    pub absence: Absence,
    pub repr: Repr,
    pub encoder: Encoder,
    pub decoder: Decoder,
}

impl ScalarLayout {
    fn encode(&self, value: Option<Primitive>) -> Result<WireValue> {
        match encode_slot(self.absence, value) {
            Slot::Null => Ok(WireValue::Null),
            Slot::Present(p) => {
                (self.encoder)(&self.column, p).map_err(|reason| MappingError::Encode {
                    field: self.field.clone(),
                    kind: self.column.kind,
                    reason,
                })
            }
        }
    }

    fn decode(&self, wire: WireValue) -> Result<Option<Primitive>> {
        match decode_slot(self.absence, self.repr, wire) {
            Incoming::Absent(form) => Ok(form),
            Incoming::Value(w) => (self.decoder)(w)
                .map(Some)
                .map_err(|actual| self.mismatch(actual)),
        }
    }

    fn mismatch(&self, actual: &'static str) -> MappingError {
        MappingError::KindMismatch {
            field: self.field.clone(),
            expected: self.column.kind,
            actual,
        }
    }
}

pub(crate) struct ScalarCodec<M, T> {
    pub layout: ScalarLayout,
    pub get: fn(&M) -> &T,
    pub get_mut: fn(&mut M) -> &mut T,
}

impl<M, T: FieldValue> ColumnCodec<M> for ScalarCodec<M, T> {
    fn encode(&self, model: &M, emit: &mut Emit<'_>) -> Result<()> {
        let wire = self.layout.encode((self.get)(model).to_primitive())?;
        emit(self.layout.ordinal, wire)
    }

    fn decode(&self, model: &mut M, fetch: &mut Fetch<'_>) -> Result<()> {
        let wire = fetch(self.layout.ordinal)?;
        let primitive = self.layout.decode(wire)?;
        let value = T::from_primitive(primitive).map_err(|reason| MappingError::Decode {
            field: self.layout.field.clone(),
            reason,
        })?;
        *(self.get_mut)(model) = value;
        Ok(())
    }
}

/// Runs an embedded model's codec against the parent's field.
pub(crate) struct Nested<M, N> {
    pub get: fn(&M) -> &N,
    pub get_mut: fn(&mut M) -> &mut N,
    pub inner: Arc<dyn ColumnCodec<N>>,
}

impl<M, N> ColumnCodec<M> for Nested<M, N> {
    fn encode(&self, model: &M, emit: &mut Emit<'_>) -> Result<()> {
        self.inner.encode((self.get)(model), emit)
    }

    fn decode(&self, model: &mut M, fetch: &mut Fetch<'_>) -> Result<()> {
        self.inner.decode((self.get_mut)(model), fetch)
    }
}

/// Structured column: the element plan is applied to every nested row.
pub(crate) struct TableCodec<M, R> {
    pub layout: ScalarLayout,
    pub plan: Arc<CompiledPlan<R>>,
    pub get: fn(&M) -> &Vec<R>,
    pub get_mut: fn(&mut M) -> &mut Vec<R>,
}

impl<M, R: Mapped> ColumnCodec<M> for TableCodec<M, R> {
    fn encode(&self, model: &M, emit: &mut Emit<'_>) -> Result<()> {
        let rows = self.plan.to_rows((self.get)(model))?;
        emit(self.layout.ordinal, WireValue::Table(rows))
    }

    fn decode(&self, model: &mut M, fetch: &mut Fetch<'_>) -> Result<()> {
        let rows = match fetch(self.layout.ordinal)? {
            WireValue::Null => Vec::new(),
            WireValue::Table(set) => self.plan.read(&mut set.reader())?,
            other => return Err(self.layout.mismatch(other.kind_name())),
        };
        *(self.get_mut)(model) = rows;
        Ok(())
    }
}

/// Composite group shared by its member operations.
pub(crate) struct GroupCodec<M, K> {
    pub layout: GroupLayout,
    pub get: fn(&M) -> &Option<K>,
    pub get_mut: fn(&mut M) -> &mut Option<K>,
}

/// One member of a composite group. The lead member (index 0) encodes and
/// decodes the whole group; the others are no-ops at run time.
pub(crate) struct MemberCodec<M, K> {
    pub group: Arc<GroupCodec<M, K>>,
    pub index: usize,
}

impl<M, K: CompositeValue> ColumnCodec<M> for MemberCodec<M, K> {
    fn encode(&self, model: &M, emit: &mut Emit<'_>) -> Result<()> {
        if self.index != 0 {
            return Ok(());
        }
        let group = &self.group;
        let wires = group.layout.encode((group.get)(model).as_ref())?;
        for (wire, m) in wires.into_iter().zip(&group.layout.members) {
            emit(m.ordinal, wire)?;
        }
        Ok(())
    }

    fn decode(&self, model: &mut M, fetch: &mut Fetch<'_>) -> Result<()> {
        if self.index != 0 {
            return Ok(());
        }
        let group = &self.group;
        let wires = group
            .layout
            .members
            .iter()
            .map(|m| fetch(m.ordinal))
            .collect::<Result<Vec<_>>>()?;
        *(group.get_mut)(model) = group.layout.decode(wires)?;
        Ok(())
    }
}
