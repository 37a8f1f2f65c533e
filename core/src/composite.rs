//! Composite field groups: one logical value spread across 2–4 columns.
//!
//! A [`CompositeValue`] (for example a [`ShardKey`]) is stored in a model as
//! `Option<K>` and declared with
//! [`ModelMap::composite`](crate::ModelMap::composite). Each physical member
//! encodes through its own wire kind, but absence is decided for the group as
//! a whole:
//!
//! - encoding `None`, or a value with a required member absent, writes the
//!   null marker to **every** member
//! - decoding yields `None` if any required member is absent; otherwise the
//!   members are recomposed in declared order and the result's origin is
//!   checked against the group's origin
//!
//! The origin is a single-character tag naming the logical keyspace. A
//! mismatch is a decode fault, never a silent substitution.

use crate::codec::{Decoder, Encoder};
use crate::descriptor::MappingDescriptor;
use crate::error::{MappingError, Result};
use crate::schema::ColumnSchema;
use crate::sentinel::{Absence, Incoming, Slot, decode_slot, encode_slot};
use crate::value::{FieldValue, Primitive, SourceType};
use crate::wire::{Repr, WireKind, WireValue};

/// Smallest number of members a group may declare.
pub const MIN_ARITY: usize = 2;
/// Largest number of members a group may declare.
pub const MAX_ARITY: usize = 4;

/// A logical value decomposed into 2–4 physical members.
pub trait CompositeValue: Sized + Send + Sync + 'static {
    /// Source types of the members, in declared order.
    fn member_types() -> Vec<SourceType>;

    /// Origin discriminator carried by this value.
    fn origin(&self) -> char;

    /// Member values in declared order; `None` for an empty member.
    fn decompose(&self) -> Vec<Option<Primitive>>;

    /// Rebuilds the value from its members.
    ///
    /// `origin` is the group's declared origin. Required members are never
    /// `None` here; optional members arrive in their absent form.
    fn recompose(
        origin: char,
        members: Vec<Option<Primitive>>,
    ) -> std::result::Result<Self, String>;
}

fn member<T: FieldValue>(
    members: &mut std::vec::IntoIter<Option<Primitive>>,
) -> std::result::Result<T, String> {
    T::from_primitive(members.next().flatten())
}

/// Record key in a sharded keyspace: shard id plus record id.
///
/// # Examples
///
/// ```
/// use tabmap_core::{CompositeValue, Primitive, ShardKey};
///
/// let key = ShardKey::new('c', 3, 1234_i64);
/// assert_eq!(
///     key.decompose(),
///     vec![Some(Primitive::Int16(3)), Some(Primitive::Int64(1234))]
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ShardKey<R> {
    pub origin: char,
    pub shard_id: i16,
    pub record_id: R,
}

impl<R> ShardKey<R> {
    pub fn new(origin: char, shard_id: i16, record_id: R) -> Self {
        Self {
            origin,
            shard_id,
            record_id,
        }
    }
}

impl<R: FieldValue> CompositeValue for ShardKey<R> {
    fn member_types() -> Vec<SourceType> {
        vec![i16::source_type(), R::source_type()]
    }

    fn origin(&self) -> char {
        self.origin
    }

    fn decompose(&self) -> Vec<Option<Primitive>> {
        vec![self.shard_id.to_primitive(), self.record_id.to_primitive()]
    }

    fn recompose(
        origin: char,
        members: Vec<Option<Primitive>>,
    ) -> std::result::Result<Self, String> {
        let mut members = members.into_iter();
        Ok(Self {
            origin,
            shard_id: member(&mut members)?,
            record_id: member(&mut members)?,
        })
    }
}

/// Child record key: a [`ShardKey`] plus a child id.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardChild<R, C> {
    pub origin: char,
    pub shard_id: i16,
    pub record_id: R,
    pub child_id: C,
}

impl<R: FieldValue, C: FieldValue> CompositeValue for ShardChild<R, C> {
    fn member_types() -> Vec<SourceType> {
        vec![i16::source_type(), R::source_type(), C::source_type()]
    }

    fn origin(&self) -> char {
        self.origin
    }

    fn decompose(&self) -> Vec<Option<Primitive>> {
        vec![
            self.shard_id.to_primitive(),
            self.record_id.to_primitive(),
            self.child_id.to_primitive(),
        ]
    }

    fn recompose(
        origin: char,
        members: Vec<Option<Primitive>>,
    ) -> std::result::Result<Self, String> {
        let mut members = members.into_iter();
        Ok(Self {
            origin,
            shard_id: member(&mut members)?,
            record_id: member(&mut members)?,
            child_id: member(&mut members)?,
        })
    }
}

/// Grandchild record key: a [`ShardChild`] plus a grandchild id.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardGrandChild<R, C, G> {
    pub origin: char,
    pub shard_id: i16,
    pub record_id: R,
    pub child_id: C,
    pub grandchild_id: G,
}

impl<R: FieldValue, C: FieldValue, G: FieldValue> CompositeValue for ShardGrandChild<R, C, G> {
    fn member_types() -> Vec<SourceType> {
        vec![
            i16::source_type(),
            R::source_type(),
            C::source_type(),
            G::source_type(),
        ]
    }

    fn origin(&self) -> char {
        self.origin
    }

    fn decompose(&self) -> Vec<Option<Primitive>> {
        vec![
            self.shard_id.to_primitive(),
            self.record_id.to_primitive(),
            self.child_id.to_primitive(),
            self.grandchild_id.to_primitive(),
        ]
    }

    fn recompose(
        origin: char,
        members: Vec<Option<Primitive>>,
    ) -> std::result::Result<Self, String> {
        let mut members = members.into_iter();
        Ok(Self {
            origin,
            shard_id: member(&mut members)?,
            record_id: member(&mut members)?,
            child_id: member(&mut members)?,
            grandchild_id: member(&mut members)?,
        })
    }
}

/// Declared layout of a composite group, built by
/// [`ModelMap::composite`](crate::ModelMap::composite).
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeFieldGroup {
    /// Group label (the model property holding the logical value).
    pub label: String,
    /// Expected origin discriminator.
    pub origin: char,
    /// Physical members in declared order.
    pub members: Vec<MappingDescriptor>,
    /// Member count the logical value decomposes into.
    pub arity: usize,
    member_types: Vec<SourceType>,
}

impl CompositeFieldGroup {
    pub(crate) fn new(label: &str, origin: char, member_types: Vec<SourceType>) -> Self {
        Self {
            label: label.to_string(),
            origin,
            members: Vec::new(),
            arity: member_types.len(),
            member_types,
        }
    }

    /// Declares the next physical member.
    pub fn member(&mut self, target: &str, kind: WireKind) -> &mut Self {
        self.member_with(target, kind, |_| {})
    }

    /// Declares the next physical member and adjusts its descriptor, e.g. to
    /// set a length or mark it not required.
    pub fn member_with(
        &mut self,
        target: &str,
        kind: WireKind,
        adjust: impl FnOnce(&mut MappingDescriptor),
    ) -> &mut Self {
        let index = self.members.len();
        let source = self
            .member_types
            .get(index)
            .copied()
            .unwrap_or(SourceType::plain("<undeclared member>", kind.repr()));
        let property = format!("{}.{index}", self.label);
        let mut descriptor = MappingDescriptor::new(&property, target, kind, source);
        adjust(&mut descriptor);
        self.members.push(descriptor);
        self
    }

    /// Validates arity and every member descriptor.
    pub fn check(&self, model: &'static str) -> Result<()> {
        if !(MIN_ARITY..=MAX_ARITY).contains(&self.arity) || self.members.len() != self.arity {
            return Err(MappingError::MalformedGroup {
                model,
                group: self.label.clone(),
                expected: self.arity,
                actual: self.members.len(),
            });
        }
        self.members.iter().try_for_each(|m| m.check(model))
    }
}

/// Compiled member of a group.
pub(crate) struct MemberLayout {
    pub ordinal: usize,
    pub column: ColumnSchema,
    pub absence: Absence,
    pub repr: Repr,
    pub required: bool,
    pub encoder: Encoder,
    pub decoder: Decoder,
}

/// Compiled group: the runtime half of [`CompositeFieldGroup`].
pub(crate) struct GroupLayout {
    pub field: String,
    pub origin: char,
    pub members: Vec<MemberLayout>,
}

impl GroupLayout {
    /// Encodes every member of `value`, applying group-level absence.
    pub fn encode<K: CompositeValue>(&self, value: Option<&K>) -> Result<Vec<WireValue>> {
        let all_null = || vec![WireValue::Null; self.members.len()];
        let Some(value) = value else {
            return Ok(all_null());
        };
        if value.origin() != self.origin {
            return Err(MappingError::OriginMismatch {
                field: self.field.clone(),
                expected: self.origin,
                actual: value.origin(),
            });
        }
        let parts = value.decompose();
        if parts.len() != self.members.len() {
            return Err(MappingError::Encode {
                field: self.field.clone(),
                kind: self.members[0].column.kind,
                reason: format!(
                    "value decomposed into {} members, group declares {}",
                    parts.len(),
                    self.members.len()
                ),
            });
        }

        let slots: Vec<Slot> = parts
            .into_iter()
            .zip(&self.members)
            .map(|(part, m)| encode_slot(m.absence, part))
            .collect();
        let incomplete = slots
            .iter()
            .zip(&self.members)
            .any(|(slot, m)| m.required && *slot == Slot::Null);
        if incomplete {
            return Ok(all_null());
        }

        slots
            .into_iter()
            .zip(&self.members)
            .map(|(slot, m)| match slot {
                Slot::Null => Ok(WireValue::Null),
                Slot::Present(p) => {
                    (m.encoder)(&m.column, p).map_err(|reason| MappingError::Encode {
                        field: format!("{}.{}", self.field, m.column.name),
                        kind: m.column.kind,
                        reason,
                    })
                }
            })
            .collect()
    }

    /// Decodes the group from one wire value per member.
    pub fn decode<K: CompositeValue>(&self, wires: Vec<WireValue>) -> Result<Option<K>> {
        let mut parts = Vec::with_capacity(self.members.len());
        let mut incomplete = false;

        for (wire, m) in wires.into_iter().zip(&self.members) {
            let (part, absent) = match decode_slot(m.absence, m.repr, wire) {
                Incoming::Absent(form) => (form, true),
                Incoming::Value(w) => {
                    let p = (m.decoder)(w).map_err(|actual| MappingError::KindMismatch {
                        field: format!("{}.{}", self.field, m.column.name),
                        expected: m.column.kind,
                        actual,
                    })?;
                    let absent = m.absence.is_absent(Some(&p));
                    (Some(p), absent)
                }
            };
            incomplete |= absent && m.required;
            // Optional members keep their rule's absent form: `None` for
            // wrappers, the sentinel for nil GUIDs and NaN.
            parts.push(part);
        }

        if incomplete {
            return Ok(None);
        }
        let value = K::recompose(self.origin, parts).map_err(|reason| MappingError::Decode {
            field: self.field.clone(),
            reason,
        })?;
        if value.origin() != self.origin {
            return Err(MappingError::OriginMismatch {
                field: self.field.clone(),
                expected: self.origin,
                actual: value.origin(),
            });
        }
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decoder, encoder};

    fn layout_for(group: &CompositeFieldGroup) -> GroupLayout {
        GroupLayout {
            field: group.label.clone(),
            origin: group.origin,
            members: group
                .members
                .iter()
                .enumerate()
                .map(|(ordinal, d)| MemberLayout {
                    ordinal,
                    column: d.column(),
                    absence: Absence::for_source(&d.source),
                    repr: d.source.repr,
                    required: d.required,
                    encoder: encoder(d.kind),
                    decoder: decoder(d.kind),
                })
                .collect(),
        }
    }

    fn shard_group() -> CompositeFieldGroup {
        let mut group = CompositeFieldGroup::new("key", 'c', ShardKey::<i64>::member_types());
        group
            .member("ShardId", WireKind::SmallInt)
            .member("RecordId", WireKind::BigInt);
        group
    }

    #[test]
    fn test_group_arity_is_checked() {
        let mut group = CompositeFieldGroup::new("key", 'c', ShardKey::<i64>::member_types());
        group.member("ShardId", WireKind::SmallInt);
        let err = group.check("M").unwrap_err();
        assert!(matches!(
            err,
            MappingError::MalformedGroup { expected: 2, actual: 1, .. }
        ));
        assert!(shard_group().check("M").is_ok());
    }

    #[test]
    fn test_member_kind_is_validated() {
        let mut group = CompositeFieldGroup::new("key", 'c', ShardKey::<i64>::member_types());
        group
            .member("ShardId", WireKind::SmallInt)
            .member("RecordId", WireKind::Int);
        assert!(matches!(
            group.check("M"),
            Err(MappingError::InvalidSourceType { .. })
        ));
    }

    #[test]
    fn test_shard_key_roundtrip() {
        let layout = layout_for(&shard_group());
        let key = ShardKey::new('c', 7, 99_i64);
        let wires = layout.encode(Some(&key)).unwrap();
        assert_eq!(wires, vec![WireValue::SmallInt(7), WireValue::BigInt(99)]);
        assert_eq!(layout.decode::<ShardKey<i64>>(wires).unwrap(), Some(key));
    }

    #[test]
    fn test_absent_key_nulls_every_member() {
        let layout = layout_for(&shard_group());
        let wires = layout.encode::<ShardKey<i64>>(None).unwrap();
        assert_eq!(wires, vec![WireValue::Null, WireValue::Null]);
    }

    #[test]
    fn test_one_null_member_makes_group_absent() {
        let layout = layout_for(&shard_group());
        let decoded = layout
            .decode::<ShardKey<i64>>(vec![WireValue::SmallInt(7), WireValue::Null])
            .unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn test_sentinel_member_makes_group_absent() {
        let mut group =
            CompositeFieldGroup::new("key", 'c', ShardKey::<uuid::Uuid>::member_types());
        group
            .member("ShardId", WireKind::SmallInt)
            .member("RecordId", WireKind::UniqueIdentifier);
        let layout = layout_for(&group);

        let key = ShardKey::new('c', 1, uuid::Uuid::nil());
        let wires = layout.encode(Some(&key)).unwrap();
        assert_eq!(wires, vec![WireValue::Null, WireValue::Null]);
    }

    #[test]
    fn test_optional_member_keeps_absent_form() {
        let types = ShardChild::<i64, uuid::Uuid>::member_types();
        let mut group = CompositeFieldGroup::new("key", 'c', types);
        group
            .member("ShardId", WireKind::SmallInt)
            .member("RecordId", WireKind::BigInt)
            .member_with("ChildId", WireKind::UniqueIdentifier, |d| {
                d.not_required();
            });
        let layout = layout_for(&group);

        let key = ShardChild {
            origin: 'c',
            shard_id: 1,
            record_id: 2_i64,
            child_id: uuid::Uuid::nil(),
        };
        let wires = layout.encode(Some(&key)).unwrap();
        assert_eq!(
            wires,
            vec![WireValue::SmallInt(1), WireValue::BigInt(2), WireValue::Null]
        );
        let decoded = layout.decode::<ShardChild<i64, uuid::Uuid>>(wires).unwrap();
        assert_eq!(decoded, Some(key));
    }

    #[test]
    fn test_encode_rejects_foreign_origin() {
        let layout = layout_for(&shard_group());
        let err = layout.encode(Some(&ShardKey::new('z', 1, 2_i64))).unwrap_err();
        assert!(matches!(
            err,
            MappingError::OriginMismatch { expected: 'c', actual: 'z', .. }
        ));
    }

    #[test]
    fn test_grandchild_decomposes_into_four_members() {
        let key = ShardGrandChild {
            origin: 'g',
            shard_id: 1,
            record_id: 2_i32,
            child_id: 3_i16,
            grandchild_id: 4_i64,
        };
        assert_eq!(key.decompose().len(), 4);
        assert_eq!(ShardGrandChild::<i32, i16, i64>::member_types().len(), 4);
    }
}
