//! Compiled mapping between Rust models and tabular database slots.
//!
//! A model type implements [`Mapped`] and declares, once, how each field maps
//! to a named parameter or column with a wire kind. The first time the model
//! is used, the compiler turns those declarations into a [`CompiledPlan`]:
//!
//! - one [`FieldOperation`] per physical column, in a fixed ordinal order
//! - an [`OutputSchema`] describing the columns
//! - per-field encoders and decoders resolved from the wire kind
//!
//! Plans are cached per type in a [`PlanCache`] and shared between threads.
//! Every execution mode uses the same plan: parameter materialization,
//! parameter extraction, row construction, and result reading.
//!
//! Absent values follow one [`Absence`] policy: `Option` wrappers are absent
//! when `None`, non-optional `Uuid` fields when nil, non-optional floats when
//! NaN. Absent values become the wire null marker, and the null marker
//! decodes back to the absent form.
//!
//! # Example
//!
//! ```
//! use tabmap_core::*;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Customer {
//!     id: i32,
//!     name: Option<String>,
//!     key: Option<ShardKey<i64>>,
//! }
//!
//! impl Mapped for Customer {
//!     fn describe(map: &mut ModelMap<Self>) {
//!         map.scalar("id", "@Id", WireKind::Int, |m| &m.id, |m| &mut m.id);
//!         map.scalar("name", "@Name", WireKind::NVarChar, |m| &m.name, |m| &mut m.name)
//!             .length(100);
//!         map.composite("key", 'c', |m| &m.key, |m| &mut m.key)
//!             .member("ShardId", WireKind::SmallInt)
//!             .member("CustomerId", WireKind::BigInt);
//!     }
//! }
//!
//! let plan = PlanCache::global().plan::<Customer>().unwrap();
//! assert_eq!(plan.schema().len(), 4);
//!
//! let customer = Customer { id: 1, name: None, key: Some(ShardKey::new('c', 2, 30)) };
//! let params = plan.to_parameters(&customer).unwrap();
//! assert_eq!(params.get("@Name").unwrap().value, WireValue::Null);
//! assert_eq!(plan.from_parameters(&params).unwrap(), customer);
//! ```

mod cache;
mod codec;
mod composite;
mod config;
mod container;
mod descriptor;
mod error;
mod exec;
mod mapper;
mod model;
mod ops;
mod plan;
mod schema;
mod sentinel;
mod transient;
mod value;
mod wire;

pub use cache::{CacheStats, PlanCache};
pub use codec::{Decoder, Encoder, decoder, encoder};
pub use composite::{
    CompositeFieldGroup, CompositeValue, MAX_ARITY, MIN_ARITY, ShardChild, ShardGrandChild,
    ShardKey,
};
pub use config::{DuplicatePolicy, MapperConfig};
pub use container::{
    Direction, Parameter, ParameterSet, ParameterSink, ParameterSource, RecordReader, Row, RowSet,
    RowSetReader,
};
pub use descriptor::{MappingDescriptor, SIGILS, strip_sigil, with_sigil};
pub use error::{MappingError, Result};
pub use exec::RowBuilder;
pub use mapper::Mapper;
pub use model::{Mapped, ModelMap};
pub use plan::{CompiledPlan, FieldOperation, compile};
pub use schema::{ColumnSchema, OutputSchema};
pub use sentinel::Absence;
pub use transient::{is_transient, transient_reason};
pub use value::{FieldValue, Primitive, SourceType, WireEnum};
pub use wire::{Repr, WireKind, WireValue};
