//! Type-keyed cache of compiled plans.
//!
//! A missing entry is compiled outside any lock and published with
//! insert-if-absent. Two threads racing on the same type may both compile;
//! the loser discards its build and returns the published plan, so every
//! caller observes the same ordinals. Compile faults are never stored.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::config::MapperConfig;
use crate::error::Result;
use crate::model::Mapped;
use crate::plan::{CompiledPlan, compile};

type AnyPlan = Arc<dyn Any + Send + Sync>;

static GLOBAL: OnceLock<PlanCache> = OnceLock::new();

/// Best-effort cache counters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    /// Builds discarded because another thread published first.
    pub redundant: usize,
    pub size: usize,
}

/// Store of compiled plans, one per model type.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tabmap_core::{Mapped, MapperConfig, ModelMap, PlanCache, WireKind};
///
/// #[derive(Default)]
/// struct Ping {
///     id: i32,
/// }
///
/// impl Mapped for Ping {
///     fn describe(map: &mut ModelMap<Self>) {
///         map.scalar("id", "Id", WireKind::Int, |m| &m.id, |m| &mut m.id);
///     }
/// }
///
/// let cache = PlanCache::new(MapperConfig::default());
/// let first = cache.plan::<Ping>().unwrap();
/// let second = cache.plan::<Ping>().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.stats().hits, 1);
/// ```
#[derive(Debug, Default)]
pub struct PlanCache {
    config: MapperConfig,
    plans: RwLock<HashMap<TypeId, AnyPlan>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    redundant: AtomicUsize,
}

impl PlanCache {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Process-wide cache using the default configuration.
    pub fn global() -> &'static PlanCache {
        GLOBAL.get_or_init(PlanCache::default)
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Returns the plan for `M`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns the compile fault for `M`. Nothing is cached, so the next call
    /// compiles again.
    pub fn plan<M: Mapped>(&self) -> Result<Arc<CompiledPlan<M>>> {
        let id = TypeId::of::<M>();

        let published = self
            .plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        if let Some(plan) = published.and_then(downcast::<M>) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(plan);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let built = Arc::new(compile::<M>(&self.config)?);

        let mut plans = self.plans.write().unwrap_or_else(PoisonError::into_inner);
        match plans.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&built) as AnyPlan);
                debug!(model = built.model(), "Published plan");
                Ok(built)
            }
            Entry::Occupied(slot) => {
                self.redundant.fetch_add(1, Ordering::Relaxed);
                debug!(model = built.model(), "Discarding redundant plan build");
                Ok(downcast::<M>(Arc::clone(slot.get())).unwrap_or(built))
            }
        }
    }

    /// Returns `true` if a plan for `M` has been published.
    pub fn contains<M: Mapped>(&self) -> bool {
        self.plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<M>())
    }

    pub fn len(&self) -> usize {
        self.plans.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            redundant: self.redundant.load(Ordering::Relaxed),
            size: self.len(),
        }
    }
}

fn downcast<M: Mapped>(plan: AnyPlan) -> Option<Arc<CompiledPlan<M>>> {
    plan.downcast::<CompiledPlan<M>>().ok()
}
