use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::context::CompareContext;
use crate::errors::Result;
use crate::value::{TypeKey, Value};

pub mod builtins;

/// Structural comparison for one type.
///
/// Returns `Ok(None)` when the values are equal and a description of the
/// difference otherwise. Sub-values are compared through
/// [`CompareContext::different`] so paths and options stay consistent.
pub trait Comparer: Send + Sync {
    fn compare(
        &self,
        first: &Value,
        second: &Value,
        ctx: &mut CompareContext<'_>,
    ) -> Result<Option<String>>;
}

impl<F> Comparer for F
where
    F: Fn(&Value, &Value, &mut CompareContext<'_>) -> Result<Option<String>> + Send + Sync,
{
    fn compare(
        &self,
        first: &Value,
        second: &Value,
        ctx: &mut CompareContext<'_>,
    ) -> Result<Option<String>> {
        self(first, second, ctx)
    }
}

/// Pin a closure to the comparer signature so its argument types can be
/// inferred.
pub fn comparer<F>(f: F) -> F
where
    F: Fn(&Value, &Value, &mut CompareContext<'_>) -> Result<Option<String>> + Send + Sync,
{
    f
}

/// Mapping from exact type to comparer. Cloning is cheap; the table is
/// copied on the first write after a clone.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<TypeKey, Arc<dyn Comparer>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut map: HashMap<TypeKey, Arc<dyn Comparer>> = HashMap::new();
        map.insert(TypeKey::Set, Arc::new(builtins::compare_set));
        map.insert(TypeKey::Map, Arc::new(builtins::compare_mapping));
        map.insert(TypeKey::List, Arc::new(builtins::compare_sequence));
        map.insert(TypeKey::Tuple, Arc::new(builtins::compare_sequence));
        map.insert(TypeKey::Text, Arc::new(builtins::compare_text));
        Self { inner: Arc::new(map) }
    }

    /// Install or replace the comparer for exactly `key`.
    pub fn register<C: Comparer + 'static>(&mut self, key: TypeKey, comparer: C) {
        self.insert(key, Arc::new(comparer));
    }

    pub fn insert(&mut self, key: TypeKey, comparer: Arc<dyn Comparer>) {
        Arc::make_mut(&mut self.inner).insert(key, comparer);
    }

    pub fn get(&self, key: &TypeKey) -> Option<Arc<dyn Comparer>> {
        self.inner.get(key).cloned()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Comparer for an exact type. Records and objects without a
    /// registration of their own get the generic field/attribute comparers;
    /// nothing else is inherited.
    pub fn lookup(&self, key: &TypeKey) -> Option<Arc<dyn Comparer>> {
        if let Some(found) = self.get(key) {
            return Some(found);
        }
        match key {
            TypeKey::Record(_) => Some(Arc::new(builtins::compare_record)),
            TypeKey::Object(_) => Some(Arc::new(builtins::compare_object)),
            _ => None,
        }
    }

    /// A copy of this registry with `overlay`'s entries taking precedence.
    pub fn overlaid(&self, overlay: &Registry) -> Registry {
        if overlay.is_empty() {
            return self.clone();
        }
        let mut merged = self.clone();
        for (key, comparer) in overlay.inner.iter() {
            merged.insert(key.clone(), Arc::clone(comparer));
        }
        merged
    }
}

static GLOBAL: LazyLock<RwLock<Registry>> =
    LazyLock::new(|| RwLock::new(Registry::with_builtins()));

/// Register a comparer for the rest of the process. The last registration
/// for a type wins.
pub fn register<C: Comparer + 'static>(key: TypeKey, comparer: C) {
    debug!(kind = %key, "registering global comparer");
    GLOBAL.write().register(key, comparer);
}

/// Snapshot of the global registry.
pub fn global() -> Registry {
    GLOBAL.read().clone()
}

/// Replaces the global registry until dropped, then puts the previous
/// table back, including when unwinding from a panic.
///
/// Not a substitute for isolation: comparisons running concurrently on
/// other threads see the replacement too.
#[must_use = "the previous registry is restored when the guard is dropped"]
pub struct ScopedRegistry {
    previous: Option<Registry>,
}

/// Swap in `replacement` as the global registry for the guard's lifetime.
pub fn scoped(replacement: Registry) -> ScopedRegistry {
    let previous = std::mem::replace(&mut *GLOBAL.write(), replacement);
    debug!("global registry replaced for scope");
    ScopedRegistry { previous: Some(previous) }
}

/// Layer `overlay` over the current global registry for the guard's lifetime.
pub fn scoped_overlay(overlay: &Registry) -> ScopedRegistry {
    scoped(global().overlaid(overlay))
}

impl Drop for ScopedRegistry {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *GLOBAL.write() = previous;
            debug!("global registry restored");
        }
    }
}
