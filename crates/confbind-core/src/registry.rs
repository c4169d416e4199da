//! Cache of bound options instances
//!
//! Each `(options type, section path)` pair is bound at most once per
//! registry; later requests receive the same [`Arc`]. The registry owns the
//! store it binds from, so a changed configuration needs a new registry.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Error, Result};
use crate::path::PathKey;
use crate::section::SectionView;
use crate::shape::Options;
use crate::store::ConfigurationStore;

/// Cache key: (options TypeId, section path)
type CacheKey = (TypeId, PathKey);

/// Hands out shared, bound options instances
pub struct OptionsRegistry {
    store: Arc<ConfigurationStore>,
    cache: RwLock<HashMap<CacheKey, Arc<dyn Any + Send + Sync>>>,
    configured: RwLock<HashMap<TypeId, PathKey>>,
}

impl OptionsRegistry {
    /// Create a registry over `store`
    pub fn new(store: impl Into<Arc<ConfigurationStore>>) -> Self {
        Self {
            store: store.into(),
            cache: RwLock::new(HashMap::new()),
            configured: RwLock::new(HashMap::new()),
        }
    }

    /// The store instances are bound from
    pub fn store(&self) -> &Arc<ConfigurationStore> {
        &self.store
    }

    /// View of a section of the underlying store
    pub fn section(&self, path: &str) -> SectionView<'_> {
        self.store.section(path)
    }

    /// Number of cached instances.
    ///
    /// Counts what is cached even after a panic poisoned the lock, since
    /// entries are only ever inserted whole.
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True if nothing has been bound yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bound `T` for the section at `path`.
    ///
    /// The first call binds and caches; later calls return the cached
    /// instance. Failed binds are not cached.
    pub fn resolve<T: Options>(&self, path: &str) -> Result<Arc<T>> {
        self.resolve_key(&PathKey::parse(path)?)
    }

    /// Same as [`resolve`](Self::resolve) with an already parsed path
    pub fn resolve_key<T: Options>(&self, path: &PathKey) -> Result<Arc<T>> {
        let key = (TypeId::of::<T>(), path.clone());

        // Try read lock first (fast path for cached instances)
        {
            let cache = self.cache.read().map_err(|_| poisoned())?;
            if let Some(cached) = cache.get(&key) {
                log::trace!("Options cache hit for {} at '{}'", type_name::<T>(), path);
                return downcast(Arc::clone(cached));
            }
        }

        log::trace!("Options cache miss for {} at '{}'", type_name::<T>(), path);
        let section = SectionView::new(&self.store, path.clone());
        let bound: Arc<dyn Any + Send + Sync> = Arc::new(section.bind::<T>()?);

        // Another thread may have published first; everyone gets that instance
        let published = {
            let mut cache = self.cache.write().map_err(|_| poisoned())?;
            Arc::clone(cache.entry(key).or_insert(bound))
        };
        log::debug!("Bound {} from '{}'", type_name::<T>(), path);
        downcast(published)
    }

    /// Record the section `T` is bound from for later [`get`](Self::get) calls.
    ///
    /// Reconfiguring a type replaces its path; instances already bound for the
    /// old path stay cached under it.
    pub fn configure<T: Options>(&self, path: &str) -> Result<()> {
        let path = PathKey::parse(path)?;
        let mut configured = self.configured.write().map_err(|_| poisoned())?;
        configured.insert(TypeId::of::<T>(), path);
        Ok(())
    }

    /// True if `T` has a configured section.
    ///
    /// Like [`len`](Self::len) this reads through a poisoned lock; [`get`](Self::get)
    /// reports the poisoning as an error instead.
    pub fn is_configured<T: Options>(&self) -> bool {
        self.configured
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    /// Bound `T` for the section it was configured with
    pub fn get<T: Options>(&self) -> Result<Arc<T>> {
        let path = {
            let configured = self.configured.read().map_err(|_| poisoned())?;
            configured
                .get(&TypeId::of::<T>())
                .cloned()
                .ok_or_else(|| Error::not_registered(short_type_name::<T>()))?
        };
        self.resolve_key(&path)
    }
}

impl fmt::Debug for OptionsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsRegistry")
            .field("entries", &self.store.len())
            .field("cached", &self.len())
            .finish()
    }
}

fn poisoned() -> Error {
    Error::internal("options cache lock poisoned")
}

fn downcast<T: Options>(value: Arc<dyn Any + Send + Sync>) -> Result<Arc<T>> {
    value.downcast::<T>().map_err(|_| {
        Error::internal(format!(
            "cached options instance is not a {}",
            type_name::<T>()
        ))
    })
}

/// Type name without its module path
fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
