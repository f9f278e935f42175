//! Process-wide cache of loaded embedding pools.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::models::resolve_model;
use super::pool::EmbeddingPool;
use super::{EmbeddingError, ModelProvider, SentenceModel};
use crate::config::EmbeddingConfig;

/// One cache entry. `init` serializes loaders of the same key only.
struct Slot<T> {
    value: OnceLock<T>,
    init: Mutex<()>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: OnceLock::new(),
            init: Mutex::new(()),
        }
    }
}

/// Keyed load-once cache.
///
/// The map lock is held only to find or create a slot, never while a value is
/// being loaded, so a slow load blocks callers of that key and nobody else. A
/// failed load leaves the slot empty and the next caller retries.
struct LoadOnceMap<T> {
    slots: RwLock<HashMap<String, Arc<Slot<T>>>>,
}

impl<T: Clone> LoadOnceMap<T> {
    fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &str) -> Arc<Slot<T>> {
        if let Some(slot) = self.slots.read().get(key) {
            return slot.clone();
        }
        self.slots.write().entry(key.to_string()).or_default().clone()
    }

    fn get_or_try_load<E>(&self, key: &str, load: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let slot = self.slot(key);
        if let Some(value) = slot.value.get() {
            return Ok(value.clone());
        }

        let _guard = slot.init.lock();
        // Another caller may have finished loading while we waited
        if let Some(value) = slot.value.get() {
            return Ok(value.clone());
        }

        let value = load()?;
        Ok(slot.value.get_or_init(|| value).clone())
    }

    fn loaded_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .slots
            .read()
            .iter()
            .filter(|(_, slot)| slot.value.get().is_some())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

/// Loads each requested model once and hands out shared handles to it.
///
/// Pools are keyed by their resolved identifier, so aliases of the same model
/// share one pool. Loaded pools are never evicted. Runs against models that are
/// already loaded never wait on another model's load.
pub struct ModelRegistry {
    config: EmbeddingConfig,
    pools: LoadOnceMap<Arc<EmbeddingPool>>,
}

impl ModelRegistry {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            pools: LoadOnceMap::new(),
        }
    }

    /// Return the pool for `model`, loading it on first use.
    pub fn get_or_load(&self, model: &str) -> Result<Arc<EmbeddingPool>, EmbeddingError> {
        let resolved = resolve_model(model)?;

        self.pools.get_or_try_load(&resolved.name, || {
            tracing::info!(target: "semantic", "Loading embedding model {}", resolved.name);
            EmbeddingPool::new(
                &resolved,
                self.config.pool_size,
                self.config.batch_size,
                self.config.cache_dir(),
                self.config.show_download_progress,
            )
            .map(Arc::new)
        })
    }

/// Load the configured default model ahead of the first request.
    pub fn preload_default(&self) -> Result<Arc<EmbeddingPool>, EmbeddingError> {
        self.get_or_load(&self.config.model)
    }

    /// Identifiers of the models loaded so far, sorted.
    pub fn loaded_models(&self) -> Vec<String> {
        self.pools.loaded_keys()
    }

    pub fn default_model(&self) -> &str {
        &self.config.model
    }
}

impl ModelProvider for ModelRegistry {
    fn resolve(&self, model: Option<&str>) -> Result<SentenceModel, EmbeddingError> {
        let name = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.config.model);
        let pool = self.get_or_load(name)?;
        Ok(SentenceModel::from_shared(pool))
    }
}
