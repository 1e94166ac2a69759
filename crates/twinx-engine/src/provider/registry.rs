use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use twinx_core::TwinError;

use crate::Result;

/// Identifier-keyed map of providers, in registration order
///
/// Each call takes the lock for its own duration only; callers get `Arc`
/// handles and work on the provider without holding the registry.
pub struct ProviderRegistry<P> {
    providers: RwLock<IndexMap<String, Arc<P>>>,
}

impl<P> Default for ProviderRegistry<P> {
    fn default() -> Self {
        Self {
            providers: RwLock::new(IndexMap::new()),
        }
    }
}

impl<P> ProviderRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider under a new id
    ///
    /// # Errors
    /// * `Conflict` - the id is already registered
    pub fn register(&self, id: impl Into<String>, provider: Arc<P>) -> Result<Arc<P>> {
        let id = id.into();
        let mut providers = self.providers.write();
        if providers.contains_key(&id) {
            return Err(TwinError::EntityAlreadyExists { entity_id: id }.into());
        }
        providers.insert(id, Arc::clone(&provider));
        Ok(provider)
    }

    /// Add or replace, returning the replaced provider
    ///
    /// A replaced entry keeps its position.
    pub fn register_or_replace(&self, id: impl Into<String>, provider: Arc<P>) -> Option<Arc<P>> {
        self.providers.write().insert(id.into(), provider)
    }

    /// # Errors
    /// * `NotFound` - no provider under the id
    pub fn unregister(&self, id: &str) -> Result<Arc<P>> {
        self.providers
            .write()
            .shift_remove(id)
            .ok_or_else(|| not_found(id))
    }

    /// # Errors
    /// * `NotFound` - no provider under the id
    pub fn get(&self, id: &str) -> Result<Arc<P>> {
        self.providers
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.read().contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }

    /// Snapshot of the registered providers in order
    pub fn providers(&self) -> Vec<Arc<P>> {
        self.providers.read().values().cloned().collect()
    }

    /// Swap the whole content for `entries` in one step
    pub fn replace_all(&self, entries: impl IntoIterator<Item = (String, Arc<P>)>) {
        let next: IndexMap<String, Arc<P>> = entries.into_iter().collect();
        *self.providers.write() = next;
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl<P> std::fmt::Debug for ProviderRegistry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

fn not_found(id: &str) -> twinx_core::ExError {
    TwinError::EntityNotFound {
        entity_id: id.to_string(),
    }
    .into()
}
