use super::ProviderStrategy;
use crate::provider::ContextProvider;
use parking_lot::RwLock;
use std::sync::Arc;
use vernacular_scope::Scope;

/// One global provider for every scope.
///
/// [`set()`](ProviderStrategy::set) and
/// [`set_default()`](ProviderStrategy::set_default) both replace it.
pub struct SingleProviderStrategy {
    provider: RwLock<Arc<dyn ContextProvider>>,
}

impl core::fmt::Debug for SingleProviderStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SingleProviderStrategy")
            .field("session", &self.provider.read().session_id())
            .finish()
    }
}

impl SingleProviderStrategy {
    /// Creates a strategy around `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn ContextProvider>) -> Self {
        Self {
            provider: RwLock::new(provider),
        }
    }
}

impl ProviderStrategy for SingleProviderStrategy {
    fn get(&self, _scope: &Scope) -> Arc<dyn ContextProvider> {
        Arc::clone(&*self.provider.read())
    }

    fn set(&self, scope: &Scope, provider: Arc<dyn ContextProvider>) {
        tracing::debug!(%scope, "replacing the global provider");
        *self.provider.write() = provider;
    }

    fn get_default(&self) -> Arc<dyn ContextProvider> {
        Arc::clone(&*self.provider.read())
    }

    fn set_default(&self, provider: Arc<dyn ContextProvider>) {
        *self.provider.write() = provider;
    }

    fn invalidate(&self) {
        let provider = self.get_default();
        provider.invalidate();
    }

    fn forget(&self, _scope: &Scope) {}
}
