//! Provider strategies: which provider governs which scope.
//!
//! - [`SingleProviderStrategy`] - One provider for every scope
//! - [`ScopedProviderStrategy`] - Per-scope providers inherited down the
//!   scope tree

mod scoped;
mod single;

pub use scoped::ScopedProviderStrategy;
pub use single::SingleProviderStrategy;

use crate::provider::ContextProvider;
use std::sync::Arc;
use vernacular_scope::Scope;

/// Maps scopes to context providers.
pub trait ProviderStrategy: Send + Sync + 'static {
    /// Returns the provider governing `scope`.
    fn get(&self, scope: &Scope) -> Arc<dyn ContextProvider>;

    /// Makes `provider` govern `scope`.
    fn set(&self, scope: &Scope, provider: Arc<dyn ContextProvider>);

    /// Returns the provider used where nothing else applies.
    fn get_default(&self) -> Arc<dyn ContextProvider>;

    /// Replaces the default provider.
    fn set_default(&self, provider: Arc<dyn ContextProvider>);

    /// Invalidates every distinct provider known to this strategy once.
    fn invalidate(&self);

    /// Drops whatever is kept for `scope`.
    fn forget(&self, scope: &Scope);

    /// Returns the provider of the calling thread's current scope.
    fn current(&self) -> Arc<dyn ContextProvider> {
        self.get(&Scope::current())
    }
}

/// Pushes `provider` unless the same instance is already in `distinct`.
pub(crate) fn push_distinct(
    distinct: &mut Vec<Arc<dyn ContextProvider>>,
    provider: &Arc<dyn ContextProvider>,
) {
    if !distinct.iter().any(|known| Arc::ptr_eq(known, provider)) {
        distinct.push(Arc::clone(provider));
    }
}
