use super::{ProviderStrategy, push_distinct};
use crate::provider::ContextProvider;
use parking_lot::Mutex;
use std::sync::Arc;
use vernacular_scope::{Scope, ScopeMap};

#[derive(Clone)]
struct ProviderEntry {
    provider: Arc<dyn ContextProvider>,
    explicit: bool,
}

struct State {
    entries: ScopeMap<ProviderEntry>,
    default: Arc<dyn ContextProvider>,
}

/// Per-scope providers, inherited down the scope tree.
///
/// A scope uses the provider explicitly [`set`](ProviderStrategy::set) for it.
/// Otherwise it uses its parent's provider, and a root uses the default. The
/// inherited answer is cached for the scope, so the next lookup does not walk
/// the tree again.
///
/// Lookups and changes are serialized by one lock. Changing a provider drops
/// the inherited entries it could make stale; they are recomputed on next
/// access.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vernacular_context::{
///     ContextProvider, ProviderBase, ProviderStrategy, ScopedProviderStrategy,
///     SharedContextProvider,
/// };
/// use vernacular_scope::Scope;
///
/// let app: Arc<dyn ContextProvider> = Arc::new(SharedContextProvider::new(ProviderBase::new()));
/// let plugin: Arc<dyn ContextProvider> = Arc::new(SharedContextProvider::new(ProviderBase::new()));
/// let strategy = ScopedProviderStrategy::new(Arc::clone(&app));
///
/// let root = Scope::root("app");
/// let plugin_scope = root.child("plugin");
/// strategy.set(&plugin_scope, Arc::clone(&plugin));
///
/// assert!(Arc::ptr_eq(&strategy.get(&root.child("library")), &app));
/// assert!(Arc::ptr_eq(&strategy.get(&plugin_scope.child("nested")), &plugin));
/// ```
pub struct ScopedProviderStrategy {
    state: Mutex<State>,
}

impl core::fmt::Debug for ScopedProviderStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ScopedProviderStrategy")
            .field("entries", &state.entries.len())
            .field("default_session", &state.default.session_id())
            .finish()
    }
}

impl ScopedProviderStrategy {
    /// Creates a strategy whose roots resolve to `default`.
    #[must_use]
    pub fn new(default: Arc<dyn ContextProvider>) -> Self {
        Self {
            state: Mutex::new(State {
                entries: ScopeMap::new(),
                default,
            }),
        }
    }

    /// Whether `scope` has an explicitly set provider.
    #[must_use]
    pub fn is_explicit(&self, scope: &Scope) -> bool {
        self.state
            .lock()
            .entries
            .get(scope)
            .is_some_and(|entry| entry.explicit)
    }

    /// Returns the number of cached entries, explicit and inherited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Removes the entries of dropped scopes and returns how many were removed.
    pub fn purge(&self) -> usize {
        self.state.lock().entries.purge()
    }
}

impl ProviderStrategy for ScopedProviderStrategy {
    fn get(&self, scope: &Scope) -> Arc<dyn ContextProvider> {
        let mut state = self.state.lock();

        // Walk up to the nearest scope with an entry, or past the root.
        let mut missing = Vec::new();
        let mut found = None;
        for ancestor in scope.lineage() {
            if let Some(entry) = state.entries.get(ancestor) {
                found = Some(Arc::clone(&entry.provider));
                break;
            }
            missing.push(ancestor);
        }
        let provider = found.unwrap_or_else(|| Arc::clone(&state.default));

        for ancestor in missing {
            tracing::debug!(scope = %ancestor, "caching inherited provider");
            state.entries.insert(
                ancestor,
                ProviderEntry {
                    provider: Arc::clone(&provider),
                    explicit: false,
                },
            );
        }
        provider
    }

    fn set(&self, scope: &Scope, provider: Arc<dyn ContextProvider>) {
        let mut state = self.state.lock();
        state
            .entries
            .retain(|cached, entry| entry.explicit || !cached.is_descendant_of(scope));
        state.entries.insert(
            scope,
            ProviderEntry {
                provider,
                explicit: true,
            },
        );
        tracing::debug!(%scope, "provider set explicitly");
    }

    fn get_default(&self) -> Arc<dyn ContextProvider> {
        Arc::clone(&self.state.lock().default)
    }

    fn set_default(&self, provider: Arc<dyn ContextProvider>) {
        let mut state = self.state.lock();
        state.default = provider;
        state.entries.retain(|_, entry| entry.explicit);
        tracing::debug!("default provider replaced");
    }

    fn invalidate(&self) {
        let distinct = {
            let state = self.state.lock();
            let mut distinct = Vec::new();
            for entry in state.entries.values() {
                if !Arc::ptr_eq(&entry.provider, &state.default) {
                    push_distinct(&mut distinct, &entry.provider);
                }
            }
            distinct.push(Arc::clone(&state.default));
            distinct
        };

        tracing::info!(providers = distinct.len(), "invalidating providers");
        for provider in distinct {
            provider.invalidate();
        }
    }

    fn forget(&self, scope: &Scope) {
        self.state.lock().entries.remove(scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderBase, SharedContextProvider};

    fn shared() -> Arc<dyn ContextProvider> {
        Arc::new(SharedContextProvider::new(ProviderBase::new()))
    }

    #[test]
    fn lookup_caches_the_whole_chain() {
        let strategy = ScopedProviderStrategy::new(shared());
        let root = Scope::root("root");
        let leaf = root.child("a").child("b");

        strategy.get(&leaf);

        assert_eq!(strategy.len(), 3);
        assert!(!strategy.is_explicit(&leaf));
    }

    #[test]
    fn explicit_set_drops_stale_inherited_descendants() {
        let default = shared();
        let strategy = ScopedProviderStrategy::new(Arc::clone(&default));
        let root = Scope::root("root");
        let middle = root.child("middle");
        let leaf = middle.child("leaf");
        assert!(Arc::ptr_eq(&strategy.get(&leaf), &default));

        let replacement = shared();
        strategy.set(&middle, Arc::clone(&replacement));

        assert!(strategy.is_explicit(&middle));
        assert!(Arc::ptr_eq(&strategy.get(&leaf), &replacement));
        assert!(Arc::ptr_eq(&strategy.get(&root), &default));
    }

    #[test]
    fn explicit_descendants_survive_ancestor_changes() {
        let strategy = ScopedProviderStrategy::new(shared());
        let root = Scope::root("root");
        let child = root.child("child");
        let own = shared();
        strategy.set(&child, Arc::clone(&own));

        strategy.set(&root, shared());
        strategy.set_default(shared());

        assert!(Arc::ptr_eq(&strategy.get(&child), &own));
    }

    #[test]
    fn set_default_reaches_inheriting_roots() {
        let strategy = ScopedProviderStrategy::new(shared());
        let root = Scope::root("root");
        strategy.get(&root);

        let replacement = shared();
        strategy.set_default(Arc::clone(&replacement));

        assert!(Arc::ptr_eq(&strategy.get(&root), &replacement));
    }

    #[test]
    fn forget_and_purge_drop_entries() {
        let strategy = ScopedProviderStrategy::new(shared());
        let root = Scope::root("root");
        let kept = root.child("kept");
        strategy.get(&kept);
        strategy.forget(&kept);
        assert_eq!(strategy.len(), 1);

        let transient = root.child("transient");
        strategy.get(&transient);
        drop(transient);
        assert_eq!(strategy.purge(), 1);
        assert_eq!(strategy.len(), 1);
    }
}
