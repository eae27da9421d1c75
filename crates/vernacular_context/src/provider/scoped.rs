use super::ContextProvider;
use crate::context::Context;
use crate::session::SessionId;
use crate::strategy::ProviderStrategy;
use crate::work::WorkId;
use std::sync::Arc;
use vernacular_config::Locale;
use vernacular_messages::Resources;

/// Routes every call to the provider of the calling thread's current scope.
///
/// Holds no contexts itself. Each call asks the strategy for
/// [`current()`](ProviderStrategy::current) and forwards to it, so code that
/// enters a different [`Scope`](vernacular_scope::Scope) transparently talks
/// to that scope's provider.
///
/// The wrapped strategy must not route back to this provider.
pub struct ScopedContextProvider {
    strategy: Arc<dyn ProviderStrategy>,
}

impl core::fmt::Debug for ScopedContextProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScopedContextProvider").finish_non_exhaustive()
    }
}

impl ScopedContextProvider {
    /// Creates a provider routing through `strategy`.
    #[must_use]
    pub fn new(strategy: Arc<dyn ProviderStrategy>) -> Self {
        Self { strategy }
    }

    /// Returns the strategy calls are routed through.
    #[must_use]
    pub fn strategy(&self) -> &Arc<dyn ProviderStrategy> {
        &self.strategy
    }

    fn target(&self) -> Arc<dyn ContextProvider> {
        self.strategy.current()
    }
}

impl ContextProvider for ScopedContextProvider {
    fn session_id(&self) -> SessionId {
        self.target().session_id()
    }

    fn get_context(&self) -> Arc<Context> {
        self.target().get_context()
    }

    fn create_context(&self) -> Arc<Context> {
        self.target().create_context()
    }

    fn is_valid(&self, context: &Arc<Context>) -> bool {
        self.target().is_valid(context)
    }

    fn clear_context(&self) {
        self.target().clear_context();
    }

    fn invalidate(&self) {
        self.target().invalidate();
    }

    fn available_locales(&self) -> Vec<Locale> {
        self.target().available_locales()
    }

    fn default_locale(&self) -> Locale {
        self.target().default_locale()
    }

    fn i18n_resources(&self, key: Option<&str>) -> Option<Arc<dyn Resources>> {
        self.target().i18n_resources(key)
    }

    fn on_spawn_child(&self, parent: WorkId, child: WorkId) {
        self.target().on_spawn_child(parent, child);
    }

    fn release(&self, work: WorkId) {
        self.target().release(work);
    }

    fn locale(&self) -> Locale {
        self.target().locale()
    }

    fn set_locale(&self, locale: Locale) {
        self.target().set_locale(locale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderBase, SharedContextProvider};
    use crate::strategy::ScopedProviderStrategy;
    use vernacular_scope::Scope;

    fn shared(locale: &str) -> Arc<dyn ContextProvider> {
        Arc::new(SharedContextProvider::new(
            ProviderBase::new().with_default_locale(Locale::new(locale)),
        ))
    }

    #[test]
    fn follows_the_entered_scope() {
        let app = shared("en");
        let plugin = shared("de");
        let strategy = Arc::new(ScopedProviderStrategy::new(Arc::clone(&app)));
        let root = Scope::root("app");
        let plugin_scope = root.child("plugin");
        strategy.set(&plugin_scope, Arc::clone(&plugin));

        let routed = ScopedContextProvider::new(strategy);

        {
            let _entered = root.enter();
            assert_eq!(routed.locale(), Locale::new("en"));
            assert_eq!(routed.session_id(), app.session_id());
        }
        {
            let _entered = plugin_scope.child("nested").enter();
            assert_eq!(routed.locale(), Locale::new("de"));
            let context = routed.get_context();
            assert!(plugin.is_valid(&context));
            assert!(routed.is_valid(&context));
        }
    }
}
