use super::{ContextProvider, ProviderBase};
use crate::context::Context;
use crate::session::{Session, SessionId};
use parking_lot::Mutex;
use std::sync::Arc;
use vernacular_config::Locale;
use vernacular_messages::Resources;

/// Shares a single context between all callers.
///
/// The context is created on first access. [`clear_context()`](ContextProvider::clear_context)
/// drops it, and [`invalidate()`](ContextProvider::invalidate) starts a new
/// session and drops it.
pub struct SharedContextProvider {
    base: ProviderBase,
    session: Session,
    context: Mutex<Option<Arc<Context>>>,
}

impl core::fmt::Debug for SharedContextProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedContextProvider")
            .field("session", &self.session.current())
            .field("context", &self.context.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl SharedContextProvider {
    /// Creates a provider.
    #[must_use]
    pub fn new(base: ProviderBase) -> Self {
        Self {
            base,
            session: Session::new(),
            context: Mutex::new(None),
        }
    }
}

impl ContextProvider for SharedContextProvider {
    fn session_id(&self) -> SessionId {
        self.session.current()
    }

    fn get_context(&self) -> Arc<Context> {
        let mut held = self.context.lock();
        let session = self.session.current();

        if let Some(context) = held.as_ref()
            && context.session_id() == session
        {
            return Arc::clone(context);
        }

        let context = self.base.new_context(&self.session);
        tracing::debug!(session = %context.session_id(), "created shared context");
        *held = Some(Arc::clone(&context));
        context
    }

    fn create_context(&self) -> Arc<Context> {
        self.base.new_context(&self.session)
    }

    fn is_valid(&self, context: &Arc<Context>) -> bool {
        let held = self.context.lock();
        context.session_id() == self.session.current()
            && held.as_ref().is_some_and(|held| Arc::ptr_eq(held, context))
    }

    fn clear_context(&self) {
        self.context.lock().take();
    }

    fn invalidate(&self) {
        let mut held = self.context.lock();
        let session = self.session.rotate();
        held.take();
        tracing::info!(%session, "shared context provider invalidated");
    }

    fn available_locales(&self) -> Vec<Locale> {
        self.base.available_locales()
    }

    fn default_locale(&self) -> Locale {
        self.base.default_locale()
    }

    fn i18n_resources(&self, key: Option<&str>) -> Option<Arc<dyn Resources>> {
        self.base.resources(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn provider() -> Arc<SharedContextProvider> {
        Arc::new(SharedContextProvider::new(
            ProviderBase::new().with_default_locale(Locale::new("en")),
        ))
    }

    #[test]
    fn all_threads_share_one_context() {
        let provider = provider();
        let here = provider.get_context();

        let there = thread::spawn({
            let provider = Arc::clone(&provider);
            move || provider.get_context()
        })
        .join()
        .unwrap();

        assert!(Arc::ptr_eq(&here, &there));
        there.set_locale(Locale::new("nl"));
        assert_eq!(provider.locale(), Locale::new("nl"));
    }

    #[test]
    fn clear_context_recreates_lazily() {
        let provider = provider();
        let first = provider.get_context();
        first.set_locale(Locale::new("sv"));

        provider.clear_context();
        assert!(!provider.is_valid(&first));

        let second = provider.get_context();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.locale(), Locale::new("en"));
        assert_eq!(second.session_id(), first.session_id());
    }

    #[test]
    fn invalidate_rotates_and_drops() {
        let provider = provider();
        let first = provider.get_context();
        let session = provider.session_id();

        provider.invalidate();

        assert_ne!(provider.session_id(), session);
        assert!(!provider.is_valid(&first));
        let second = provider.get_context();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(provider.is_valid(&second));
    }
}
