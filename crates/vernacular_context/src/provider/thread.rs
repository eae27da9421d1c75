use super::{ContextProvider, ProviderBase};
use crate::context::Context;
use crate::session::{Session, SessionId};
use crate::work::{self, ThreadExit, WorkId};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use vernacular_config::Locale;
use vernacular_messages::Resources;

/// Keeps one context per unit of work.
///
/// Each [`WorkId`] owns a slot. A slot is reused while its context carries the
/// current session; after [`invalidate()`](ContextProvider::invalidate) every
/// slot is stale and is replaced on next access.
///
/// A thread's own slot is dropped when the thread exits. Slots of adopted or
/// spawned units are dropped by [`release()`](ContextProvider::release).
///
/// In inheritable mode a child unit of work starts with a copy of its
/// parent's context (see [`spawn_child()`](Self::spawn_child)), so it sees
/// the parent's locale at spawn time but its own changes stay its own.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vernacular_config::Locale;
/// use vernacular_context::{ContextProvider, ProviderBase, ThreadContextProvider};
///
/// let provider = Arc::new(ThreadContextProvider::new(
///     ProviderBase::new().with_default_locale(Locale::new("en")),
///     true,
/// ));
/// provider.set_locale(Locale::new("it"));
///
/// let child = provider.spawn_child({
///     let provider = Arc::clone(&provider);
///     move || {
///         let inherited = provider.locale();
///         provider.set_locale(Locale::new("ja"));
///         inherited
///     }
/// });
///
/// assert_eq!(child.join().unwrap(), Locale::new("it"));
/// assert_eq!(provider.locale(), Locale::new("it"));
/// ```
pub struct ThreadContextProvider {
    base: ProviderBase,
    session: Session,
    inherited: bool,
    slots: Arc<Slots>,
}

#[derive(Default)]
struct Slots(Mutex<HashMap<WorkId, Arc<Context>>>);

impl ThreadExit for Slots {
    fn thread_exited(&self, work: WorkId) {
        self.0.lock().remove(&work);
    }
}

impl core::fmt::Debug for ThreadContextProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThreadContextProvider")
            .field("session", &self.session.current())
            .field("inherited", &self.inherited)
            .field("slots", &self.slots.0.lock().len())
            .finish_non_exhaustive()
    }
}

impl ThreadContextProvider {
    /// Creates a provider. `inherited` enables copying contexts into child
    /// units of work.
    #[must_use]
    pub fn new(base: ProviderBase, inherited: bool) -> Self {
        Self {
            base,
            session: Session::new(),
            inherited,
            slots: Arc::default(),
        }
    }

    /// Whether child units of work start from a copy of their parent's
    /// context.
    #[must_use]
    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    /// Spawns a thread as a child unit of work of the caller.
    ///
    /// See [`spawn()`](crate::spawn).
    pub fn spawn_child<F, T>(self: &Arc<Self>, f: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let provider: Arc<dyn ContextProvider> = Arc::clone(self) as Arc<dyn ContextProvider>;
        work::spawn(&provider, f)
    }

    /// Number of occupied slots, stale ones included. Threads that have
    /// exited hold none.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.0.lock().len()
    }
}

impl ContextProvider for ThreadContextProvider {
    fn session_id(&self) -> SessionId {
        self.session.current()
    }

    fn get_context(&self) -> Arc<Context> {
        let work = WorkId::current();
        let session = self.session.current();
        let mut slots = self.slots.0.lock();

        if let Some(context) = slots.get(&work)
            && context.session_id() == session
        {
            return Arc::clone(context);
        }

        let context = self.base.new_context(&self.session);
        tracing::trace!(%work, session = %context.session_id(), "created per-thread context");
        slots.insert(work, Arc::clone(&context));
        drop(slots);

        let owner = Arc::clone(&self.slots) as Arc<dyn ThreadExit>;
        work::release_on_thread_exit(work, &owner);
        context
    }

    fn create_context(&self) -> Arc<Context> {
        self.base.new_context(&self.session)
    }

    fn is_valid(&self, context: &Arc<Context>) -> bool {
        context.session_id() == self.session.current()
            && self
                .slots
                .0
                .lock()
                .get(&WorkId::current())
                .is_some_and(|stored| Arc::ptr_eq(stored, context))
    }

    fn clear_context(&self) {
        self.slots.0.lock().remove(&WorkId::current());
    }

    fn invalidate(&self) {
        let session = self.session.rotate();
        tracing::info!(%session, "per-thread context provider invalidated");
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

    fn on_spawn_child(&self, parent: WorkId, child: WorkId) {
        if !self.inherited {
            return;
        }

        let session = self.session.current();
        let mut slots = self.slots.0.lock();
        let Some(context) = slots.get(&parent).filter(|c| c.session_id() == session) else {
            return;
        };
        let copy = Arc::new(context.snapshot());
        tracing::trace!(%parent, %child, "copied context into child unit of work");
        slots.insert(child, copy);
    }

    fn release(&self, work: WorkId) {
        self.slots.0.lock().remove(&work);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(inherited: bool) -> Arc<ThreadContextProvider> {
        Arc::new(ThreadContextProvider::new(
            ProviderBase::new().with_default_locale(Locale::new("en")),
            inherited,
        ))
    }

    #[test]
    fn reuses_valid_slot() {
        let provider = provider(true);
        let first = provider.get_context();
        let second = provider.get_context();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(provider.is_valid(&first));
    }

    #[test]
    fn created_context_is_not_stored() {
        let provider = provider(true);
        let created = provider.create_context();
        assert_eq!(created.session_id(), provider.session_id());
        assert_eq!(created.locale(), Locale::new("en"));
        assert!(!provider.is_valid(&created));
    }

    #[test]
    fn clear_context_empties_the_slot() {
        let provider = provider(true);
        let first = provider.get_context();
        provider.clear_context();
        assert!(!provider.is_valid(&first));
        assert!(!Arc::ptr_eq(&first, &provider.get_context()));
    }

    #[test]
    fn child_without_inheritance_starts_fresh() {
        let provider = provider(false);
        provider.set_locale(Locale::new("fr"));

        let child = provider.spawn_child({
            let provider = Arc::clone(&provider);
            move || provider.locale()
        });
        assert_eq!(child.join().unwrap(), Locale::new("en"));
    }

    #[test]
    fn child_slot_is_released_on_exit() {
        let provider = provider(true);
        provider.get_context();

        provider
            .spawn_child({
                let provider = Arc::clone(&provider);
                move || {
                    provider.get_context();
                }
            })
            .join()
            .unwrap();

        assert_eq!(provider.slot_count(), 1);
    }

    #[test]
    fn stale_parent_context_is_not_inherited() {
        let provider = provider(true);
        provider.set_locale(Locale::new("fr"));
        provider.invalidate();

        let parent = WorkId::current();
        let child = WorkId::reserve();
        provider.on_spawn_child(parent, child);

        let _adopted = child.adopt();
        assert_eq!(provider.locale(), Locale::new("en"));
    }
}
