//! Units of work and the hand-off to child units.
//!
//! Per-thread providers keep one context slot per [`WorkId`]. By default a
//! thread gets its own id the first time it asks for one. Work that moves
//! between threads (a task, a pooled job) can carry an id explicitly and
//! [`adopt`](WorkId::adopt) it where it runs.
//!
//! State keyed by a thread's own id is dropped when the thread exits.
//! Adopted ids outlive the threads they visit and are released explicitly.

use crate::provider::ContextProvider;
use core::cell::{Cell, RefCell};
use core::marker::PhantomData;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use vernacular_scope::Scope;

static NEXT_WORK_ID: AtomicU64 = AtomicU64::new(1);

/// Per-unit state to drop when the owning thread exits.
pub(crate) trait ThreadExit: Send + Sync {
    fn thread_exited(&self, work: WorkId);
}

/// The calling thread's own id and the owners of state keyed by it.
struct ThreadWork {
    id: Cell<Option<WorkId>>,
    on_exit: RefCell<Vec<Weak<dyn ThreadExit>>>,
}

impl ThreadWork {
    fn id(&self) -> WorkId {
        self.id.get().unwrap_or_else(|| {
            let id = WorkId::reserve();
            self.id.set(Some(id));
            id
        })
    }
}

impl Drop for ThreadWork {
    fn drop(&mut self) {
        let Some(work) = self.id.get() else {
            return;
        };
        for owner in self.on_exit.get_mut().drain(..) {
            if let Some(owner) = owner.upgrade() {
                owner.thread_exited(work);
            }
        }
    }
}

thread_local! {
    static CURRENT: Cell<Option<WorkId>> = const { Cell::new(None) };
    static THREAD: ThreadWork = const {
        ThreadWork {
            id: Cell::new(None),
            on_exit: RefCell::new(Vec::new()),
        }
    };
}

/// Notifies `owner` when the calling thread exits, if `work` is the thread's
/// own id. Adopted ids are ignored.
pub(crate) fn release_on_thread_exit(work: WorkId, owner: &Arc<dyn ThreadExit>) {
    // Fails only while the thread is already tearing down its locals.
    let _ = THREAD.try_with(|thread| {
        if thread.id.get() != Some(work) {
            return;
        }
        let owner = Arc::downgrade(owner);
        let mut on_exit = thread.on_exit.borrow_mut();
        on_exit.retain(|known| known.strong_count() > 0);
        if !on_exit.iter().any(|known| known.ptr_eq(&owner)) {
            on_exit.push(owner);
        }
    });
}

/// Identifies a unit of work owning one context slot per provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkId(u64);

impl WorkId {
    /// Returns the unit of work of the calling thread: the adopted id if
    /// any, otherwise the thread's own id, assigned on first use.
    #[must_use]
    pub fn current() -> Self {
        CURRENT.with(|current| {
            current.get().unwrap_or_else(|| {
                let id = THREAD.with(ThreadWork::id);
                current.set(Some(id));
                id
            })
        })
    }

    /// Allocates a new id without binding it to any thread.
    #[must_use]
    pub fn reserve() -> Self {
        Self(NEXT_WORK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Makes this id the calling thread's unit of work until the guard is
    /// dropped, then restores the previous one.
    #[must_use = "the id is only adopted while the guard is alive"]
    pub fn adopt(self) -> AdoptGuard {
        let previous = CURRENT.with(|current| current.replace(Some(self)));
        AdoptGuard {
            previous,
            _not_send: PhantomData,
        }
    }

    /// Returns the numeric value.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for WorkId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "work-{}", self.0)
    }
}

/// Guard returned by [`WorkId::adopt()`].
#[derive(Debug)]
pub struct AdoptGuard {
    previous: Option<WorkId>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for AdoptGuard {
    fn drop(&mut self) {
        CURRENT.with(|current| current.set(self.previous));
    }
}

/// Releases a child's slot when the child finishes, even by panicking.
struct ReleaseOnExit {
    provider: Arc<dyn ContextProvider>,
    work: WorkId,
}

impl Drop for ReleaseOnExit {
    fn drop(&mut self) {
        self.provider.release(self.work);
    }
}

/// Spawns a thread as a child unit of work of the caller.
///
/// The child gets a fresh [`WorkId`], inherits the caller's current scope, and
/// is announced to `provider` through
/// [`on_spawn_child()`](ContextProvider::on_spawn_child) before it starts. Its
/// slot is released when `f` returns.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vernacular_config::Locale;
/// use vernacular_context::{ContextProvider, ProviderBase, ThreadContextProvider, spawn};
///
/// let provider: Arc<dyn ContextProvider> =
///     Arc::new(ThreadContextProvider::new(ProviderBase::new(), true));
/// provider.set_locale(Locale::new("fr"));
///
/// let child = spawn(&provider, {
///     let provider = Arc::clone(&provider);
///     move || provider.locale()
/// });
/// assert_eq!(child.join().unwrap(), Locale::new("fr"));
/// ```
pub fn spawn<F, T>(provider: &Arc<dyn ContextProvider>, f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let parent = WorkId::current();
    let child = WorkId::reserve();
    let scope = Scope::try_current();
    provider.on_spawn_child(parent, child);
    tracing::trace!(%parent, %child, "spawning child unit of work");

    let provider = Arc::clone(provider);
    std::thread::spawn(move || {
        let _entered = scope.as_ref().map(Scope::enter);
        let _adopted = child.adopt();
        let _release = ReleaseOnExit {
            provider,
            work: child,
        };
        f()
    })
}
