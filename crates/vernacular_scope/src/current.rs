//! The current scope of the calling thread.

use crate::scope::Scope;
use core::cell::RefCell;
use core::marker::PhantomData;

thread_local! {
    static ENTERED: RefCell<Vec<Scope>> = const { RefCell::new(Vec::new()) };
}

impl Scope {
    /// Makes this scope the current scope of the calling thread until the
    /// returned guard is dropped.
    ///
    /// Guards nest: dropping an inner guard restores the previously entered
    /// scope. Dropping an outer guard first also leaves every scope entered
    /// after it.
    ///
    /// # Example
    ///
    /// ```
    /// use vernacular_scope::Scope;
    ///
    /// let outer = Scope::root("outer");
    /// let inner = outer.child("inner");
    ///
    /// let _outer = outer.enter();
    /// {
    ///     let _inner = inner.enter();
    ///     assert_eq!(Scope::current(), inner);
    /// }
    /// assert_eq!(Scope::current(), outer);
    /// ```
    #[must_use = "the scope is only current while the guard is alive"]
    pub fn enter(&self) -> EnterGuard {
        let depth = ENTERED.with(|entered| {
            let mut entered = entered.borrow_mut();
            entered.push(self.clone());
            entered.len() - 1
        });
        EnterGuard {
            depth,
            _not_send: PhantomData,
        }
    }

    /// Returns the innermost scope entered on this thread, or
    /// [`Scope::global()`] if none is.
    #[must_use]
    pub fn current() -> Scope {
        Self::try_current().unwrap_or_else(Scope::global)
    }

    /// Returns the innermost scope entered on this thread, if any.
    #[must_use]
    pub fn try_current() -> Option<Scope> {
        ENTERED.with(|entered| entered.borrow().last().cloned())
    }
}

/// Guard returned by [`Scope::enter()`].
///
/// The guard is tied to the thread that created it.
#[derive(Debug)]
pub struct EnterGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for EnterGuard {
    fn drop(&mut self) {
        ENTERED.with(|entered| {
            entered.borrow_mut().truncate(self.depth);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_global() {
        assert!(Scope::try_current().is_none());
        assert_eq!(Scope::current(), Scope::global());
    }

    #[test]
    fn guards_nest_and_restore() {
        let a = Scope::root("a");
        let b = a.child("b");

        let guard_a = a.enter();
        let guard_b = b.enter();
        assert_eq!(Scope::current(), b);
        drop(guard_b);
        assert_eq!(Scope::current(), a);
        drop(guard_a);
        assert!(Scope::try_current().is_none());
    }

    #[test]
    fn out_of_order_drop_leaves_inner_scopes() {
        let a = Scope::root("a");
        let b = a.child("b");
        let c = Scope::root("c");

        let guard_a = a.enter();
        let guard_b = b.enter();
        drop(guard_a);
        assert!(Scope::try_current().is_none());

        let guard_c = c.enter();
        drop(guard_b);
        assert_eq!(Scope::current(), c);
        drop(guard_c);
        assert!(Scope::try_current().is_none());
    }

    #[test]
    fn current_scope_is_per_thread() {
        let scope = Scope::root("main-only");
        let _guard = scope.enter();

        let seen = std::thread::spawn(Scope::try_current)
            .join()
            .expect("thread panicked");
        assert!(seen.is_none());
        assert_eq!(Scope::current(), scope);
    }
}
