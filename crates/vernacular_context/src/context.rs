//! The locale holder handed to application code.

use crate::session::SessionId;
use core::sync::atomic::{AtomicBool, Ordering};
use parking_lot::RwLock;
use vernacular_config::Locale;

/// Mutable locale state of one unit of work (or of everyone, for the shared
/// provider).
///
/// Contexts are created by a [`ContextProvider`](crate::ContextProvider) and
/// handed out as `Arc<Context>`. Whether a context is still current is decided
/// by the provider: see [`ContextProvider::is_valid()`](crate::ContextProvider::is_valid).
#[derive(Debug)]
pub struct Context {
    session: SessionId,
    locale: RwLock<Locale>,
    full_mode: AtomicBool,
}

impl Context {
    /// Creates a context for `session` with `locale`.
    #[must_use]
    pub fn new(session: SessionId, locale: Locale) -> Self {
        Self {
            session,
            locale: RwLock::new(locale),
            full_mode: AtomicBool::new(false),
        }
    }

    /// Returns the session of the provider that created this context.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session
    }

    /// Returns the current locale.
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale.read().clone()
    }

    /// Replaces the locale.
    pub fn set_locale(&self, locale: Locale) {
        *self.locale.write() = locale;
    }

    /// Whether this context asks for all available translations rather than
    /// the current locale only.
    #[must_use]
    pub fn is_full_mode(&self) -> bool {
        self.full_mode.load(Ordering::Acquire)
    }

    /// Sets full mode.
    pub fn set_full_mode(&self, full_mode: bool) {
        self.full_mode.store(full_mode, Ordering::Release);
    }

    /// Returns an independent context with the same session and state.
    ///
    /// Used to hand a parent's state to a child unit of work: changes to the
    /// copy never reach the original.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            session: self.session,
            locale: RwLock::new(self.locale()),
            full_mode: AtomicBool::new(self.is_full_mode()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_independent() {
        let original = Context::new(SessionId::new(), Locale::new("en"));
        original.set_full_mode(true);

        let copy = original.snapshot();
        assert_eq!(copy.session_id(), original.session_id());
        assert_eq!(copy.locale(), Locale::new("en"));
        assert!(copy.is_full_mode());

        copy.set_locale(Locale::new("fr"));
        copy.set_full_mode(false);
        assert_eq!(original.locale(), Locale::new("en"));
        assert!(original.is_full_mode());
    }
}
