//! Process-wide default [`I18n`] instance.
//!
//! Libraries should receive an [`I18n`] explicitly. This holder exists for
//! the application's composition root and for code that cannot be handed
//! one; tests call [`reset()`] to isolate themselves.

use crate::i18n::I18n;
use parking_lot::RwLock;
use std::sync::Arc;

static INSTANCE: RwLock<Option<Arc<I18n>>> = parking_lot::const_rwlock(None);

/// Installs `i18n` as the process-wide instance, replacing any previous one.
pub fn init(i18n: I18n) -> Arc<I18n> {
    let i18n = Arc::new(i18n);
    let previous = INSTANCE.write().replace(Arc::clone(&i18n));
    if previous.is_some() {
        tracing::debug!("replaced the process-wide i18n instance");
    }
    i18n
}

/// Returns the process-wide instance, if one is installed.
#[must_use]
pub fn get() -> Option<Arc<I18n>> {
    INSTANCE.read().clone()
}

/// Removes and returns the process-wide instance.
pub fn reset() -> Option<Arc<I18n>> {
    INSTANCE.write().take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Factories;
    use vernacular_config::{ConfigCache, MemorySources};
    use vernacular_scope::Scope;

    #[test]
    fn init_get_reset() {
        let cache = Arc::new(ConfigCache::new(Arc::new(MemorySources::new())));
        let i18n = I18n::bootstrap(&Scope::root("app"), cache, Factories::default()).unwrap();

        let installed = init(i18n);
        let fetched = get().expect("an instance is installed");
        assert!(Arc::ptr_eq(&installed, &fetched));

        let removed = reset().expect("an instance was installed");
        assert!(Arc::ptr_eq(&installed, &removed));
        assert!(get().is_none());
    }
}
