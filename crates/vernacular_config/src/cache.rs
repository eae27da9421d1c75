//! Per-scope configuration cache.
//!
//! [`ConfigCache`] resolves the configuration of a scope once and remembers
//! it. Resolution walks the parent chain lazily:
//!
//! ```text
//! root        (own source or built-in defaults)
//!  ├── a      (no new source: inherits root verbatim)
//!  │   └── a1 (introduces a1.properties: replaces inherited properties)
//!  └── b      (introduces two new sources: ConfigError::Ambiguous)
//! ```
//!
//! A scope inherits its parent's entry unless it can see exactly one source
//! that its parent could not. Seeing more than one new source is a fatal
//! configuration error, reported the first time the scope is resolved.

use crate::error::ConfigError;
use crate::properties::Properties;
use crate::source::{ConfigSources, SourceId};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use vernacular_scope::{Scope, ScopeMap};

/// The resolved configuration of one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// Effective key/value configuration.
    pub properties: Properties,
    /// Every source that contributed along the scope's lineage.
    ///
    /// Two scopes with equal sets share the same configuration origin; a
    /// descendant with a larger set introduced its own source.
    pub source_ids: BTreeSet<SourceId>,
}

impl ConfigEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(properties: Properties, source_ids: BTreeSet<SourceId>) -> Self {
        Self {
            properties,
            source_ids,
        }
    }
}

struct CacheState {
    entries: ScopeMap<Arc<ConfigEntry>>,
    /// Bumped by every administrative mutation. A resolution that started
    /// before a bump is recomputed instead of being cached.
    generation: u64,
}

/// Loads and memoizes configuration per scope.
///
/// All access is internally serialized; configuration sources are loaded
/// outside the lock, and the first resolution cached for a scope wins, so
/// concurrent first access never yields two different entries for one scope.
///
/// # Example
///
/// ```
/// use vernacular_config::{ConfigCache, MemorySources, Properties};
/// use vernacular_scope::Scope;
/// use std::sync::Arc;
///
/// let root = Scope::root("app");
/// let plugin = root.child("plugin");
/// let sources = Arc::new(MemorySources::new());
/// sources.attach(&root, "app.properties", Properties::new().with("strategy", "scoped"));
///
/// let cache = ConfigCache::new(sources);
/// let entry = cache.get(&plugin)?;
/// assert_eq!(entry.properties.get("strategy"), Some("scoped"));
/// # Ok::<(), vernacular_config::ConfigError>(())
/// ```
pub struct ConfigCache {
    sources: Arc<dyn ConfigSources>,
    defaults: Properties,
    state: Mutex<CacheState>,
}

impl core::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ConfigCache")
            .field("entries", &state.entries.len())
            .field("generation", &state.generation)
            .finish_non_exhaustive()
    }
}

impl ConfigCache {
    /// Upper bound on recomputations when administrative updates keep racing
    /// with a resolution.
    const MAX_ATTEMPTS: usize = 8;

    /// Creates a cache over `sources` whose root scopes fall back to
    /// [`Settings::default()`](crate::Settings) when they have no source.
    pub fn new(sources: Arc<dyn ConfigSources>) -> Self {
        Self::with_defaults(sources, crate::Settings::default().to_properties())
    }

    /// Creates a cache whose root scopes fall back to `defaults` when they have
    /// no source.
    pub fn with_defaults(sources: Arc<dyn ConfigSources>, defaults: Properties) -> Self {
        Self {
            sources,
            defaults,
            state: Mutex::new(CacheState {
                entries: ScopeMap::new(),
                generation: 0,
            }),
        }
    }

    /// Returns the built-in defaults used for roots without a source.
    #[must_use]
    pub fn defaults(&self) -> &Properties {
        &self.defaults
    }

    /// Returns the configuration of `scope`, resolving and caching it (and any
    /// uncached ancestors) on first access.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Ambiguous`] if `scope` or an ancestor introduces
    /// more than one new source, or any error raised while loading a source.
    /// Nothing is cached for the failing scope.
    pub fn get(&self, scope: &Scope) -> Result<Arc<ConfigEntry>, ConfigError> {
        let mut attempt = 0;
        loop {
            let generation = {
                let state = self.state.lock();
                if let Some(entry) = state.entries.get(scope) {
                    return Ok(Arc::clone(entry));
                }
                state.generation
            };

            let resolved = self.resolve(scope)?;

            let mut state = self.state.lock();
            attempt += 1;
            if state.generation == generation || attempt >= Self::MAX_ATTEMPTS {
                let cached = state.entries.get_or_insert(scope, resolved);
                return Ok(Arc::clone(cached));
            }
            tracing::trace!(scope = %scope, "configuration changed during resolution, retrying");
        }
    }

    /// Returns the cached configuration of `scope` without resolving it.
    #[must_use]
    pub fn peek(&self, scope: &Scope) -> Option<Arc<ConfigEntry>> {
        self.state.lock().entries.get(scope).cloned()
    }

    fn resolve(&self, scope: &Scope) -> Result<Arc<ConfigEntry>, ConfigError> {
        let Some(parent) = scope.parent() else {
            return self.resolve_root(scope);
        };

        let inherited = self.get(parent)?;
        let introduced: BTreeSet<SourceId> = self
            .sources
            .visible(scope)?
            .into_iter()
            .filter(|id| !inherited.source_ids.contains(id))
            .collect();
        let introduced: Vec<SourceId> = introduced.into_iter().collect();

        match introduced.as_slice() {
            [] => {
                tracing::debug!(scope = %scope, parent = %parent, "scope inherits parent configuration");
                Ok(inherited)
            }
            [source] => {
                let properties = self.sources.load(source)?;
                let mut source_ids = inherited.source_ids.clone();
                source_ids.insert(source.clone());
                tracing::debug!(scope = %scope, source = %source, "scope introduces its own configuration");
                Ok(Arc::new(ConfigEntry::new(properties, source_ids)))
            }
            _ => Err(ambiguous(scope, introduced)),
        }
    }

    fn resolve_root(&self, scope: &Scope) -> Result<Arc<ConfigEntry>, ConfigError> {
        let own: BTreeSet<SourceId> = self.sources.visible(scope)?.into_iter().collect();
        let own: Vec<SourceId> = own.into_iter().collect();

        match own.as_slice() {
            [] => {
                tracing::debug!(scope = %scope, "root scope uses built-in configuration");
                Ok(Arc::new(ConfigEntry::new(
                    self.defaults.clone(),
                    BTreeSet::new(),
                )))
            }
            [source] => {
                let properties = self.sources.load(source)?;
                tracing::debug!(scope = %scope, source = %source, "root scope loaded its configuration");
                Ok(Arc::new(ConfigEntry::new(
                    properties,
                    BTreeSet::from([source.clone()]),
                )))
            }
            _ => Err(ambiguous(scope, own)),
        }
    }

    /// Replaces the configuration of `scope` with `properties`.
    ///
    /// The update is propagated to every cached descendant whose source set is
    /// identical to `scope`'s, that is, every descendant that purely inherits
    /// from `scope`. Descendants that introduced their own source keep their
    /// configuration.
    ///
    /// # Errors
    ///
    /// Resolves `scope` first if it is not cached yet and returns any error
    /// from that resolution. The cache is unchanged on error.
    pub fn set(&self, scope: &Scope, properties: Properties) -> Result<(), ConfigError> {
        let resolved = self.get(scope)?;

        let mut state = self.state.lock();
        let previous = state.entries.get(scope).cloned().unwrap_or(resolved);
        let updated = Arc::new(ConfigEntry::new(properties, previous.source_ids.clone()));

        state.entries.insert(scope, Arc::clone(&updated));
        let mut propagated = 0usize;
        state.entries.for_each_mut(|other, entry| {
            if other.is_descendant_of(scope) && entry.source_ids == previous.source_ids {
                *entry = Arc::clone(&updated);
                propagated += 1;
            }
        });
        state.generation += 1;

        tracing::debug!(scope = %scope, propagated, "configuration replaced");
        Ok(())
    }

    /// Drops the cached entry of `scope`. Its descendants keep theirs.
    ///
    /// Hosts call this when they tear a scope down.
    pub fn forget(&self, scope: &Scope) {
        let mut state = self.state.lock();
        state.entries.remove(scope);
        state.generation += 1;
    }

    /// Drops the entries of scopes the host has already dropped and returns
    /// how many were removed.
    pub fn purge(&self) -> usize {
        self.state.lock().entries.purge()
    }

    /// Clears the whole cache.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.generation += 1;
        tracing::debug!("configuration cache reset");
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}

fn ambiguous(scope: &Scope, sources: Vec<SourceId>) -> ConfigError {
    tracing::warn!(scope = %scope, ?sources, "ambiguous configuration");
    ConfigError::Ambiguous {
        scope: scope.to_string(),
        sources,
    }
}
