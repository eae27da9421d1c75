//! Locale-aware message resources.
//!
//! A resource set maps message codes to templates per locale. Lookups walk
//! the locale's fallback chain (`de_CH` → `de`) and finally the base
//! (locale-independent) entries.

use hashbrown::HashMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vernacular_config::{Locale, Properties};

/// A set of message templates keyed by code.
pub trait Resources: Send + Sync + 'static {
    /// Identifier of this resource set (its base name).
    fn base_name(&self) -> &str;

    /// Returns the template for `code` in `locale`, falling back to less
    /// specific locales and then to the base entries.
    fn template(&self, code: &str, locale: &Locale) -> Option<String>;
}

/// Creates resource sets from base names.
///
/// Providers call the loader once per configured base name (`resources`,
/// `resources.named.<name>`).
pub trait ResourceLoader: Send + Sync + 'static {
    /// Returns the resource set for `base_name`.
    fn load(&self, base_name: &str) -> Arc<dyn Resources>;
}

/// In-memory resources, mainly for programmatic setups and tests.
///
/// # Example
///
/// ```
/// use vernacular_config::Locale;
/// use vernacular_messages::{MapResources, Resources};
///
/// let resources = MapResources::new("messages")
///     .with_base("greeting", "Hello {0}")
///     .with(Locale::new("fr"), "greeting", "Bonjour {0}");
///
/// let swiss_french: Locale = "fr_CH".parse().unwrap();
/// assert_eq!(resources.template("greeting", &swiss_french).as_deref(), Some("Bonjour {0}"));
/// assert_eq!(resources.template("greeting", &Locale::new("de")).as_deref(), Some("Hello {0}"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapResources {
    base_name: String,
    base: Properties,
    localized: HashMap<Locale, Properties>,
}

impl MapResources {
    /// Creates an empty resource set.
    #[must_use]
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            base: Properties::new(),
            localized: HashMap::new(),
        }
    }

    /// Adds a locale-independent template.
    #[must_use]
    pub fn with_base(mut self, code: impl Into<String>, template: impl Into<String>) -> Self {
        self.base.insert(code, template);
        self
    }

    /// Adds a template for `locale`.
    #[must_use]
    pub fn with(
        mut self,
        locale: Locale,
        code: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.localized
            .entry(locale)
            .or_default()
            .insert(code, template);
        self
    }
}

impl Resources for MapResources {
    fn base_name(&self) -> &str {
        &self.base_name
    }

    fn template(&self, code: &str, locale: &Locale) -> Option<String> {
        locale
            .fallback_chain()
            .iter()
            .filter_map(|candidate| self.localized.get(candidate))
            .chain(core::iter::once(&self.base))
            .find_map(|properties| properties.get(code))
            .map(str::to_string)
    }
}

/// Resources read from `.properties` bundle files.
///
/// For base name `i18n.messages` under root `dir`, the bundle for `fr_CA` is
/// `dir/i18n/messages_fr_CA.properties` and the base bundle is
/// `dir/i18n/messages.properties`. Bundles are read lazily, once per locale;
/// a missing or unreadable bundle behaves as an empty one.
pub struct BundleResources {
    base_name: String,
    stem: PathBuf,
    bundles: RwLock<HashMap<String, Option<Arc<Properties>>>>,
}

impl core::fmt::Debug for BundleResources {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BundleResources")
            .field("base_name", &self.base_name)
            .field("stem", &self.stem)
            .finish_non_exhaustive()
    }
}

impl BundleResources {
    /// Creates bundle resources for `base_name` under `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>, base_name: impl Into<String>) -> Self {
        let base_name = base_name.into();
        let stem = base_name
            .split('.')
            .fold(root.as_ref().to_path_buf(), |path, part| path.join(part));
        Self {
            base_name,
            stem,
            bundles: RwLock::new(HashMap::new()),
        }
    }

    fn bundle(&self, suffix: &str) -> Option<Arc<Properties>> {
        if let Some(cached) = self.bundles.read().get(suffix) {
            return cached.clone();
        }

        let mut file_name = self
            .stem
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        file_name.push_str(suffix);
        file_name.push_str(".properties");
        let path = self.stem.with_file_name(file_name);

        let loaded = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| match Properties::parse(&text) {
                Ok(properties) => Some(Arc::new(properties)),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "ignoring malformed message bundle");
                    None
                }
            });
        tracing::trace!(path = %path.display(), found = loaded.is_some(), "message bundle lookup");

        self.bundles
            .write()
            .entry(suffix.to_string())
            .or_insert(loaded)
            .clone()
    }
}

impl Resources for BundleResources {
    fn base_name(&self) -> &str {
        &self.base_name
    }

    fn template(&self, code: &str, locale: &Locale) -> Option<String> {
        locale
            .fallback_chain()
            .iter()
            .map(|candidate| format!("_{candidate}"))
            .chain(core::iter::once(String::new()))
            .filter_map(|suffix| self.bundle(&suffix))
            .find_map(|bundle| bundle.get(code).map(str::to_string))
    }
}

/// Loads [`BundleResources`] from a root directory.
#[derive(Debug, Clone)]
pub struct BundleLoader {
    root: PathBuf,
}

impl BundleLoader {
    /// Creates a loader rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceLoader for BundleLoader {
    fn load(&self, base_name: &str) -> Arc<dyn Resources> {
        Arc::new(BundleResources::new(&self.root, base_name))
    }
}

/// Loader that hands out pre-built resource sets by base name and empty sets
/// for unknown names.
#[derive(Default, Clone)]
pub struct StaticLoader {
    sets: HashMap<String, Arc<dyn Resources>>,
}

impl core::fmt::Debug for StaticLoader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StaticLoader")
            .field("sets", &self.sets.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StaticLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `resources` under its base name.
    #[must_use]
    pub fn with(mut self, resources: impl Resources) -> Self {
        self.sets
            .insert(resources.base_name().to_string(), Arc::new(resources));
        self
    }
}

impl ResourceLoader for StaticLoader {
    fn load(&self, base_name: &str) -> Arc<dyn Resources> {
        self.sets
            .get(base_name)
            .cloned()
            .unwrap_or_else(|| Arc::new(MapResources::new(base_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_resources_fall_back_through_locales() {
        let resources = MapResources::new("m")
            .with_base("a", "base a")
            .with_base("b", "base b")
            .with(Locale::new("de"), "a", "de a")
            .with(Locale::new("de").with_country("CH"), "b", "ch b");

        let swiss: Locale = "de_CH".parse().unwrap();
        assert_eq!(resources.template("a", &swiss).as_deref(), Some("de a"));
        assert_eq!(resources.template("b", &swiss).as_deref(), Some("ch b"));
        assert_eq!(
            resources.template("b", &Locale::new("de")).as_deref(),
            Some("base b")
        );
        assert_eq!(resources.template("missing", &swiss), None);
    }

    #[test]
    fn bundle_resources_read_locale_files() {
        let dir = tempfile::tempdir().unwrap();
        let bundles = dir.path().join("i18n");
        std::fs::create_dir(&bundles).unwrap();
        std::fs::write(bundles.join("messages.properties"), "hello=Hello {0}\nbye=Bye\n").unwrap();
        std::fs::write(bundles.join("messages_fr.properties"), "hello=Bonjour {0}\n").unwrap();

        let resources = BundleResources::new(dir.path(), "i18n.messages");
        let french: Locale = "fr_FR".parse().unwrap();

        assert_eq!(resources.base_name(), "i18n.messages");
        assert_eq!(
            resources.template("hello", &french).as_deref(),
            Some("Bonjour {0}")
        );
        assert_eq!(resources.template("bye", &french).as_deref(), Some("Bye"));
        assert_eq!(resources.template("nope", &french), None);
    }

    #[test]
    fn missing_bundle_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let resources = BundleLoader::new(dir.path()).load("absent");
        assert_eq!(resources.template("x", &Locale::new("en")), None);
    }

    #[test]
    fn static_loader_serves_registered_sets() {
        let loader = StaticLoader::new().with(MapResources::new("known").with_base("k", "v"));

        let known = loader.load("known");
        assert_eq!(known.template("k", &Locale::new("en")).as_deref(), Some("v"));
        let unknown = loader.load("unknown");
        assert_eq!(unknown.base_name(), "unknown");
        assert_eq!(unknown.template("k", &Locale::new("en")), None);
    }
}
