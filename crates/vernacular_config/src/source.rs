//! Configuration sources visible to scopes.
//!
//! A configuration source is anything that yields a [`Properties`] set and has
//! a stable identity ([`SourceId`]), for example a file path. Sources are
//! attached to scopes and are visible from the scope they are attached to and
//! from all of its descendants, the same way resources of a parent module are
//! visible from a child module.
//!
//! The [`ConfigCache`](crate::ConfigCache) only needs to know which sources a
//! scope can see and how to load one; that contract is [`ConfigSources`].

use crate::error::ConfigError;
use crate::properties::Properties;
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vernacular_scope::{Scope, ScopeMap};

/// Stable identity of a configuration source.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(Arc<str>);

impl SourceId {
    /// Creates a source identifier.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SourceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl core::fmt::Display for SourceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Discovers and loads the configuration sources of a scope.
pub trait ConfigSources: Send + Sync + 'static {
    /// Lists every source visible from `scope`: the scope's own sources and
    /// those of all its ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery itself fails (e.g. an unreadable
    /// directory).
    fn visible(&self, scope: &Scope) -> Result<Vec<SourceId>, ConfigError>;

    /// Loads a source previously returned by [`visible()`](Self::visible).
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or parsed.
    fn load(&self, source: &SourceId) -> Result<Properties, ConfigError>;
}

/// Sources attached to scopes programmatically.
///
/// Useful for hosts that assemble configuration in code and for tests.
///
/// # Example
///
/// ```
/// use vernacular_config::{ConfigSources, MemorySources, Properties};
/// use vernacular_scope::Scope;
///
/// let root = Scope::root("app");
/// let plugin = root.child("plugin");
///
/// let sources = MemorySources::new();
/// sources.attach(&plugin, "plugin.properties", Properties::new().with("strategy", "scoped"));
///
/// assert!(sources.visible(&root).unwrap().is_empty());
/// assert_eq!(sources.visible(&plugin).unwrap().len(), 1);
/// ```
#[derive(Default)]
pub struct MemorySources {
    attached: RwLock<ScopeMap<Vec<SourceId>>>,
    contents: RwLock<HashMap<SourceId, Properties>>,
}

impl MemorySources {
    /// Creates an empty set of sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a source to `scope`. Attaching the same id again replaces its
    /// contents without attaching it twice.
    pub fn attach(&self, scope: &Scope, id: impl Into<SourceId>, properties: Properties) {
        let id = id.into();
        let mut attached = self.attached.write();
        let ids = attached.get_or_insert(scope, Vec::new());
        if !ids.contains(&id) {
            ids.push(id.clone());
        }
        self.contents.write().insert(id, properties);
    }

    /// Detaches every source from `scope`.
    pub fn detach(&self, scope: &Scope) {
        if let Some(ids) = self.attached.write().remove(scope) {
            let mut contents = self.contents.write();
            for id in ids {
                contents.remove(&id);
            }
        }
    }
}

impl ConfigSources for MemorySources {
    fn visible(&self, scope: &Scope) -> Result<Vec<SourceId>, ConfigError> {
        let attached = self.attached.read();
        Ok(scope
            .lineage()
            .filter_map(|scope| attached.get(scope))
            .flatten()
            .cloned()
            .collect())
    }

    fn load(&self, source: &SourceId) -> Result<Properties, ConfigError> {
        self.contents
            .read()
            .get(source)
            .cloned()
            .ok_or_else(|| ConfigError::MissingSource(source.clone()))
    }
}

/// The file name [`FileSources`] looks for by default.
pub const DEFAULT_FILE_NAME: &str = "i18n.properties";

/// Configuration files found in directories attached to scopes.
///
/// Every attached directory that contains the configured file name (by
/// default [`DEFAULT_FILE_NAME`]) contributes one source, identified by the
/// file's canonical path.
pub struct FileSources {
    file_name: String,
    roots: RwLock<ScopeMap<Vec<PathBuf>>>,
}

impl Default for FileSources {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSources {
    /// Creates file sources looking for [`DEFAULT_FILE_NAME`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_file_name(DEFAULT_FILE_NAME)
    }

    /// Creates file sources looking for `file_name`.
    #[must_use]
    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            roots: RwLock::new(ScopeMap::new()),
        }
    }

    /// Returns the file name looked up in each directory.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Makes `dir` part of `scope`'s search path.
    pub fn attach(&self, scope: &Scope, dir: impl Into<PathBuf>) {
        self.roots
            .write()
            .get_or_insert(scope, Vec::new())
            .push(dir.into());
    }

    fn candidate(&self, dir: &Path) -> Result<Option<SourceId>, ConfigError> {
        let path = dir.join(&self.file_name);
        if !path.is_file() {
            return Ok(None);
        }
        let canonical = path
            .canonicalize()
            .map_err(|error| ConfigError::Io { path, error })?;
        Ok(Some(SourceId::new(canonical.to_string_lossy())))
    }
}

impl ConfigSources for FileSources {
    fn visible(&self, scope: &Scope) -> Result<Vec<SourceId>, ConfigError> {
        let roots = self.roots.read();
        let mut found = Vec::new();
        for dir in scope.lineage().filter_map(|scope| roots.get(scope)).flatten() {
            if let Some(id) = self.candidate(dir)?
                && !found.contains(&id)
            {
                found.push(id);
            }
        }
        Ok(found)
    }

    fn load(&self, source: &SourceId) -> Result<Properties, ConfigError> {
        let path = PathBuf::from(source.as_str());
        let text = std::fs::read_to_string(&path).map_err(|error| ConfigError::Io { path, error })?;
        tracing::debug!(source = %source, "loaded configuration file");
        Properties::parse(&text).map_err(|error| ConfigError::Parse {
            source_id: source.clone(),
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sources_are_visible_from_descendants() {
        let root = Scope::root("root");
        let child = root.child("child");
        let grandchild = child.child("grandchild");
        let sources = MemorySources::new();
        sources.attach(&root, "root", Properties::new());
        sources.attach(&child, "child", Properties::new());

        assert_eq!(sources.visible(&root).unwrap(), [SourceId::new("root")]);
        assert_eq!(
            sources.visible(&grandchild).unwrap(),
            [SourceId::new("child"), SourceId::new("root")]
        );
    }

    #[test]
    fn memory_sources_reattach_replaces_contents() {
        let scope = Scope::root("root");
        let sources = MemorySources::new();
        sources.attach(&scope, "a", Properties::new().with("k", "1"));
        sources.attach(&scope, "a", Properties::new().with("k", "2"));

        assert_eq!(sources.visible(&scope).unwrap().len(), 1);
        let loaded = sources.load(&SourceId::new("a")).unwrap();
        assert_eq!(loaded.get("k"), Some("2"));
    }

    #[test]
    fn memory_sources_detach() {
        let scope = Scope::root("root");
        let sources = MemorySources::new();
        sources.attach(&scope, "a", Properties::new());
        sources.detach(&scope);

        assert!(sources.visible(&scope).unwrap().is_empty());
        assert!(matches!(
            sources.load(&SourceId::new("a")),
            Err(ConfigError::MissingSource(_))
        ));
    }

    #[test]
    fn file_sources_find_files_in_attached_directories() {
        let with_file = tempfile::tempdir().unwrap();
        let without_file = tempfile::tempdir().unwrap();
        std::fs::write(
            with_file.path().join(DEFAULT_FILE_NAME),
            "strategy = scoped\n",
        )
        .unwrap();

        let root = Scope::root("root");
        let child = root.child("child");
        let sources = FileSources::new();
        sources.attach(&root, without_file.path());
        sources.attach(&child, with_file.path());

        assert!(sources.visible(&root).unwrap().is_empty());
        let visible = sources.visible(&child).unwrap();
        assert_eq!(visible.len(), 1);
        let loaded = sources.load(&visible[0]).unwrap();
        assert_eq!(loaded.get("strategy"), Some("scoped"));
    }

    #[test]
    fn file_sources_report_parse_errors_with_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("custom.properties"), "bad = \\uZZ").unwrap();

        let scope = Scope::root("root");
        let sources = FileSources::with_file_name("custom.properties");
        sources.attach(&scope, dir.path());

        let visible = sources.visible(&scope).unwrap();
        match sources.load(&visible[0]) {
            Err(ConfigError::Parse { source_id, error }) => {
                assert_eq!(source_id, visible[0]);
                assert_eq!(error.line, 1);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
