//! Per-scope configuration for Vernacular.
//!
//! Configuration is a flat key/value set per [`Scope`](vernacular_scope::Scope),
//! conventionally read from a `.properties` file:
//!
//! | Key | Effect | Default |
//! |-----|--------|---------|
//! | `context.provider` | context provider implementation | `thread` |
//! | `context.inherited` | child units of work inherit per-thread contexts | `true` |
//! | `language.default` | default locale | environment locale |
//! | `language.available` | comma-separated supported locales | default locale |
//! | `resources` | base name of the default message resources | none |
//! | `resources.named.<name>` | base name of a named message resource set | none |
//! | `strategy` | provider strategy | `single` |
//!
//! - [`ConfigCache`] - Resolves and memoizes configuration per scope
//! - [`ConfigSources`] - Discovery/loading contract, with [`MemorySources`]
//!   and [`FileSources`] implementations
//! - [`Properties`] - Key/value set and `.properties` parser
//! - [`Settings`] - Typed view of the recognized keys
//! - [`Locale`] - Language/country/variant identifier
//! - [`ConfigError`] - Fatal configuration errors

mod cache;
mod error;
mod locale;
mod properties;
mod settings;
mod source;

pub use cache::{ConfigCache, ConfigEntry};
pub use error::{ConfigError, LocaleError, PropertiesError};
pub use locale::Locale;
pub use properties::Properties;
pub use settings::{
    SCOPED_STRATEGY, SHARED_PROVIDER, SINGLE_STRATEGY, Settings, SettingsBuilder, THREAD_PROVIDER,
    keys,
};
pub use source::{ConfigSources, DEFAULT_FILE_NAME, FileSources, MemorySources, SourceId};
