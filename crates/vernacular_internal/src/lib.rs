//! # Vernacular Internal Library
//!
//! Re-exports the Vernacular crates for convenience.

/// Layer 1: Scope tree.
pub use vernacular_scope;

/// Layer 2: Per-scope configuration.
pub use vernacular_config;

/// Layer 2: Message formatting and resources.
pub use vernacular_messages;

/// Layer 3: Contexts, providers and strategies.
pub use vernacular_context;

/// Tracing subscriber setup.
#[cfg(feature = "telemetry")]
pub use vernacular_telemetry;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use vernacular_config::{
        ConfigCache, ConfigError, FileSources, Locale, MemorySources, Properties, Settings,
    };
    pub use vernacular_context::{
        Context, ContextProvider, Factories, I18n, ProviderBase, ProviderStrategy, WorkId,
    };
    pub use vernacular_messages::{MapResources, MessageSource, Resources};
    pub use vernacular_scope::Scope;
}
