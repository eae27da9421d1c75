//! Configuration error types.

use crate::source::SourceId;
use std::path::PathBuf;

/// Error produced while parsing properties text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {reason}")]
pub struct PropertiesError {
    /// One-based line number where the logical line starts.
    pub line: usize,
    /// What went wrong.
    pub reason: String,
}

/// Error produced when a locale tag cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid locale '{0}'")]
pub struct LocaleError(pub String);

/// Fatal configuration errors.
///
/// These abort the operation that triggered them; nothing is cached for the
/// scope that failed, so the call can be retried once the configuration is
/// fixed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// More than one configuration source is newly introduced in one scope.
    #[error("scope '{scope}' introduces more than one configuration source: {sources:?}")]
    Ambiguous {
        /// Display form of the offending scope.
        scope: String,
        /// The sources newly visible in that scope.
        sources: Vec<SourceId>,
    },

    /// A strategy name is not registered.
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),

    /// A context provider name is not registered.
    #[error("unknown context provider '{0}'")]
    UnknownProvider(String),

    /// A registered strategy or provider factory failed.
    #[error("failed to construct {kind} '{name}': {reason}")]
    Construction {
        /// What was being constructed (`"strategy"` or `"provider"`).
        kind: &'static str,
        /// The registered name.
        name: String,
        /// The factory's error message.
        reason: String,
    },

    /// A recognized key holds a value that cannot be interpreted.
    #[error("invalid value '{value}' for '{key}'")]
    InvalidValue {
        /// The configuration key.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// A configuration source is not valid properties text.
    #[error("cannot parse {source_id}: {error}")]
    Parse {
        /// The source being parsed.
        source_id: SourceId,
        /// The parser error.
        #[source]
        error: PropertiesError,
    },

    /// A configuration source listed as visible is not known to its loader.
    #[error("configuration source {0} is not available")]
    MissingSource(SourceId),

    /// Reading a configuration source failed.
    #[error("cannot read {path}: {error}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },
}

impl ConfigError {
    /// Creates an [`InvalidValue`](Self::InvalidValue) error.
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a [`Construction`](Self::Construction) error.
    pub fn construction(
        kind: &'static str,
        name: impl Into<String>,
        reason: impl core::fmt::Display,
    ) -> Self {
        Self::Construction {
            kind,
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}
