//! Typed view of the recognized configuration keys.

use crate::error::ConfigError;
use crate::locale::Locale;
use crate::properties::Properties;
use std::collections::BTreeMap;

/// Recognized configuration keys.
pub mod keys {
    /// Selects the context provider implementation by registered name.
    pub const CONTEXT_PROVIDER: &str = "context.provider";
    /// Whether per-thread contexts are inherited by child units of work.
    pub const CONTEXT_INHERITED: &str = "context.inherited";
    /// Default locale when none is set.
    pub const LANGUAGE_DEFAULT: &str = "language.default";
    /// Comma-separated list of supported locales.
    pub const LANGUAGE_AVAILABLE: &str = "language.available";
    /// Base name of the default message resources.
    pub const RESOURCES: &str = "resources";
    /// Prefix of named message resource sets (`resources.named.<name>`).
    pub const RESOURCES_NAMED_PREFIX: &str = "resources.named.";
    /// Selects the provider strategy by registered name.
    pub const STRATEGY: &str = "strategy";
}

/// Registered name of the per-thread context provider.
pub const THREAD_PROVIDER: &str = "thread";
/// Registered name of the shared context provider.
pub const SHARED_PROVIDER: &str = "shared";
/// Registered name of the single-provider strategy.
pub const SINGLE_STRATEGY: &str = "single";
/// Registered name of the scope-based strategy.
pub const SCOPED_STRATEGY: &str = "scoped";

/// Typed configuration of a scope.
///
/// Built from [`Properties`] with [`Settings::from_properties()`] or in code
/// with [`Settings::builder()`].
///
/// # Example
///
/// ```
/// use vernacular_config::{Locale, Settings};
///
/// let settings = Settings::builder()
///     .provider("shared")
///     .default_locale(Locale::new("fr"))
///     .available(["fr", "en"])
///     .resources("messages")
///     .named_resources("errors", "errors")
///     .build();
///
/// let roundtrip = Settings::from_properties(&settings.to_properties()).unwrap();
/// assert_eq!(roundtrip, settings);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Registered name of the context provider (`context.provider`).
    pub provider: String,
    /// Whether child units of work inherit per-thread contexts
    /// (`context.inherited`).
    pub inherited: bool,
    /// Default locale (`language.default`). `None` defers to the locale
    /// supplier of the provider.
    pub default_locale: Option<Locale>,
    /// Supported locales (`language.available`).
    pub available_locales: Vec<Locale>,
    /// Base name of the default message resources (`resources`).
    pub resources: Option<String>,
    /// Named message resource sets (`resources.named.<name>`).
    pub named_resources: BTreeMap<String, String>,
    /// Registered name of the provider strategy (`strategy`).
    pub strategy: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: THREAD_PROVIDER.to_string(),
            inherited: true,
            default_locale: None,
            available_locales: Vec::new(),
            resources: None,
            named_resources: BTreeMap::new(),
            strategy: SINGLE_STRATEGY.to_string(),
        }
    }
}

impl Settings {
    /// Starts building settings from the defaults.
    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder {
            settings: Self::default(),
        }
    }

    /// Interprets recognized keys, using defaults for absent ones.
    /// Unrecognized keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a non-boolean
    /// `context.inherited`, an unparsable locale, or an empty name.
    pub fn from_properties(properties: &Properties) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(provider) = properties.get(keys::CONTEXT_PROVIDER) {
            settings.provider = non_empty(keys::CONTEXT_PROVIDER, provider)?;
        }
        if let Some(inherited) = properties.get(keys::CONTEXT_INHERITED) {
            settings.inherited = parse_bool(keys::CONTEXT_INHERITED, inherited)?;
        }
        if let Some(locale) = properties.get(keys::LANGUAGE_DEFAULT)
            && !locale.trim().is_empty()
        {
            settings.default_locale = Some(
                locale
                    .parse()
                    .map_err(|_| ConfigError::invalid_value(keys::LANGUAGE_DEFAULT, locale))?,
            );
        }
        if let Some(list) = properties.get(keys::LANGUAGE_AVAILABLE) {
            settings.available_locales = Locale::parse_list(list)
                .map_err(|_| ConfigError::invalid_value(keys::LANGUAGE_AVAILABLE, list))?;
        }
        if let Some(resources) = properties.get(keys::RESOURCES)
            && !resources.trim().is_empty()
        {
            settings.resources = Some(resources.trim().to_string());
        }
        for (name, base_name) in properties.with_prefix(keys::RESOURCES_NAMED_PREFIX) {
            let key = format!("{}{name}", keys::RESOURCES_NAMED_PREFIX);
            if name.is_empty() {
                return Err(ConfigError::invalid_value(key, base_name));
            }
            settings
                .named_resources
                .insert(name.to_string(), non_empty(&key, base_name)?);
        }
        if let Some(strategy) = properties.get(keys::STRATEGY) {
            settings.strategy = non_empty(keys::STRATEGY, strategy)?;
        }

        Ok(settings)
    }

    /// Renders these settings as properties, omitting unset optional keys.
    #[must_use]
    pub fn to_properties(&self) -> Properties {
        let mut properties = Properties::new()
            .with(keys::CONTEXT_PROVIDER, &self.provider)
            .with(keys::CONTEXT_INHERITED, self.inherited.to_string())
            .with(keys::STRATEGY, &self.strategy);

        if let Some(locale) = &self.default_locale {
            properties.insert(keys::LANGUAGE_DEFAULT, locale.to_string());
        }
        if !self.available_locales.is_empty() {
            let list: Vec<String> = self
                .available_locales
                .iter()
                .map(ToString::to_string)
                .collect();
            properties.insert(keys::LANGUAGE_AVAILABLE, list.join(","));
        }
        if let Some(resources) = &self.resources {
            properties.insert(keys::RESOURCES, resources);
        }
        for (name, base_name) in &self.named_resources {
            properties.insert(format!("{}{name}", keys::RESOURCES_NAMED_PREFIX), base_name);
        }
        properties
    }
}

/// Fluent constructor for [`Settings`]. Created by [`Settings::builder()`].
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Sets the context provider name.
    #[must_use]
    pub fn provider(mut self, name: impl Into<String>) -> Self {
        self.settings.provider = name.into();
        self
    }

    /// Sets whether child units of work inherit per-thread contexts.
    #[must_use]
    pub fn inherited(mut self, inherited: bool) -> Self {
        self.settings.inherited = inherited;
        self
    }

    /// Sets the default locale.
    #[must_use]
    pub fn default_locale(mut self, locale: Locale) -> Self {
        self.settings.default_locale = Some(locale);
        self
    }

    /// Sets the supported locales.
    ///
    /// # Panics
    ///
    /// Panics if an item is not a valid locale tag.
    #[must_use]
    pub fn available<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.settings.available_locales = locales
            .into_iter()
            .map(|tag| {
                let tag = tag.as_ref();
                tag.parse()
                    .unwrap_or_else(|_| panic!("'{tag}' is not a valid locale"))
            })
            .collect();
        self
    }

    /// Sets the base name of the default message resources.
    #[must_use]
    pub fn resources(mut self, base_name: impl Into<String>) -> Self {
        self.settings.resources = Some(base_name.into());
        self
    }

    /// Adds a named message resource set.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    #[must_use]
    pub fn named_resources(mut self, name: impl Into<String>, base_name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "named resources require a non-empty name");
        self.settings.named_resources.insert(name, base_name.into());
        self
    }

    /// Sets the strategy name.
    #[must_use]
    pub fn strategy(mut self, name: impl Into<String>) -> Self {
        self.settings.strategy = name.into();
        self
    }

    /// Finishes building.
    #[must_use]
    pub fn build(self) -> Settings {
        self.settings
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::invalid_value(key, value)),
    }
}

fn non_empty(key: &str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid_value(key, value));
    }
    Ok(trimmed.to_string())
}
