//! Named constructors for providers and strategies.
//!
//! The `context.provider` and `strategy` configuration keys select entries
//! from [`ProviderFactories`] and [`StrategyFactories`]. The built-in names
//! are registered by `Default`; applications register their own with
//! [`register()`](ProviderFactories::register).

use crate::provider::{
    ContextProvider, LocaleSupplier, ProviderBase, SharedContextProvider, ThreadContextProvider,
    system_locale_supplier,
};
use crate::strategy::{ProviderStrategy, ScopedProviderStrategy, SingleProviderStrategy};
use hashbrown::HashMap;
use std::sync::Arc;
use vernacular_config::{
    ConfigError, SCOPED_STRATEGY, SHARED_PROVIDER, SINGLE_STRATEGY, Settings, THREAD_PROVIDER,
};
use vernacular_messages::{ResourceLoader, StaticLoader};

/// Error returned by a failing factory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FactoryError(pub String);

impl From<&str> for FactoryError {
    fn from(reason: &str) -> Self {
        Self(reason.to_string())
    }
}

impl From<String> for FactoryError {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

/// Collaborators handed to provider factories.
#[derive(Clone)]
pub struct Environment {
    /// Loads the resource sets named in the configuration.
    pub loader: Arc<dyn ResourceLoader>,
    /// Supplies the default locale when `language.default` is not set.
    pub locale_supplier: LocaleSupplier,
}

impl core::fmt::Debug for Environment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Environment").finish_non_exhaustive()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            loader: Arc::new(StaticLoader::new()),
            locale_supplier: system_locale_supplier(),
        }
    }
}

impl Environment {
    /// Builds the [`ProviderBase`] described by `settings`.
    #[must_use]
    pub fn provider_base(&self, settings: &Settings) -> ProviderBase {
        ProviderBase::from_settings(settings, self.loader.as_ref(), Arc::clone(&self.locale_supplier))
    }
}

/// Constructs a context provider from settings.
pub trait ProviderFactory: Send + Sync + 'static {
    /// Creates a provider.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError`] if the provider cannot be built.
    fn create(
        &self,
        settings: &Settings,
        environment: &Environment,
    ) -> Result<Arc<dyn ContextProvider>, FactoryError>;
}

impl<F> ProviderFactory for F
where
    F: Fn(&Settings, &Environment) -> Result<Arc<dyn ContextProvider>, FactoryError>
        + Send
        + Sync
        + 'static,
{
    fn create(
        &self,
        settings: &Settings,
        environment: &Environment,
    ) -> Result<Arc<dyn ContextProvider>, FactoryError> {
        self(settings, environment)
    }
}

/// Constructs a provider strategy around a default provider.
pub trait StrategyFactory: Send + Sync + 'static {
    /// Creates a strategy.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError`] if the strategy cannot be built.
    fn create(
        &self,
        default: Arc<dyn ContextProvider>,
    ) -> Result<Arc<dyn ProviderStrategy>, FactoryError>;
}

impl<F> StrategyFactory for F
where
    F: Fn(Arc<dyn ContextProvider>) -> Result<Arc<dyn ProviderStrategy>, FactoryError>
        + Send
        + Sync
        + 'static,
{
    fn create(
        &self,
        default: Arc<dyn ContextProvider>,
    ) -> Result<Arc<dyn ProviderStrategy>, FactoryError> {
        self(default)
    }
}

/// Provider factories by name.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vernacular_config::Settings;
/// use vernacular_context::{
///     ContextProvider, Environment, FactoryError, ProviderFactories, SharedContextProvider,
/// };
///
/// fn custom(
///     settings: &Settings,
///     environment: &Environment,
/// ) -> Result<Arc<dyn ContextProvider>, FactoryError> {
///     Ok(Arc::new(SharedContextProvider::new(environment.provider_base(settings))))
/// }
///
/// let mut factories = ProviderFactories::default();
/// factories.register("custom", custom);
///
/// let settings = Settings::builder().provider("custom").build();
/// assert!(factories.create(&settings, &Environment::default()).is_ok());
/// ```
#[derive(Clone)]
pub struct ProviderFactories {
    factories: HashMap<String, Arc<dyn ProviderFactory>>,
}

impl core::fmt::Debug for ProviderFactories {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProviderFactories")
            .field("names", &self.names())
            .finish()
    }
}

impl Default for ProviderFactories {
    /// Registers `thread` and `shared`.
    fn default() -> Self {
        let mut factories = Self::new();
        factories.register(THREAD_PROVIDER, thread_provider);
        factories.register(SHARED_PROVIDER, shared_provider);
        factories
    }
}

fn thread_provider(
    settings: &Settings,
    environment: &Environment,
) -> Result<Arc<dyn ContextProvider>, FactoryError> {
    Ok(Arc::new(ThreadContextProvider::new(
        environment.provider_base(settings),
        settings.inherited,
    )))
}

fn shared_provider(
    settings: &Settings,
    environment: &Environment,
) -> Result<Arc<dyn ContextProvider>, FactoryError> {
    Ok(Arc::new(SharedContextProvider::new(
        environment.provider_base(settings),
    )))
}

impl ProviderFactories {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers `factory` under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered.
    pub fn register(&mut self, name: impl Into<String>, factory: impl ProviderFactory) {
        let name = name.into();
        assert!(
            !self.factories.contains_key(&name),
            "context provider '{name}' is already registered"
        );
        self.factories.insert(name, Arc::new(factory));
    }

    /// Creates the provider named by `settings.provider`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProvider`] for an unregistered name and
    /// [`ConfigError::Construction`] if the factory fails.
    pub fn create(
        &self,
        settings: &Settings,
        environment: &Environment,
    ) -> Result<Arc<dyn ContextProvider>, ConfigError> {
        let name = settings.provider.as_str();
        let Some(factory) = self.factories.get(name) else {
            tracing::warn!(provider = name, "unknown context provider");
            return Err(ConfigError::UnknownProvider(name.to_string()));
        };
        factory.create(settings, environment).map_err(|error| {
            tracing::warn!(provider = name, %error, "context provider construction failed");
            ConfigError::construction("provider", name, error)
        })
    }

    /// Checks if a name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Lists registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Strategy factories by name.
#[derive(Clone)]
pub struct StrategyFactories {
    factories: HashMap<String, Arc<dyn StrategyFactory>>,
}

impl core::fmt::Debug for StrategyFactories {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StrategyFactories")
            .field("names", &self.names())
            .finish()
    }
}

impl Default for StrategyFactories {
    /// Registers `single` and `scoped`.
    fn default() -> Self {
        let mut factories = Self::new();
        factories.register(SINGLE_STRATEGY, single_strategy);
        factories.register(SCOPED_STRATEGY, scoped_strategy);
        factories
    }
}

fn single_strategy(
    default: Arc<dyn ContextProvider>,
) -> Result<Arc<dyn ProviderStrategy>, FactoryError> {
    Ok(Arc::new(SingleProviderStrategy::new(default)))
}

fn scoped_strategy(
    default: Arc<dyn ContextProvider>,
) -> Result<Arc<dyn ProviderStrategy>, FactoryError> {
    Ok(Arc::new(ScopedProviderStrategy::new(default)))
}

impl StrategyFactories {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers `factory` under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered.
    pub fn register(&mut self, name: impl Into<String>, factory: impl StrategyFactory) {
        let name = name.into();
        assert!(
            !self.factories.contains_key(&name),
            "strategy '{name}' is already registered"
        );
        self.factories.insert(name, Arc::new(factory));
    }

    /// Creates the strategy `name` around `default`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownStrategy`] for an unregistered name and
    /// [`ConfigError::Construction`] if the factory fails.
    pub fn create(
        &self,
        name: &str,
        default: Arc<dyn ContextProvider>,
    ) -> Result<Arc<dyn ProviderStrategy>, ConfigError> {
        let Some(factory) = self.factories.get(name) else {
            tracing::warn!(strategy = name, "unknown strategy");
            return Err(ConfigError::UnknownStrategy(name.to_string()));
        };
        factory.create(default).map_err(|error| {
            tracing::warn!(strategy = name, %error, "strategy construction failed");
            ConfigError::construction("strategy", name, error)
        })
    }

    /// Checks if a name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Lists registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        assert_eq!(ProviderFactories::default().names(), ["shared", "thread"]);
        assert_eq!(StrategyFactories::default().names(), ["scoped", "single"]);
    }

    #[test]
    fn unknown_names_are_config_errors() {
        let settings = Settings::builder().provider("nope").build();
        let provider = ProviderFactories::default().create(&settings, &Environment::default());
        assert!(matches!(provider, Err(ConfigError::UnknownProvider(name)) if name == "nope"));

        let default = ProviderFactories::default()
            .create(&Settings::default(), &Environment::default())
            .unwrap();
        let strategy = StrategyFactories::default().create("nope", default);
        assert!(matches!(strategy, Err(ConfigError::UnknownStrategy(name)) if name == "nope"));
    }

    #[test]
    fn factory_failures_become_construction_errors() {
        let mut factories = ProviderFactories::new();
        factories.register(
            "broken",
            |_: &Settings, _: &Environment| -> Result<Arc<dyn ContextProvider>, FactoryError> {
                Err(FactoryError::from("missing backend"))
            },
        );

        let settings = Settings::builder().provider("broken").build();
        match factories.create(&settings, &Environment::default()) {
            Err(ConfigError::Construction { kind, name, reason }) => {
                assert_eq!(kind, "provider");
                assert_eq!(name, "broken");
                assert_eq!(reason, "missing backend");
            }
            other => panic!("expected a construction error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_registration_panics() {
        let mut factories = StrategyFactories::default();
        factories.register(SINGLE_STRATEGY, single_strategy);
    }
}
