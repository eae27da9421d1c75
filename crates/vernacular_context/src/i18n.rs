//! The composition root.

use crate::context::Context;
use crate::factory::{Environment, ProviderFactories, StrategyFactories};
use crate::provider::{ContextProvider, LocaleSupplier, ScopedContextProvider};
use crate::strategy::ProviderStrategy;
use crate::work;
use core::fmt::Display;
use std::sync::Arc;
use std::thread::JoinHandle;
use vernacular_config::{ConfigCache, ConfigError, Locale, Settings};
use vernacular_messages::{ResourceLoader, Resources};
use vernacular_scope::Scope;

/// Everything [`I18n::bootstrap()`] needs besides configuration.
#[derive(Debug, Clone, Default)]
pub struct Factories {
    /// Provider constructors by name.
    pub providers: ProviderFactories,
    /// Strategy constructors by name.
    pub strategies: StrategyFactories,
    /// Collaborators handed to provider constructors.
    pub environment: Environment,
}

impl Factories {
    /// Replaces the resource loader.
    #[must_use]
    pub fn with_loader(mut self, loader: impl ResourceLoader) -> Self {
        self.environment.loader = Arc::new(loader);
        self
    }

    /// Replaces the default-locale supplier.
    #[must_use]
    pub fn with_locale_supplier(mut self, supplier: LocaleSupplier) -> Self {
        self.environment.locale_supplier = supplier;
        self
    }
}

/// Locale services for an application.
///
/// Built from a scope's configuration by [`bootstrap()`](Self::bootstrap):
/// the `strategy` key picks the [`ProviderStrategy`] and `context.provider`
/// picks the default provider. All context operations go through a
/// [`ScopedContextProvider`], so they reach the provider of whatever scope the
/// calling thread has entered.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vernacular_config::{ConfigCache, Locale, MemorySources, Settings};
/// use vernacular_context::{Factories, I18n};
/// use vernacular_scope::Scope;
///
/// let app = Scope::root("app");
/// let sources = Arc::new(MemorySources::new());
/// sources.attach(
///     &app,
///     "app.properties",
///     Settings::builder()
///         .provider("shared")
///         .default_locale(Locale::new("fr"))
///         .build()
///         .to_properties(),
/// );
///
/// let i18n = I18n::bootstrap(&app, Arc::new(ConfigCache::new(sources)), Factories::default())?;
/// assert_eq!(i18n.locale(), Locale::new("fr"));
/// assert_eq!(i18n.message("Bonjour {0}", &["greeting"], &[&"Ada"]), "Bonjour Ada");
/// # Ok::<(), vernacular_config::ConfigError>(())
/// ```
pub struct I18n {
    scope: Scope,
    settings: Settings,
    cache: Arc<ConfigCache>,
    factories: Factories,
    strategy: Arc<dyn ProviderStrategy>,
    provider: Arc<dyn ContextProvider>,
}

impl core::fmt::Debug for I18n {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("I18n")
            .field("scope", &self.scope)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl I18n {
    /// Reads the configuration of `scope` and builds the strategy and default
    /// provider it names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the scope's configuration cannot be resolved
    /// or parsed, or names an unknown or failing strategy or provider.
    pub fn bootstrap(
        scope: &Scope,
        cache: Arc<ConfigCache>,
        factories: Factories,
    ) -> Result<Self, ConfigError> {
        let entry = cache.get(scope)?;
        let settings = Settings::from_properties(&entry.properties)?;

        let default = factories
            .providers
            .create(&settings, &factories.environment)?;
        let strategy = factories
            .strategies
            .create(&settings.strategy, default)?;
        let provider: Arc<dyn ContextProvider> =
            Arc::new(ScopedContextProvider::new(Arc::clone(&strategy)));

        tracing::info!(
            %scope,
            strategy = %settings.strategy,
            provider = %settings.provider,
            "i18n bootstrapped"
        );
        Ok(Self {
            scope: scope.clone(),
            settings,
            cache,
            factories,
            strategy,
            provider,
        })
    }

    /// Gives `scope` a provider built from its own configuration.
    ///
    /// Scopes that introduce no configuration source of their own keep the
    /// provider they inherit. Returns the provider now governing `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the scope's configuration cannot be resolved
    /// or parsed, or names an unknown or failing provider.
    pub fn configure(&self, scope: &Scope) -> Result<Arc<dyn ContextProvider>, ConfigError> {
        let entry = self.cache.get(scope)?;
        let inherits = match scope.parent() {
            Some(parent) => Arc::ptr_eq(&entry, &self.cache.get(parent)?),
            None => false,
        };
        if inherits {
            tracing::debug!(%scope, "scope inherits its provider");
            return Ok(self.strategy.get(scope));
        }

        let settings = Settings::from_properties(&entry.properties)?;
        let provider = self
            .factories
            .providers
            .create(&settings, &self.factories.environment)?;
        self.strategy.set(scope, Arc::clone(&provider));
        tracing::info!(%scope, provider = %settings.provider, "scope configured");
        Ok(provider)
    }

    /// Makes `provider` govern `scope`.
    pub fn set_provider(&self, scope: &Scope, provider: Arc<dyn ContextProvider>) {
        self.strategy.set(scope, provider);
    }

    /// Returns the scope this instance was bootstrapped from.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the settings this instance was bootstrapped with.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the configuration cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<ConfigCache> {
        &self.cache
    }

    /// Returns the strategy.
    #[must_use]
    pub fn strategy(&self) -> &Arc<dyn ProviderStrategy> {
        &self.strategy
    }

    /// Returns the provider routing to the current scope.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn ContextProvider> {
        &self.provider
    }

    /// Returns the caller's context.
    #[must_use]
    pub fn context(&self) -> Arc<Context> {
        self.provider.get_context()
    }

    /// Returns the caller's locale.
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.provider.locale()
    }

    /// Sets the caller's locale.
    pub fn set_locale(&self, locale: Locale) {
        self.provider.set_locale(locale);
    }

    /// Returns the supported locales of the current scope's provider.
    #[must_use]
    pub fn available_locales(&self) -> Vec<Locale> {
        self.provider.available_locales()
    }

    /// Drops the caller's context.
    pub fn clear_context(&self) {
        self.provider.clear_context();
    }

    /// Invalidates every provider known to the strategy.
    pub fn invalidate(&self) {
        self.strategy.invalidate();
    }

    /// Returns the default (`None`) or named resource set of the current
    /// scope's provider.
    #[must_use]
    pub fn i18n_resources(&self, key: Option<&str>) -> Option<Arc<dyn Resources>> {
        self.provider.i18n_resources(key)
    }

    /// Formats a message in the caller's locale.
    ///
    /// See [`ContextProvider::message()`].
    #[must_use]
    pub fn message(&self, template: &str, codes: &[&str], args: &[&dyn Display]) -> String {
        self.provider.message(template, codes, args)
    }

    /// Spawns a thread as a child unit of work of the caller.
    ///
    /// See [`spawn()`](crate::spawn).
    pub fn spawn<F, T>(&self, f: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        work::spawn(&self.provider, f)
    }
}
