//! Context providers.
//!
//! A provider owns a [`SessionId`] and hands out [`Context`]s stamped with it.
//! [`invalidate()`](ContextProvider::invalidate) rotates the session, which
//! makes every context issued before stale at once.
//!
//! - [`ThreadContextProvider`] - One context per unit of work, optionally
//!   copied into child units
//! - [`SharedContextProvider`] - One context for everyone
//! - [`ScopedContextProvider`] - Routes to the provider of the current scope

mod scoped;
mod shared;
mod thread;

pub use scoped::ScopedContextProvider;
pub use shared::SharedContextProvider;
pub use thread::ThreadContextProvider;

use crate::context::Context;
use crate::session::{Session, SessionId};
use crate::work::WorkId;
use core::fmt::Display;
use std::collections::BTreeMap;
use std::sync::Arc;
use vernacular_config::{Locale, Settings};
use vernacular_messages::{MessageSource, ResourceLoader, Resources};

/// Supplies the locale of new contexts when none is configured.
pub type LocaleSupplier = Arc<dyn Fn() -> Locale + Send + Sync>;

/// Returns a supplier reading the process environment
/// ([`Locale::system_default()`]).
#[must_use]
pub fn system_locale_supplier() -> LocaleSupplier {
    Arc::new(Locale::system_default)
}

/// Creates, stores and validates [`Context`]s.
///
/// Implementations decide where contexts live; the locale and message
/// operations have default implementations on top of
/// [`get_context()`](Self::get_context).
pub trait ContextProvider: Send + Sync + 'static {
    /// Returns the current session id.
    fn session_id(&self) -> SessionId;

    /// Returns the caller's context, creating and storing a fresh one when
    /// there is none or it is no longer valid.
    fn get_context(&self) -> Arc<Context>;

    /// Creates a context stamped with the current session and the default
    /// locale. The context is not stored.
    fn create_context(&self) -> Arc<Context>;

    /// Whether `context` is the caller's current context for this provider.
    fn is_valid(&self, context: &Arc<Context>) -> bool;

    /// Drops the caller's stored context; the next
    /// [`get_context()`](Self::get_context) creates a new one.
    fn clear_context(&self);

    /// Starts a new session, invalidating every context issued so far.
    fn invalidate(&self);

    /// Returns the supported locales.
    fn available_locales(&self) -> Vec<Locale>;

    /// Returns the locale of newly created contexts.
    fn default_locale(&self) -> Locale;

    /// Returns the default resources (`key` is `None`) or the named resource
    /// set `key`.
    fn i18n_resources(&self, key: Option<&str>) -> Option<Arc<dyn Resources>>;

    /// Called before a child unit of work starts.
    ///
    /// Providers that keep per-unit state can seed the child's state from the
    /// parent's here.
    fn on_spawn_child(&self, parent: WorkId, child: WorkId) {
        let _ = (parent, child);
    }

    /// Called when a unit of work finishes, to drop any state kept for it.
    fn release(&self, work: WorkId) {
        let _ = work;
    }

    /// Returns the locale of the caller's context.
    fn locale(&self) -> Locale {
        self.get_context().locale()
    }

    /// Sets the locale of the caller's context.
    fn set_locale(&self, locale: Locale) {
        self.get_context().set_locale(locale);
    }

    /// Formats a message from the default resources in the caller's locale.
    ///
    /// `codes` are tried in order; when none resolves, `template` is used.
    /// Malformed templates are returned verbatim.
    fn message(&self, template: &str, codes: &[&str], args: &[&dyn Display]) -> String {
        let source = self.i18n_resources(None).map(MessageSource::from_shared);
        vernacular_messages::message(source.as_ref(), template, codes, args, &self.locale())
    }
}

/// Locale and resource configuration common to the built-in providers.
///
/// # Example
///
/// ```
/// use vernacular_config::Locale;
/// use vernacular_context::ProviderBase;
///
/// let base = ProviderBase::new()
///     .with_default_locale(Locale::new("de"))
///     .with_available([Locale::new("de"), Locale::new("en")]);
///
/// assert_eq!(base.default_locale(), Locale::new("de"));
/// assert_eq!(base.available_locales().len(), 2);
/// ```
#[derive(Clone)]
pub struct ProviderBase {
    default_locale: Option<Locale>,
    available: Vec<Locale>,
    locale_supplier: LocaleSupplier,
    resources: Option<Arc<dyn Resources>>,
    named: BTreeMap<String, Arc<dyn Resources>>,
}

impl core::fmt::Debug for ProviderBase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProviderBase")
            .field("default_locale", &self.default_locale)
            .field("available", &self.available)
            .field(
                "resources",
                &self.resources.as_ref().map(|r| r.base_name().to_string()),
            )
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for ProviderBase {
    fn default() -> Self {
        Self {
            default_locale: None,
            available: Vec::new(),
            locale_supplier: system_locale_supplier(),
            resources: None,
            named: BTreeMap::new(),
        }
    }
}

impl ProviderBase {
    /// Creates a base with no resources that takes its default locale from
    /// the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a base from `settings`, loading the configured resource sets
    /// through `loader`.
    #[must_use]
    pub fn from_settings(
        settings: &Settings,
        loader: &dyn ResourceLoader,
        locale_supplier: LocaleSupplier,
    ) -> Self {
        Self {
            default_locale: settings.default_locale.clone(),
            available: settings.available_locales.clone(),
            locale_supplier,
            resources: settings
                .resources
                .as_deref()
                .map(|base_name| loader.load(base_name)),
            named: settings
                .named_resources
                .iter()
                .map(|(name, base_name)| (name.clone(), loader.load(base_name)))
                .collect(),
        }
    }

    /// Sets a fixed default locale.
    #[must_use]
    pub fn with_default_locale(mut self, locale: Locale) -> Self {
        self.default_locale = Some(locale);
        self
    }

    /// Sets the supplier consulted when no default locale is fixed.
    #[must_use]
    pub fn with_locale_supplier(mut self, supplier: LocaleSupplier) -> Self {
        self.locale_supplier = supplier;
        self
    }

    /// Sets the supported locales.
    ///
    /// # Panics
    ///
    /// Panics if `locales` is empty.
    #[must_use]
    pub fn with_available(mut self, locales: impl IntoIterator<Item = Locale>) -> Self {
        self.available = locales.into_iter().collect();
        assert!(
            !self.available.is_empty(),
            "the available locales must not be empty"
        );
        self
    }

    /// Sets the default resources.
    #[must_use]
    pub fn with_resources(mut self, resources: impl Resources) -> Self {
        self.resources = Some(Arc::new(resources));
        self
    }

    /// Adds a named resource set.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    #[must_use]
    pub fn with_named_resources(
        mut self,
        name: impl Into<String>,
        resources: impl Resources,
    ) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "named resources require a non-empty name");
        self.named.insert(name, Arc::new(resources));
        self
    }

    /// Returns the fixed default locale, or asks the supplier.
    #[must_use]
    pub fn default_locale(&self) -> Locale {
        self.default_locale
            .clone()
            .unwrap_or_else(|| (self.locale_supplier)())
    }

    /// Returns the supported locales, or the default locale alone when none
    /// are configured.
    #[must_use]
    pub fn available_locales(&self) -> Vec<Locale> {
        if self.available.is_empty() {
            vec![self.default_locale()]
        } else {
            self.available.clone()
        }
    }

    /// Returns the default (`None`) or named resource set.
    #[must_use]
    pub fn resources(&self, key: Option<&str>) -> Option<Arc<dyn Resources>> {
        match key {
            None => self.resources.clone(),
            Some(name) => self.named.get(name).cloned(),
        }
    }

    fn new_context(&self, session: &Session) -> Arc<Context> {
        Arc::new(Context::new(session.current(), self.default_locale()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vernacular_messages::{MapResources, StaticLoader};

    #[test]
    fn available_locales_default_to_the_default_locale() {
        let base = ProviderBase::new().with_locale_supplier(Arc::new(|| Locale::new("pt")));
        assert_eq!(base.default_locale(), Locale::new("pt"));
        assert_eq!(base.available_locales(), vec![Locale::new("pt")]);
    }

    #[test]
    fn from_settings_loads_configured_resources() {
        let settings = Settings::builder()
            .default_locale(Locale::new("es"))
            .available(["es", "en"])
            .resources("messages")
            .named_resources("mail", "mail")
            .build();
        let loader = StaticLoader::new().with(MapResources::new("messages").with_base("k", "v"));

        let base = ProviderBase::from_settings(&settings, &loader, system_locale_supplier());

        assert_eq!(base.default_locale(), Locale::new("es"));
        assert_eq!(base.available_locales().len(), 2);
        let resources = base.resources(None).expect("default resources");
        assert_eq!(resources.template("k", &Locale::new("es")).as_deref(), Some("v"));
        assert_eq!(base.resources(Some("mail")).map(|r| r.base_name().to_string()).as_deref(), Some("mail"));
        assert!(base.resources(Some("other")).is_none());
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_available_list_is_rejected() {
        let _ = ProviderBase::new().with_available([]);
    }
}
