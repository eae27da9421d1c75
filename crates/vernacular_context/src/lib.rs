//! Locale contexts and the providers that manage them.
//!
//! A [`ContextProvider`] hands out [`Context`]s stamped with its current
//! [`SessionId`]. A [`ProviderStrategy`] decides which provider governs which
//! [`Scope`](vernacular_scope::Scope). [`I18n`] wires both from configuration.
//!
//! # Providers
//!
//! | Name | Type | Context storage |
//! |------|------|-----------------|
//! | `thread` | [`ThreadContextProvider`] | one per unit of work |
//! | `shared` | [`SharedContextProvider`] | one for everyone |
//! | - | [`ScopedContextProvider`] | none, routes by current scope |
//!
//! # Strategies
//!
//! | Name | Type |
//! |------|------|
//! | `single` | [`SingleProviderStrategy`] |
//! | `scoped` | [`ScopedProviderStrategy`] |
//!
//! # Validity
//!
//! A context is valid while it carries its provider's current session and,
//! for stored contexts, is the instance the provider holds for the caller.
//! [`ContextProvider::invalidate()`] starts a new session, so every context
//! issued earlier becomes invalid without being tracked.
//!
//! ```
//! use std::sync::Arc;
//! use vernacular_context::{ContextProvider, ProviderBase, ThreadContextProvider};
//!
//! let provider = ThreadContextProvider::new(ProviderBase::new(), true);
//! let context = provider.get_context();
//! assert!(provider.is_valid(&context));
//!
//! provider.invalidate();
//! assert!(!provider.is_valid(&context));
//! assert!(!Arc::ptr_eq(&context, &provider.get_context()));
//! ```

mod context;
mod factory;
pub mod global;
mod i18n;
mod provider;
mod session;
mod strategy;
mod work;

pub use context::Context;
pub use factory::{
    Environment, FactoryError, ProviderFactories, ProviderFactory, StrategyFactories,
    StrategyFactory,
};
pub use i18n::{Factories, I18n};
pub use provider::{
    ContextProvider, LocaleSupplier, ProviderBase, ScopedContextProvider, SharedContextProvider,
    ThreadContextProvider, system_locale_supplier,
};
pub use session::SessionId;
pub use strategy::{ProviderStrategy, ScopedProviderStrategy, SingleProviderStrategy};
pub use work::{AdoptGuard, WorkId, spawn};
