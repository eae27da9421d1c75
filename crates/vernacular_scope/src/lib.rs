//! Scope tree primitives for Vernacular.
//!
//! A [`Scope`] models an isolation boundary (a loaded module, a plugin, a
//! tenant) with at most one parent. Scopes form a forest and are created and
//! dropped entirely by the host application; every other Vernacular crate only
//! reads them.
//!
//! - [`Scope`] - Identity handle with parent access and lineage iteration
//! - [`ScopeId`] - Stable, never reused identifier used as a cache key
//! - [`WeakScope`] - Non-owning handle for per-scope caches
//! - [`ScopeMap`] - Per-scope storage that does not keep scopes alive
//! - [`EnterGuard`] - Marks a scope as current for the calling thread
//!
//! # Example
//!
//! ```
//! use vernacular_scope::Scope;
//!
//! let app = Scope::root("app");
//! let plugin = app.child("plugin");
//!
//! assert_eq!(plugin.parent(), Some(&app));
//! assert!(plugin.is_descendant_of(&app));
//!
//! let _guard = plugin.enter();
//! assert_eq!(Scope::current(), plugin);
//! ```

mod current;
mod map;
mod scope;

pub use current::EnterGuard;
pub use map::ScopeMap;
pub use scope::{Lineage, Scope, ScopeId, WeakScope};
