//! Scope-hierarchical locale contexts with session-based invalidation.
//!

pub use vernacular_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use vernacular_internal::prelude::*;
}
