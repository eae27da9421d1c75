//! Scope identity handles.

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

/// Source of scope identifiers. Identifiers are never reused, so a cache entry
/// keyed by a dropped scope can never be hit by a newer scope.
static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// The process-wide root scope returned by [`Scope::global()`].
static GLOBAL: OnceLock<Scope> = OnceLock::new();

/// Unique identifier of a [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    fn next() -> Self {
        Self(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ScopeInner {
    id: ScopeId,
    name: String,
    parent: Option<Scope>,
}

/// A node in the scope forest.
///
/// `Scope` is a cheap, clonable handle. Equality and hashing are by identity:
/// two scopes created with the same name are still different scopes.
///
/// A child holds its parent alive; nothing in Vernacular holds a scope alive
/// on its own (see [`ScopeMap`](crate::ScopeMap)).
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// Creates a new root scope (a scope with no parent).
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: ScopeId::next(),
                name: name.into(),
                parent: None,
            }),
        }
    }

    /// Creates a new scope whose parent is `self`.
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: ScopeId::next(),
                name: name.into(),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Returns the process-wide root scope.
    ///
    /// This is the scope reported by [`Scope::current()`] when the calling
    /// thread has not entered any scope.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL.get_or_init(|| Self::root("global")).clone()
    }

    /// Returns this scope's identifier.
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    /// Returns the human-readable name given at creation.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the parent scope, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<&Scope> {
        self.inner.parent.as_ref()
    }

    /// Returns `true` if this scope has no parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// Returns the number of ancestors between this scope and its root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.lineage().count() - 1
    }

    /// Iterates over this scope followed by each of its ancestors, ending at
    /// the root.
    #[must_use]
    pub fn lineage(&self) -> Lineage<'_> {
        Lineage { next: Some(self) }
    }

    /// Returns `true` if `ancestor` is a strict ancestor of this scope.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &Scope) -> bool {
        self.lineage().skip(1).any(|scope| scope == ancestor)
    }

    /// Returns the root of this scope's tree.
    #[must_use]
    pub fn root_of(&self) -> &Scope {
        let mut scope = self;
        while let Some(parent) = scope.parent() {
            scope = parent;
        }
        scope
    }

    /// Creates a non-owning handle to this scope.
    #[must_use]
    pub fn downgrade(&self) -> WeakScope {
        WeakScope {
            id: self.inner.id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Returns a `/`-separated path from the root to this scope.
    #[must_use]
    pub fn path(&self) -> String {
        let mut names: Vec<&str> = self.lineage().map(Scope::name).collect();
        names.reverse();
        names.join("/")
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Scope {}

impl core::hash::Hash for Scope {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl core::fmt::Debug for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("path", &self.path())
            .finish()
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.path(), self.inner.id)
    }
}

/// Iterator over a scope and its ancestors. Created by [`Scope::lineage()`].
#[derive(Debug, Clone)]
pub struct Lineage<'a> {
    next: Option<&'a Scope>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a Scope;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// A non-owning handle to a [`Scope`].
///
/// Upgrading fails once the host has dropped every strong handle to the scope
/// (including all of its children).
#[derive(Clone)]
pub struct WeakScope {
    id: ScopeId,
    inner: Weak<ScopeInner>,
}

impl WeakScope {
    /// Returns the identifier of the referenced scope.
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Attempts to recover a strong handle.
    #[must_use]
    pub fn upgrade(&self) -> Option<Scope> {
        self.inner.upgrade().map(|inner| Scope { inner })
    }

    /// Returns `true` if the referenced scope has been dropped.
    #[must_use]
    pub fn is_dropped(&self) -> bool {
        self.inner.strong_count() == 0
    }
}

impl core::fmt::Debug for WeakScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WeakScope")
            .field("id", &self.id)
            .field("dropped", &self.is_dropped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_compare_by_identity() {
        let a = Scope::root("same");
        let b = Scope::root("same");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn lineage_walks_to_root() {
        let root = Scope::root("root");
        let mid = root.child("mid");
        let leaf = mid.child("leaf");

        let names: Vec<&str> = leaf.lineage().map(Scope::name).collect();
        assert_eq!(names, ["leaf", "mid", "root"]);
        assert_eq!(leaf.depth(), 2);
        assert_eq!(leaf.root_of(), &root);
        assert_eq!(leaf.path(), "root/mid/leaf");
    }

    #[test]
    fn descendant_check_is_strict() {
        let root = Scope::root("root");
        let child = root.child("child");
        let other = Scope::root("other");

        assert!(child.is_descendant_of(&root));
        assert!(!root.is_descendant_of(&child));
        assert!(!child.is_descendant_of(&child));
        assert!(!child.is_descendant_of(&other));
    }

    #[test]
    fn weak_handle_does_not_keep_scope_alive() {
        let root = Scope::root("root");
        let child = root.child("child");
        let weak = child.downgrade();

        assert_eq!(weak.upgrade(), Some(child.clone()));
        drop(child);
        assert!(weak.is_dropped());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn child_keeps_parent_alive() {
        let root = Scope::root("root");
        let weak_root = root.downgrade();
        let child = root.child("child");
        drop(root);

        assert!(!weak_root.is_dropped());
        assert_eq!(child.parent().map(Scope::id), Some(weak_root.id()));
    }

    #[test]
    fn global_scope_is_stable() {
        assert_eq!(Scope::global(), Scope::global());
        assert!(Scope::global().is_root());
    }
}
