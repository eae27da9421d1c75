//! Per-scope storage keyed by scope identity.

use crate::scope::{Scope, ScopeId, WeakScope};
use hashbrown::HashMap;

struct Slot<V> {
    scope: WeakScope,
    value: V,
}

/// A map from [`Scope`] to `V` that does not keep its keys alive.
///
/// Entries are keyed by [`ScopeId`] and remember their scope through a
/// [`WeakScope`]. Once the host drops a scope its entry can no longer be
/// reached by lookup (identifiers are never reused) and is removed by the next
/// [`purge()`](Self::purge) or [`retain()`](Self::retain). Hosts that tear
/// scopes down deterministically can call [`remove()`](Self::remove) instead.
///
/// `ScopeMap` is not synchronized; the caches built on it wrap it in a lock.
pub struct ScopeMap<V> {
    slots: HashMap<ScopeId, Slot<V>>,
}

impl<V> Default for ScopeMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ScopeMap<V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Returns the value stored for `scope`.
    #[must_use]
    pub fn get(&self, scope: &Scope) -> Option<&V> {
        self.slots.get(&scope.id()).map(|slot| &slot.value)
    }

    /// Returns a mutable reference to the value stored for `scope`.
    pub fn get_mut(&mut self, scope: &Scope) -> Option<&mut V> {
        self.slots.get_mut(&scope.id()).map(|slot| &mut slot.value)
    }

    /// Returns `true` if a value is stored for `scope`.
    #[must_use]
    pub fn contains(&self, scope: &Scope) -> bool {
        self.slots.contains_key(&scope.id())
    }

    /// Stores `value` for `scope`, returning the previous value.
    pub fn insert(&mut self, scope: &Scope, value: V) -> Option<V> {
        self.slots
            .insert(
                scope.id(),
                Slot {
                    scope: scope.downgrade(),
                    value,
                },
            )
            .map(|slot| slot.value)
    }

    /// Returns the value stored for `scope`, storing `value` first if the scope
    /// has no entry yet.
    pub fn get_or_insert(&mut self, scope: &Scope, value: V) -> &mut V {
        &mut self
            .slots
            .entry(scope.id())
            .or_insert_with(|| Slot {
                scope: scope.downgrade(),
                value,
            })
            .value
    }

    /// Removes and returns the value stored for `scope`.
    pub fn remove(&mut self, scope: &Scope) -> Option<V> {
        self.slots.remove(&scope.id()).map(|slot| slot.value)
    }

    /// Keeps only the entries for which `keep` returns `true`.
    ///
    /// Entries whose scope has been dropped are removed without calling `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Scope, &mut V) -> bool) {
        self.slots.retain(|_, slot| match slot.scope.upgrade() {
            Some(scope) => keep(&scope, &mut slot.value),
            None => false,
        });
    }

    /// Calls `f` for every entry whose scope is still alive.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&Scope, &mut V)) {
        for slot in self.slots.values_mut() {
            if let Some(scope) = slot.scope.upgrade() {
                f(&scope, &mut slot.value);
            }
        }
    }

    /// Iterates over the stored values, including those of dropped scopes that
    /// have not been purged yet.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.slots.values().map(|slot| &slot.value)
    }

    /// Removes the entries of dropped scopes and returns how many were removed.
    pub fn purge(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| !slot.scope.is_dropped());
        before - self.slots.len()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Returns the number of entries, including unpurged dropped scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<V: core::fmt::Debug> core::fmt::Debug for ScopeMap<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(id, slot)| (id, &slot.value)))
            .finish()
    }
}
