//! Provider session identifiers.

use parking_lot::RwLock;
use uuid::Uuid;

/// Identifies one generation of a context provider.
///
/// Every context is stamped with the session of the provider that created it.
/// Rotating the session invalidates all contexts issued before, without the
/// provider tracking them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a fresh random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// The current session of a provider.
///
/// Reads and rotations are ordered by the lock: a context created after
/// [`rotate()`](Self::rotate) returns carries the new id on every thread.
#[derive(Debug, Default)]
pub(crate) struct Session {
    current: RwLock<SessionId>,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn current(&self) -> SessionId {
        *self.current.read()
    }

    /// Replaces the session id, returning the new one.
    pub(crate) fn rotate(&self) -> SessionId {
        let mut current = self.current.write();
        *current = SessionId::new();
        *current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_changes_the_id_once() {
        let session = Session::new();
        let before = session.current();
        assert_eq!(session.current(), before);

        let rotated = session.rotate();
        assert_ne!(rotated, before);
        assert_eq!(session.current(), rotated);
    }

    #[test]
    fn displays_as_uuid() {
        let id = SessionId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
        assert_eq!(id.to_string().len(), 36);
    }
}
