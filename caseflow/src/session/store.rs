//! Session storage.

use super::SessionRecord;
use crate::errors::CaseflowError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

/// Storage for session records.
///
/// `get` returns a copy taken under the entry's read lock and `update`
/// mutates under its write lock, so readers never see a half-applied
/// transition.
pub trait SessionStore: Send + Sync {
    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the id is already taken.
    fn create(&self, record: SessionRecord) -> Result<(), CaseflowError>;

    /// Returns a copy of a record.
    fn get(&self, session_id: &Uuid) -> Option<SessionRecord>;

    /// Applies `f` to a record. Returns false if the id is unknown.
    fn update(&self, session_id: &Uuid, f: &mut dyn FnMut(&mut SessionRecord)) -> bool;

    /// Removes a record.
    fn remove(&self, session_id: &Uuid) -> Option<SessionRecord>;

    /// Removes every record matching `predicate`; returns how many.
    fn purge(&self, predicate: &dyn Fn(&SessionRecord) -> bool) -> usize;

    /// Returns the number of records.
    fn len(&self) -> usize;

    /// Returns true if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process store backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<Uuid, SessionRecord>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, record: SessionRecord) -> Result<(), CaseflowError> {
        match self.sessions.entry(record.session_id) {
            Entry::Occupied(_) => Err(CaseflowError::InvalidRequest(format!(
                "Session {} already exists",
                record.session_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn get(&self, session_id: &Uuid) -> Option<SessionRecord> {
        self.sessions.get(session_id).map(|r| r.value().clone())
    }

    fn update(&self, session_id: &Uuid, f: &mut dyn FnMut(&mut SessionRecord)) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(mut record) => {
                f(record.value_mut());
                true
            }
            None => false,
        }
    }

    fn remove(&self, session_id: &Uuid) -> Option<SessionRecord> {
        self.sessions.remove(session_id).map(|(_, record)| record)
    }

    fn purge(&self, predicate: &dyn Fn(&SessionRecord) -> bool) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, record| !predicate(record));
        before.saturating_sub(self.sessions.len())
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;
    use crate::testing::sample_request;

    fn record() -> SessionRecord {
        SessionRecord::new(Uuid::new_v4(), sample_request(), 3, Vec::new())
    }

    #[test]
    fn test_create_get_remove() {
        let store = InMemorySessionStore::new();
        let r = record();
        let id = r.session_id;

        store.create(r.clone()).unwrap();
        assert_eq!(store.get(&id), Some(r));
        assert_eq!(store.len(), 1);

        assert!(store.remove(&id).is_some());
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_rejects_duplicate_id() {
        let store = InMemorySessionStore::new();
        let r = record();
        store.create(r.clone()).unwrap();
        assert!(matches!(store.create(r), Err(CaseflowError::InvalidRequest(_))));
    }

    #[test]
    fn test_update() {
        let store = InMemorySessionStore::new();
        let r = record();
        let id = r.session_id;
        store.create(r).unwrap();

        assert!(store.update(&id, &mut |r| r.start()));
        assert_eq!(store.get(&id).unwrap().status, SessionStatus::Running);
        assert!(!store.update(&Uuid::new_v4(), &mut |r| r.start()));
    }

    #[test]
    fn test_purge() {
        let store = InMemorySessionStore::new();
        let mut done = record();
        done.fail("boom");
        store.create(done).unwrap();
        store.create(record()).unwrap();

        assert_eq!(store.purge(&|r| r.status.is_terminal()), 1);
        assert_eq!(store.len(), 1);
    }
}
