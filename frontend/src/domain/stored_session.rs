//! Session store backed by key-value storage.
//!
//! This is the only place that parses the persisted record. Every failure on
//! the read path is logged and reported as "no session", so callers such as
//! the route guard never see an error from a corrupted record.

use tracing::{debug, warn};

use crate::domain::Session;
use crate::domain::ports::{KeyValueStore, SessionStore, SessionStoreError};

/// Storage key used by the web client for the session record.
pub const DEFAULT_SESSION_KEY: &str = "loginResponse";

/// [`SessionStore`] persisting the record as JSON under one storage key.
///
/// # Examples
/// ```
/// use frontend::domain::ports::{KeyValueStore, SessionStore};
/// use frontend::domain::{Role, Session, StoredSessionStore};
/// use frontend::outbound::storage::MemoryKeyValueStore;
///
/// let store = StoredSessionStore::new(MemoryKeyValueStore::default());
/// assert!(store.get_session().is_none());
///
/// let session = Session::new("1", "ada", Role::Doctor).with_token("abc");
/// store.set_session(&session).unwrap();
/// assert_eq!(store.get_session(), Some(session));
/// ```
#[derive(Debug, Clone)]
pub struct StoredSessionStore<K> {
    storage: K,
    key: String,
}

impl<K> StoredSessionStore<K> {
    /// Store using [`DEFAULT_SESSION_KEY`].
    pub fn new(storage: K) -> Self {
        Self::with_key(storage, DEFAULT_SESSION_KEY)
    }

    /// Store using a custom storage key.
    pub fn with_key(storage: K, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Storage key holding the record.
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Underlying storage adapter.
    pub fn storage(&self) -> &K {
        &self.storage
    }
}

impl<K: KeyValueStore> SessionStore for StoredSessionStore<K> {
    fn get_session(&self) -> Option<Session> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                warn!(key = %self.key, %error, "session storage unreadable; treating as anonymous");
                return None;
            }
        };
        match Session::from_record(&raw) {
            Ok(session) => Some(session),
            Err(error) => {
                warn!(key = %self.key, %error, "discarding malformed session record");
                None
            }
        }
    }

    fn set_session(&self, session: &Session) -> Result<(), SessionStoreError> {
        let record = session
            .to_record()
            .map_err(|error| SessionStoreError::encode(error.to_string()))?;
        self.storage
            .set_item(&self.key, &record)
            .map_err(|error| SessionStoreError::storage(error.to_string()))?;
        debug!(key = %self.key, role = %session.role(), "session stored");
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionStoreError> {
        self.storage
            .remove_item(&self.key)
            .map_err(|error| SessionStoreError::storage(error.to_string()))?;
        debug!(key = %self.key, "session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{Role, RoleClaim};
    use crate::domain::ports::{KeyValueStoreError, MockKeyValueStore};
    use crate::outbound::storage::MemoryKeyValueStore;
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> StoredSessionStore<MemoryKeyValueStore> {
        StoredSessionStore::new(MemoryKeyValueStore::default())
    }

    fn seeded(raw: &str) -> StoredSessionStore<MemoryKeyValueStore> {
        let storage = MemoryKeyValueStore::default();
        storage
            .set_item(DEFAULT_SESSION_KEY, raw)
            .expect("seed storage");
        StoredSessionStore::new(storage)
    }

    #[rstest]
    fn empty_storage_is_anonymous(store: StoredSessionStore<MemoryKeyValueStore>) {
        assert_eq!(store.get_session(), None);
        assert!(!store.is_authenticated());
    }

    #[rstest]
    #[case("not-json")]
    #[case("{\"username\":\"ada\"}")]
    #[case("")]
    fn malformed_record_is_anonymous(#[case] raw: &str) {
        let store = seeded(raw);
        assert_eq!(store.get_session(), None);
        assert!(!store.is_authenticated());
    }

    #[rstest]
    fn set_then_get_round_trips(store: StoredSessionStore<MemoryKeyValueStore>) {
        let session = Session::new("64f1", "ada", Role::Therapist)
            .with_email("ada@example.org")
            .with_token("abc");
        store.set_session(&session).expect("set session");
        assert_eq!(store.get_session(), Some(session));
        assert_eq!(store.get_session(), store.get_session());
    }

    #[rstest]
    #[case("admin")]
    #[case("superuser")]
    #[case("ADMIN")]
    fn claims_round_trip_through_storage(
        store: StoredSessionStore<MemoryKeyValueStore>,
        #[case] raw: &str,
    ) {
        let session = Session::new("7", "casey", RoleClaim::from_raw(raw)).with_token("abc");
        store.set_session(&session).expect("set session");
        assert_eq!(store.get_session(), Some(session));
    }

    #[rstest]
    fn clear_removes_the_record(store: StoredSessionStore<MemoryKeyValueStore>) {
        store
            .set_session(&Session::new("1", "ada", Role::Admin).with_token("abc"))
            .expect("set session");
        store.clear_session().expect("clear session");
        assert_eq!(
            store.storage().get_item(DEFAULT_SESSION_KEY).expect("read"),
            None
        );
        assert_eq!(store.get_session(), None);
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let store = seeded(r#"{"role":"admin","token":""}"#);
        assert!(store.get_session().is_some());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn read_failures_are_anonymous() {
        let mut storage = MockKeyValueStore::new();
        storage
            .expect_get_item()
            .with(eq(DEFAULT_SESSION_KEY))
            .returning(|key| Err(KeyValueStoreError::read(key, "disk on fire")));
        let store = StoredSessionStore::new(storage);
        assert_eq!(store.get_session(), None);
    }

    #[test]
    fn write_failures_surface_as_storage_errors() {
        let mut storage = MockKeyValueStore::new();
        storage
            .expect_set_item()
            .returning(|key, _| Err(KeyValueStoreError::write(key, "quota exceeded")));
        let store = StoredSessionStore::new(storage);
        let error = store
            .set_session(&Session::new("1", "ada", Role::User))
            .expect_err("write must fail");
        assert!(matches!(error, SessionStoreError::Storage { .. }));
    }

    #[test]
    fn custom_keys_are_honoured() {
        let store = StoredSessionStore::with_key(MemoryKeyValueStore::default(), "medbot.session");
        store
            .set_session(&Session::new("1", "ada", Role::User).with_token("t"))
            .expect("set session");
        assert!(store
            .storage()
            .get_item("medbot.session")
            .expect("read")
            .is_some());
        assert!(store
            .storage()
            .get_item(DEFAULT_SESSION_KEY)
            .expect("read")
            .is_none());
    }
}
