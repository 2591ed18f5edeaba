//! Driving port for reading and writing the signed-in user's session.
//!
//! Route guards, menus and the HTTP client depend on this trait rather than
//! on storage directly, so each can be exercised with a fixture session.

use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::Session;

use super::define_port_error;

define_port_error! {
    /// Errors raised while persisting or clearing the session.
    pub enum SessionStoreError {
        /// The record could not be encoded.
        Encode { message: String } => "failed to encode session: {message}",
        /// The storage write or removal failed.
        Storage { message: String } => "session storage failed: {message}",
    }
}

/// Single read/write surface for the persisted session.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore {
    /// Current session; `None` when absent or unreadable. Never fails.
    fn get_session(&self) -> Option<Session>;

    /// Replace the stored session.
    fn set_session(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Remove the stored session.
    fn clear_session(&self) -> Result<(), SessionStoreError>;

    /// Whether a session with a non-empty token is stored.
    fn is_authenticated(&self) -> bool {
        self.get_session()
            .is_some_and(|session| session.is_authenticated())
    }
}

macro_rules! forward_session_store {
    ($($wrapper:ty),* $(,)?) => {
        $(
            impl<T: SessionStore + ?Sized> SessionStore for $wrapper {
                fn get_session(&self) -> Option<Session> {
                    (**self).get_session()
                }

                fn set_session(&self, session: &Session) -> Result<(), SessionStoreError> {
                    (**self).set_session(session)
                }

                fn clear_session(&self) -> Result<(), SessionStoreError> {
                    (**self).clear_session()
                }

                fn is_authenticated(&self) -> bool {
                    (**self).is_authenticated()
                }
            }
        )*
    };
}

forward_session_store!(&T, Arc<T>, Rc<T>, Box<T>);

/// In-memory session store for tests and previews.
#[derive(Debug, Default)]
pub struct FixtureSessionStore {
    session: Mutex<Option<Session>>,
}

impl FixtureSessionStore {
    /// Store pre-populated with `session`.
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    /// Anonymous store.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl SessionStore for FixtureSessionStore {
    fn get_session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_session(&self, session: &Session) -> Result<(), SessionStoreError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionStoreError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
