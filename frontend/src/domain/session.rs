//! Persisted identity record for the signed-in user.
//!
//! The record is stored as JSON under a single storage key:
//! `{ "id", "username", "email", "role", "token" }`. Only `role` is
//! required for the record to be well formed; a record without a token is
//! kept but does not count as authenticated.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use zeroize::Zeroizing;

use super::role::RoleClaim;

/// Opaque bearer credential issued by the authentication backend.
///
/// ## Invariants
/// - Never empty.
/// - Wiped from memory on drop and redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(Zeroizing<String>);

impl AuthToken {
    /// Wrap a raw token, returning `None` for empty input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(Zeroizing::new(raw)))
        }
    }

    /// Raw token value for the `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Errors raised when a stored record cannot be read as a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionRecordError {
    /// The value is not JSON or lacks the required shape.
    #[error("malformed session record: {message}")]
    Malformed {
        /// Parser diagnostic.
        message: String,
    },
}

/// Identity of the signed-in user as persisted in client storage.
///
/// # Examples
/// ```
/// use frontend::domain::{Role, Session};
///
/// let session = Session::new("u-1", "ada", Role::Doctor).with_token("abc");
/// assert!(session.is_authenticated());
/// assert_eq!(session.role().as_str(), "doctor");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SessionRecord", into = "SessionRecord")]
pub struct Session {
    id: String,
    username: String,
    email: String,
    role: RoleClaim,
    token: Option<AuthToken>,
}

impl Session {
    /// Build a session without email or token.
    pub fn new(id: impl Into<String>, username: impl Into<String>, role: impl Into<RoleClaim>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: String::new(),
            role: role.into(),
            token: None,
        }
    }

    /// Attach an email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Attach a bearer token; an empty token leaves the session
    /// unauthenticated.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = AuthToken::new(token);
        self
    }

    /// Parse a raw stored record.
    pub fn from_record(raw: &str) -> Result<Self, SessionRecordError> {
        serde_json::from_str(raw).map_err(|error| SessionRecordError::Malformed {
            message: error.to_string(),
        })
    }

    /// Serialise into the stored record format.
    pub fn to_record(&self) -> Result<String, SessionRecordError> {
        serde_json::to_string(self).map_err(|error| SessionRecordError::Malformed {
            message: error.to_string(),
        })
    }

    /// Opaque user identifier.
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Display name.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Email address; empty when unknown.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Role claim carried by the record.
    pub fn role(&self) -> &RoleClaim {
        &self.role
    }

    /// Bearer token, when present.
    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    /// Whether the session carries a usable token.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Apply a profile update, keeping role and token untouched.
    #[must_use]
    pub fn with_profile(mut self, update: &ProfileUpdate) -> Self {
        if let Some(username) = &update.username {
            self.username.clone_from(username);
        }
        if let Some(email) = &update.email {
            self.email.clone_from(email);
        }
        self
    }
}

/// Profile fields returned by the backend after a profile edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name, if changed.
    #[serde(default)]
    pub username: Option<String>,
    /// New email, if changed.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    username: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    email: String,
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            role: RoleClaim::from_raw(record.role),
            token: record.token.and_then(AuthToken::new),
        }
    }
}

impl From<Session> for SessionRecord {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            username: session.username,
            email: session.email,
            role: session.role.into(),
            token: session.token.map(|token| token.expose().to_owned()),
        }
    }
}
