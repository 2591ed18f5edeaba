//! Authentication payloads exchanged with the auth service.
//!
//! Form input is validated here before any request leaves the client, and the
//! service's response is turned into a [`Session`] in one place.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use super::role::RoleClaim;
use super::session::Session;

const REDACTED: &str = "<redacted>";

/// Shortest new password accepted by a password change.
pub const MIN_NEW_PASSWORD_LEN: usize = 6;

/// Errors returned when login, registration or password change input is
/// invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Registration email was blank or lacked an `@`.
    #[error("email address is not valid")]
    InvalidEmail,
    /// The current password was not supplied on a password change.
    #[error("Current password is required")]
    MissingCurrentPassword,
    /// The new password and its confirmation differ.
    #[error("New passwords do not match")]
    PasswordMismatch,
    /// The new password is shorter than [`MIN_NEW_PASSWORD_LEN`].
    #[error("New password must be at least {MIN_NEW_PASSWORD_LEN} characters long")]
    PasswordTooShort,
    /// No user id was available; the stored session is missing or stale.
    #[error("User not found. Please login again.")]
    MissingUserId,
}

/// Validated login credentials.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use frontend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("admin", "password").unwrap();
/// assert_eq!(creds.username(), "admin");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username sent to the auth service.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

impl Serialize for LoginCredentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CredentialsBody {
            username: self.username(),
            password: self.password(),
            email: None,
        }
        .serialize(serializer)
    }
}

/// Validated account registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    credentials: LoginCredentials,
    email: String,
}

impl Registration {
    /// Construct a registration from raw form inputs.
    pub fn try_from_parts(
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<Self, LoginValidationError> {
        let credentials = LoginCredentials::try_from_parts(username, password)?;
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(LoginValidationError::InvalidEmail);
        }
        Ok(Self {
            credentials,
            email: email.to_owned(),
        })
    }

    /// Login part of the registration.
    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    /// Email address of the new account.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}

impl Serialize for Registration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CredentialsBody {
            username: self.credentials.username(),
            password: self.credentials.password(),
            email: Some(self.email()),
        }
        .serialize(serializer)
    }
}

/// Validated password change for the signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordChange {
    user_id: String,
    current_password: Zeroizing<String>,
    new_password: Zeroizing<String>,
}

impl PasswordChange {
    /// Construct a password change request from the settings form.
    ///
    /// Checks run in form order: confirmation, length, current password,
    /// then the user id taken from the stored session.
    pub fn try_from_parts(
        user_id: &str,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Self, LoginValidationError> {
        if new_password != confirm_password {
            return Err(LoginValidationError::PasswordMismatch);
        }
        if new_password.chars().count() < MIN_NEW_PASSWORD_LEN {
            return Err(LoginValidationError::PasswordTooShort);
        }
        if current_password.is_empty() {
            return Err(LoginValidationError::MissingCurrentPassword);
        }
        if user_id.is_empty() {
            return Err(LoginValidationError::MissingUserId);
        }
        Ok(Self {
            user_id: user_id.to_owned(),
            current_password: Zeroizing::new(current_password.to_owned()),
            new_password: Zeroizing::new(new_password.to_owned()),
        })
    }

    /// Account whose password changes.
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordChange")
            .field("user_id", &self.user_id)
            .field("current_password", &REDACTED)
            .field("new_password", &REDACTED)
            .finish()
    }
}

impl Serialize for PasswordChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            user_id: &'a str,
            current_password: &'a str,
            new_password: &'a str,
        }

        Body {
            user_id: self.user_id(),
            current_password: self.current_password.as_str(),
            new_password: self.new_password.as_str(),
        }
        .serialize(serializer)
    }
}

/// Successful login or registration response from the auth service.
///
/// # Examples
/// ```
/// use frontend::domain::{AuthResponse, Role};
///
/// let body = r#"{"id":"64f1","username":"ada","email":null,"role":"doctor","token":"abc"}"#;
/// let response: AuthResponse = serde_json::from_str(body).unwrap();
/// let session = response.into_session();
/// assert_eq!(session.role().known(), Some(Role::Doctor));
/// assert!(session.is_authenticated());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    /// Account identifier.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub username: String,
    /// Email address, when the account has one.
    #[serde(default)]
    pub email: Option<String>,
    /// Role string as issued by the backend.
    pub role: RoleClaim,
    /// Bearer token; absent on some legacy responses.
    #[serde(default)]
    pub token: Option<String>,
}

impl AuthResponse {
    /// Session record for this response. A missing email is stored as `""`.
    pub fn into_session(self) -> Session {
        let session = Session::new(self.id, self.username, self.role)
            .with_email(self.email.unwrap_or_default());
        match self.token {
            Some(token) => session.with_token(token),
            None => session,
        }
    }
}

// Mongo-style backends sometimes return numeric ids.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(text)) => text,
        Some(RawId::Number(number)) => number.to_string(),
        None => String::new(),
    })
}
