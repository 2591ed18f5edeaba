//! Reqwest-backed client for the medical assistant REST backend.
//!
//! The client reads the session store on every request to attach the bearer
//! token, and clears the session when the backend answers `401`.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::ApiError;
use crate::config::ClientSettings;
use crate::domain::ports::SessionStore;
use crate::domain::{
    AuthResponse, Error, Location, LoginCredentials, PasswordChange, ProfileUpdate, Registration,
    Session, apply_profile_update, complete_login, handle_auth_failure,
};

const USER_NOT_FOUND: &str = "User not found. Please login again.";

/// Whether a `401` means "session expired" for this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnUnauthorized {
    /// Clear the session and report [`ApiError::SessionExpired`].
    Invalidate,
    /// Report the status; used by the login forms where 401 means bad
    /// credentials.
    Report,
}

/// Chat message sent to the assistant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage<'a> {
    /// Sender.
    pub user_id: &'a str,
    /// Message text.
    pub message: &'a str,
    /// Start a new conversation.
    pub is_new_chat: bool,
}

/// Body of `PUT /auth/profile`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRequest<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    update: &'a ProfileUpdate,
}

/// Reply of `PUT /auth/profile`; `user` holds the saved fields.
#[derive(Debug, Deserialize)]
struct ProfileReply {
    #[serde(default)]
    user: Option<ProfileUpdate>,
}

/// HTTP client bound to a session store.
#[derive(Debug)]
pub struct HttpBackendClient<S> {
    client: Client,
    base_url: Url,
    chat_timeout: Duration,
    store: S,
}

impl<S: SessionStore> HttpBackendClient<S> {
    /// Build a client with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] when the reqwest client cannot be
    /// constructed.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        chat_timeout: Duration,
        store: S,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ApiError::InvalidRequest {
                message: error.to_string(),
            })?;
        Ok(Self {
            client,
            base_url,
            chat_timeout,
            store,
        })
    }

    /// Build a client from loaded settings.
    pub fn from_settings(settings: &ClientSettings, store: S) -> Result<Self, ApiError> {
        let base_url = settings
            .api_base_url()
            .map_err(|error| ApiError::InvalidRequest {
                message: format!("invalid API base URL: {error}"),
            })?;
        Self::new(
            base_url,
            settings.api_timeout(),
            settings.chat_timeout(),
            store,
        )
    }

    /// Session store backing the client.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Authenticate against `POST /auth/login`.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        let request = self.prepare(Method::POST, "auth/login")?.json(credentials);
        self.send(request, OnUnauthorized::Report).await
    }

    /// Create an account via `POST /auth/register`.
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let request = self.prepare(Method::POST, "auth/register")?.json(registration);
        self.send(request, OnUnauthorized::Report).await
    }

    /// Log in, store the session and return where to go next.
    pub async fn sign_in(
        &self,
        credentials: &LoginCredentials,
        from: Option<&Location>,
    ) -> Result<Location, Error> {
        let response = self.login(credentials).await?;
        complete_login(&self.store, response, from)
    }

    /// Register, store the session and return where to go next.
    pub async fn sign_up(
        &self,
        registration: &Registration,
        from: Option<&Location>,
    ) -> Result<Location, Error> {
        let response = self.register(registration).await?;
        complete_login(&self.store, response, from)
    }

    /// Save profile edits via `PUT /auth/profile` and merge the saved user
    /// into the stored session.
    ///
    /// The request carries the stored session's id as `userId`. A reply
    /// without a `user` object leaves the session as it was.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::Unauthorized`](crate::domain::ErrorCode) without
    /// contacting the backend when no session with an id is stored.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Session, Error> {
        let user_id = self
            .store
            .get_session()
            .map(|session| session.id().to_owned())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::unauthorized(USER_NOT_FOUND))?;
        let body = ProfileRequest {
            user_id: &user_id,
            update,
        };
        let request = self.prepare(Method::PUT, "auth/profile")?.json(&body);
        let reply: Option<ProfileReply> = self.send(request, OnUnauthorized::Invalidate).await?;
        let saved = reply.and_then(|reply| reply.user).unwrap_or_default();
        apply_profile_update(&self.store, &saved)
    }

    /// Change the password via `PUT /auth/change-password`.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        let request = self.prepare(Method::PUT, "auth/change-password")?.json(change);
        self.send::<Value>(request, OnUnauthorized::Invalidate)
            .await
            .map(drop)
    }

    /// Send a chat message with the longer chat timeout.
    pub async fn send_chat_message(&self, message: &ChatMessage<'_>) -> Result<Value, ApiError> {
        let request = self
            .prepare(Method::POST, "chat/message")?
            .timeout(self.chat_timeout)
            .json(message);
        self.send(request, OnUnauthorized::Invalidate).await
    }

    /// `GET` an endpoint relative to the base URL.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.prepare(Method::GET, path)?;
        self.send(request, OnUnauthorized::Invalidate).await
    }

    /// `POST` a JSON body.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.prepare(Method::POST, path)?.json(body);
        self.send(request, OnUnauthorized::Invalidate).await
    }

    /// `PUT` a JSON body.
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.prepare(Method::PUT, path)?.json(body);
        self.send(request, OnUnauthorized::Invalidate).await
    }

    /// `DELETE` an endpoint.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.prepare(Method::DELETE, path)?;
        self.send(request, OnUnauthorized::Invalidate).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| ApiError::InvalidRequest {
                message: format!("invalid endpoint {path}: {error}"),
            })
    }

    fn prepare(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        let request = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        Ok(match self.store.get_session() {
            Some(session) => match session.token() {
                Some(token) => request.bearer_auth(token.expose()),
                None => request,
            },
            None => request,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        on_unauthorized: OnUnauthorized,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(%url, status = status.as_u16(), "backend responded");

        if status == StatusCode::UNAUTHORIZED && on_unauthorized == OnUnauthorized::Invalidate {
            warn!(%url, "backend rejected session token");
            let redirect = handle_auth_failure(&self.store);
            return Err(ApiError::SessionExpired { redirect });
        }
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        decode(body.as_ref())
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|error| ApiError::Decode {
        message: error.to_string(),
    })
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout {
            message: error.to_string(),
        }
    } else if error.is_decode() || error.is_builder() {
        ApiError::InvalidRequest {
            message: error.to_string(),
        }
    } else {
        ApiError::Network {
            message: error.to_string(),
        }
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ApiError {
    let server_message = serde_json::from_slice::<Value>(body).ok().and_then(|value| {
        ["message", "error"]
            .into_iter()
            .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_owned))
    });
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        preview
    };
    ApiError::Status {
        status: status.as_u16(),
        message,
        server_message,
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
