//! Errors raised by the backend client.

use crate::domain::{Error, Location};

const TIMEOUT_MESSAGE: &str = "The request is taking longer than expected. The AI is processing \
your message, please wait a moment and try again if needed.";
const NETWORK_MESSAGE: &str =
    "Unable to connect to the server. Please check your internet connection and try again.";
const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please wait a moment before trying again.";
const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again in a few moments.";
const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Failures of a backend request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request did not complete in time.
    #[error("request timed out: {message}")]
    Timeout {
        /// Transport diagnostic.
        message: String,
    },
    /// The backend could not be reached.
    #[error("network error: {message}")]
    Network {
        /// Transport diagnostic.
        message: String,
    },
    /// The backend rejected the session token; the session has been cleared.
    #[error("session rejected by backend")]
    SessionExpired {
        /// Where to send the user.
        redirect: Location,
    },
    /// The backend answered with a non-success status.
    #[error("status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Body preview.
        message: String,
        /// `message` or `error` field of a JSON error body.
        server_message: Option<String>,
    },
    /// The response body was not the expected JSON.
    #[error("invalid response body: {message}")]
    Decode {
        /// Decoder diagnostic.
        message: String,
    },
    /// The request could not be built.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Builder diagnostic.
        message: String,
    },
}

impl ApiError {
    /// Message suitable for showing to the user.
    ///
    /// # Examples
    /// ```
    /// use frontend::outbound::api::ApiError;
    ///
    /// let error = ApiError::Status { status: 429, message: String::new(), server_message: None };
    /// assert_eq!(
    ///     error.user_message(),
    ///     "Too many requests. Please wait a moment before trying again."
    /// );
    /// ```
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout { .. } => TIMEOUT_MESSAGE.to_owned(),
            Self::Network { .. } => NETWORK_MESSAGE.to_owned(),
            Self::SessionExpired { .. } => SESSION_EXPIRED_MESSAGE.to_owned(),
            Self::Status {
                server_message: Some(message),
                ..
            } => message.clone(),
            Self::Status { status: 429, .. } => RATE_LIMITED_MESSAGE.to_owned(),
            Self::Status { status: 500, .. } => SERVER_ERROR_MESSAGE.to_owned(),
            other => other.to_string(),
        }
    }
}

impl From<ApiError> for Error {
    fn from(value: ApiError) -> Self {
        let message = value.user_message();
        match value {
            ApiError::SessionExpired { .. } => Error::unauthorized(message),
            ApiError::Status { status: 401, .. } => Error::unauthorized(message),
            ApiError::Status { status: 403, .. } => Error::forbidden(message),
            ApiError::Status { status: 404, .. } => Error::not_found(message),
            ApiError::Status { status, .. } if (400..500).contains(&status) => {
                Error::invalid_request(message)
            }
            ApiError::InvalidRequest { .. } => Error::invalid_request(message),
            _ => Error::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn status(status: u16, server_message: Option<&str>) -> ApiError {
        ApiError::Status {
            status,
            message: format!("status {status}"),
            server_message: server_message.map(str::to_owned),
        }
    }

    #[rstest]
    #[case(ApiError::Timeout { message: "deadline".into() }, TIMEOUT_MESSAGE)]
    #[case(ApiError::Network { message: "refused".into() }, NETWORK_MESSAGE)]
    #[case(status(429, None), RATE_LIMITED_MESSAGE)]
    #[case(status(500, None), SERVER_ERROR_MESSAGE)]
    #[case(status(500, Some("Database offline")), "Database offline")]
    #[case(status(418, None), "status 418: status 418")]
    fn user_messages(#[case] error: ApiError, #[case] expected: &str) {
        assert_eq!(error.user_message(), expected);
    }

    #[rstest]
    #[case(status(401, None), ErrorCode::Unauthorized)]
    #[case(status(403, None), ErrorCode::Forbidden)]
    #[case(status(404, None), ErrorCode::NotFound)]
    #[case(status(422, None), ErrorCode::InvalidRequest)]
    #[case(status(502, None), ErrorCode::InternalError)]
    #[case(ApiError::SessionExpired { redirect: Location::login() }, ErrorCode::Unauthorized)]
    fn converts_to_domain_errors(#[case] error: ApiError, #[case] expected: ErrorCode) {
        assert_eq!(Error::from(error).code(), expected);
    }
}
