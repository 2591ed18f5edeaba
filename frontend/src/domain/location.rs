//! In-app locations used for navigation and redirects.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Path of the login view.
pub const LOGIN_PATH: &str = "/login";
/// Path of the access-denied view.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
/// Path of the landing page.
pub const HOME_PATH: &str = "/";
/// Query parameter carrying the location to resume after login.
pub const FROM_PARAM: &str = "from";

/// Validation errors returned by [`Location::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// The location was empty.
    #[error("location must not be empty")]
    Empty,
    /// The location did not start with a single `/`.
    #[error("location must be an absolute in-app path: {0}")]
    NotAbsolute(String),
}

/// Absolute in-app location: a path plus an optional query string.
///
/// ## Invariants
/// - `path` starts with exactly one `/`; protocol-relative `//host` values are
///   rejected so a redirect can never leave the application.
/// - Fragments are dropped.
///
/// # Examples
/// ```
/// use frontend::domain::Location;
///
/// let location = Location::parse("/reports?status=open").unwrap();
/// assert_eq!(location.path(), "/reports");
/// assert_eq!(location.query(), Some("status=open"));
/// assert!(Location::parse("//evil.example").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location {
    path: String,
    query: Option<String>,
}

impl Location {
    /// Parse and validate a raw location string.
    pub fn parse(raw: &str) -> Result<Self, LocationError> {
        let raw = raw.split_once('#').map_or(raw, |(before, _)| before);
        if raw.is_empty() {
            return Err(LocationError::Empty);
        }
        if !raw.starts_with('/') || raw.starts_with("//") || raw.starts_with("/\\") {
            return Err(LocationError::NotAbsolute(raw.to_owned()));
        }

        let (path, query) = match raw.split_once('?') {
            Some((path, query)) if !query.is_empty() => (path, Some(query.to_owned())),
            Some((path, _)) => (path, None),
            None => (raw, None),
        };
        Ok(Self {
            path: path.to_owned(),
            query,
        })
    }

    /// The landing page.
    pub fn home() -> Self {
        Self::from_static(HOME_PATH)
    }

    /// The login view without a resume target.
    pub fn login() -> Self {
        Self::from_static(LOGIN_PATH)
    }

    /// The access-denied view.
    pub fn unauthorized() -> Self {
        Self::from_static(UNAUTHORIZED_PATH)
    }

    /// The login view carrying `from` so a successful login can resume it.
    ///
    /// # Examples
    /// ```
    /// use frontend::domain::Location;
    ///
    /// let requested = Location::parse("/reports?status=open").unwrap();
    /// let login = Location::login_resuming(&requested);
    /// assert_eq!(login.to_string(), "/login?from=%2Freports%3Fstatus%3Dopen");
    /// assert_eq!(login.resume_target(), Some(requested));
    /// ```
    pub fn login_resuming(from: &Self) -> Self {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(FROM_PARAM, &from.to_string())
            .finish();
        Self {
            path: LOGIN_PATH.to_owned(),
            query: Some(query),
        }
    }

    /// Location named by the `from` query parameter, if present and valid.
    pub fn resume_target(&self) -> Option<Self> {
        let query = self.query.as_deref()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == FROM_PARAM)
            .and_then(|(_, value)| Self::parse(&value).ok())
    }

    /// Path component.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Query component without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Whether the path points at the login or access-denied views.
    pub fn is_auth_view(&self) -> bool {
        let path = self.path.trim_end_matches('/');
        path.eq_ignore_ascii_case(LOGIN_PATH) || path.eq_ignore_ascii_case(UNAUTHORIZED_PATH)
    }

    fn from_static(path: &'static str) -> Self {
        Self {
            path: path.to_owned(),
            query: None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{}", self.path, query),
            None => f.write_str(&self.path),
        }
    }
}

impl From<Location> for String {
    fn from(value: Location) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Location {
    type Error = LocationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}
