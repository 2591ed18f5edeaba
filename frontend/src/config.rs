//! Client configuration loaded via OrthoConfig.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::DEFAULT_SESSION_KEY;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_API_TIMEOUT_MS: u64 = 20_000;
const DEFAULT_CHAT_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_STORAGE_DIR: &str = ".medbot";

/// Configuration for the backend client and native session storage.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MEDBOT")]
pub struct ClientSettings {
    /// Base URL of the REST backend, e.g. `https://host/api`.
    pub api_base_url: Option<String>,
    /// Timeout for ordinary requests, in milliseconds.
    pub api_timeout_ms: Option<u64>,
    /// Timeout for chat requests, in milliseconds.
    pub chat_timeout_ms: Option<u64>,
    /// Storage key holding the session record.
    pub session_key: Option<String>,
    /// Directory used for session storage by native tools.
    pub storage_dir: Option<String>,
}

impl ClientSettings {
    /// Backend base URL, always ending in `/` so relative endpoints append.
    pub fn api_base_url(&self) -> Result<Url, url::ParseError> {
        let raw = self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL);
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Timeout for ordinary requests.
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms.unwrap_or(DEFAULT_API_TIMEOUT_MS))
    }

    /// Timeout for chat requests.
    pub fn chat_timeout(&self) -> Duration {
        Duration::from_millis(self.chat_timeout_ms.unwrap_or(DEFAULT_CHAT_TIMEOUT_MS))
    }

    /// Storage key holding the session record.
    pub fn session_key(&self) -> &str {
        self.session_key.as_deref().unwrap_or(DEFAULT_SESSION_KEY)
    }

    /// Session storage directory.
    pub fn storage_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.storage_dir.as_deref().unwrap_or(DEFAULT_STORAGE_DIR))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for client configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> ClientSettings {
        ClientSettings::load_from_iter([OsString::from("access-check")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env([
            ("MEDBOT_API_BASE_URL", None::<String>),
            ("MEDBOT_API_TIMEOUT_MS", None::<String>),
            ("MEDBOT_CHAT_TIMEOUT_MS", None::<String>),
            ("MEDBOT_SESSION_KEY", None::<String>),
            ("MEDBOT_STORAGE_DIR", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_base_url().expect("default url").as_str(),
            "http://localhost:5000/api/"
        );
        assert_eq!(settings.api_timeout(), Duration::from_secs(20));
        assert_eq!(settings.chat_timeout(), Duration::from_secs(60));
        assert_eq!(settings.session_key(), "loginResponse");
        assert_eq!(settings.storage_dir(), Utf8PathBuf::from(".medbot"));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("MEDBOT_API_BASE_URL", Some("https://bot.example.org/api/".to_owned())),
            ("MEDBOT_API_TIMEOUT_MS", Some("1500".to_owned())),
            ("MEDBOT_CHAT_TIMEOUT_MS", None::<String>),
            ("MEDBOT_SESSION_KEY", Some("session".to_owned())),
            ("MEDBOT_STORAGE_DIR", Some("/tmp/medbot".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_base_url().expect("url").as_str(),
            "https://bot.example.org/api/"
        );
        assert_eq!(settings.api_timeout(), Duration::from_millis(1500));
        assert_eq!(settings.chat_timeout(), Duration::from_secs(60));
        assert_eq!(settings.session_key(), "session");
        assert_eq!(settings.storage_dir(), Utf8PathBuf::from("/tmp/medbot"));
    }

    #[rstest]
    fn invalid_base_url_is_reported() {
        let settings = ClientSettings {
            api_base_url: Some("not a url".to_owned()),
            api_timeout_ms: None,
            chat_timeout_ms: None,
            session_key: None,
            storage_dir: None,
        };
        assert!(settings.api_base_url().is_err());
    }
}
