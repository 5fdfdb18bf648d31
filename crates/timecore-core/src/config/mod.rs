//! Client configuration.
//!
//! Provides a unified `ClientConfig` used by every TimeCore front end to reach
//! the REST backend and to tune paging and change polling.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{clamp_page_size, ReportScope, DEFAULT_PAGE_SIZE};
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_BASE_URL: &str = "TIMECORE_API_BASE_URL";
pub const ENV_SCOPE: &str = "TIMECORE_SCOPE";
pub const ENV_PAGE_SIZE: &str = "TIMECORE_PAGE_SIZE";
pub const ENV_POLL_INTERVAL_SECS: &str = "TIMECORE_POLL_INTERVAL_SECS";
pub const ENV_SESSION: &str = "TIMECORE_SESSION";

/// Runtime configuration for talking to the TimeCore backend.
///
/// `session_cookie` is the opaque session cookie issued by the backend's
/// login flow; it is forwarded verbatim and never logged.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    #[serde(default)]
    pub scope: ReportScope,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub session_cookie: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("scope", &self.scope)
            .field("page_size", &self.page_size)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Config with defaults for everything except the base URL.
    pub fn new(api_base_url: impl Into<String>) -> Result<Self> {
        Self {
            api_base_url: api_base_url.into(),
            scope: ReportScope::default(),
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_cookie: None,
        }
        .validated()
    }

    /// Parse a JSON config document and validate it.
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::Config(format!("invalid client config JSON: {error}")))?;
        config.validated()
    }

    /// Apply `TIMECORE_*` environment overrides on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (environment in production).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = normalize_text_option(lookup(ENV_API_BASE_URL)) {
            self.api_base_url = url;
        }
        if let Some(scope) = normalize_text_option(lookup(ENV_SCOPE)) {
            self.scope = scope.parse().map_err(Error::Config)?;
        }
        if let Some(page_size) = normalize_text_option(lookup(ENV_PAGE_SIZE)) {
            self.page_size = page_size
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_PAGE_SIZE} must be a number")))?;
        }
        if let Some(interval) = normalize_text_option(lookup(ENV_POLL_INTERVAL_SECS)) {
            self.poll_interval_secs = interval.parse().map_err(|_| {
                Error::Config(format!("{ENV_POLL_INTERVAL_SECS} must be a number"))
            })?;
        }
        if let Some(session) = normalize_text_option(lookup(ENV_SESSION)) {
            self.session_cookie = Some(session);
        }
        self.validated()
    }

    /// Normalize and validate every field.
    pub fn validated(mut self) -> Result<Self> {
        self.api_base_url = normalize_required_http_url(&self.api_base_url, "api_base_url")?;
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".to_string()));
        }
        self.page_size = clamp_page_size(self.page_size);
        if self.poll_interval_secs == 0 {
            return Err(Error::Config(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        self.session_cookie = normalize_text_option(self.session_cookie);
        Ok(self)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

const fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn normalize_required_http_url(raw: &str, field: &str) -> Result<String> {
    let value = normalize_text_option(Some(raw.to_string()))
        .ok_or_else(|| Error::Config(format!("field '{field}' is required")))?;
    if is_http_url(&value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(format!(
            "field '{field}' must include http:// or https://"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn new_strips_trailing_slash() {
        let config = ClientConfig::new("https://api.example.com/").unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.poll_interval(), Duration::from_secs(15));
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn new_rejects_missing_scheme() {
        let error = ClientConfig::new("api.example.com").unwrap_err();
        assert!(error.to_string().contains("http:// or https://"));
        assert!(ClientConfig::new("   ").is_err());
    }

    #[test]
    fn from_json_rejects_unknown_fields() {
        let error = ClientConfig::from_json(
            r#"{ "api_base_url": "https://api.example.com", "unexpected": true }"#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn from_json_applies_defaults_and_clamps_page_size() {
        let config = ClientConfig::from_json(
            r#"{ "api_base_url": "http://localhost:3000", "scope": "admin", "page_size": 9000 }"#,
        )
        .unwrap();
        assert_eq!(config.scope, ReportScope::Admin);
        assert_eq!(config.page_size, 500);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let error = ClientConfig::from_json(
            r#"{ "api_base_url": "http://localhost:3000", "poll_interval_secs": 0 }"#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn overrides_take_precedence() {
        let env = HashMap::from([
            (ENV_API_BASE_URL, "https://override.example.com/"),
            (ENV_SCOPE, "admin"),
            (ENV_PAGE_SIZE, "20"),
            (ENV_SESSION, "  sid=abc  "),
        ]);
        let config = ClientConfig::new("https://api.example.com")
            .unwrap()
            .with_overrides(|key| env.get(key).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.api_base_url, "https://override.example.com");
        assert_eq!(config.scope, ReportScope::Admin);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.session_cookie.as_deref(), Some("sid=abc"));
    }

    #[test]
    fn invalid_override_is_reported() {
        let error = ClientConfig::new("https://api.example.com")
            .unwrap()
            .with_overrides(|key| (key == ENV_PAGE_SIZE).then(|| "many".to_string()))
            .unwrap_err();
        assert!(error.to_string().contains(ENV_PAGE_SIZE));
    }

    #[test]
    fn debug_redacts_session_cookie() {
        let mut config = ClientConfig::new("https://api.example.com").unwrap();
        config.session_cookie = Some("sid=secret".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
