//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use timecore_core::config::ENV_API_BASE_URL;
use timecore_core::util::normalize_text_option;
use timecore_core::{ClientConfig, ReportScope};

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "cli-config.json";

pub const ENV_PROFILE: &str = "TIMECORE_PROFILE";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub scope: Option<ReportScope>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub session_cookie: Option<String>,
}

impl std::fmt::Debug for CliProfile {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CliProfile")
            .field("api_base_url", &self.api_base_url)
            .field("scope", &self.scope)
            .field("page_size", &self.page_size)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("timecore").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Profile name from the flag, then `TIMECORE_PROFILE`, then the active profile.
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        self.resolve_profile_name_with(explicit, std::env::var(ENV_PROFILE).ok().as_deref())
    }

    pub fn resolve_profile_name_with(&self, explicit: Option<&str>, env: Option<&str>) -> String {
        normalize_profile_name(explicit)
            .or_else(|| normalize_profile_name(env))
            .or_else(|| normalize_profile_name(self.active_profile.as_deref()))
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    /// Build the client config for this profile; `lookup` supplies
    /// `TIMECORE_*` overrides (the process environment in production).
    pub fn client_config(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientConfig, CliError> {
        let base_url = normalize_text_option(lookup(ENV_API_BASE_URL))
            .or_else(|| normalize_text_option(self.api_base_url.clone()))
            .ok_or(CliError::NotConfigured)?;

        let mut config = ClientConfig::new(base_url)?;
        if let Some(scope) = self.scope {
            config.scope = scope;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(interval) = self.poll_interval_secs {
            config.poll_interval_secs = interval;
        }
        config.session_cookie = normalize_text_option(self.session_cookie.clone());
        Ok(config.with_overrides(&lookup)?)
    }

    fn normalize(&mut self) {
        self.api_base_url = normalize_text_option(self.api_base_url.clone())
            .map(|url| url.trim_end_matches('/').to_string());
        self.session_cookie = normalize_text_option(self.session_cookie.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn normalize_profile_name_rejects_empty() {
        assert_eq!(normalize_profile_name(None), None);
        assert_eq!(normalize_profile_name(Some(" ")), None);
        assert_eq!(normalize_profile_name(Some(" work ")), Some("work".to_string()));
    }

    #[test]
    fn config_roundtrip_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = CliProfilesConfig {
            version: 1,
            active_profile: Some(" office ".to_string()),
            profiles: BTreeMap::new(),
        };
        config.profiles.insert(
            "office".to_string(),
            CliProfile {
                api_base_url: Some(" https://time.example.com/api/ ".to_string()),
                scope: Some(ReportScope::Admin),
                page_size: Some(100),
                poll_interval_secs: None,
                session_cookie: Some("  ".to_string()),
            },
        );

        config.save_to_path(&path).unwrap();
        let loaded = CliProfilesConfig::load_from_path(&path).unwrap();

        assert_eq!(loaded.active_profile.as_deref(), Some("office"));
        let profile = loaded.profile("office").unwrap();
        assert_eq!(
            profile.api_base_url.as_deref(),
            Some("https://time.example.com/api")
        );
        assert_eq!(profile.scope, Some(ReportScope::Admin));
        assert_eq!(profile.session_cookie, None);
    }

    #[test]
    fn missing_file_loads_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = CliProfilesConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, CliProfilesConfig::default());
    }

    #[test]
    fn resolve_profile_name_prefers_explicit_then_env_then_active() {
        let config = CliProfilesConfig {
            version: 1,
            active_profile: Some("work".to_string()),
            profiles: BTreeMap::new(),
        };
        assert_eq!(config.resolve_profile_name_with(Some("mobile"), Some("env")), "mobile");
        assert_eq!(config.resolve_profile_name_with(None, Some("env")), "env");
        assert_eq!(config.resolve_profile_name_with(None, Some(" ")), "work");
        assert_eq!(
            CliProfilesConfig::default().resolve_profile_name_with(None, None),
            "default"
        );
    }

    #[test]
    fn client_config_layers_env_over_profile() {
        let profile = CliProfile {
            api_base_url: Some("https://time.example.com".to_string()),
            scope: Some(ReportScope::Admin),
            page_size: Some(20),
            poll_interval_secs: Some(30),
            session_cookie: Some("sid=profile".to_string()),
        };
        let env = HashMap::from([("TIMECORE_SESSION", "sid=env")]);

        let config = profile
            .client_config(|key| env.get(key).map(ToString::to_string))
            .unwrap();
        assert_eq!(config.api_base_url, "https://time.example.com");
        assert_eq!(config.scope, ReportScope::Admin);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.session_cookie.as_deref(), Some("sid=env"));
    }

    #[test]
    fn client_config_requires_a_base_url() {
        let error = CliProfile::default().client_config(|_| None).unwrap_err();
        assert!(matches!(error, CliError::NotConfigured));

        let config = CliProfile::default()
            .client_config(|key| (key == ENV_API_BASE_URL).then(|| "http://localhost:3000".to_string()))
            .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:3000");
    }

    #[test]
    fn debug_redacts_session_cookie() {
        let profile = CliProfile {
            session_cookie: Some("sid=secret".to_string()),
            ..CliProfile::default()
        };
        assert!(!format!("{profile:?}").contains("secret"));
    }
}
