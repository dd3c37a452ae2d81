use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use fas_api::Sites;
use serde::{Deserialize, Serialize};

use crate::error::FasError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub sites: SitesConfig,
}

/// Settings for the shared HTTP client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Whole-request timeout. `None` leaves requests unbounded.
    pub timeout_secs: Option<u64>,
    /// In-flight requests per range resolution.
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitesConfig {
    pub animeunity: SiteConfig,
    pub animeworld: SiteConfig,
    pub aniplay: SiteConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub enabled: bool,
    /// Mirror to use instead of the adapter's built-in base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// API root override (AniPlay only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load config: user file (if exists) over built-in defaults.
    pub fn load() -> Result<Self, FasError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, FasError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| FasError::Config(e.to_string()))
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), FasError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), FasError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| FasError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "fas")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    pub fn site(&self, site: Sites) -> &SiteConfig {
        match site {
            Sites::AnimeUnity => &self.sites.animeunity,
            Sites::AnimeWorld => &self.sites.animeworld,
            Sites::AniPlay => &self.sites.aniplay,
        }
    }

    pub fn site_mut(&mut self, site: Sites) -> &mut SiteConfig {
        match site {
            Sites::AnimeUnity => &mut self.sites.animeunity,
            Sites::AnimeWorld => &mut self.sites.animeworld,
            Sites::AniPlay => &mut self.sites.aniplay,
        }
    }

    /// Sites enabled in this config, in [`Sites::ALL`] order.
    pub fn enabled_sites(&self) -> Vec<Sites> {
        Sites::ALL
            .iter()
            .copied()
            .filter(|s| self.site(*s).enabled)
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.http.timeout_secs, Some(30));
        assert_eq!(config.http.concurrency, 8);
        assert!(config.http.user_agent.starts_with("Mozilla/5.0"));
        assert!(config.sites.animeunity.enabled);
        assert!(config.sites.aniplay.base_url.is_none());
        assert_eq!(config.enabled_sites(), Sites::ALL.to_vec());
    }

    #[test]
    fn test_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_site_overrides() {
        let toml = r#"
            [http]
            user_agent = "fas-test"
            concurrency = 2

            [sites.animeunity]
            enabled = false

            [sites.animeworld]
            enabled = true
            base_url = "https://www.animeworld.ac"

            [sites.aniplay]
            enabled = true
            api_url = "https://api.mirror.example"
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.http.timeout_secs, None);
        assert!(!config.site(Sites::AnimeUnity).enabled);
        assert_eq!(
            config.site(Sites::AnimeWorld).base_url.as_deref(),
            Some("https://www.animeworld.ac")
        );
        assert_eq!(
            config.site(Sites::AniPlay).api_url.as_deref(),
            Some("https://api.mirror.example")
        );
        assert_eq!(config.enabled_sites(), vec![Sites::AnimeWorld, Sites::AniPlay]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.site_mut(Sites::AniPlay).enabled = false;
        config.http.concurrency = 4;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(!loaded.site(Sites::AniPlay).enabled);
    }

    #[test]
    fn test_load_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "http = 3").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(FasError::Config(_))
        ));
    }
}
