//! Configuration file handling for expendash.
//!
//! The configuration file is stored at `$EXPENDASH_HOME/config.json` and
//! contains the backend base URL plus the handshake and chart tunables.

use crate::dashboard::DashboardSettings;
use crate::{utils, Result};
use anyhow::{bail, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_NAME: &str = "expendash";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_AUTH_TIMEOUT_MS: u64 = 300_000;
const DEFAULT_SLICE_LABEL_MIN_PERCENT: u32 = 5;

/// The `Config` object represents the configuration of the app. You
/// instantiate it by providing the path to `$EXPENDASH_HOME` and from there
/// it loads `$EXPENDASH_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_base_url: Url,
    share_url: Url,
}

impl Config {
    /// Creates the data directory and an initial `config.json` using
    /// `api_base_url` along with default settings.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the expendash home, e.g.
    ///   `$HOME/expendash`
    /// - `api_base_url` - The root URL of the backend API.
    /// - `share_url` - The URL of the hosted dashboard page used to build
    ///   shareable links. Defaults to `api_base_url` when omitted.
    pub async fn create(
        dir: impl Into<PathBuf>,
        api_base_url: &str,
        share_url: Option<&str>,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the expendash home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_base_url: api_base_url.to_string(),
            share_url: share_url.map(|s| s.to_string()),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            auth_timeout_ms: DEFAULT_AUTH_TIMEOUT_MS,
            slice_label_min_percent: DEFAULT_SLICE_LABEL_MIN_PERCENT,
        };
        let (api_base_url, share_url) = config_file.parse_urls()?;

        let config_path = root.join(CONFIG_JSON);
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
            api_base_url,
            share_url,
        })
    }

    /// Validates that the home and config file exist, loads the config file
    /// and returns the loaded configuration object.
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Expendash home is missing, run 'expendash init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let (api_base_url, share_url) = config_file.parse_urls()?;

        Ok(Self {
            root,
            config_path,
            config_file,
            api_base_url,
            share_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The backend API root, normalized to end with `/` so endpoint paths
    /// append cleanly.
    pub fn api_base_url(&self) -> Url {
        self.api_base_url.clone()
    }

    /// The base URL that shareable links are built on.
    pub fn share_url(&self) -> Url {
        self.share_url.clone()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config_file.poll_interval_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.config_file.auth_timeout_ms)
    }

    /// Slices below this percentage get no on-slice label.
    pub fn slice_label_min_percent(&self) -> Decimal {
        Decimal::from(self.config_file.slice_label_min_percent)
    }

    /// The dashboard tunables in the shape the controller wants.
    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            poll_interval: self.poll_interval(),
            auth_timeout: self.auth_timeout(),
            share_url: self.share_url(),
        }
    }
}

/// The wire format of `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct ConfigFile {
    app_name: String,
    config_version: u8,
    api_base_url: String,
    share_url: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
    #[serde(default = "default_auth_timeout_ms")]
    auth_timeout_ms: u64,
    #[serde(default = "default_slice_label_min_percent")]
    slice_label_min_percent: u32,
}

impl ConfigFile {
    async fn load(path: &Path) -> Result<Self> {
        utils::deserialize(path).await
    }

    async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Unable to serialize the config file")?;
        utils::write(path, content).await
    }

    /// Parses and normalizes both URLs. The API base gets a trailing slash
    /// because endpoint paths are appended directly to it.
    fn parse_urls(&self) -> Result<(Url, Url)> {
        let mut api = Url::parse(&self.api_base_url)
            .with_context(|| format!("Invalid api_base_url '{}'", self.api_base_url))?;
        if !api.path().ends_with('/') {
            let path = format!("{}/", api.path());
            api.set_path(&path);
        }
        let share = match &self.share_url {
            Some(raw) => {
                Url::parse(raw).with_context(|| format!("Invalid share_url '{raw}'"))?
            }
            None => api.clone(),
        };
        Ok((api, share))
    }
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_auth_timeout_ms() -> u64 {
    DEFAULT_AUTH_TIMEOUT_MS
}

fn default_slice_label_min_percent() -> u32 {
    DEFAULT_SLICE_LABEL_MIN_PERCENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_then_load_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("expendash");

        let created = Config::create(&home, "https://backend.example/api", None)
            .await
            .unwrap();
        assert_eq!(created.api_base_url().as_str(), "https://backend.example/api/");
        assert_eq!(created.poll_interval(), Duration::from_millis(2_000));
        assert_eq!(created.auth_timeout(), Duration::from_millis(300_000));
        assert_eq!(created.slice_label_min_percent(), Decimal::from(5));

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.api_base_url(), created.api_base_url());
        assert_eq!(loaded.share_url(), created.share_url());
    }

    #[tokio::test]
    async fn test_share_url_defaults_to_api_base() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("expendash");
        let config = Config::create(&home, "https://backend.example", None)
            .await
            .unwrap();
        assert_eq!(config.share_url(), config.api_base_url());
    }

    #[tokio::test]
    async fn test_explicit_share_url_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("expendash");
        let config = Config::create(
            &home,
            "https://backend.example/api",
            Some("https://dash.example/"),
        )
        .await
        .unwrap();
        assert_eq!(config.share_url().as_str(), "https://dash.example/");
    }

    #[tokio::test]
    async fn test_invalid_api_url_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("expendash");
        assert!(Config::create(&home, "not a url", None).await.is_err());
    }

    #[tokio::test]
    async fn test_load_without_init_fails() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("never-created");
        assert!(Config::load(&home).await.is_err());
    }
}
