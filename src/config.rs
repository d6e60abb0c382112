//! Bootstrap configuration.
//!
//! Defaults match the shipped app. A JSON file at `~/.farmgate/config.json`
//! (or `--config <path>`) may override any field; command line flags and
//! `FARMGATE_*` environment variables are applied on top by `main`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Remote flag endpoint (bare JSON boolean)
pub const DEFAULT_FLAG_URL: &str = "https://chikengame-df0a7-default-rtdb.firebaseio.com/flag.json";

/// Remote locator endpoint (string, `{"url": ..}` or arbitrary object)
pub const DEFAULT_LOCATOR_URL: &str =
    "https://chikengame-df0a7-default-rtdb.firebaseio.com/url.json";

/// User agent presented by the browsing surface
pub const DEFAULT_SURFACE_USER_AGENT: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

const CONFIG_DIR: &str = ".farmgate";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BootstrapConfig {
    pub flag_url: String,
    pub locator_url: String,
    /// Per-request timeout for both resolver fetches and surface loads
    pub request_timeout_secs: u64,
    /// Automatic retries after the first failed load
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub surface_user_agent: String,
    /// Switch to native as soon as the loader gives up, instead of showing
    /// the retry panel
    pub auto_fallback: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            flag_url: DEFAULT_FLAG_URL.to_string(),
            locator_url: DEFAULT_LOCATOR_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            surface_user_agent: DEFAULT_SURFACE_USER_AGENT.to_string(),
            auto_fallback: false,
        }
    }
}

impl BootstrapConfig {
    /// Default config file location (`~/.farmgate/config.json`).
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .context("Could not determine home directory")?
            .join(CONFIG_DIR)
            .join(CONFIG_FILE))
    }

    /// Load configuration from `path`, or the default location.
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply command line / environment overrides.
    pub fn with_overrides(
        mut self,
        flag_url: Option<String>,
        locator_url: Option<String>,
        auto_fallback: bool,
    ) -> Self {
        if let Some(url) = flag_url {
            self.flag_url = url;
        }
        if let Some(url) = locator_url {
            self.locator_url = url;
        }
        if auto_fallback {
            self.auto_fallback = true;
        }
        self
    }

    /// Check that both endpoints parse as URLs.
    pub fn validate(&self) -> Result<()> {
        self.flag_endpoint()?;
        self.locator_endpoint()?;
        Ok(())
    }

    pub fn flag_endpoint(&self) -> Result<Url> {
        Url::parse(&self.flag_url).with_context(|| format!("Invalid flag URL: {}", self.flag_url))
    }

    pub fn locator_endpoint(&self) -> Result<Url> {
        Url::parse(&self.locator_url)
            .with_context(|| format!("Invalid locator URL: {}", self.locator_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
