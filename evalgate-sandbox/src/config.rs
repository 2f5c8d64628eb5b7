//! Configuration management for the gateway

use crate::error::{GatewayError, GatewayResult};
use crate::limits::OutputLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Execution service
    #[serde(default)]
    pub sandbox: SandboxConfig,
    /// Paste store used for long or flagged output
    #[serde(default)]
    pub paste: PasteConfig,
    /// Inline rendering limits
    #[serde(default)]
    pub output: OutputLimits,
}

/// Execution service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Base address; `/eval` is appended
    #[serde(default = "SandboxConfig::default_url")]
    pub url: Url,
    /// Deadline for one evaluation round-trip (none = wait indefinitely)
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl SandboxConfig {
    fn default_url() -> Url {
        Url::parse("http://127.0.0.1:8060").expect("static url is valid")
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            timeout: None,
        }
    }
}

/// Paste store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasteConfig {
    /// Base address; `/documents` is appended for uploads
    #[serde(default = "PasteConfig::default_url")]
    pub url: Url,
    /// Request timeout for one upload
    #[serde(default = "PasteConfig::default_timeout", with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl PasteConfig {
    fn default_url() -> Url {
        Url::parse("https://paste.pythondiscord.com").expect("static url is valid")
    }

    fn default_timeout() -> Option<Duration> {
        Some(Duration::from_secs(10))
    }
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            timeout: Self::default_timeout(),
        }
    }
}

impl GatewayConfig {
    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing default file yields the built-in defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> GatewayResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = Self::config_path()?;
                if !default_path.exists() {
                    tracing::debug!(path = %default_path.display(), "No config file, using defaults");
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            GatewayError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> GatewayResult<Self> {
        let config: GatewayConfig = toml::from_str(content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> GatewayResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GatewayError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| GatewayError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| GatewayError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> GatewayResult<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| GatewayError::Config("Cannot determine home directory".to_string()))?;

        Ok(home.join(".config").join("evalgate").join("config.toml"))
    }

    pub fn validate(&self) -> GatewayResult<()> {
        for (name, url) in [("sandbox.url", &self.sandbox.url), ("paste.url", &self.paste.url)] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(GatewayError::Config(format!(
                    "{} must be an http(s) url, got {}",
                    name, url
                )));
            }
        }
        self.output.validate().map_err(GatewayError::Config)
    }
}

/// Append `path` to `base` as a new segment, keeping any path `base` already has
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}
