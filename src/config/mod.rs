// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod limits;
pub mod server;
pub mod upstream;
pub mod watermark;

pub use limits::LimitsConfig;
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;
pub use watermark::WatermarkConfig;

use crate::logging::LogFormat;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format (default: json)
    #[serde(default)]
    pub format: LogFormat,
}

/// Values supplied on the command line or through the environment.
///
/// Any field that is set replaces the value read from the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub image_url: Option<String>,
    pub watermark_size: Option<u32>,
    pub watermark_path: Option<PathBuf>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub upstream_timeout_secs: Option<u64>,
    pub log_format: Option<LogFormat>,
}

/// Startup configuration errors; all of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document deserializes as unit, not as a map
        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Apply command line / environment overrides on top of file values.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.image_url {
            self.upstream.base_url = url;
        }
        if let Some(size) = overrides.watermark_size {
            self.watermark.size = size;
        }
        if let Some(path) = overrides.watermark_path {
            self.watermark.path = Some(path);
        }
        if let Some(address) = overrides.address {
            self.server.address = address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(timeout) = overrides.upstream_timeout_secs {
            self.upstream.timeout_secs = timeout;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.upstream.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Invalid(
                "upstream base URL is required (--image-url or IMAGE_URL)".to_string(),
            ));
        }

        let parsed = reqwest::Url::parse(base_url).map_err(|e| {
            ConfigError::Invalid(format!("upstream base URL '{}' is invalid: {}", base_url, e))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::Invalid(format!(
                "upstream base URL '{}' must use http or https",
                base_url
            )));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "upstream timeout must be > 0 seconds".to_string(),
            ));
        }

        if self.limits.max_source_pixels == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_source_pixels must be > 0".to_string(),
            ));
        }

        if self.limits.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_body_bytes must be > 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server port must be > 0".to_string()));
        }

        if self.server.address.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "server address cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
