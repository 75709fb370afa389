//! Upstream origin configuration.
//!
//! The base URL every `/watermark/<path>` request is resolved against, and the
//! timeout applied to each upstream fetch.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::DEFAULT_UPSTREAM_TIMEOUT_SECS;

fn default_timeout_secs() -> u64 {
    DEFAULT_UPSTREAM_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL for image files (e.g. "https://images.example.com/media")
    #[serde(default)]
    pub base_url: String,
    /// Upstream fetch timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
