//! Watermark configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::DEFAULT_WATERMARK_SIZE;
use crate::watermark::{Watermark, WatermarkError};

fn default_size() -> u32 {
    DEFAULT_WATERMARK_SIZE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Side length of the square watermark in pixels
    #[serde(default = "default_size")]
    pub size: u32,
    /// Replacement asset on disk; the embedded graphic is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            path: None,
        }
    }
}

impl WatermarkConfig {
    /// Decode and scale the configured asset.
    pub fn build(&self) -> Result<Watermark, WatermarkError> {
        match &self.path {
            Some(path) => Watermark::from_file(path, self.size),
            None => Watermark::embedded(self.size),
        }
    }
}
