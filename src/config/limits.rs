//! Source image limits.
//!
//! Caps applied to every upstream image before it is decoded, so a small
//! compressed file cannot claim a huge canvas and exhaust memory.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_SOURCE_PIXELS};

fn default_max_source_pixels() -> u64 {
    DEFAULT_MAX_SOURCE_PIXELS
}

fn default_max_body_bytes() -> u64 {
    DEFAULT_MAX_BODY_BYTES
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum width * height of a source image (default: 100 megapixels)
    #[serde(default = "default_max_source_pixels")]
    pub max_source_pixels: u64,
    /// Maximum upstream body size in bytes (default: 50MB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_source_pixels: default_max_source_pixels(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}
