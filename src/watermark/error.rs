//! Watermark error types.
//!
//! Defines errors that can occur while preparing the watermark at startup.

use std::fmt;

/// Errors that can occur during watermark preparation.
#[derive(Debug)]
pub enum WatermarkError {
    /// Failed to read the watermark asset from disk
    ReadError(String),

    /// Failed to decode the watermark asset
    DecodeError(String),

    /// Failed to resample the watermark to the configured size
    ResizeError(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadError(msg) => write!(f, "Failed to read watermark asset: {}", msg),
            Self::DecodeError(msg) => write!(f, "Failed to decode watermark image: {}", msg),
            Self::ResizeError(msg) => write!(f, "Failed to resize watermark: {}", msg),
        }
    }
}

impl std::error::Error for WatermarkError {}
