//! Image transform pipeline
//!
//! Decodes an upstream image, composites the shared watermark onto its
//! bottom-right corner and re-encodes it in the same format:
//!
//! ```text
//! format ──► ImageCodec lookup ──► size check ──► decode ──► composite ──► encode ──► output
//! ```
//!
//! The engine holds an `Arc` to the startup-built watermark and the source
//! pixel limit, so it is cheap to clone into blocking tasks.

pub mod codec;
pub mod error;

pub use codec::ImageCodec;
pub use error::TransformError;

use std::io::{BufReader, Read, Write};
use std::sync::Arc;
use std::time::Instant;

use crate::constants::DEFAULT_MAX_SOURCE_PIXELS;
use crate::watermark::{composite, Watermark};

/// Applies the shared watermark to images
#[derive(Debug, Clone)]
pub struct TransformEngine {
    watermark: Arc<Watermark>,
    max_source_pixels: u64,
}

impl TransformEngine {
    pub fn new(watermark: Arc<Watermark>) -> Self {
        Self {
            watermark,
            max_source_pixels: DEFAULT_MAX_SOURCE_PIXELS,
        }
    }

    /// Reject sources whose width * height exceeds `max_pixels`
    pub fn with_max_source_pixels(mut self, max_pixels: u64) -> Self {
        self.max_source_pixels = max_pixels;
        self
    }

    pub fn max_source_pixels(&self) -> u64 {
        self.max_source_pixels
    }

    pub fn watermark(&self) -> &Watermark {
        &self.watermark
    }

    /// Watermark an image whose format is named by `format` (e.g. "png", "JPG")
    ///
    /// Unknown formats are rejected before `input` is touched.
    pub fn transform<R: Read, W: Write>(
        &self,
        format: &str,
        input: R,
        output: W,
    ) -> Result<(), TransformError> {
        let codec = ImageCodec::from_subtype(format)
            .ok_or_else(|| TransformError::UnsupportedFormat(format.to_string()))?;
        self.transform_with(codec, input, output)
    }

    /// Watermark an image with an already resolved codec
    pub fn transform_with<R: Read, W: Write>(
        &self,
        codec: ImageCodec,
        input: R,
        output: W,
    ) -> Result<(), TransformError> {
        let started = Instant::now();

        let source = codec.decode(BufReader::new(input), self.max_source_pixels)?;

        let canvas = composite(&source, self.watermark.image());

        codec
            .encode(output, &canvas)
            .map_err(|source| TransformError::Encode {
                format: codec.name(),
                source,
            })?;

        tracing::debug!(
            format = codec.name(),
            width = canvas.width(),
            height = canvas.height(),
            watermark_size = self.watermark.size(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Watermark applied"
        );

        Ok(())
    }
}
