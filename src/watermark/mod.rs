//! Watermark preparation and compositing.
//!
//! The watermark is built exactly once at startup: the embedded asset (or an
//! operator-supplied file) is decoded and resampled to a `size × size` RGBA
//! raster. The resulting [`Watermark`] is immutable and shared by every
//! request through an `Arc`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use imgwater::watermark::Watermark;
//!
//! let watermark = Arc::new(Watermark::embedded(64).expect("embedded asset decodes"));
//! assert_eq!(watermark.size(), 64);
//! ```

pub mod compositor;
pub mod error;
pub mod position;
pub mod resize;

use image::RgbaImage;
use std::path::Path;

pub use compositor::{composite, draw_over};
pub use error::WatermarkError;
pub use position::{
    bottom_right_offset, visible_region, ImageDimensions, PlacementPosition,
    VisibleRegion, WatermarkDimensions,
};
pub use resize::resize_square;

/// Watermark graphic bundled with the binary.
pub const EMBEDDED_ASSET: &[u8] = include_bytes!("../../assets/watermark.png");

/// Pre-scaled, square watermark raster.
///
/// Invariant: `width == height == size`.
pub struct Watermark {
    image: RgbaImage,
}

impl std::fmt::Debug for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watermark")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .finish()
    }
}

impl Watermark {
    /// Decode `asset` and resample it to `size × size`.
    ///
    /// # Errors
    ///
    /// Returns `WatermarkError::DecodeError` if the asset is not a decodable
    /// raster image, or `WatermarkError::ResizeError` if resampling fails.
    pub fn from_asset(asset: &[u8], size: u32) -> Result<Self, WatermarkError> {
        let full = image::load_from_memory(asset)
            .map_err(|e| WatermarkError::DecodeError(e.to_string()))?
            .to_rgba8();

        let image = resize_square(&full, size)?;

        tracing::debug!(
            source_width = full.width(),
            source_height = full.height(),
            size = size,
            "Watermark prepared"
        );

        Ok(Self { image })
    }

    /// Build the watermark from the asset embedded in the binary.
    pub fn embedded(size: u32) -> Result<Self, WatermarkError> {
        Self::from_asset(EMBEDDED_ASSET, size)
    }

    /// Build the watermark from an image file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P, size: u32) -> Result<Self, WatermarkError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| WatermarkError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_asset(&bytes, size)
    }

    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// True when the watermark has zero area and compositing is a no-op.
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// The scaled RGBA pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}
