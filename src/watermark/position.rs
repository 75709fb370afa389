//! Position calculation for watermark placement.
//!
//! The watermark is anchored so that its bottom-right corner coincides with
//! the bottom-right corner of the target image. When the target is smaller
//! than the watermark the offset goes negative and the watermark overflows
//! the top/left edges; nothing is clamped.
//!
//! # Example
//!
//! ```
//! use imgwater::watermark::position::{bottom_right_offset, ImageDimensions, WatermarkDimensions};
//!
//! let image = ImageDimensions { width: 800, height: 600 };
//! let watermark = WatermarkDimensions { width: 100, height: 100 };
//!
//! let pos = bottom_right_offset(&image, &watermark);
//! assert_eq!((pos.x, pos.y), (700, 500));
//! ```

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of the watermark to be placed.
#[derive(Debug, Clone, Copy)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

/// Top-left coordinate of a watermark placement on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Clipped rectangle of canvas pixels touched by a placement.
///
/// Half-open: `x_start..x_end`, `y_start..y_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRegion {
    pub x_start: u32,
    pub y_start: u32,
    pub x_end: u32,
    pub y_end: u32,
}

impl VisibleRegion {
    pub fn is_empty(&self) -> bool {
        self.x_start >= self.x_end || self.y_start >= self.y_end
    }
}

/// Offset that aligns the watermark's bottom-right corner with the image's.
///
/// Equivalent to `image.max - watermark.max` for bounds rooted at the origin.
/// Coordinates are negative when the watermark is larger than the image.
pub fn bottom_right_offset(
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> PlacementPosition {
    let x = image.width as i64 - watermark.width as i64;
    let y = image.height as i64 - watermark.height as i64;
    PlacementPosition::new(saturate_i32(x), saturate_i32(y))
}

/// Intersect a placement with the image bounds.
pub fn visible_region(
    position: PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> VisibleRegion {
    let x = position.x as i64;
    let y = position.y as i64;

    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + watermark.width as i64).min(image.width as i64);
    let y_end = (y + watermark.height as i64).min(image.height as i64);

    if x_start >= x_end || y_start >= y_end {
        return VisibleRegion {
            x_start: 0,
            y_start: 0,
            x_end: 0,
            y_end: 0,
        };
    }

    VisibleRegion {
        x_start: x_start as u32,
        y_start: y_start as u32,
        x_end: x_end as u32,
        y_end: y_end as u32,
    }
}

fn saturate_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
