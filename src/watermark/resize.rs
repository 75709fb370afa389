//! Watermark resampling with fast-image-resize.

use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::RgbaImage;
use std::num::NonZeroU32;

use super::WatermarkError;

/// Resample `img` to exactly `size × size` with a Catmull-Rom filter.
///
/// Alpha is premultiplied for the convolution so transparent edges do not
/// bleed colour into the result. `size == 0` yields an empty image.
pub fn resize_square(img: &RgbaImage, size: u32) -> Result<RgbaImage, WatermarkError> {
    if size == 0 {
        return Ok(RgbaImage::new(0, 0));
    }

    let src_width = NonZeroU32::new(img.width())
        .ok_or_else(|| WatermarkError::ResizeError("Source width is 0".to_string()))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| WatermarkError::ResizeError("Source height is 0".to_string()))?;
    let dst_side = NonZeroU32::new(size)
        .ok_or_else(|| WatermarkError::ResizeError("Target size is 0".to_string()))?;

    let mut src_image =
        Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x4)
            .map_err(|e| {
                WatermarkError::ResizeError(format!("Failed to create source image: {:?}", e))
            })?;

    let alpha_mul_div = MulDiv::default();
    alpha_mul_div
        .multiply_alpha_inplace(&mut src_image.view_mut())
        .map_err(|e| WatermarkError::ResizeError(format!("Failed to premultiply alpha: {:?}", e)))?;

    let mut dst_image = Image::new(dst_side, dst_side, PixelType::U8x4);
    let mut dst_view = dst_image.view_mut();

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::CatmullRom));
    resizer
        .resize(&src_image.view(), &mut dst_view)
        .map_err(|e| WatermarkError::ResizeError(format!("Resize operation failed: {:?}", e)))?;

    alpha_mul_div
        .divide_alpha_inplace(&mut dst_view)
        .map_err(|e| WatermarkError::ResizeError(format!("Failed to restore alpha: {:?}", e)))?;

    RgbaImage::from_raw(size, size, dst_image.into_vec()).ok_or_else(|| {
        WatermarkError::ResizeError("Failed to create output image buffer".to_string())
    })
}
