//! Porter-Duff "over" compositing onto an RGBA canvas.
//!
//! The canvas is a fresh transparent buffer with the source bounds. The source
//! image is drawn over it first, then the watermark is drawn over the result at
//! its placement. Only pixels inside the clipped footprint of each layer are
//! touched.

use super::position::{
    bottom_right_offset, visible_region, ImageDimensions, PlacementPosition, WatermarkDimensions,
};
use image::{DynamicImage, Rgba, RgbaImage};

/// Draw `layer` over `target` with its top-left corner at `position`.
///
/// Parts of the layer outside the target are skipped.
pub fn draw_over(target: &mut RgbaImage, layer: &RgbaImage, position: PlacementPosition) {
    let image_dims = ImageDimensions {
        width: target.width(),
        height: target.height(),
    };
    let layer_dims = WatermarkDimensions {
        width: layer.width(),
        height: layer.height(),
    };

    let region = visible_region(position, &image_dims, &layer_dims);
    if region.is_empty() {
        return;
    }

    for ty in region.y_start..region.y_end {
        for tx in region.x_start..region.x_end {
            let lx = (tx as i64 - position.x as i64) as u32;
            let ly = (ty as i64 - position.y as i64) as u32;

            let fg = *layer.get_pixel(lx, ly);
            let bg = *target.get_pixel(tx, ty);
            target.put_pixel(tx, ty, blend_pixels(bg, fg));
        }
    }
}

/// Build the composite canvas for `source` with `watermark` anchored bottom-right.
pub fn composite(source: &DynamicImage, watermark: &RgbaImage) -> RgbaImage {
    let mut canvas = RgbaImage::new(source.width(), source.height());

    let source_rgba = source.to_rgba8();
    draw_over(&mut canvas, &source_rgba, PlacementPosition::new(0, 0));

    let offset = bottom_right_offset(
        &ImageDimensions {
            width: canvas.width(),
            height: canvas.height(),
        },
        &WatermarkDimensions {
            width: watermark.width(),
            height: watermark.height(),
        },
    );
    draw_over(&mut canvas, watermark, offset);

    canvas
}

/// Blend two straight-alpha pixels with the "over" operator.
///
/// result = foreground + background * (1 - foreground.alpha)
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    // Exact cases of the operator
    match (foreground[3], background[3]) {
        (255, _) => return foreground,
        (0, _) => return background,
        (_, 0) => return foreground,
        _ => {}
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
