//! Format dispatch for the transform pipeline
//!
//! Each supported raster format is a variant of [`ImageCodec`] bound to one
//! decoder and one encoder. Lookup goes through a table keyed by the lowercase
//! image subtype, so supporting another format means adding a variant and a
//! table entry.

use image::codecs::gif::{GifDecoder, GifEncoder};
use image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use image::codecs::png::{PngDecoder, PngEncoder};
use image::{
    ColorType, DynamicImage, Frame, ImageDecoder, ImageEncoder, ImageResult, RgbaImage,
};
use std::io::{Read, Write};

use super::TransformError;

/// Supported raster formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageCodec {
    Jpeg,
    Png,
    Gif,
}

/// Subtype → codec registrations (keys are lowercase)
const CODEC_TABLE: &[(&str, ImageCodec)] = &[
    ("jpeg", ImageCodec::Jpeg),
    ("jpg", ImageCodec::Jpeg),
    ("png", ImageCodec::Png),
    ("gif", ImageCodec::Gif),
];

impl ImageCodec {
    /// Look up the codec for an image subtype (case-insensitive)
    pub fn from_subtype(subtype: &str) -> Option<Self> {
        let key = subtype.trim().to_ascii_lowercase();
        CODEC_TABLE
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, codec)| *codec)
    }

    /// Canonical short name
    pub fn name(&self) -> &'static str {
        match self {
            ImageCodec::Jpeg => "jpeg",
            ImageCodec::Png => "png",
            ImageCodec::Gif => "gif",
        }
    }

    /// Content-Type header value for encoded output
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageCodec::Jpeg => "image/jpeg",
            ImageCodec::Png => "image/png",
            ImageCodec::Gif => "image/gif",
        }
    }

    /// Decode a complete image from `reader`
    ///
    /// Only the header is read before the declared dimensions are checked
    /// against `max_pixels`; oversized images are rejected without allocating
    /// a pixel buffer. GIF input yields its first frame.
    pub fn decode<R: Read>(&self, reader: R, max_pixels: u64) -> Result<DynamicImage, TransformError> {
        match self {
            ImageCodec::Jpeg => {
                let decoder = JpegDecoder::new(reader).map_err(|e| self.decode_error(e))?;
                self.decode_within(decoder, max_pixels)
            }
            ImageCodec::Png => {
                let decoder = PngDecoder::new(reader).map_err(|e| self.decode_error(e))?;
                self.decode_within(decoder, max_pixels)
            }
            ImageCodec::Gif => {
                let decoder = GifDecoder::new(reader).map_err(|e| self.decode_error(e))?;
                self.decode_within(decoder, max_pixels)
            }
        }
    }

    fn decode_within<'a, D: ImageDecoder<'a>>(
        &self,
        decoder: D,
        max_pixels: u64,
    ) -> Result<DynamicImage, TransformError> {
        let (width, height) = decoder.dimensions();
        if u64::from(width) * u64::from(height) > max_pixels {
            return Err(TransformError::ImageTooLarge {
                format: self.name(),
                width,
                height,
                max_pixels,
            });
        }
        DynamicImage::from_decoder(decoder).map_err(|e| self.decode_error(e))
    }

    fn decode_error(&self, source: image::ImageError) -> TransformError {
        TransformError::Decode {
            format: self.name(),
            source,
        }
    }

    /// Encode `canvas` to `writer` with the format's default settings
    ///
    /// JPEG has no alpha channel, so the canvas is flattened to RGB first.
    pub fn encode<W: Write>(&self, writer: W, canvas: &RgbaImage) -> ImageResult<()> {
        let (width, height) = canvas.dimensions();
        match self {
            ImageCodec::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
                let mut encoder = JpegEncoder::new(writer);
                encoder.encode(rgb.as_raw(), width, height, ColorType::Rgb8)
            }
            ImageCodec::Png => {
                PngEncoder::new(writer).write_image(canvas.as_raw(), width, height, ColorType::Rgba8)
            }
            ImageCodec::Gif => {
                let mut encoder = GifEncoder::new(writer);
                encoder.encode_frame(Frame::new(canvas.clone()))
            }
        }
    }
}

impl std::fmt::Display for ImageCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
