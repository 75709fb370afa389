//! Transform error types

/// Errors produced by the decode → composite → encode pipeline
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The declared format has no registered codec
    #[error("unsupported image format {0}")]
    UnsupportedFormat(String),

    /// The input stream is not a valid image of the declared format
    #[error("failed to decode {format} image: {source}")]
    Decode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    /// The image header declares more pixels than the configured limit
    #[error("{format} image is {width}x{height}, over the {max_pixels} pixel limit")]
    ImageTooLarge {
        format: &'static str,
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    /// The composited canvas could not be encoded
    #[error("failed to encode {format} image: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
}

impl TransformError {
    /// Maps transform errors to HTTP status codes
    ///
    /// All transform failures are 500, including an image subtype with no codec
    pub fn to_http_status(&self) -> u16 {
        match self {
            TransformError::UnsupportedFormat(_)
            | TransformError::Decode { .. }
            | TransformError::ImageTooLarge { .. }
            | TransformError::Encode { .. } => 500,
        }
    }
}
