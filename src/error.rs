// Error types module

use std::fmt;

use crate::constants::{
    MSG_ERROR_APPLYING_WATERMARK, MSG_ERROR_REQUESTING_RESOURCE, MSG_INTERNAL_ERROR,
    MSG_INVALID_CONTENT_TYPE, MSG_NOT_A_MEDIA_FILE,
};
use crate::transform::TransformError;

/// Request-scoped proxy failures
///
/// Every variant is recovered at the request boundary and turned into a
/// status code plus a fixed diagnostic body. The detail carried by a variant
/// goes to the log only; callers never see it.
#[derive(Debug)]
pub enum ProxyError {
    /// Network/transport failure talking to the upstream (includes timeouts)
    UpstreamUnreachable(String),

    /// Upstream answered with a 4xx status
    UpstreamClientError { status: u16 },

    /// Upstream answered with a 5xx status
    UpstreamServerError { status: u16 },

    /// Upstream response had no Content-Type header
    MissingContentType,

    /// Content-Type was unparsable or not an `image/*` type
    InvalidContentType(String),

    /// Upstream body is larger than the configured limit
    BodyTooLarge { size: u64, max_size: u64 },

    /// Decode/composite/encode failed, or the image subtype is unsupported
    Transform(TransformError),

    /// The blocking transform task did not complete
    Internal(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::UpstreamUnreachable(msg) => write!(f, "Upstream unreachable: {}", msg),
            ProxyError::UpstreamClientError { status } => {
                write!(f, "Upstream returned client error status {}", status)
            }
            ProxyError::UpstreamServerError { status } => {
                write!(f, "Upstream returned server error status {}", status)
            }
            ProxyError::MissingContentType => write!(f, "Upstream response has no content type"),
            ProxyError::InvalidContentType(ct) => write!(f, "Invalid content type: {}", ct),
            ProxyError::BodyTooLarge { size, max_size } => write!(
                f,
                "Upstream body of at least {} bytes exceeds the {} byte limit",
                size, max_size
            ),
            ProxyError::Transform(err) => write!(f, "Transform failed: {}", err),
            ProxyError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Transform(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransformError> for ProxyError {
    fn from(err: TransformError) -> Self {
        ProxyError::Transform(err)
    }
}

impl ProxyError {
    /// Maps proxy errors to HTTP status codes
    ///
    /// - UpstreamClientError, MissingContentType, InvalidContentType → 400
    /// - UpstreamUnreachable, UpstreamServerError, BodyTooLarge, any transform
    ///   failure (unsupported format included), Internal → 500
    pub fn to_http_status(&self) -> u16 {
        match self {
            ProxyError::UpstreamClientError { .. }
            | ProxyError::MissingContentType
            | ProxyError::InvalidContentType(_) => 400,
            ProxyError::UpstreamUnreachable(_)
            | ProxyError::UpstreamServerError { .. }
            | ProxyError::BodyTooLarge { .. }
            | ProxyError::Internal(_) => 500,
            ProxyError::Transform(err) => err.to_http_status(),
        }
    }

    /// Body sent to the caller
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::UpstreamUnreachable(_)
            | ProxyError::UpstreamServerError { .. }
            | ProxyError::Internal(_) => MSG_INTERNAL_ERROR,
            ProxyError::UpstreamClientError { .. } => MSG_ERROR_REQUESTING_RESOURCE,
            ProxyError::MissingContentType => MSG_NOT_A_MEDIA_FILE,
            ProxyError::InvalidContentType(_) => MSG_INVALID_CONTENT_TYPE,
            ProxyError::BodyTooLarge { .. } | ProxyError::Transform(_) => {
                MSG_ERROR_APPLYING_WATERMARK
            }
        }
    }

    /// Short stable label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::UpstreamUnreachable(_) => "upstream_unreachable",
            ProxyError::UpstreamClientError { .. } => "upstream_client_error",
            ProxyError::UpstreamServerError { .. } => "upstream_server_error",
            ProxyError::MissingContentType => "missing_content_type",
            ProxyError::InvalidContentType(_) => "invalid_content_type",
            ProxyError::Transform(TransformError::UnsupportedFormat(_)) => "unsupported_format",
            ProxyError::BodyTooLarge { .. } => "body_too_large",
            ProxyError::Transform(TransformError::Decode { .. }) => "decode_error",
            ProxyError::Transform(TransformError::ImageTooLarge { .. }) => "image_too_large",
            ProxyError::Transform(TransformError::Encode { .. }) => "encode_error",
            ProxyError::Internal(_) => "internal",
        }
    }
}
