//! Response handler module for the proxy.
//!
//! Validates the upstream Content-Type and builds the outbound responses.

use bytes::Bytes;

use crate::error::ProxyError;

/// Outbound response produced by the proxy, independent of the HTTP stack.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Bytes,
}

impl ProxyResponse {
    /// 200 with the encoded image.
    pub fn image(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type,
            body: Bytes::from(body),
        }
    }

    /// Plain-text diagnostic for a failed request.
    pub fn from_error(err: &ProxyError) -> Self {
        Self::text(err.to_http_status(), err.public_message())
    }

    pub fn text(status: u16, message: &'static str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: Bytes::from_static(message.as_bytes()),
        }
    }
}

/// Extract the image subtype from an upstream Content-Type header.
///
/// `None` means the header was absent. Parameters after `;` are ignored and
/// the subtype is lowercased, so `Image/PNG; q=1` yields `png`. Whether the
/// subtype is a supported format is decided later by the transform engine.
pub fn image_subtype(content_type: Option<&str>) -> Result<String, ProxyError> {
    let raw = match content_type {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Err(ProxyError::MissingContentType),
    };

    let essence = raw.split_once(';').map_or(raw, |(mime, _)| mime).trim();
    let (kind, subtype) = essence
        .split_once('/')
        .ok_or_else(|| ProxyError::InvalidContentType(raw.to_string()))?;

    if !kind.eq_ignore_ascii_case("image") || !is_token(subtype) {
        return Err(ProxyError::InvalidContentType(raw.to_string()));
    }

    Ok(subtype.to_ascii_lowercase())
}

// RFC 7230 token characters
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}
