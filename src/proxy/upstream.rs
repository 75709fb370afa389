//! Upstream request handling for the proxy.
//!
//! URL resolution against the configured base, classification of the
//! upstream status code and the body size guard. The fetch itself lives in [`super::WatermarkProxy`].

use crate::error::ProxyError;

/// Join the configured base URL and the request path suffix.
///
/// Exactly one `/` separates the two when the base lacks a trailing one. The
/// suffix is otherwise appended verbatim, query string included.
///
/// ```
/// use imgwater::proxy::upstream::resolve_upstream_url;
///
/// assert_eq!(
///     resolve_upstream_url("https://img.example.com", "cats/a.png"),
///     "https://img.example.com/cats/a.png"
/// );
/// ```
pub fn resolve_upstream_url(base_url: &str, suffix: &str) -> String {
    if base_url.ends_with('/') {
        format!("{}{}", base_url, suffix)
    } else {
        format!("{}/{}", base_url, suffix)
    }
}

/// Turn an upstream status code into an error when it is not usable.
///
/// 4xx and 5xx fail; every other status passes through.
pub fn check_upstream_status(status: u16) -> Result<(), ProxyError> {
    match status {
        400..=499 => Err(ProxyError::UpstreamClientError { status }),
        500.. => Err(ProxyError::UpstreamServerError { status }),
        _ => Ok(()),
    }
}

/// Fail once `size` bytes of upstream body exceed `max_size`.
pub fn check_body_size(size: u64, max_size: u64) -> Result<(), ProxyError> {
    if size > max_size {
        return Err(ProxyError::BodyTooLarge { size, max_size });
    }
    Ok(())
}
