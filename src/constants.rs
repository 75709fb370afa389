// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Using constants instead of magic numbers improves maintainability
// and makes it easier to understand and modify defaults.

// =============================================================================
// Server defaults
// =============================================================================

/// Default bind address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Route prefix for watermark requests; everything after it is the upstream path
pub const WATERMARK_ROUTE_PREFIX: &str = "/watermark/";

/// Built-in health check endpoint
pub const HEALTH_PATH: &str = "/health";

/// Built-in Prometheus metrics endpoint
pub const METRICS_PATH: &str = "/metrics";

/// Seconds to wait for open connections to finish after a shutdown signal
pub const SHUTDOWN_GRACE_SECS: u64 = 10;

// =============================================================================
// Upstream defaults
// =============================================================================

/// Default upstream fetch timeout in seconds
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default watermark side length in pixels (zero disables the overlay)
pub const DEFAULT_WATERMARK_SIZE: u32 = 0;

// =============================================================================
// Source limits
// =============================================================================

/// Largest source image accepted, as width * height (100 megapixels)
pub const DEFAULT_MAX_SOURCE_PIXELS: u64 = 100_000_000;

/// Largest upstream body read into memory (50MB)
pub const DEFAULT_MAX_BODY_BYTES: u64 = 50 * 1024 * 1024;

// =============================================================================
// Response bodies
// =============================================================================

/// Body for transport failures and upstream 5xx
pub const MSG_INTERNAL_ERROR: &str = "internal error";

/// Body for upstream 4xx
pub const MSG_ERROR_REQUESTING_RESOURCE: &str = "error requesting resource";

/// Body when the upstream sent no Content-Type
pub const MSG_NOT_A_MEDIA_FILE: &str = "requested resource is not a media file";

/// Body when the upstream Content-Type is not an image type
pub const MSG_INVALID_CONTENT_TYPE: &str = "invalid content type";

/// Body for transform failures (unsupported format, decode, encode)
pub const MSG_ERROR_APPLYING_WATERMARK: &str = "error applying watermark";

/// Body for unknown paths
pub const MSG_NOT_FOUND: &str = "not found";

/// Body for non-GET requests on the watermark route
pub const MSG_METHOD_NOT_ALLOWED: &str = "method not allowed";
