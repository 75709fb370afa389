// Proxy module - upstream fetch and watermark pipeline
// Fetches an image from the configured origin and returns it watermarked

pub mod response_handler;
pub mod special_endpoints;
pub mod upstream;

pub use response_handler::ProxyResponse;
pub use special_endpoints::EndpointResponse;

use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{LimitsConfig, UpstreamConfig};
use crate::error::ProxyError;
use crate::metrics::Metrics;
use crate::transform::{ImageCodec, TransformEngine, TransformError};
use crate::watermark::Watermark;

/// WatermarkProxy serves `/watermark/<path>` requests
/// Holds only shared, read-only state so one instance serves every connection
#[derive(Clone)]
pub struct WatermarkProxy {
    client: reqwest::Client,
    base_url: Arc<str>,
    max_body_bytes: u64,
    engine: TransformEngine,
    metrics: Arc<Metrics>,
    /// Proxy start time (for uptime calculation in /health endpoint)
    start_time: Instant,
}

impl WatermarkProxy {
    /// Create a proxy for the given upstream, sharing the startup-built watermark
    pub fn new(
        upstream: &UpstreamConfig,
        limits: &LimitsConfig,
        watermark: Arc<Watermark>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(upstream.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: Arc::from(upstream.base_url.as_str()),
            max_body_bytes: limits.max_body_bytes,
            engine: TransformEngine::new(watermark).with_max_source_pixels(limits.max_source_pixels),
            metrics: Arc::new(Metrics::new()),
            start_time: Instant::now(),
        })
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Handle one watermark request; `suffix` is everything after `/watermark/`
    ///
    /// Never fails: every error becomes a 400/500 diagnostic response.
    pub async fn handle(&self, suffix: &str) -> ProxyResponse {
        self.metrics.increment_request_count();
        let url = upstream::resolve_upstream_url(&self.base_url, suffix);

        let response = match self.watermark_from(&url).await {
            Ok((codec, body)) => {
                self.metrics.increment_format(codec.name());
                self.metrics.add_bytes_sent(body.len() as u64);
                tracing::info!(url = %url, format = codec.name(), bytes = body.len(), "Watermarked image served");
                ProxyResponse::image(codec.content_type(), body)
            }
            Err(err) => {
                let status = err.to_http_status();
                if status >= 500 {
                    tracing::error!(url = %url, status = status, error = %err, "Watermark request failed");
                } else {
                    tracing::warn!(url = %url, status = status, error = %err, "Watermark request rejected");
                }
                self.metrics.increment_error(err.kind());
                ProxyResponse::from_error(&err)
            }
        };

        self.metrics.increment_status_count(response.status);
        response
    }

    /// /health response
    pub fn health(&self) -> EndpointResponse {
        special_endpoints::handle_health(self.start_time, self.engine.watermark().size())
    }

    /// /metrics response
    pub fn metrics_response(&self) -> EndpointResponse {
        special_endpoints::handle_metrics(&self.metrics)
    }

    async fn watermark_from(&self, url: &str) -> Result<(ImageCodec, Vec<u8>), ProxyError> {
        let (codec, body) = self.fetch(url).await?;

        let engine = self.engine.clone();
        let started = Instant::now();
        let result = tokio::task::spawn_blocking(move || {
            let mut output = Vec::new();
            engine
                .transform_with(codec, body.as_ref(), &mut output)
                .map(|()| output)
        })
        .await
        .map_err(|e| ProxyError::Internal(e.to_string()))?;
        self.metrics.record_transform_duration(started.elapsed());

        Ok((codec, result?))
    }

    /// GET the upstream image and validate status and content type
    ///
    /// The format is resolved before the body is read, so unsupported images
    /// are rejected without downloading them. The body is read chunk by chunk
    /// and abandoned as soon as it passes `max_body_bytes`.
    async fn fetch(&self, url: &str) -> Result<(ImageCodec, Bytes), ProxyError> {
        let started = Instant::now();

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProxyError::UpstreamUnreachable(e.to_string()))?;

        upstream::check_upstream_status(response.status().as_u16())?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .map(|value| {
                value
                    .to_str()
                    .map_err(|_| ProxyError::InvalidContentType(format!("{:?}", value)))
            })
            .transpose()?;
        let subtype = response_handler::image_subtype(content_type)?;
        let codec = ImageCodec::from_subtype(&subtype)
            .ok_or(TransformError::UnsupportedFormat(subtype))?;

        let declared = response.content_length();
        if let Some(length) = declared {
            upstream::check_body_size(length, self.max_body_bytes)?;
        }

        let mut body = BytesMut::with_capacity(declared.unwrap_or(0) as usize);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ProxyError::UpstreamUnreachable(e.to_string()))?
        {
            upstream::check_body_size((body.len() + chunk.len()) as u64, self.max_body_bytes)?;
            body.extend_from_slice(&chunk);
        }
        let body = body.freeze();
        self.metrics.record_upstream_duration(started.elapsed());

        tracing::debug!(url = %url, format = codec.name(), bytes = body.len(), "Fetched upstream image");
        Ok((codec, body))
    }
}

impl std::fmt::Debug for WatermarkProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkProxy")
            .field("base_url", &self.base_url)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("max_source_pixels", &self.engine.max_source_pixels())
            .field("watermark", self.engine.watermark())
            .finish()
    }
}
