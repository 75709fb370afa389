// Error handling integration tests
//
// Every upstream or transform failure must become a 400/500 with a fixed
// plain-text body:
// - upstream 4xx / 5xx / unreachable / timeout
// - missing or non-image Content-Type
// - unsupported, undecodable or oversized images
// - unknown routes and methods

use image::ImageFormat;
use std::time::Duration;

use imgwater::config::LimitsConfig;

use super::test_harness::{
    oversized_png, sample_image, solid_watermark, FakeUpstream, ProxyTestHarness, UpstreamReply,
};

async fn assert_error(response: reqwest::Response, status: u16, message: &str) {
    assert_eq!(response.status(), status);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(response.text().await.unwrap(), message);
}

#[tokio::test]
async fn test_upstream_404_is_400() {
    let upstream = FakeUpstream::start(vec![]).await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 16).await;

    let response = harness.get("/watermark/missing.png").await;

    assert_error(response, 400, "error requesting resource").await;
}

#[tokio::test]
async fn test_upstream_403_is_400() {
    let upstream = FakeUpstream::start(vec![("/secret.png", UpstreamReply::status(403))]).await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 16).await;

    let response = harness.get("/watermark/secret.png").await;

    assert_error(response, 400, "error requesting resource").await;
}

#[tokio::test]
async fn test_upstream_5xx_is_500() {
    let upstream = FakeUpstream::start(vec![("/broken.png", UpstreamReply::status(503))]).await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 16).await;

    let response = harness.get("/watermark/broken.png").await;

    assert_error(response, 500, "internal error").await;
}

#[tokio::test]
async fn test_html_content_type_is_400() {
    let upstream = FakeUpstream::start(vec![(
        "/page",
        UpstreamReply::ok("text/html", b"<html></html>".to_vec()),
    )])
    .await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 16).await;

    let response = harness.get("/watermark/page").await;

    assert_error(response, 400, "invalid content type").await;
}

#[tokio::test]
async fn test_missing_content_type_is_400() {
    let upstream = FakeUpstream::start(vec![(
        "/raw",
        UpstreamReply::without_content_type(sample_image(10, 10, ImageFormat::Png)),
    )])
    .await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 16).await;

    let response = harness.get("/watermark/raw").await;

    assert_error(response, 400, "requested resource is not a media file").await;
}

#[tokio::test]
async fn test_unsupported_image_subtype_is_500() {
    let upstream = FakeUpstream::start(vec![(
        "/a.bmp",
        UpstreamReply::ok("image/bmp", vec![0x42, 0x4d, 0, 0]),
    )])
    .await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 16).await;

    let response = harness.get("/watermark/a.bmp").await;

    assert_error(response, 500, "error applying watermark").await;
}

#[tokio::test]
async fn test_jpeg_declared_as_png_is_500() {
    let upstream = FakeUpstream::start(vec![(
        "/liar.png",
        UpstreamReply::ok("image/png", sample_image(30, 30, ImageFormat::Jpeg)),
    )])
    .await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 16).await;

    let response = harness.get("/watermark/liar.png").await;

    assert_error(response, 500, "error applying watermark").await;
}

#[tokio::test]
async fn test_truncated_image_is_500() {
    let mut body = sample_image(30, 30, ImageFormat::Png);
    body.truncate(body.len() / 2);
    let upstream = FakeUpstream::start(vec![("/half.png", UpstreamReply::ok("image/png", body))]).await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 16).await;

    let response = harness.get("/watermark/half.png").await;

    assert_error(response, 500, "error applying watermark").await;
}

// The header alone claims 2.5 gigapixels; the proxy must answer instead of
// trying to allocate the canvas
#[tokio::test]
async fn test_image_bomb_header_is_500() {
    let upstream = FakeUpstream::start(vec![(
        "/bomb.png",
        UpstreamReply::ok("image/png", oversized_png(50_000, 50_000)),
    )])
    .await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 16).await;

    let response = harness.get("/watermark/bomb.png").await;
    assert_error(response, 500, "error applying watermark").await;

    let metrics = harness.get("/metrics").await.text().await.unwrap();
    assert!(metrics.contains("watermark_errors_total{kind=\"image_too_large\"} 1"));
}

#[tokio::test]
async fn test_source_over_pixel_limit_is_500() {
    let upstream = FakeUpstream::start(vec![(
        "/big.jpg",
        UpstreamReply::ok("image/jpeg", sample_image(40, 40, ImageFormat::Jpeg)),
    )])
    .await;
    let limits = LimitsConfig {
        max_source_pixels: 40 * 40 - 1,
        ..LimitsConfig::default()
    };
    let harness = ProxyTestHarness::start_with_limits(&upstream.base_url(), limits).await;

    let response = harness.get("/watermark/big.jpg").await;

    assert_error(response, 500, "error applying watermark").await;
}

#[tokio::test]
async fn test_body_over_size_limit_is_500() {
    let body = sample_image(64, 64, ImageFormat::Png);
    let limit = body.len() as u64 - 1;
    let upstream = FakeUpstream::start(vec![("/heavy.png", UpstreamReply::ok("image/png", body))]).await;
    let limits = LimitsConfig {
        max_body_bytes: limit,
        ..LimitsConfig::default()
    };
    let harness = ProxyTestHarness::start_with_limits(&upstream.base_url(), limits).await;

    let response = harness.get("/watermark/heavy.png").await;
    assert_error(response, 500, "error applying watermark").await;

    let metrics = harness.get("/metrics").await.text().await.unwrap();
    assert!(metrics.contains("watermark_errors_total{kind=\"body_too_large\"} 1"));
}

#[tokio::test]
async fn test_body_at_size_limit_is_served() {
    let body = sample_image(64, 64, ImageFormat::Png);
    let limit = body.len() as u64;
    let upstream = FakeUpstream::start(vec![("/exact.png", UpstreamReply::ok("image/png", body))]).await;
    let limits = LimitsConfig {
        max_body_bytes: limit,
        ..LimitsConfig::default()
    };
    let harness = ProxyTestHarness::start_with_limits(&upstream.base_url(), limits).await;

    assert_eq!(harness.get("/watermark/exact.png").await.status(), 200);
}

#[tokio::test]
async fn test_unreachable_upstream_is_500() {
    // Port from a listener that has already been closed
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let harness = ProxyTestHarness::start(&format!("http://127.0.0.1:{}", port), 16).await;

    let response = harness.get("/watermark/a.png").await;

    assert_error(response, 500, "internal error").await;
}

#[tokio::test]
async fn test_upstream_timeout_is_500() {
    let upstream = FakeUpstream::start(vec![(
        "/slow.png",
        UpstreamReply::ok("image/png", sample_image(10, 10, ImageFormat::Png))
            .delayed(Duration::from_secs(3)),
    )])
    .await;
    let harness =
        ProxyTestHarness::start_with(&upstream.base_url(), solid_watermark(4, image::Rgba([0, 0, 0, 255])), 1)
            .await;

    let response = harness.get("/watermark/slow.png").await;

    assert_error(response, 500, "internal error").await;
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let upstream = FakeUpstream::start(vec![]).await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 16).await;

    let response = harness.get("/images/a.png").await;

    assert_error(response, 404, "not found").await;
}

#[tokio::test]
async fn test_post_to_watermark_route_is_405() {
    let upstream = FakeUpstream::start(vec![]).await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 16).await;

    let response = harness
        .client
        .post(harness.url("/watermark/a.png"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["allow"], "GET");
    assert_error(response, 405, "method not allowed").await;
}

#[tokio::test]
async fn test_failures_do_not_affect_next_request() {
    let upstream = FakeUpstream::start(vec![
        ("/bad.png", UpstreamReply::ok("image/png", b"not an image".to_vec())),
        ("/good.png", UpstreamReply::ok("image/png", sample_image(16, 16, ImageFormat::Png))),
    ])
    .await;
    let harness = ProxyTestHarness::start(&upstream.base_url(), 4).await;

    assert_eq!(harness.get("/watermark/bad.png").await.status(), 500);
    assert_eq!(harness.get("/watermark/good.png").await.status(), 200);
}
