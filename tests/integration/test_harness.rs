// Test harness for integration tests
// Runs a fake upstream origin and the watermark proxy in-process on ephemeral ports

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::TokioIo;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::convert::Infallible;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use imgwater::config::{LimitsConfig, UpstreamConfig};
use imgwater::proxy::WatermarkProxy;
use imgwater::watermark::Watermark;

/// Canned upstream reply
#[derive(Clone, Debug)]
pub struct UpstreamReply {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Bytes,
    pub delay: Option<Duration>,
}

impl UpstreamReply {
    pub fn ok(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type),
            body: Bytes::from(body),
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: Some("text/plain"),
            body: Bytes::from_static(b"upstream says no"),
            delay: None,
        }
    }

    pub fn without_content_type(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: None,
            body: Bytes::from(body),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Fake origin serving canned replies by path (query string included); 404 otherwise
pub struct FakeUpstream {
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl FakeUpstream {
    pub async fn start(routes: Vec<(&str, UpstreamReply)>) -> Self {
        let routes: Arc<HashMap<String, UpstreamReply>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, reply)| (path.to_string(), reply))
                .collect(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let routes = Arc::clone(&routes);
                tokio::spawn(async move {
                    let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                        let routes = Arc::clone(&routes);
                        async move {
                            let key = req
                                .uri()
                                .path_and_query()
                                .map(|pq| pq.as_str().to_string())
                                .unwrap_or_default();
                            let reply = routes
                                .get(&key)
                                .cloned()
                                .unwrap_or_else(|| UpstreamReply::status(404));
                            if let Some(delay) = reply.delay {
                                tokio::time::sleep(delay).await;
                            }
                            let mut response = Response::new(Full::new(reply.body));
                            *response.status_mut() = StatusCode::from_u16(reply.status).unwrap();
                            if let Some(ct) = reply.content_type {
                                response
                                    .headers_mut()
                                    .insert(CONTENT_TYPE, HeaderValue::from_static(ct));
                            }
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { addr, task }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Watermark proxy running in-process
pub struct ProxyTestHarness {
    pub base_url: String,
    pub client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl ProxyTestHarness {
    /// Start a proxy in front of `upstream_base` using the embedded watermark
    pub async fn start(upstream_base: &str, watermark_size: u32) -> Self {
        let watermark = Watermark::embedded(watermark_size).unwrap();
        Self::start_with(upstream_base, watermark, 5).await
    }

    pub async fn start_with(upstream_base: &str, watermark: Watermark, timeout_secs: u64) -> Self {
        Self::start_configured(upstream_base, watermark, timeout_secs, LimitsConfig::default()).await
    }

    /// Start a proxy with a 4px embedded watermark and the given source limits
    pub async fn start_with_limits(upstream_base: &str, limits: LimitsConfig) -> Self {
        let watermark = Watermark::embedded(4).unwrap();
        Self::start_configured(upstream_base, watermark, 5, limits).await
    }

    async fn start_configured(
        upstream_base: &str,
        watermark: Watermark,
        timeout_secs: u64,
        limits: LimitsConfig,
    ) -> Self {
        let upstream = UpstreamConfig {
            base_url: upstream_base.to_string(),
            timeout_secs,
        };
        let proxy = WatermarkProxy::new(&upstream, &limits, Arc::new(watermark)).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let task = tokio::spawn(imgwater::server::serve(listener, proxy, async {
            let _ = rx.await;
        }));

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// Stop accepting connections and wait for the server to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.unwrap().unwrap();
        }
    }
}

impl Drop for ProxyTestHarness {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Opaque gradient image encoded with `format`
pub fn sample_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 90, 255])
    });
    let dynamic = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8())
    } else {
        DynamicImage::ImageRgba8(img)
    };
    let mut buffer = Cursor::new(Vec::new());
    dynamic.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

/// Square watermark of a single colour, built at its final size
pub fn solid_watermark(size: u32, color: Rgba<u8>) -> Watermark {
    let mut buffer = Cursor::new(Vec::new());
    RgbaImage::from_pixel(size, size, color)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    Watermark::from_asset(&buffer.into_inner(), size).unwrap()
}

// CRC-32 (IEEE) as used by PNG chunk trailers
fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for byte in bytes {
        crc ^= u32::from(*byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}

fn png_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    let start = out.len();
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let crc = crc32(&out[start..]);
    out.extend_from_slice(&crc.to_be_bytes());
}

/// Tiny PNG whose header claims `width` x `height` RGBA pixels
pub fn oversized_png(width: u32, height: u32) -> Vec<u8> {
    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);
    png_chunk(&mut out, b"IHDR", &ihdr);
    png_chunk(&mut out, b"IDAT", &[0x78, 0x9C, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01]);
    png_chunk(&mut out, b"IEND", &[]);
    out
}
