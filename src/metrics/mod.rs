// Metrics module - Prometheus-compatible metrics tracking
// Counters and duration sums exported in the text exposition format

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Metrics struct tracks request counters and stage timings
/// Thread-safe via atomic operations and mutexes
#[derive(Debug, Default)]
pub struct Metrics {
    // Watermark requests received
    request_count: AtomicU64,

    // Final status code counters (200, 400, 500, ...)
    status_counts: Mutex<HashMap<u16, u64>>,

    // Failures by kind (upstream_unreachable, decode_error, ...)
    error_counts: Mutex<HashMap<&'static str, u64>>,

    // Successful transforms by output format
    format_counts: Mutex<HashMap<&'static str, u64>>,

    // Stage timings (stored in microseconds as u64)
    upstream_duration_us: AtomicU64,
    upstream_fetches: AtomicU64,
    transform_duration_us: AtomicU64,
    transforms: AtomicU64,

    // Response body bytes sent for watermarked images
    bytes_sent: AtomicU64,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment total watermark request counter
    pub fn increment_request_count(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment counter for a specific response status code
    pub fn increment_status_count(&self, status_code: u16) {
        if let Ok(mut counts) = self.status_counts.lock() {
            *counts.entry(status_code).or_insert(0) += 1;
        }
    }

    /// Increment counter for a failure kind
    pub fn increment_error(&self, kind: &'static str) {
        if let Ok(mut counts) = self.error_counts.lock() {
            *counts.entry(kind).or_insert(0) += 1;
        }
    }

    /// Increment counter for a successfully produced format
    pub fn increment_format(&self, format: &'static str) {
        if let Ok(mut counts) = self.format_counts.lock() {
            *counts.entry(format).or_insert(0) += 1;
        }
    }

    /// Record how long the upstream fetch (headers and body) took
    pub fn record_upstream_duration(&self, duration: Duration) {
        self.upstream_duration_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.upstream_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how long decode + composite + encode took
    pub fn record_transform_duration(&self, duration: Duration) {
        self.transform_duration_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.transforms.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes_sent(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn get_status_count(&self, status_code: u16) -> u64 {
        self.status_counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(&status_code).copied())
            .unwrap_or(0)
    }

    pub fn get_error_count(&self, kind: &str) -> u64 {
        self.error_counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(kind).copied())
            .unwrap_or(0)
    }

    pub fn get_format_count(&self, format: &str) -> u64 {
        self.format_counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(format).copied())
            .unwrap_or(0)
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP watermark_requests_total Total number of watermark requests received\n");
        output.push_str("# TYPE watermark_requests_total counter\n");
        output.push_str(&format!(
            "watermark_requests_total {}\n",
            self.request_count.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP watermark_responses_by_status_total Watermark responses by status code\n");
        output.push_str("# TYPE watermark_responses_by_status_total counter\n");
        if let Ok(counts) = self.status_counts.lock() {
            let mut sorted: Vec<_> = counts.iter().collect();
            sorted.sort();
            for (status, count) in sorted {
                output.push_str(&format!(
                    "watermark_responses_by_status_total{{status=\"{}\"}} {}\n",
                    status, count
                ));
            }
        }

        output.push_str("\n# HELP watermark_errors_total Failed watermark requests by error kind\n");
        output.push_str("# TYPE watermark_errors_total counter\n");
        if let Ok(counts) = self.error_counts.lock() {
            let mut sorted: Vec<_> = counts.iter().collect();
            sorted.sort();
            for (kind, count) in sorted {
                output.push_str(&format!(
                    "watermark_errors_total{{kind=\"{}\"}} {}\n",
                    kind, count
                ));
            }
        }

        output.push_str("\n# HELP watermark_images_total Watermarked images by format\n");
        output.push_str("# TYPE watermark_images_total counter\n");
        if let Ok(counts) = self.format_counts.lock() {
            let mut sorted: Vec<_> = counts.iter().collect();
            sorted.sort();
            for (format, count) in sorted {
                output.push_str(&format!(
                    "watermark_images_total{{format=\"{}\"}} {}\n",
                    format, count
                ));
            }
        }

        push_summary(
            &mut output,
            "watermark_upstream_duration_seconds",
            "Time spent fetching images from the upstream",
            &self.upstream_duration_us,
            &self.upstream_fetches,
        );
        push_summary(
            &mut output,
            "watermark_transform_duration_seconds",
            "Time spent decoding, compositing and encoding",
            &self.transform_duration_us,
            &self.transforms,
        );

        output.push_str("\n# HELP watermark_bytes_sent_total Bytes of watermarked image data sent\n");
        output.push_str("# TYPE watermark_bytes_sent_total counter\n");
        output.push_str(&format!(
            "watermark_bytes_sent_total {}\n",
            self.bytes_sent.load(Ordering::Relaxed)
        ));

        output
    }
}

fn push_summary(output: &mut String, name: &str, help: &str, sum_us: &AtomicU64, count: &AtomicU64) {
    let seconds = sum_us.load(Ordering::Relaxed) as f64 / 1_000_000.0;
    output.push_str(&format!("\n# HELP {} {}\n", name, help));
    output.push_str(&format!("# TYPE {} summary\n", name));
    output.push_str(&format!("{}_sum {:.6}\n", name, seconds));
    output.push_str(&format!("{}_count {}\n", name, count.load(Ordering::Relaxed)));
}
