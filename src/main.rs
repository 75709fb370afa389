use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use imgwater::config::{Config, ConfigOverrides};
use imgwater::logging::LogFormat;
use imgwater::proxy::WatermarkProxy;

/// imgwater - HTTP proxy that stamps a watermark onto upstream images
#[derive(Parser, Debug)]
#[command(name = "imgwater")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to an optional YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL for image files
    #[arg(long, env = "IMAGE_URL")]
    image_url: Option<String>,

    /// Watermark side length in pixels
    #[arg(long, env = "WATERMARK_SIZE")]
    watermark_size: Option<u32>,

    /// Replacement watermark image (PNG, JPEG or GIF)
    #[arg(long, env = "WATERMARK_PATH")]
    watermark_path: Option<PathBuf>,

    /// Address to bind to
    #[arg(long)]
    address: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Upstream fetch timeout in seconds
    #[arg(long)]
    upstream_timeout: Option<u64>,

    /// Log format: json or pretty
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            image_url: self.image_url.clone(),
            watermark_size: self.watermark_size,
            watermark_path: self.watermark_path.clone(),
            address: self.address.clone(),
            port: self.port,
            upstream_timeout_secs: self.upstream_timeout,
            log_format: self.log_format,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_overrides(args.overrides());

    imgwater::logging::init_subscriber(config.logging.format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    config.validate().context("Invalid configuration")?;

    tracing::info!(
        config_file = ?args.config,
        image_url = %config.upstream.base_url,
        upstream_timeout_secs = config.upstream.timeout_secs,
        watermark_size = config.watermark.size,
        watermark_path = ?config.watermark.path,
        max_source_pixels = config.limits.max_source_pixels,
        max_body_bytes = config.limits.max_body_bytes,
        address = %config.server.address,
        port = config.server.port,
        log_format = ?config.logging.format,
        "Configuration loaded successfully"
    );

    let watermark = Arc::new(config.watermark.build().context("Failed to load watermark")?);
    if watermark.is_empty() {
        tracing::warn!("Watermark size is 0, images will be served without a visible watermark");
    }

    if args.test {
        tracing::info!("Configuration test successful");
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;

    runtime.block_on(async move {
        let proxy = WatermarkProxy::new(&config.upstream, &config.limits, watermark)
            .context("Failed to build upstream HTTP client")?;

        let listen_addr = config.server.listen_addr();
        let listener = TcpListener::bind(&listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", listen_addr))?;

        tracing::info!(address = %listen_addr, "Starting imgwater");

        imgwater::server::serve(listener, proxy, shutdown_signal())
            .await
            .context("Server error")
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
