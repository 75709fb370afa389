// imgwater - watermarking image proxy library

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod proxy;
pub mod server;
pub mod transform;
pub mod watermark;
