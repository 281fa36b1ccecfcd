//! ``src/logging.rs``
//! ============================================================================
//! # Logger: Tracing Initialization
//!
//! Installs a daily rolling file appender under `logs/` plus an ANSI stderr
//! layer, both gated by `RUST_LOG` (default `info`).

use std::{fs, path::Path};

use tracing_appender::rolling::{RollingFileAppender, daily};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub struct Logger;

impl Logger {
    /// Call **once** near the start of `main`.
    pub fn init_tracing() {
        // create logs/ if missing
        let log_dir: &Path = Path::new("logs");
        fs::create_dir_all(log_dir).expect("cannot create logs dir");

        // daily rolling file appender -> logs/ds-YYYY-MM-DD.log
        let file: RollingFileAppender = daily(log_dir, "ds");

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_filter(env_filter());

        // stderr layer for live debugging
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_filter(env_filter());

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .init();
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
