//! Logging and (optional) profiling setup
//!
//! Logs go to stderr so that stdout carries only the requested output. With the
//! `profiling` feature, `--trace-file` adds a Chrome trace layer that is flushed
//! when the returned guard is dropped.

use crate::settings::Settings;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Keeps profiling output alive until dropped
pub struct LoggingGuard {
    #[cfg(feature = "profiling")]
    _chrome: Option<tracing_chrome::FlushGuard>,
}

fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Initialize logging, honoring RUST_LOG when set
pub fn setup_logging(settings: &Settings) -> LoggingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    #[cfg(feature = "profiling")]
    {
        let (chrome_layer, guard) = match &settings.trace_file {
            Some(path) => {
                let (layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                    .file(path)
                    .include_args(true)
                    .build();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };
        tracing_subscriber::registry()
            .with(chrome_layer)
            .with(fmt_layer)
            .init();
        if let Some(path) = &settings.trace_file {
            tracing::info!("Recording Chrome trace to {}", path.display());
        }
        LoggingGuard { _chrome: guard }
    }

    #[cfg(not(feature = "profiling"))]
    {
        let _ = settings;
        tracing_subscriber::registry().with(fmt_layer).init();
        LoggingGuard {}
    }
}
