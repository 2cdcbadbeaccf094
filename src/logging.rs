//! Logging setup.
//!
//! The library only emits `tracing` events. Binaries and tests that want to
//! see them call [`init`] once at startup.

use crate::config::{LoggingConfig, APP_ID};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.filter`. When `config.log_dir` is
/// set, events are also written to a daily-rotated file; keep the returned
/// guard alive for as long as logs should be flushed. Does nothing if a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| build_filter(&config.filter));

    let console = tracing_subscriber::fmt::layer().with_target(config.show_target);

    let (file, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, format!("{}.log", APP_ID));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();

    match result {
        Ok(()) => {
            tracing::info!("Logging initialized");
            guard
        }
        Err(_) => None,
    }
}

fn build_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|e| {
        eprintln!("Invalid log filter {:?}: {}", directives, e);
        EnvFilter::new(crate::config::DEFAULT_LOG_FILTER)
    })
}
