use std::path::PathBuf;

use tracing::{subscriber::set_global_default, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// Builds the process-wide subscriber: human-readable output on stdout and, if
/// `log_directory` is set, bunyan JSON records in an hourly rolling file there.
///
/// The returned guard flushes the file writer on drop; keep it alive in `main`.
pub fn get_subscriber(
    name: String,
    env_filter: String,
    log_directory: Option<PathBuf>,
) -> (impl Subscriber + Send + Sync, Option<WorkerGuard>) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    let (file_layer, guard) = match log_directory {
        Some(directory) => {
            let file_appender =
                tracing_appender::rolling::hourly(directory, format!("{name}.log"));
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = BunyanFormattingLayer::new(name, non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let res = Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(JsonStorageLayer)
        .with(file_layer);
    (res, guard)
}

/// Register a subscriber as global default to process span data.
///
/// It should only be called once!
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    // Redirect all `log`'s events to our subscriber
    LogTracer::init().expect("Failed to set logger");
    set_global_default(subscriber).expect("Failed to set subscriber");
}
