use std::io;

use tracing::subscriber::{set_global_default, SetGlobalDefaultError};
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::log_tracer::SetLoggerError;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Could not redirect `log` records: {0}")]
    Logger(#[from] SetLoggerError),

    #[error("A global tracing subscriber is already installed: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Compose the layers of the service's tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Events and spans are written to stdout in
/// Bunyan compatible JSON, tagged with `name`.
pub fn make_subscriber(name: impl Into<String>, default_filter: impl Into<String>) -> impl Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter.into()));
    let formatting_layer = BunyanFormattingLayer::new(name.into(), io::stdout);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Installs `subscriber` as the global default and redirects `log` records emitted by
/// dependencies into it.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), TelemetryError> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}

/// Utility macro to log information about an error and map it to some other type.
///
/// This is meant to be used in a `Result::map_err`, e.g.:
///
/// ```ignore
/// foo().map_err(simple_err_map!("Foo failed.", MyError::Foo))?;
/// ```
///
/// Gets expanded into:
///
/// ```ignore
/// foo().map_err(|e| {
///     tracing::error!(error = ?e, "Foo failed.");
///     MyError::Foo
/// })?;
/// ```
#[macro_export]
macro_rules! simple_err_map {
    ($msg:expr, $result:expr) => {
        |e| {
            tracing::error!(error = ?e, $msg);
            $result
        }
    };
}
