use assessment_service::{Config, Context};
use service_core::telemetry::{init_subscriber, make_subscriber};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_subscriber(make_subscriber(env!("CARGO_PKG_NAME"), config.log_filter.clone()))?;

    let ctx = Context::new(&config)?;
    let sweeper = ctx.spawn_sweeper();
    tracing::info!(
        rate = ctx.rate_limiter.config().rate,
        window_secs = ctx.rate_limiter.config().window.as_secs(),
        "Assessment engine ready."
    );

    tokio::signal::ctrl_c().await?;
    sweeper.abort();
    tracing::info!(tracked_keys = ctx.rate_limiter.tracked_keys(), "Shutting down.");

    Ok(())
}
