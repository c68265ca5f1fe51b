use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::admission::RateLimiter;
use crate::config::Config;
use crate::notifications::{Notifier, TracingNotifier};
use crate::repository::StoreError;
use crate::store::SqliteStore;

/// Long-lived state shared by every request.
pub struct Context {
    pub store: Arc<SqliteStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub notifier: Arc<dyn Notifier>,
    sweep_interval: Duration,
}

impl Context {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let store = SqliteStore::open(&config.database_path)?;
        tracing::info!(path = %config.database_path.display(), "opened assessment store");

        Ok(Context {
            store: Arc::new(store),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            notifier: Arc::new(TracingNotifier),
            sweep_interval: config.sweep_interval,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Starts the periodic rate limiter sweep on the current runtime.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        Arc::clone(&self.rate_limiter).spawn_sweeper(self.sweep_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_config_opens_an_ephemeral_store() {
        let context = Context::new(&Config::default()).unwrap();
        assert!(context.rate_limiter.allow("127.0.0.1").is_ok());

        let sweeper = context.spawn_sweeper();
        sweeper.abort();
    }
}
