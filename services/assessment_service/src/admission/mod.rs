//! Request admission control, independent of the lifecycle operations and the store.

mod rate_limiter;

pub use rate_limiter::{AdmissionError, RateLimitConfig, RateLimiter};
