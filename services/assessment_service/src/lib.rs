//! Assessment lifecycle engine: homework, quizzes, session reviews and notification preferences,
//! plus the admission gate in front of them.

pub mod admission;
pub mod config;
pub mod context;
pub mod domain;
pub mod notifications;
pub mod operations;
pub mod policy;
pub mod repository;
pub mod store;

pub use config::{Config, ConfigError};
pub use context::Context;
pub use store::SqliteStore;
