//! Shared wiring for the `patentdesk` binary: configuration and the
//! clients every command is built from.

pub mod config;
pub mod context;

pub use config::{Config, ConfigError};
pub use context::AppContext;
