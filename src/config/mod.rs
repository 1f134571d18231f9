//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, ListenConfig, DatabaseConfig)
//! - [`solved`]: Accepted-answer feature switches (SolvedConfig)
//! - [`validation`]: Startup validation that reports every problem at once

mod defaults;
mod solved;
mod types;
pub mod validation;

pub use solved::SolvedConfig;
pub use types::{Config, ConfigError, DatabaseConfig, ListenConfig, ServerConfig};
pub use validation::{ValidationError, validate};
