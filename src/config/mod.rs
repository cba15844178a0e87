//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions and loading
//! - [`listen`]: Listener configuration and address mode
//! - [`limits`]: Line, queue, and mute limits
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup validation

mod defaults;
mod limits;
mod listen;
mod types;
pub mod validation;

pub use limits::LimitsConfig;
pub use listen::{AddressMode, ENV_VAR, ListenConfig};
pub use types::{Config, ConfigError, LoggingConfig, ModerationConfig, ServerConfig};
pub use validation::{ValidationError, validate};
