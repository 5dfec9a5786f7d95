//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, IdleTimeoutsConfig, ...)
//! - [`listen`]: Network listener configuration (ListenConfig)
//! - [`limits`]: Framing and queue limits (LimitsConfig)

mod limits;
mod listen;
mod types;

pub use limits::LimitsConfig;
pub use listen::ListenConfig;
pub use types::{
    Config, ConfigError, IdleTimeoutsConfig, MessagingConfig, MotdConfig, ServerConfig,
    UnknownTargetPolicy,
};
