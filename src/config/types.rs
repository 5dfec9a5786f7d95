//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use super::limits::LimitsConfig;
use super::listen::ListenConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
///
/// Every section is optional; an empty file yields [`Config::default`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server information.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Liveness probe timings.
    #[serde(default)]
    pub idle_timeouts: IdleTimeoutsConfig,
    /// Framing and queue limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// PRIVMSG delivery policy.
    #[serde(default)]
    pub messaging: MessagingConfig,
    /// Message of the Day configuration.
    #[serde(default)]
    pub motd: MotdConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, used as the prefix of numeric replies (e.g., "relay.local").
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Network name, used in the welcome text.
    #[serde(default = "default_network")]
    pub network: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            network: default_network(),
        }
    }
}

fn default_server_name() -> String {
    "relay.local".to_string()
}

fn default_network() -> String {
    "RelayNet".to_string()
}

/// Idle timeout configuration for client connection keepalive.
///
/// Every `ping` seconds the server probes the client with a PING. A client
/// that has sent nothing for `ping + timeout` seconds is disconnected with
/// "Ping timeout".
#[derive(Debug, Clone, Deserialize)]
pub struct IdleTimeoutsConfig {
    /// Seconds between liveness probes (default: 30).
    #[serde(default = "default_ping_interval")]
    pub ping: u64,

    /// Grace seconds of silence on top of one probe interval (default: 120).
    #[serde(default = "default_ping_timeout")]
    pub timeout: u64,
}

/// Upper bound for either idle setting, in seconds (one week).
const MAX_IDLE_SECS: u64 = 7 * 24 * 60 * 60;

impl IdleTimeoutsConfig {
    /// Interval between liveness probes, clamped to 1 s ..= one week.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping.clamp(1, MAX_IDLE_SECS))
    }

    /// Total silence tolerated before a session is considered dead.
    pub fn idle_limit(&self) -> Duration {
        let grace = self.timeout.min(MAX_IDLE_SECS);
        Duration::from_secs(self.ping.clamp(1, MAX_IDLE_SECS).saturating_add(grace))
    }
}

impl Default for IdleTimeoutsConfig {
    fn default() -> Self {
        Self {
            ping: default_ping_interval(),
            timeout: default_ping_timeout(),
        }
    }
}

fn default_ping_interval() -> u64 {
    30
}

fn default_ping_timeout() -> u64 {
    120
}

/// What to do with a PRIVMSG whose target is neither a channel nor a nick.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTargetPolicy {
    /// Discard silently.
    #[default]
    Drop,
    /// Answer the sender with ERR_NOSUCHCHANNEL.
    Reject,
}

/// Messaging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagingConfig {
    /// Policy for PRIVMSG to an unknown target (default: drop).
    #[serde(default)]
    pub unknown_target: UnknownTargetPolicy,
}

/// Message of the Day (MOTD) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MotdConfig {
    /// MOTD lines sent after RPL_WELCOME.
    #[serde(default = "default_motd_lines")]
    pub lines: Vec<String>,
}

impl Default for MotdConfig {
    fn default() -> Self {
        Self {
            lines: default_motd_lines(),
        }
    }
}

fn default_motd_lines() -> Vec<String> {
    vec!["Welcome to relayd".to_string()]
}
