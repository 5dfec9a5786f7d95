//! relayd - minimal line-oriented chat relay.
//!
//! Sessions register with NICK/USER, join named channels and exchange
//! PRIVMSG lines. All shared state lives in one [`state::Matrix`]; each
//! connection is served by its own task ([`network::Connection`]).

pub mod config;
pub mod error;
pub mod handlers;
pub mod network;
pub mod state;
pub mod telemetry;
