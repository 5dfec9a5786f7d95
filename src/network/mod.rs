//! Network module.
//!
//! Contains the Gateway (TCP listener), the per-session Connection worker
//! and its liveness monitor.

mod connection;
mod gateway;
pub mod liveness;

pub use connection::Connection;
pub use gateway::Gateway;
