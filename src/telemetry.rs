//! Telemetry utilities: standardized tracing spans.

/// Standardized span constructors for relay observability.
pub mod spans {
    use std::net::SocketAddr;
    use tracing::{Span, debug_span, info_span};

    /// Create a span for a client connection.
    pub fn connection(uid: &str, addr: &SocketAddr) -> Span {
        info_span!("connection", uid = %uid, addr = %addr)
    }

    /// Create a span for a command execution.
    pub fn command(name: &str, uid: &str, source_nick: &str) -> Span {
        debug_span!("irc.command", command = %name, uid = %uid, source_nick = %source_nick)
    }
}
