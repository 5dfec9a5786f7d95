//! Framing and queue limits configuration.

use serde::Deserialize;

/// Per-connection resource limits.
///
/// `max_line_len` bounds the inbound framer (terminator included); a peer
/// that exceeds it is disconnected. `send_queue` is the capacity of each
/// session's outbound queue; a session whose queue is full when a fanout
/// reaches it is torn down.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum inbound line length in bytes, CRLF included (default: 512).
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
    /// Outbound queue capacity per session (default: 512).
    #[serde(default = "default_send_queue")]
    pub send_queue: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_len: default_max_line_len(),
            send_queue: default_send_queue(),
        }
    }
}

fn default_max_line_len() -> usize {
    relay_proto::line::DEFAULT_MAX_LINE_LEN
}

fn default_send_queue() -> usize {
    512
}
