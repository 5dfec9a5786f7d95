//! Relay message codec for tokio.
//!
//! Inbound, the codec yields raw lines: parsing is left to the caller so a
//! malformed command can be answered instead of tearing the stream down.
//! Outbound, it serializes [`Message`] values into single CRLF lines.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error;
use crate::line::LineCodec;
use crate::message::Message;

/// Tokio codec for reading lines and writing [`Message`]s.
///
/// Wraps [`LineCodec`] for framing.
#[derive(Debug, Default)]
pub struct IrcCodec {
    inner: LineCodec,
}

impl IrcCodec {
    /// Create a new codec with the default line limit.
    pub fn new() -> Self {
        Self {
            inner: LineCodec::new(),
        }
    }

    /// Create a new codec with custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            inner: LineCodec::with_max_len(max_len),
        }
    }

    /// Sanitize outgoing message data.
    ///
    /// Truncates at the first CR or LF so one message is always one line.
    pub fn sanitize(mut data: String) -> String {
        if let Some(pos) = data.find(|c: char| c == '\r' || c == '\n') {
            data.truncate(pos);
        }
        data
    }
}

impl Decoder for IrcCodec {
    type Item = String;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        self.inner.decode(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        self.inner.decode_eof(src)
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> error::Result<()> {
        let sanitized = Self::sanitize(msg.to_string());
        self.inner.encode(sanitized, dst)
    }
}
