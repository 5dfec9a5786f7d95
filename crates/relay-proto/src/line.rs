//! Line-based codec for tokio.
//!
//! This module provides the framer that turns a raw byte stream into
//! CRLF-terminated lines, and writes lines back out with the terminator.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error;

/// Default maximum line length in bytes, terminator included.
pub const DEFAULT_MAX_LINE_LEN: usize = 512;

/// Line-based codec that handles CRLF-terminated messages.
///
/// Decoded lines never carry their terminator. Bytes after the last
/// terminator stay buffered until the rest of the line arrives, so a line
/// may be split across any number of reads.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for the terminator
    next_index: usize,
    /// Maximum line length, terminator included
    max_len: usize,
}

impl LineCodec {
    /// Create a new codec with the default 512 byte limit.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a new codec with custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        // Back up one byte: a CR ending the previous scan may pair with a new LF.
        let start = self.next_index.saturating_sub(1).min(src.len());

        if let Some(offset) = src[start..].windows(2).position(|w| w == b"\r\n") {
            let end = start + offset;
            self.next_index = 0;

            if end + 2 > self.max_len {
                return Err(error::ProtocolError::MessageTooLong {
                    actual: end + 2,
                    limit: self.max_len,
                });
            }

            let line = src.split_to(end);
            src.advance(2);

            let data = String::from_utf8(line.to_vec()).map_err(|e| {
                error::ProtocolError::InvalidUtf8 {
                    byte_pos: e.utf8_error().valid_up_to(),
                }
            })?;

            Ok(Some(data))
        } else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(error::ProtocolError::MessageTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None => {
                // An unterminated fragment at EOF is not a line.
                src.clear();
                self.next_index = 0;
                Ok(None)
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> error::Result<()> {
        dst.reserve(msg.len() + 2);
        dst.extend_from_slice(msg.as_bytes());
        if !msg.ends_with("\r\n") {
            dst.extend_from_slice(b"\r\n");
        }
        Ok(())
    }
}
