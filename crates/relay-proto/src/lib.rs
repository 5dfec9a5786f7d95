//! # relay-proto
//!
//! Wire types for the relay protocol: a line-oriented, IRC-style text
//! protocol where every message is one CRLF-terminated UTF-8 line.
//!
//! ## Parsing
//!
//! ```rust
//! use relay_proto::{Command, Message};
//!
//! let msg: Message = "PRIVMSG #rust :hello there".parse().unwrap();
//! assert_eq!(
//!     msg.command,
//!     Command::PRIVMSG("#rust".to_string(), "hello there".to_string())
//! );
//! ```
//!
//! ## Encoding
//!
//! ```rust
//! use relay_proto::{Command, Message, Prefix};
//!
//! let msg = Message::from(Command::PRIVMSG("#rust".into(), "hi".into()))
//!     .with_prefix(Prefix::Nickname("alice".into()));
//! assert_eq!(msg.to_string(), ":alice PRIVMSG #rust :hi");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod chan;
pub mod command;
pub mod error;
#[cfg(feature = "tokio")]
pub mod irc;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod nick;
pub mod prefix;
pub mod response;

pub use self::casemap::{irc_eq, irc_to_lower};
pub use self::chan::{ChannelExt, CHANNEL_MAX_LEN};
pub use self::command::Command;
pub use self::error::{CommandError, ProtocolError};
#[cfg(feature = "tokio")]
pub use self::irc::IrcCodec;
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::Message;
pub use self::nick::NickExt;
pub use self::prefix::Prefix;
pub use self::response::Response;
