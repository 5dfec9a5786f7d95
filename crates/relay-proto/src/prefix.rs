//! Message prefix types.
//!
//! A prefix identifies the origin of a message: either the server itself
//! (numeric replies, probes) or the nickname of the session that caused an
//! event notice.

use std::fmt;

/// Message prefix - identifies the origin of a message.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Prefix {
    /// Server name (e.g., "relay.local")
    ServerName(String),
    /// Nickname of the originating session
    Nickname(String),
}

impl Prefix {
    /// Parse a prefix string (without the leading `:`).
    ///
    /// This is a lenient parser: a dot marks a server name, anything else is
    /// taken as a nickname, with any `!user@host` suffix dropped.
    pub fn new_from_str(s: &str) -> Self {
        if s.contains('.') && !s.contains('!') && !s.contains('@') {
            return Prefix::ServerName(s.to_string());
        }
        let nick = s.split(|c| c == '!' || c == '@').next().unwrap_or_default();
        Prefix::Nickname(nick.to_string())
    }

    /// The prefix text without the leading `:`.
    pub fn as_str(&self) -> &str {
        match self {
            Prefix::ServerName(name) | Prefix::Nickname(name) => name,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
