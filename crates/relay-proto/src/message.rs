//! A complete protocol message: optional prefix plus command.

use std::fmt;
use std::str::FromStr;

use crate::command::Command;
use crate::error::CommandError;
use crate::prefix::Prefix;

/// A parsed or outgoing protocol message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Origin of the message, if any.
    pub prefix: Option<Prefix>,
    /// The command and its arguments.
    pub command: Command,
}

impl Message {
    /// Parse one line (without its CRLF terminator).
    ///
    /// Tokens are split on whitespace. A leading `:source` token is
    /// recognised and kept as the prefix; servers ignore it on input.
    pub fn parse(line: &str) -> Result<Message, CommandError> {
        let mut tokens: Vec<&str> = line.split_whitespace().collect();

        let prefix = match tokens.first() {
            Some(first) if first.starts_with(':') => {
                let source = tokens.remove(0);
                Some(Prefix::new_from_str(&source[1..]))
            }
            _ => None,
        };

        let (verb, rest) = tokens.split_first().ok_or(CommandError::Empty)?;
        let command = Command::new(verb, rest)?;
        Ok(Message { prefix, command })
    }

    /// Attach a prefix.
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// `:<server> PING :<server>` liveness probe.
    pub fn ping(server: &str) -> Message {
        Message::from(Command::PING(server.to_string(), None))
            .with_prefix(Prefix::ServerName(server.to_string()))
    }

    /// `:<server> PONG <server> :<token>` reply to a client probe.
    pub fn pong(server: &str, token: &str) -> Message {
        Message::from(Command::PONG(
            Some(server.to_string()),
            Some(token.to_string()),
        ))
        .with_prefix(Prefix::ServerName(server.to_string()))
    }

    /// `ERROR :<text>` sent just before the server closes a link.
    pub fn error(text: impl Into<String>) -> Message {
        Message::from(Command::ERROR(text.into()))
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message {
            prefix: None,
            command,
        }
    }
}

impl FromStr for Message {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Message::parse(s)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        write!(f, "{}", self.command)
    }
}
