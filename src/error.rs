//! Unified error handling for relayd.
//!
//! Handler outcomes that the client must hear about map to numeric replies
//! through `to_irc_reply`; the rest (send failures, quit, internal) end or
//! skip the reply silently.

use crate::handlers::{
    err_alreadyregistred, err_erroneusnickname, err_needmoreparams, err_nicknameinuse,
    err_nosuchchannel, err_notonchannel, err_notregistered, err_unknowncommand,
    err_useronchannel, err_usersdontmatch,
};
use relay_proto::{CommandError, Message};
use thiserror::Error;
use tokio::sync::mpsc;

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("not enough parameters")]
    NeedMoreParams,

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("erroneous nickname: {0}")]
    ErroneousNickname(String),

    #[error("not registered")]
    NotRegistered,

    #[error("already registered")]
    AlreadyRegistered,

    #[error("no such channel: {0}")]
    NoSuchChannel(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("cannot change mode for other users")]
    UsersDontMatch,

    #[error("{channel}: {error}")]
    Channel {
        channel: String,
        error: ChannelError,
    },

    /// The session's own outbound queue is full or closed.
    #[error("send queue exceeded")]
    Send,

    #[error("client quit: {0:?}")]
    Quit(Option<String>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NeedMoreParams => "need_more_params",
            Self::NicknameInUse(_) => "nickname_in_use",
            Self::ErroneousNickname(_) => "erroneous_nickname",
            Self::NotRegistered => "not_registered",
            Self::AlreadyRegistered => "already_registered",
            Self::NoSuchChannel(_) => "no_such_channel",
            Self::UnknownCommand(_) => "unknown_command",
            Self::UsersDontMatch => "users_dont_match",
            Self::Channel { .. } => "channel_error",
            Self::Send => "send_error",
            Self::Quit(_) => "quit",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Convert to an IRC error reply message.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply
    /// (internal errors, send failures, quit).
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, cmd_name: &str) -> Option<Message> {
        let msg = match self {
            Self::NotRegistered => err_notregistered(server_name, nick),
            Self::NeedMoreParams => err_needmoreparams(server_name, nick, cmd_name),
            Self::NicknameInUse(bad_nick) => err_nicknameinuse(server_name, nick, bad_nick),
            Self::ErroneousNickname(bad_nick) => err_erroneusnickname(server_name, nick, bad_nick),
            Self::AlreadyRegistered => err_alreadyregistred(server_name, nick),
            Self::NoSuchChannel(bad_chan) => err_nosuchchannel(server_name, nick, bad_chan),
            Self::UnknownCommand(cmd) => err_unknowncommand(server_name, nick, cmd),
            Self::UsersDontMatch => err_usersdontmatch(server_name, nick),
            Self::Channel { channel, error } => error.to_irc_reply(server_name, nick, channel),

            // These errors don't get client-visible replies
            Self::Send => return None,
            Self::Quit(_) => return None,
            Self::Internal(_) => return None,
        };

        Some(msg)
    }
}

impl HandlerError {
    /// ERR_NOSUCHCHANNEL for a name that can never be a channel.
    ///
    /// Only the first token is echoed so the reply keeps one middle parameter.
    pub fn invalid_channel(name: &str) -> Self {
        let shown = name
            .split_whitespace()
            .next()
            .map(|token| token.trim_start_matches(':'))
            .filter(|token| !token.is_empty())
            .unwrap_or("*");
        Self::NoSuchChannel(shown.to_string())
    }
}

impl From<CommandError> for HandlerError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::UnknownCommand(verb) => Self::UnknownCommand(verb),
            CommandError::NeedMoreParams(_) => Self::NeedMoreParams,
            CommandError::Empty => Self::Internal("empty command".to_string()),
        }
    }
}

impl<T> From<mpsc::error::TrySendError<T>> for HandlerError {
    fn from(_: mpsc::error::TrySendError<T>) -> Self {
        Self::Send
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Channel Errors (registry operations)
// ============================================================================

/// Channel membership errors.
///
/// These represent registry outcomes that handler code maps to
/// RFC-compliant error responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("not on channel")]
    NotOnChannel,

    #[error("already on channel")]
    AlreadyOnChannel,
}

impl ChannelError {
    /// Convert to an IRC error reply message.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, channel: &str) -> Message {
        match self {
            Self::NotOnChannel => err_notonchannel(server_name, nick, channel),
            Self::AlreadyOnChannel => err_useronchannel(server_name, nick, channel),
        }
    }
}
