//! Command handlers.
//!
//! This module contains the Handler trait and the command registry that
//! dispatches incoming lines to the appropriate handler.
//!
//! Handlers run inside the owning connection's task. They reply through the
//! session's own outbound queue with [`Context::send`], which never waits:
//! a full queue is a send failure and ends the session.

mod channel;
mod connection;
mod helpers;
mod messaging;
mod query;

// Re-export helper functions for use by handlers and the registry
pub use helpers::{
    closing_link, err_alreadyregistred, err_erroneusnickname, err_needmoreparams,
    err_nicknameinuse, err_nosuchchannel, err_notonchannel, err_notregistered,
    err_unknowncommand, err_useronchannel, err_usersdontmatch, names_reply, server_reply,
    user_event,
};

pub use channel::{JoinHandler, ListHandler, NamesHandler, PartHandler};
pub use connection::{NickHandler, PingHandler, PongHandler, QuitHandler, UserHandler};
pub use messaging::PrivmsgHandler;
pub use query::{ModeHandler, WhoHandler};

pub use crate::error::{HandlerError, HandlerResult};

use crate::state::Matrix;
use crate::telemetry::spans;
use async_trait::async_trait;
use relay_proto::{Command, CommandError, Message};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Instrument, debug};

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The session's unique ID.
    pub uid: &'a str,
    /// Shared server state.
    pub matrix: &'a Arc<Matrix>,
    /// Sender for outgoing messages to this client.
    pub sender: &'a mpsc::Sender<Message>,
    /// Current registration state.
    pub handshake: &'a mut HandshakeState,
}

impl Context<'_> {
    /// Queue a message for this client without waiting.
    pub fn send(&self, msg: Message) -> HandlerResult {
        self.sender.try_send(msg)?;
        Ok(())
    }

    /// This server's name, the prefix of every numeric reply.
    pub fn server_name(&self) -> &str {
        &self.matrix.server_info.name
    }

    /// The current nickname, or `*` before one is accepted.
    pub fn nick_or_star(&self) -> &str {
        self.handshake.nick.as_deref().unwrap_or("*")
    }
}

/// Registration progress of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    NickSet,
    Registered,
}

/// State tracked during client registration handshake.
#[derive(Debug, Default)]
pub struct HandshakeState {
    /// Nick accepted by NICK.
    pub nick: Option<String>,
    /// Username provided by USER.
    pub user: Option<String>,
    /// Whether registration is complete.
    pub registered: bool,
}

impl HandshakeState {
    /// Check if we have both NICK and USER and can complete registration.
    pub fn can_register(&self) -> bool {
        self.nick.is_some() && self.user.is_some() && !self.registered
    }

    /// Current position in the registration state machine.
    pub fn state(&self) -> RegistrationState {
        if self.registered {
            RegistrationState::Registered
        } else if self.nick.is_some() {
            RegistrationState::NickSet
        } else {
            RegistrationState::Unregistered
        }
    }
}

/// Trait implemented by all command handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle an incoming message.
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult;

    /// Whether the command is rejected with ERR_NOTREGISTERED before registration.
    fn requires_registration(&self) -> bool {
        true
    }
}

/// Registry of command handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        // Connection/registration handlers
        handlers.insert("NICK", Box::new(NickHandler));
        handlers.insert("USER", Box::new(UserHandler));
        handlers.insert("PING", Box::new(PingHandler));
        handlers.insert("PONG", Box::new(PongHandler));
        handlers.insert("QUIT", Box::new(QuitHandler));

        // Channel handlers
        handlers.insert("JOIN", Box::new(JoinHandler));
        handlers.insert("PART", Box::new(PartHandler));
        handlers.insert("NAMES", Box::new(NamesHandler));
        handlers.insert("LIST", Box::new(ListHandler));

        // Messaging handlers
        handlers.insert("PRIVMSG", Box::new(PrivmsgHandler));

        // Query handlers
        handlers.insert("WHO", Box::new(WhoHandler));
        handlers.insert("MODE", Box::new(ModeHandler));

        Self { handlers }
    }

    /// Dispatch a parsed message to the appropriate handler.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Some(handler) = self.handlers.get(msg.command.name()) else {
            return Err(HandlerError::UnknownCommand(verb_of(&msg.command)));
        };

        if handler.requires_registration() && !ctx.handshake.registered {
            return Err(HandlerError::NotRegistered);
        }

        handler.handle(ctx, msg).await
    }

    /// Parse and dispatch one framed line, answering protocol errors.
    ///
    /// Errors with a numeric reply are sent to the client and swallowed;
    /// only send failures, quit and internal errors are returned.
    pub async fn handle_line(&self, ctx: &mut Context<'_>, line: &str) -> HandlerResult {
        let (verb, result) = match Message::parse(line) {
            Ok(msg) => {
                let verb = verb_of(&msg.command);
                let span = spans::command(&verb, ctx.uid, ctx.nick_or_star());
                let result = self.dispatch(ctx, &msg).instrument(span).await;
                (verb, result)
            }
            Err(CommandError::Empty) => return Ok(()),
            Err(err) => (err.verb().unwrap_or("*").to_string(), Err(err.into())),
        };

        let Err(err) = result else {
            return Ok(());
        };
        debug!(command = %verb, error = %err, code = err.error_code(), "Handler error");

        match err.to_irc_reply(ctx.server_name(), ctx.nick_or_star(), &verb) {
            Some(reply) => ctx.send(reply),
            None => Err(err),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// The verb as the client sent it (numerics keep their code).
fn verb_of(command: &Command) -> String {
    match command {
        Command::Response(resp, _) => resp.to_string(),
        other => other.name().to_string(),
    }
}
