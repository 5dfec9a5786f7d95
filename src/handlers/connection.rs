//! Connection and registration handlers.
//!
//! Handles NICK, USER, PING, PONG, QUIT commands.

use super::{Context, Handler, HandlerError, HandlerResult, server_reply};
use crate::state::NickChange;
use async_trait::async_trait;
use relay_proto::{Command, Message, NickExt, Response};
use tracing::{debug, info};

/// Handler for NICK command.
pub struct NickHandler;

#[async_trait]
impl Handler for NickHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::NICK(nick) = &msg.command else {
            return Ok(());
        };

        if !nick.is_valid_nick() {
            return Err(HandlerError::ErroneousNickname(nick.clone()));
        }

        let announce = ctx.handshake.registered;
        match ctx.matrix.claim_nick(ctx.uid, nick, announce)? {
            NickChange::Unchanged => return Ok(()),
            NickChange::Claimed => debug!(nick = %nick, "Nick set"),
            NickChange::Renamed { old } => info!(old = %old, new = %nick, "Nick changed"),
        }
        ctx.handshake.nick = Some(nick.clone());

        // Check if we can complete registration
        if ctx.handshake.can_register() {
            complete_registration(ctx)?;
        }

        Ok(())
    }

    fn requires_registration(&self) -> bool {
        false
    }
}

/// Handler for USER command.
pub struct UserHandler;

#[async_trait]
impl Handler for UserHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        if ctx.handshake.registered {
            return Err(HandlerError::AlreadyRegistered);
        }

        let Command::USER(username, _mode, realname) = &msg.command else {
            return Ok(());
        };

        ctx.matrix.set_user(ctx.uid, username, realname)?;
        ctx.handshake.user = Some(username.clone());

        debug!(user = %username, realname = %realname, "User set");

        // Check if we can complete registration
        if ctx.handshake.can_register() {
            complete_registration(ctx)?;
        }

        Ok(())
    }

    fn requires_registration(&self) -> bool {
        false
    }
}

fn complete_registration(ctx: &mut Context<'_>) -> HandlerResult {
    ctx.handshake.registered = true;
    info!(nick = %ctx.nick_or_star(), "Client registered");
    send_welcome_burst(ctx)
}

/// Send the welcome burst (001 + MOTD) after successful registration.
fn send_welcome_burst(ctx: &Context<'_>) -> HandlerResult {
    let server = ctx.server_name();
    let nick = ctx.nick_or_star();

    ctx.send(server_reply(
        server,
        Response::RPL_WELCOME,
        vec![
            nick.to_string(),
            format!(
                "Welcome to the {} Network {}",
                ctx.matrix.server_info.network, nick
            ),
        ],
    ))?;

    ctx.send(server_reply(
        server,
        Response::RPL_MOTDSTART,
        vec![
            nick.to_string(),
            format!("- {} Message of the Day -", server),
        ],
    ))?;
    for line in &ctx.matrix.config.motd {
        ctx.send(server_reply(
            server,
            Response::RPL_MOTD,
            vec![nick.to_string(), format!("- {}", line)],
        ))?;
    }
    ctx.send(server_reply(
        server,
        Response::RPL_ENDOFMOTD,
        vec![nick.to_string(), "End of /MOTD command.".to_string()],
    ))?;

    Ok(())
}

/// Handler for PING command.
pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::PING(token, _) = &msg.command else {
            return Ok(());
        };

        ctx.send(Message::pong(ctx.server_name(), token))
    }

    fn requires_registration(&self) -> bool {
        false
    }
}

/// Handler for PONG command.
pub struct PongHandler;

#[async_trait]
impl Handler for PongHandler {
    async fn handle(&self, _ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        // Any inbound line resets the idle timer (handled in the connection loop)
        Ok(())
    }

    fn requires_registration(&self) -> bool {
        false
    }
}

/// Handler for QUIT command.
pub struct QuitHandler;

#[async_trait]
impl Handler for QuitHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let quit_msg = match &msg.command {
            Command::QUIT(reason) => reason.clone(),
            _ => None,
        };

        info!(
            uid = %ctx.uid,
            nick = ?ctx.handshake.nick,
            message = ?quit_msg,
            "Client quit"
        );

        // Signal quit by returning Quit error that connection loop will handle
        Err(HandlerError::Quit(quit_msg))
    }

    fn requires_registration(&self) -> bool {
        false
    }
}
