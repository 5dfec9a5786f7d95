//! Channel command handlers.
//!
//! Handles JOIN, PART, NAMES, LIST commands.

use super::{Context, Handler, HandlerError, HandlerResult, names_reply, server_reply};
use async_trait::async_trait;
use relay_proto::{ChannelExt, Command, Message, Response};
use tracing::info;

/// PART reason when the client gives none.
const DEFAULT_PART_REASON: &str = "Leaving";

/// Split a comma-separated channel list, skipping empty entries.
fn channel_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|name| !name.is_empty())
}

/// Send the reply for a per-channel error and keep going; propagate the rest.
fn report_channel_error(ctx: &Context<'_>, err: HandlerError) -> HandlerResult {
    match err {
        HandlerError::Channel { .. } | HandlerError::NoSuchChannel(_) => match err.to_irc_reply(ctx.server_name(), ctx.nick_or_star(), "") {
            Some(reply) => ctx.send(reply),
            None => Ok(()),
        },
        other => Err(other),
    }
}

/// Handler for JOIN command.
pub struct JoinHandler;

#[async_trait]
impl Handler for JoinHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::JOIN(channels) = &msg.command else {
            return Ok(());
        };

        for channel in channel_list(channels) {
            match ctx.matrix.join(ctx.uid, channel) {
                Ok(created) => {
                    info!(channel = %channel, nick = %ctx.nick_or_star(), created, "Joined channel");
                }
                Err(err) => report_channel_error(ctx, err)?,
            }
        }

        Ok(())
    }
}

/// Handler for PART command.
pub struct PartHandler;

#[async_trait]
impl Handler for PartHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::PART(channels, reason) = &msg.command else {
            return Ok(());
        };
        let reason = reason.as_deref().unwrap_or(DEFAULT_PART_REASON);

        for channel in channel_list(channels) {
            if !channel.is_channel_name() {
                report_channel_error(ctx, HandlerError::invalid_channel(channel))?;
                continue;
            }
            match ctx.matrix.part(ctx.uid, channel, reason) {
                Ok(destroyed) => {
                    info!(channel = %channel, nick = %ctx.nick_or_star(), destroyed, "Left channel");
                }
                Err(err) => report_channel_error(ctx, err)?,
            }
        }

        Ok(())
    }
}

/// Handler for NAMES command.
pub struct NamesHandler;

#[async_trait]
impl Handler for NamesHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::NAMES(channel) = &msg.command else {
            return Ok(());
        };

        if !channel.is_channel_name() {
            return Err(HandlerError::invalid_channel(channel));
        }
        let members = ctx.matrix.channel_names(channel).unwrap_or_default();
        for reply in names_reply(ctx.server_name(), ctx.nick_or_star(), channel, &members) {
            ctx.send(reply)?;
        }
        Ok(())
    }
}

/// Handler for LIST command.
///
/// The whole listing is queued at once; a listing longer than the
/// requester's free send queue ends that session with a send error.
pub struct ListHandler;

#[async_trait]
impl Handler for ListHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        let server = ctx.server_name();
        let nick = ctx.nick_or_star();

        ctx.send(server_reply(
            server,
            Response::RPL_LISTSTART,
            vec![nick.to_string(), "Channel".to_string(), "Users  Name".to_string()],
        ))?;
        for (channel, count) in ctx.matrix.list() {
            ctx.send(server_reply(
                server,
                Response::RPL_LIST,
                vec![nick.to_string(), channel, count.to_string(), String::new()],
            ))?;
        }
        ctx.send(server_reply(
            server,
            Response::RPL_LISTEND,
            vec![nick.to_string(), "End of /LIST".to_string()],
        ))?;

        Ok(())
    }
}
