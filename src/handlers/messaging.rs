//! PRIVMSG handler.
//!
//! A target naming a channel fans out to its members (minus the sender);
//! a target naming a live nickname is delivered to that session only.
//! Anything else follows the configured unknown-target policy.

use super::{Context, Handler, HandlerError, HandlerResult};
use crate::config::UnknownTargetPolicy;
use crate::state::Delivery;
use async_trait::async_trait;
use relay_proto::{Command, Message};
use tracing::debug;

/// Handler for PRIVMSG command.
pub struct PrivmsgHandler;

#[async_trait]
impl Handler for PrivmsgHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::PRIVMSG(target, text) = &msg.command else {
            return Ok(());
        };

        match ctx.matrix.privmsg(ctx.uid, target, text)? {
            Delivery::Channel(recipients) => {
                debug!(target = %target, recipients, "Channel message relayed");
            }
            Delivery::Direct => debug!(target = %target, "Direct message relayed"),
            Delivery::NoSuchTarget => match ctx.matrix.config.unknown_target {
                UnknownTargetPolicy::Drop => {
                    debug!(target = %target, "Message to unknown target dropped");
                }
                UnknownTargetPolicy::Reject => {
                    return Err(HandlerError::NoSuchChannel(target.clone()));
                }
            },
        }

        Ok(())
    }
}
