//! Query handlers: WHO and the MODE placeholder.

use super::{Context, Handler, HandlerError, HandlerResult, server_reply};
use async_trait::async_trait;
use relay_proto::{ChannelExt, Command, Message, Response, irc_eq};

/// Handler for WHO command.
///
/// Like LIST, the reply is queued in one go and must fit the requester's
/// free send queue.
pub struct WhoHandler;

#[async_trait]
impl Handler for WhoHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::WHO(channel) = &msg.command else {
            return Ok(());
        };
        if !channel.is_channel_name() {
            return Err(HandlerError::invalid_channel(channel));
        }
        let server = ctx.server_name();
        let nick = ctx.nick_or_star();

        for entry in ctx.matrix.who(channel).unwrap_or_default() {
            ctx.send(server_reply(
                server,
                Response::RPL_WHOREPLY,
                vec![
                    nick.to_string(),
                    channel.clone(),
                    entry.user,
                    entry.host,
                    server.to_string(),
                    entry.nick,
                    "H".to_string(),
                    format!("0 {}", entry.realname),
                ],
            ))?;
        }
        ctx.send(server_reply(
            server,
            Response::RPL_ENDOFWHO,
            vec![nick.to_string(), channel.clone(), "End of /WHO list".to_string()],
        ))?;

        Ok(())
    }
}

/// Handler for MODE command.
///
/// Modes are not supported; queries are answered with an empty mode string
/// and change requests are ignored.
pub struct ModeHandler;

#[async_trait]
impl Handler for ModeHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::MODE(target, _modes) = &msg.command else {
            return Ok(());
        };
        let server = ctx.server_name();
        let nick = ctx.nick_or_star();

        if ctx.matrix.has_channel(target) {
            return ctx.send(server_reply(
                server,
                Response::RPL_CHANNELMODEIS,
                vec![nick.to_string(), target.clone(), "+".to_string()],
            ));
        }
        if irc_eq(target, nick) {
            return ctx.send(server_reply(
                server,
                Response::RPL_UMODEIS,
                vec![nick.to_string(), "+".to_string()],
            ));
        }
        if ctx.matrix.uid_for_nick(target).is_some() {
            return Err(HandlerError::UsersDontMatch);
        }

        Err(HandlerError::NoSuchChannel(target.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::Registry;
    use super::super::test_support::{TestSession, matrix};

    #[tokio::test]
    async fn test_who_lists_members_in_join_order() {
        let registry = Registry::new();
        let matrix = matrix();
        let mut alice = TestSession::new(&matrix);
        let mut bob = TestSession::new(&matrix);
        alice.register(&registry, "alice").await;
        bob.register(&registry, "bob").await;
        alice.line(&registry, "JOIN #test").await.unwrap();
        bob.line(&registry, "JOIN #test").await.unwrap();
        bob.drain();

        bob.line(&registry, "WHO #test").await.unwrap();
        assert_eq!(
            bob.drain(),
            vec![
                ":relay.local 352 bob #test alice 127.0.0.1 relay.local alice H :0 alice Real",
                ":relay.local 352 bob #test bob 127.0.0.1 relay.local bob H :0 bob Real",
                ":relay.local 315 bob #test :End of /WHO list",
            ]
        );
    }

    #[tokio::test]
    async fn test_who_rejects_invalid_name() {
        let registry = Registry::new();
        let mut alice = TestSession::new(&matrix());
        alice.register(&registry, "alice").await;

        alice.line(&registry, "WHO :#a b").await.unwrap();
        assert_eq!(
            alice.drain(),
            vec![":relay.local 403 alice #a :No such channel"]
        );
    }

    #[tokio::test]
    async fn test_mode_placeholder_replies() {
        let registry = Registry::new();
        let matrix = matrix();
        let mut alice = TestSession::new(&matrix);
        let mut bob = TestSession::new(&matrix);
        alice.register(&registry, "alice").await;
        bob.register(&registry, "bob").await;
        alice.line(&registry, "JOIN #test").await.unwrap();
        alice.drain();

        alice.line(&registry, "MODE #test +n").await.unwrap();
        assert_eq!(alice.drain(), vec![":relay.local 324 alice #test :+"]);

        alice.line(&registry, "MODE Alice").await.unwrap();
        assert_eq!(alice.drain(), vec![":relay.local 221 alice :+"]);

        alice.line(&registry, "MODE bob +i").await.unwrap();
        assert_eq!(
            alice.drain(),
            vec![":relay.local 502 alice :Cannot change mode for other users"]
        );

        alice.line(&registry, "MODE #nowhere").await.unwrap();
        assert_eq!(
            alice.drain(),
            vec![":relay.local 403 alice #nowhere :No such channel"]
        );
    }
}
