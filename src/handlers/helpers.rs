//! Helper functions for command handlers.
//!
//! Reply builders shared by handlers and by the registry's fanout paths.
//! Every numeric reply carries the server name as prefix and the target's
//! nickname (or `*` before one is set) as first argument.

use relay_proto::{Command, Message, Prefix, Response};

// ============================================================================
// Common reply helpers
// ============================================================================

/// Helper to create a server reply message (numeric response).
pub fn server_reply(server_name: &str, response: Response, params: Vec<String>) -> Message {
    Message::from(Command::Response(response, params))
        .with_prefix(Prefix::ServerName(server_name.to_string()))
}

/// Helper to create an event notice originating from a session (`:<nick> ...`).
pub fn user_event(nick: &str, command: Command) -> Message {
    Message::from(command).with_prefix(Prefix::Nickname(nick.to_string()))
}

/// `ERROR :Closing Link: <host> (<reason>)`, the last line before a close.
pub fn closing_link(host: &str, reason: &str) -> Message {
    Message::error(format!("Closing Link: {} ({})", host, reason))
}

/// Create ERR_NEEDMOREPARAMS reply (461) - not enough parameters.
pub fn err_needmoreparams(server_name: &str, nick: &str, command: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_NEEDMOREPARAMS,
        vec![
            nick.to_string(),
            command.to_string(),
            "Not enough parameters".to_string(),
        ],
    )
}

/// Create ERR_NOSUCHCHANNEL reply (403) - no such channel.
pub fn err_nosuchchannel(server_name: &str, nick: &str, channel: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_NOSUCHCHANNEL,
        vec![
            nick.to_string(),
            channel.to_string(),
            "No such channel".to_string(),
        ],
    )
}

/// Create ERR_NOTONCHANNEL reply (442) - you're not on that channel.
pub fn err_notonchannel(server_name: &str, nick: &str, channel: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_NOTONCHANNEL,
        vec![
            nick.to_string(),
            channel.to_string(),
            "You're not on that channel".to_string(),
        ],
    )
}

/// Create ERR_USERONCHANNEL reply (443) - already on channel.
pub fn err_useronchannel(server_name: &str, nick: &str, channel: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_USERONCHANNEL,
        vec![
            nick.to_string(),
            nick.to_string(),
            channel.to_string(),
            "is already on channel".to_string(),
        ],
    )
}

/// Create ERR_NOTREGISTERED reply (451) - you have not registered.
pub fn err_notregistered(server_name: &str, nick: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_NOTREGISTERED,
        vec![nick.to_string(), "You have not registered".to_string()],
    )
}

/// Create ERR_UNKNOWNCOMMAND reply (421) - unknown command.
pub fn err_unknowncommand(server_name: &str, nick: &str, command: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_UNKNOWNCOMMAND,
        vec![
            nick.to_string(),
            command.to_string(),
            "Unknown command".to_string(),
        ],
    )
}

/// Create ERR_ERRONEOUSNICKNAME reply (432).
pub fn err_erroneusnickname(server_name: &str, nick: &str, bad_nick: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_ERRONEOUSNICKNAME,
        vec![
            nick.to_string(),
            bad_nick.to_string(),
            "Erroneous nickname".to_string(),
        ],
    )
}

/// Create ERR_NICKNAMEINUSE reply (433).
pub fn err_nicknameinuse(server_name: &str, nick: &str, taken: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_NICKNAMEINUSE,
        vec![
            nick.to_string(),
            taken.to_string(),
            "Nickname is already in use".to_string(),
        ],
    )
}

/// Create ERR_ALREADYREGISTRED reply (462).
pub fn err_alreadyregistred(server_name: &str, nick: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_ALREADYREGISTRED,
        vec![nick.to_string(), "You may not reregister".to_string()],
    )
}

/// Create ERR_USERSDONTMATCH reply (502).
pub fn err_usersdontmatch(server_name: &str, nick: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_USERSDONTMATCH,
        vec![
            nick.to_string(),
            "Cannot change mode for other users".to_string(),
        ],
    )
}

/// RPL_NAMREPLY (353) followed by RPL_ENDOFNAMES (366).
///
/// Members are listed in the order given. With no members only the
/// terminator is produced.
pub fn names_reply(server_name: &str, nick: &str, channel: &str, members: &[String]) -> Vec<Message> {
    let mut replies = Vec::with_capacity(2);
    if !members.is_empty() {
        replies.push(server_reply(
            server_name,
            Response::RPL_NAMREPLY,
            vec![
                nick.to_string(),
                "=".to_string(),
                channel.to_string(),
                members.join(" "),
            ],
        ));
    }
    replies.push(server_reply(
        server_name,
        Response::RPL_ENDOFNAMES,
        vec![
            nick.to_string(),
            channel.to_string(),
            "End of /NAMES list.".to_string(),
        ],
    ));
    replies
}
