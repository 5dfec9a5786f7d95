//! Protocol commands.
//!
//! [`Command::new`] turns a verb and its whitespace-separated tokens into a
//! typed command, enforcing each verb's minimum arity. Free-text arguments
//! (message bodies, reasons, real names) are the remaining tokens joined
//! with single spaces, with one leading `:` stripped.

use std::fmt::{self, Write};

use crate::error::CommandError;
use crate::response::Response;

/// A protocol command with its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Command {
    /// `NICK <nickname>`
    NICK(String),
    /// `USER <username> <mode> <unused> <realname...>`
    USER(String, String, String),
    /// `PING <token> [<token2>]`
    PING(String, Option<String>),
    /// `PONG [<server>] [<token>]`
    PONG(Option<String>, Option<String>),
    /// `JOIN <channel>{,<channel>}`
    JOIN(String),
    /// `PART <channel>{,<channel>} [<reason...>]`
    PART(String, Option<String>),
    /// `QUIT [<reason...>]`
    QUIT(Option<String>),
    /// `PRIVMSG <target> <text...>`
    PRIVMSG(String, String),
    /// `NAMES <channel>`
    NAMES(String),
    /// `LIST`
    LIST,
    /// `MODE <target> [<modes>...]`
    MODE(String, Vec<String>),
    /// `WHO <channel>`
    WHO(String),
    /// `ERROR <text...>` (server to client only)
    ERROR(String),
    /// Numeric reply: code plus arguments, the last one being free text.
    Response(Response, Vec<String>),
}

impl Command {
    /// Build a command from a verb and its raw argument tokens.
    ///
    /// The verb is matched case-insensitively.
    pub fn new(verb: &str, tokens: &[&str]) -> Result<Command, CommandError> {
        let upper = verb.to_ascii_uppercase();
        let mut args = collect_args(tokens, free_text_position(&upper)).into_iter();
        let verb = upper.as_str();

        let cmd = match verb {
            "NICK" => Command::NICK(required(&mut args, verb)?),
            "USER" => {
                let username = required(&mut args, verb)?;
                let mode = required(&mut args, verb)?;
                let _unused = required(&mut args, verb)?;
                let realname = required(&mut args, verb)?;
                Command::USER(username, mode, realname)
            }
            "PING" => Command::PING(required(&mut args, verb)?, args.next()),
            "PONG" => Command::PONG(args.next(), args.next()),
            "JOIN" => Command::JOIN(required(&mut args, verb)?),
            "PART" => Command::PART(required(&mut args, verb)?, non_empty(args.next())),
            "QUIT" => Command::QUIT(non_empty(args.next())),
            "PRIVMSG" => {
                let target = required(&mut args, verb)?;
                let text = non_empty(args.next())
                    .ok_or_else(|| CommandError::NeedMoreParams(upper.clone()))?;
                Command::PRIVMSG(target, text)
            }
            "NAMES" => Command::NAMES(required(&mut args, verb)?),
            "LIST" => Command::LIST,
            "MODE" => Command::MODE(required(&mut args, verb)?, args.collect()),
            "WHO" => Command::WHO(required(&mut args, verb)?),
            "ERROR" => Command::ERROR(required(&mut args, verb)?),
            numeric if numeric.len() == 3 && numeric.bytes().all(|b| b.is_ascii_digit()) => {
                let resp = numeric
                    .parse::<u16>()
                    .ok()
                    .and_then(Response::from_code)
                    .ok_or_else(|| CommandError::UnknownCommand(upper.clone()))?;
                Command::Response(resp, args.collect())
            }
            _ => return Err(CommandError::UnknownCommand(upper)),
        };

        Ok(cmd)
    }

    /// The verb used to route this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::NICK(_) => "NICK",
            Command::USER(..) => "USER",
            Command::PING(..) => "PING",
            Command::PONG(..) => "PONG",
            Command::JOIN(_) => "JOIN",
            Command::PART(..) => "PART",
            Command::QUIT(_) => "QUIT",
            Command::PRIVMSG(..) => "PRIVMSG",
            Command::NAMES(_) => "NAMES",
            Command::LIST => "LIST",
            Command::MODE(..) => "MODE",
            Command::WHO(_) => "WHO",
            Command::ERROR(_) => "ERROR",
            Command::Response(..) => "NUMERIC",
        }
    }
}

/// Index of the argument where a verb's free-text trailer starts.
fn free_text_position(verb: &str) -> Option<usize> {
    match verb {
        "QUIT" | "ERROR" => Some(0),
        "PART" | "PRIVMSG" => Some(1),
        "USER" => Some(3),
        _ => None,
    }
}

/// Split tokens into arguments, folding the trailer into one argument.
///
/// The trailer starts at the first token beginning with `:` or at the
/// verb's free-text position, whichever comes first.
fn collect_args(tokens: &[&str], free_at: Option<usize>) -> Vec<String> {
    let mut args = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        if token.starts_with(':') || free_at == Some(i) {
            let rest = tokens[i..].join(" ");
            let rest = rest.strip_prefix(':').unwrap_or(&rest);
            args.push(rest.to_string());
            break;
        }
        args.push((*token).to_string());
    }
    args
}

fn required(args: &mut impl Iterator<Item = String>, verb: &str) -> Result<String, CommandError> {
    args.next()
        .ok_or_else(|| CommandError::NeedMoreParams(verb.to_string()))
}

fn non_empty(arg: Option<String>) -> Option<String> {
    arg.filter(|a| !a.is_empty())
}

fn write_command(
    f: &mut fmt::Formatter<'_>,
    verb: &str,
    middle: &[&str],
    trailing: Option<&str>,
) -> fmt::Result {
    f.write_str(verb)?;
    for arg in middle {
        f.write_char(' ')?;
        f.write_str(arg)?;
    }
    if let Some(text) = trailing {
        f.write_str(" :")?;
        f.write_str(text)?;
    }
    Ok(())
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::NICK(nick) => write_command(f, "NICK", &[nick], None),
            Command::USER(user, mode, realname) => {
                write_command(f, "USER", &[user, mode, "*"], Some(realname))
            }
            Command::PING(token, None) => write_command(f, "PING", &[], Some(token)),
            Command::PING(server, Some(token)) => {
                write_command(f, "PING", &[server], Some(token))
            }
            Command::PONG(None, _) => f.write_str("PONG"),
            Command::PONG(Some(token), None) => write_command(f, "PONG", &[], Some(token)),
            Command::PONG(Some(server), Some(token)) => {
                write_command(f, "PONG", &[server], Some(token))
            }
            Command::JOIN(chan) => write_command(f, "JOIN", &[chan], None),
            Command::PART(chan, reason) => write_command(f, "PART", &[chan], reason.as_deref()),
            Command::QUIT(reason) => write_command(f, "QUIT", &[], reason.as_deref()),
            Command::PRIVMSG(target, text) => write_command(f, "PRIVMSG", &[target], Some(text)),
            Command::NAMES(chan) => write_command(f, "NAMES", &[chan], None),
            Command::LIST => f.write_str("LIST"),
            Command::MODE(target, modes) => {
                let mut middle: Vec<&str> = vec![target];
                middle.extend(modes.iter().map(String::as_str));
                write_command(f, "MODE", &middle, None)
            }
            Command::WHO(chan) => write_command(f, "WHO", &[chan], None),
            Command::ERROR(text) => write_command(f, "ERROR", &[], Some(text)),
            Command::Response(resp, args) => {
                let code = resp.to_string();
                match args.split_last() {
                    Some((last, middle)) => {
                        let middle: Vec<&str> = middle.iter().map(String::as_str).collect();
                        write_command(f, &code, &middle, Some(last))
                    }
                    None => f.write_str(&code),
                }
            }
        }
    }
}
