//! Numeric response codes.
//!
//! Only the numerics the relay actually emits are modelled. Names follow
//! RFC 2812, including its historical spelling of `ERR_ALREADYREGISTRED`.

#![allow(non_camel_case_types)]

use std::fmt;

/// Server response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Response {
    /// 001 - Welcome to the network
    RPL_WELCOME = 1,
    /// 221 - Current user modes
    RPL_UMODEIS = 221,
    /// 315 - End of WHO list
    RPL_ENDOFWHO = 315,
    /// 321 - Start of LIST
    RPL_LISTSTART = 321,
    /// 322 - One LIST entry
    RPL_LIST = 322,
    /// 323 - End of LIST
    RPL_LISTEND = 323,
    /// 324 - Current channel modes
    RPL_CHANNELMODEIS = 324,
    /// 352 - One WHO entry
    RPL_WHOREPLY = 352,
    /// 353 - NAMES member list
    RPL_NAMREPLY = 353,
    /// 366 - End of NAMES list
    RPL_ENDOFNAMES = 366,
    /// 372 - MOTD body line
    RPL_MOTD = 372,
    /// 375 - MOTD start
    RPL_MOTDSTART = 375,
    /// 376 - MOTD end
    RPL_ENDOFMOTD = 376,
    /// 403 - No such channel
    ERR_NOSUCHCHANNEL = 403,
    /// 421 - Unknown command
    ERR_UNKNOWNCOMMAND = 421,
    /// 432 - Erroneous nickname
    ERR_ERRONEOUSNICKNAME = 432,
    /// 433 - Nickname is already in use
    ERR_NICKNAMEINUSE = 433,
    /// 442 - You're not on that channel
    ERR_NOTONCHANNEL = 442,
    /// 443 - Already on channel
    ERR_USERONCHANNEL = 443,
    /// 451 - You have not registered
    ERR_NOTREGISTERED = 451,
    /// 461 - Not enough parameters
    ERR_NEEDMOREPARAMS = 461,
    /// 462 - You may not reregister
    ERR_ALREADYREGISTRED = 462,
    /// 502 - Cannot change mode for other users
    ERR_USERSDONTMATCH = 502,
}

impl Response {
    /// Returns the numeric code as u16
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Creates a Response from a numeric code
    pub fn from_code(code: u16) -> Option<Response> {
        let resp = match code {
            1 => Response::RPL_WELCOME,
            221 => Response::RPL_UMODEIS,
            315 => Response::RPL_ENDOFWHO,
            321 => Response::RPL_LISTSTART,
            322 => Response::RPL_LIST,
            323 => Response::RPL_LISTEND,
            324 => Response::RPL_CHANNELMODEIS,
            352 => Response::RPL_WHOREPLY,
            353 => Response::RPL_NAMREPLY,
            366 => Response::RPL_ENDOFNAMES,
            372 => Response::RPL_MOTD,
            375 => Response::RPL_MOTDSTART,
            376 => Response::RPL_ENDOFMOTD,
            403 => Response::ERR_NOSUCHCHANNEL,
            421 => Response::ERR_UNKNOWNCOMMAND,
            432 => Response::ERR_ERRONEOUSNICKNAME,
            433 => Response::ERR_NICKNAMEINUSE,
            442 => Response::ERR_NOTONCHANNEL,
            443 => Response::ERR_USERONCHANNEL,
            451 => Response::ERR_NOTREGISTERED,
            461 => Response::ERR_NEEDMOREPARAMS,
            462 => Response::ERR_ALREADYREGISTRED,
            502 => Response::ERR_USERSDONTMATCH,
            _ => return None,
        };
        Some(resp)
    }

    /// Check if this is an error response (4xx, 5xx)
    #[inline]
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.code())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for resp in [
            Response::RPL_WELCOME,
            Response::RPL_NAMREPLY,
            Response::ERR_NICKNAMEINUSE,
            Response::ERR_USERSDONTMATCH,
        ] {
            assert_eq!(Response::from_code(resp.code()), Some(resp));
        }
        assert_eq!(Response::from_code(999), None);
    }

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(Response::RPL_WELCOME.to_string(), "001");
        assert_eq!(Response::ERR_NOTONCHANNEL.to_string(), "442");
    }

    #[test]
    fn test_is_error() {
        assert!(Response::ERR_NOTREGISTERED.is_error());
        assert!(!Response::RPL_ENDOFNAMES.is_error());
    }
}
