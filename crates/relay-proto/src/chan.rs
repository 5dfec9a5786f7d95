//! Channel name utilities.
//!
//! Channel names are case-sensitive and need no particular prefix, but they
//! travel as a single middle parameter, so anything that would split or
//! terminate a parameter is refused.

/// Longest accepted channel name, in characters.
pub const CHANNEL_MAX_LEN: usize = 50;

/// Extension trait for checking if a string is a usable channel name.
pub trait ChannelExt {
    /// Check if this string is a valid channel name.
    ///
    /// Valid channel names:
    /// - Are 1 to [`CHANNEL_MAX_LEN`] characters long
    /// - Do not start with ':'
    /// - Do not contain whitespace, comma or control characters
    fn is_channel_name(&self) -> bool;
}

impl ChannelExt for str {
    fn is_channel_name(&self) -> bool {
        if self.is_empty() || self.starts_with(':') {
            return false;
        }
        if self.chars().count() > CHANNEL_MAX_LEN {
            return false;
        }
        !self
            .chars()
            .any(|c| c == ',' || c.is_whitespace() || c.is_control())
    }
}

impl ChannelExt for String {
    fn is_channel_name(&self) -> bool {
        self.as_str().is_channel_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_channels() {
        assert!("#channel".is_channel_name());
        assert!("&local".is_channel_name());
        assert!("lobby".is_channel_name());
        assert!("#ünïcode".is_channel_name());
    }

    #[test]
    fn test_invalid_channels() {
        assert!(!"".is_channel_name());
        assert!(!"#chan nel".is_channel_name());
        assert!(!"#chan\tnel".is_channel_name());
        assert!(!"#chan,nel".is_channel_name());
        assert!(!"#bell\x07".is_channel_name());
        assert!(!":#chan".is_channel_name());
        assert!(!"#".repeat(CHANNEL_MAX_LEN + 1).is_channel_name());
    }
}
