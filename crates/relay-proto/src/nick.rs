//! Nickname validation utilities.
//!
//! A nickname is an ASCII letter followed by up to eight ASCII letters,
//! digits or underscores.

/// Extension trait for checking if a string is a valid nickname.
pub trait NickExt {
    /// Check if this string is a valid nickname.
    ///
    /// # Examples
    ///
    /// ```
    /// use relay_proto::NickExt;
    ///
    /// assert!("alice".is_valid_nick());
    /// assert!("bob_42".is_valid_nick());
    ///
    /// assert!(!"9lives".is_valid_nick());     // must start with a letter
    /// assert!(!"".is_valid_nick());           // empty
    /// assert!(!"toolongnick".is_valid_nick()); // more than nine characters
    /// ```
    fn is_valid_nick(&self) -> bool;
}

/// Maximum nickname length.
const NICK_MAX_LEN: usize = 9;

impl NickExt for &str {
    fn is_valid_nick(&self) -> bool {
        if self.is_empty() || self.len() > NICK_MAX_LEN {
            return false;
        }

        let mut chars = self.chars();

        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            _ => return false,
        }

        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl NickExt for String {
    fn is_valid_nick(&self) -> bool {
        self.as_str().is_valid_nick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_nicks() {
        assert!("nick".is_valid_nick());
        assert!("Nick".is_valid_nick());
        assert!("nick123".is_valid_nick());
        assert!("n".is_valid_nick());
        assert!("a_b_c".is_valid_nick());
        assert!("abcdefghi".is_valid_nick());
    }

    #[test]
    fn test_invalid_nicks() {
        assert!(!"".is_valid_nick());
        assert!(!"123nick".is_valid_nick());
        assert!(!"_nick".is_valid_nick());
        assert!(!"nick name".is_valid_nick());
        assert!(!"nick-name".is_valid_nick());
        assert!(!"[nick]".is_valid_nick());
        assert!(!"nïck".is_valid_nick());
    }

    #[test]
    fn test_length_limits() {
        assert!("abcdefghi".is_valid_nick());
        assert!(!"abcdefghij".is_valid_nick());
    }
}
