//! Case folding for nickname comparison.
//!
//! Nicknames are restricted to ASCII letters, digits and underscore, so a
//! plain ASCII fold is the whole mapping. Channel names are never folded.

/// Fold a nickname to its comparison key.
pub fn irc_to_lower(s: &str) -> String {
    s.to_ascii_lowercase()
}

/// Compare two nicknames case-insensitively.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
