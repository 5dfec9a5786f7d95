//! Session identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a session.
pub type Uid = String;

/// Generates sequential session IDs encoded in base36.
///
/// IDs are at least six characters wide and zero-padded, so they sort in
/// allocation order: "000000", "000001", ..., "00000Z", "000010".
pub struct UidGenerator {
    counter: AtomicU64,
}

const UID_MIN_WIDTH: usize = 6;

impl UidGenerator {
    /// Create a generator whose first ID is "000000".
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Generate the next unique UID.
    pub fn next(&self) -> Uid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        base36_encode(n)
    }
}

impl Default for UidGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a number in base36, left-padded with '0' to the minimum width.
fn base36_encode(mut n: u64) -> String {
    const CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut digits = Vec::with_capacity(UID_MIN_WIDTH);

    loop {
        digits.push(CHARS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    while digits.len() < UID_MIN_WIDTH {
        digits.push(b'0');
    }
    digits.reverse();

    String::from_utf8_lossy(&digits).into_owned()
}
