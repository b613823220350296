//! Unpredictable identifiers.
//!
//! All randomness comes from `rand::rng()`, a ChaCha-based CSPRNG seeded and
//! periodically reseeded from the operating system.

use chrono::Utc;
use rand::RngCore;

/// 12 bytes, rendered as 24 hex characters.
pub const INVITE_ID_BYTES: usize = 12;

const DEFAULT_RANDOM_BYTES: usize = 8;

/// `bytes` random bytes as lowercase hex (`2 * bytes` characters).
pub fn secure_random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Invite identifier. Entropy is the only uniqueness guarantee; no store lookup is made.
pub fn new_invite_id() -> String {
    secure_random_hex(INVITE_ID_BYTES)
}

/// `{prefix}_{epoch millis in base36}_{16 hex}`
pub fn secure_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    format!(
        "{}_{}_{}",
        prefix,
        to_base36(millis),
        secure_random_hex(DEFAULT_RANDOM_BYTES)
    )
}

/// `{prefix}_{16 hex}`
pub fn short_id(prefix: &str) -> String {
    format!("{}_{}", prefix, secure_random_hex(DEFAULT_RANDOM_BYTES))
}

pub fn transaction_id() -> String {
    secure_id("tx")
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
