//! Hashing and random token helpers.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Uppercase letters and digits.
pub const UPPER_ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Computes the SHA-256 hash of the input and returns it as a lowercase hex string.
///
/// Refresh tokens are stored only in this form.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a random string of `len` characters drawn from `alphabet`.
pub fn random_string(len: usize, alphabet: &[u8]) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}
