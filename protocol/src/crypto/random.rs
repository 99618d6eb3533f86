//! Throwaway random identifiers.
//!
//! Not security-sensitive. These exist for test fixtures and for minting
//! network hashes on fresh devnets; never derive a key from them.

use rand::{thread_rng, Rng};

const NETHASH_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const STRING_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789#$%^&*@";

/// Length of a generated network hash.
pub const NETHASH_LENGTH: usize = 8;

fn random_from(alphabet: &[u8], len: usize) -> String {
    let mut rng = thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

/// An 8-character lowercase alphanumeric network hash.
pub fn random_nethash() -> String {
    random_from(NETHASH_ALPHABET, NETHASH_LENGTH)
}

/// A string of exactly `max` characters drawn from letters, digits and
/// `#$%^&*@`.
pub fn random_string(max: usize) -> String {
    random_from(STRING_ALPHABET, max)
}
