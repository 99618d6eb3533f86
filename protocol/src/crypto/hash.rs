//! # Hashing Utilities
//!
//! Two hash functions, and we refuse to support more without a very good
//! reason:
//!
//! - **SHA-256**: everything canonical. Secrets are hashed into Ed25519
//!   seeds with it, transaction IDs are SHA-256 of the canonical bytes, and
//!   signatures are computed over a SHA-256 digest rather than the raw bytes.
//!
//! - **RIPEMD-160**: only ever applied on top of SHA-256, to squeeze a
//!   public key into the 20 bytes an address encodes. Same `hash160`
//!   construction Bitcoin uses, for the same reason: short addresses with
//!   no loss of collision resistance that matters in practice.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// Returns a 32-byte digest as a `Vec<u8>`, for callers that want owned
/// bytes. Use [`sha256_array`] on hot paths.
///
/// # Example
///
/// ```
/// use keystone_protocol::crypto::sha256;
///
/// let hash = sha256(b"keystone");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    sha256_array(data).to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute `RIPEMD-160(SHA-256(data))`.
///
/// The 20-byte digest is what an address encodes. Never used on its own
/// for anything signature-related.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let inner = sha256_array(data);
    let mut hasher = Ripemd160::new();
    hasher.update(inner);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of empty string, the canonical test vector everyone should
        // have memorized by now.
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash, expected);
    }

    #[test]
    fn test_sha256_array_matches_vec() {
        let vec_result = sha256(b"test data");
        let arr_result = sha256_array(b"test data");
        assert_eq!(vec_result.as_slice(), arr_result.as_slice());
    }

    #[test]
    fn hash160_known_vector() {
        // hash160 of the empty string, same value Bitcoin tooling reports.
        let digest = hash160(b"");
        assert_eq!(
            hex::encode(digest),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }

    #[test]
    fn hash160_differs_from_truncated_sha256() {
        let digest = hash160(b"keystone");
        assert_ne!(&digest[..], &sha256(b"keystone")[..20]);
    }
}
