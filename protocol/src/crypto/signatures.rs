//! # Digital Signatures
//!
//! Thin Ed25519 sign/verify wrappers. Primary, second, and co-signatures on
//! transactions are all produced and checked here.
//!
//! Garbage input and a wrong signature are kept apart: the first is a
//! [`KeyError`], the second is `false`.

use super::keys::{Keypair, KeyError, PublicKey, Signature};

/// Sign a message using an account keypair.
///
/// # Example
///
/// ```
/// use keystone_protocol::crypto::{Keypair, sign, verify};
///
/// let keypair = Keypair::from_secret("alpha");
/// let signature = sign(&keypair, b"hello");
/// assert!(verify(&keypair.public_key(), b"hello", &signature));
/// ```
pub fn sign(keypair: &Keypair, message: &[u8]) -> Signature {
    keypair.sign(message)
}

/// Verify an Ed25519 signature against a public key and message.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    public_key.verify(message, signature)
}

/// Verify a signature given hex-encoded key and signature.
///
/// This is the "I got these strings off the wire" variant. Malformed hex or
/// wrong lengths are `Err`; a well-formed signature that does not verify is
/// `Ok(false)`.
pub fn verify_hex(
    public_key_hex: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<bool, KeyError> {
    let public_key = PublicKey::from_hex(public_key_hex)?;
    let signature = Signature::from_hex(signature_hex)?;
    Ok(verify(&public_key, message, &signature))
}
