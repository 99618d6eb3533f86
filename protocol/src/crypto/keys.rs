//! # Key Management
//!
//! Deterministic Ed25519 keypairs derived from a human-memorable secret.
//!
//! Every account in keystone is one of these. The derivation is deliberately
//! boring:
//!
//! ```text
//! secret (utf-8) --SHA-256--> 32-byte seed --Ed25519--> (public key, private key)
//! ```
//!
//! No salt, no randomness, no KDF stretching. The same secret produces the
//! same keypair on every node and in every client, forever. That is the whole
//! contract: a user who remembers their passphrase can always get back in.
//!
//! ## Security considerations
//!
//! - Keypairs are created fresh per derivation and never cached.
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - Key bytes are never logged. If you add logging to this module,
//!   you will be asked to leave.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

use super::hash::sha256_array;
use crate::config::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Errors that can occur while decoding key and signature material.
///
/// These are *input* errors: the bytes handed to us were not even the right
/// shape. They are never returned for a signature that simply fails to
/// verify: that is a plain `false`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("malformed hex: {0}")]
    MalformedHex(String),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("field too long to encode: {0} bytes")]
    FieldTooLong(usize),
}

/// Decode a hex string into exactly `N` bytes.
pub(crate) fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], KeyError> {
    let bytes = hex::decode(s).map_err(|e| KeyError::MalformedHex(e.to_string()))?;
    bytes.as_slice().try_into().map_err(|_| KeyError::InvalidLength {
        expected: N,
        got: bytes.len(),
    })
}

/// An account keypair wrapping an Ed25519 signing key.
///
/// `Keypair` intentionally does NOT implement `Serialize`/`Deserialize`.
/// Exporting private key material should be a deliberate act: call
/// [`private_key_hex`](Self::private_key_hex) explicitly.
///
/// # Examples
///
/// ```
/// use keystone_protocol::crypto::keys::Keypair;
///
/// let kp = Keypair::from_secret("alpha");
/// let again = Keypair::from_secret("alpha");
/// assert_eq!(kp.public_key(), again.public_key());
/// ```
pub struct Keypair {
    signing_key: SigningKey,
}

/// The public half of an account key, safe to share with the world.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

/// A detached Ed25519 signature. Always exactly 64 bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; SIGNATURE_LENGTH],
}

impl Keypair {
    /// Derive the keypair for a secret: `seed = SHA-256(secret)`.
    ///
    /// Works for any string: a BIP-39 mnemonic, a passphrase, or `"alpha"`.
    /// Whether the secret is *good* is [`is_valid_secret`]'s problem, not ours.
    ///
    /// [`is_valid_secret`]: crate::crypto::mnemonic::is_valid_secret
    pub fn from_secret(secret: &str) -> Self {
        let seed = sha256_array(secret.as_bytes());
        Self::from_seed(&seed)
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Generate a keypair from OS randomness. Only useful for tests and
    /// throwaway identities. Real accounts come from a secret.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Hex of the 32-byte public key.
    pub fn public_key_hex(&self) -> String {
        self.public_key().to_hex()
    }

    /// Hex of the 64-byte expanded private key (`seed || public_key`).
    ///
    /// **Handle with extreme care.** This is the NaCl secret-key layout that
    /// clients expect. Don't log it, don't put it in a JSON response.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_keypair_bytes())
    }

    /// Sign a message and return a detached [`Signature`].
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }

    /// Verify a signature against this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.public_key().verify(message, signature)
    }
}

impl Clone for Keypair {
    /// Cloning a keypair is allowed but should make you uncomfortable.
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material in debug output. Not even "partially."
        write!(f, "Keypair(pub={})", self.public_key_hex())
    }
}

impl PartialEq for Keypair {
    /// Two keypairs are equal if their public keys match. Comparing secret
    /// material in non-constant time is a bad habit.
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for Keypair {}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Create a `PublicKey` from raw bytes without curve validation.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Parse a hex-encoded public key.
    ///
    /// Rejects bad hex, wrong length, and byte strings that are not a valid
    /// Ed25519 point.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = decode_fixed::<PUBLIC_KEY_LENGTH>(s)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Hex-encoded representation. 64 characters for 32 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Verify a detached signature against this public key.
    ///
    /// Returns `false` for any failure, including key bytes that don't
    /// decode to a curve point. Callers that need to tell "bad input" from
    /// "bad signature" validate the key with [`from_hex`](Self::from_hex)
    /// first.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let dalek_sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }
}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Parse a hex-encoded signature (128 hex characters).
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        Ok(Self {
            bytes: decode_fixed::<SIGNATURE_LENGTH>(s)?,
        })
    }

    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.bytes
    }

    /// Returns the hex-encoded signature string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_secret_is_deterministic() {
        let kp1 = Keypair::from_secret("alpha");
        let kp2 = Keypair::from_secret("alpha");
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.private_key_hex(), kp2.private_key_hex());
    }

    #[test]
    fn different_secrets_different_keys() {
        let kp1 = Keypair::from_secret("alpha");
        let kp2 = Keypair::from_secret("beta");
        assert_ne!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn from_secret_known_answers() {
        assert_eq!(
            Keypair::from_secret("alpha").public_key_hex(),
            "ed75adf92762301247705bfb51761f4e66d7747c529cc3a38cfd0ddcb056fc9c"
        );
        assert_eq!(
            Keypair::from_secret("beta").public_key_hex(),
            "625f58947b9fb9162c0907a07427ee261edce4d4a5b0c2c975287f42c61041b9"
        );
    }

    #[test]
    fn from_secret_equals_from_sha256_seed() {
        let seed = sha256_array(b"alpha");
        assert_eq!(Keypair::from_secret("alpha"), Keypair::from_seed(&seed));
    }

    #[test]
    fn private_key_is_seed_then_public_key() {
        let kp = Keypair::from_secret("alpha");
        let private = kp.private_key_hex();
        assert_eq!(private.len(), 128);
        assert_eq!(&private[..64], hex::encode(sha256_array(b"alpha")));
        assert_eq!(&private[64..], kp.public_key_hex());
    }

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = Keypair::from_secret("alpha");
        let sig = kp.sign(b"register second signature");
        assert!(kp.verify(b"register second signature", &sig));
        assert!(!kp.verify(b"something else", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.verify(b"message", &sig));
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let pk = Keypair::from_secret("alpha").public_key();
        assert_eq!(PublicKey::from_hex(&pk.to_hex()).unwrap(), pk);
    }

    #[test]
    fn public_key_from_hex_rejects_malformed_input() {
        assert!(matches!(
            PublicKey::from_hex("not-hex"),
            Err(KeyError::MalformedHex(_))
        ));
        assert_eq!(
            PublicKey::from_hex("deadbeef"),
            Err(KeyError::InvalidLength {
                expected: 32,
                got: 4
            })
        );
    }

    #[test]
    fn signature_hex_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"test");
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);
        assert!(Signature::from_hex(&"ab".repeat(63)).is_err());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::from_secret("alpha");
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("Keypair(pub="));
        assert!(!debug_str.contains(&kp.private_key_hex()[..64]));
    }
}
