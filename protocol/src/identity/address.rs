//! # Account Addresses
//!
//! An address is what users paste into payment forms. It is derived from the
//! account's Ed25519 public key:
//!
//! ```text
//! public_key (32 bytes)
//!     -> SHA-256 -> RIPEMD-160            (20 bytes)
//!     -> base58check                      (4-byte double-SHA-256 checksum)
//!     -> prefix char + encoded string     e.g. "D7Lp9w..."
//! ```
//!
//! The leading character is the network's token prefix. It is *not* part of
//! the checksummed payload, so validation has to check it separately.
//!
//! ## Allowed prefixes
//!
//! Validation is expressed against an [`AddressPrefixes`] set rather than a
//! single character, so a network that migrates prefixes can accept both
//! during the transition without special-casing every call site.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::config::{ADDRESS_HASH_LENGTH, TOKEN_PREFIX};
use crate::crypto::hash::hash160;
use crate::crypto::keys::{KeyError, PublicKey};

/// Errors that can occur while parsing an address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address prefix '{0}' is not allowed on this network")]
    InvalidPrefix(char),

    #[error("base58check decode failed: {0}")]
    Base58(String),

    #[error("invalid address payload length: expected {expected} bytes, got {got}")]
    InvalidPayloadLength { expected: usize, got: usize },

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Derive the address of a public key under the given prefix.
///
/// # Example
///
/// ```
/// use keystone_protocol::crypto::Keypair;
/// use keystone_protocol::identity::address::{derive_address, is_valid_address};
///
/// let kp = Keypair::from_secret("alpha");
/// let address = derive_address(&kp.public_key(), 'D');
/// assert!(address.starts_with('D'));
/// assert!(is_valid_address(&address, 'D'));
/// ```
pub fn derive_address(public_key: &PublicKey, prefix: char) -> String {
    let digest = hash160(public_key.as_bytes());
    let mut address = String::with_capacity(36);
    address.push(prefix);
    address.push_str(&bs58::encode(digest).with_check().into_string());
    address
}

/// Same as [`derive_address`], for a hex-encoded public key.
pub fn derive_address_hex(public_key_hex: &str, prefix: char) -> Result<String, AddressError> {
    let public_key = PublicKey::from_hex(public_key_hex)?;
    Ok(derive_address(&public_key, prefix))
}

/// Check an address against a single allowed prefix.
///
/// Fails closed: anything that does not decode is `false`.
pub fn is_valid_address(address: &str, prefix: char) -> bool {
    AddressPrefixes::single(prefix).is_valid(address)
}

/// The set of prefix characters a network accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPrefixes {
    allowed: BTreeSet<char>,
}

impl AddressPrefixes {
    /// A set containing exactly one prefix.
    pub fn single(prefix: char) -> Self {
        Self::new([prefix])
    }

    /// A set built from any collection of prefixes.
    pub fn new(prefixes: impl IntoIterator<Item = char>) -> Self {
        Self {
            allowed: prefixes.into_iter().collect(),
        }
    }

    /// Returns `true` if `prefix` is allowed.
    pub fn contains(&self, prefix: char) -> bool {
        self.allowed.contains(&prefix)
    }

    /// Returns `true` if the address carries an allowed prefix and its body
    /// is a well-formed base58check string.
    pub fn is_valid(&self, address: &str) -> bool {
        let Some((prefix, body)) = split_prefix(address) else {
            return false;
        };
        if bs58::decode(body).with_check(None).into_vec().is_err() {
            return false;
        }
        self.contains(prefix)
    }

    /// Decode an address into its 20-byte public key digest.
    ///
    /// Stricter than [`is_valid`](Self::is_valid): the payload must also be
    /// exactly the length `derive_address` produces.
    pub fn decode(&self, address: &str) -> Result<[u8; ADDRESS_HASH_LENGTH], AddressError> {
        let (prefix, body) = split_prefix(address).ok_or(AddressError::Empty)?;
        let payload = bs58::decode(body)
            .with_check(None)
            .into_vec()
            .map_err(|e| AddressError::Base58(e.to_string()))?;
        if !self.contains(prefix) {
            return Err(AddressError::InvalidPrefix(prefix));
        }
        payload
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidPayloadLength {
                expected: ADDRESS_HASH_LENGTH,
                got: payload.len(),
            })
    }
}

impl Default for AddressPrefixes {
    fn default() -> Self {
        Self::single(TOKEN_PREFIX)
    }
}

impl fmt::Display for AddressPrefixes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: String = self.allowed.iter().collect();
        write!(f, "[{}]", joined)
    }
}

fn split_prefix(address: &str) -> Option<(char, &str)> {
    let mut chars = address.chars();
    let prefix = chars.next()?;
    Some((prefix, chars.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

    fn alpha_address() -> String {
        derive_address(&Keypair::from_secret("alpha").public_key(), 'D')
    }

    #[test]
    fn derivation_is_deterministic() {
        assert_eq!(alpha_address(), alpha_address());
        assert!(alpha_address().starts_with('D'));
    }

    #[test]
    fn known_answer_addresses() {
        assert_eq!(alpha_address(), "D6A9MdxuELBydG9N36Xmgf31eWQV8ovfdu");
        assert_eq!(
            derive_address(&Keypair::from_secret("beta").public_key(), 'D'),
            "D46EuajcwgPyfRRhksQLRqMAfjH96KnwhX"
        );
    }

    #[test]
    fn derived_address_round_trips() {
        for secret in ["alpha", "beta", "gamma", ""] {
            let pk = Keypair::from_secret(secret).public_key();
            for prefix in ['D', 'E', 'x'] {
                assert!(is_valid_address(&derive_address(&pk, prefix), prefix));
            }
        }
    }

    #[test]
    fn hex_derivation_matches_typed_derivation() {
        let kp = Keypair::from_secret("alpha");
        assert_eq!(
            derive_address_hex(&kp.public_key_hex(), 'D').unwrap(),
            alpha_address()
        );
        assert!(derive_address_hex("nope", 'D').is_err());
    }

    #[test]
    fn decode_recovers_hash160() {
        let kp = Keypair::from_secret("alpha");
        let digest = AddressPrefixes::single('D').decode(&alpha_address()).unwrap();
        assert_eq!(digest, hash160(kp.public_key().as_bytes()));
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        assert!(!is_valid_address(&alpha_address(), 'E'));
        assert_eq!(
            AddressPrefixes::single('E').decode(&alpha_address()),
            Err(AddressError::InvalidPrefix('D'))
        );
    }

    #[test]
    fn empty_and_garbage_are_rejected() {
        assert!(!is_valid_address("", 'D'));
        assert!(!is_valid_address("D", 'D'));
        assert!(!is_valid_address("D0OIl", 'D'));
        assert!(!is_valid_address("Dnot-base58!", 'D'));
    }

    #[test]
    fn every_single_character_flip_is_rejected() {
        let address = alpha_address();
        for (i, original) in address.char_indices() {
            let replacement = BASE58_ALPHABET
                .chars()
                .find(|&c| c != original)
                .unwrap();
            let mut tampered = String::with_capacity(address.len());
            tampered.push_str(&address[..i]);
            tampered.push(replacement);
            tampered.push_str(&address[i + original.len_utf8()..]);
            assert!(
                !is_valid_address(&tampered, 'D'),
                "tampered address {} accepted",
                tampered
            );
        }
    }

    #[test]
    fn multi_prefix_set_accepts_each_member() {
        let prefixes = AddressPrefixes::new(['D', 'E']);
        let pk = Keypair::from_secret("alpha").public_key();
        assert!(prefixes.is_valid(&derive_address(&pk, 'D')));
        assert!(prefixes.is_valid(&derive_address(&pk, 'E')));
        assert!(!prefixes.is_valid(&derive_address(&pk, 'F')));
        assert_eq!(prefixes.to_string(), "[DE]");
    }
}
