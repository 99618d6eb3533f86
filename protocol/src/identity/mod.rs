//! # Identity Module
//!
//! Everything needed to go from "a string the user remembers" to "an account
//! the network recognises":
//!
//! 1. **Secret**: a BIP-39 mnemonic or any passphrase ([`crate::crypto::mnemonic`]).
//! 2. **Keypair**: Ed25519, seeded with `SHA-256(secret)` ([`crate::crypto::keys`]).
//! 3. **Address**: prefix + base58check(hash160(public key)) ([`address`]).
//!
//! All three steps are pure functions. Nothing here touches storage.

pub mod address;

pub use crate::crypto::keys::{Keypair, PublicKey, Signature};
pub use address::{derive_address, derive_address_hex, is_valid_address, AddressError, AddressPrefixes};
