//! # Cryptographic Primitives for keystone
//!
//! The foundation of everything security-related in the node. Every key,
//! every hash, every signature flows through here.
//!
//! Primitives in use:
//!
//! - **Ed25519** for signatures.
//! - **SHA-256** for seeds, IDs and signing digests.
//! - **RIPEMD-160** (over SHA-256) for address digests.
//! - **BIP-39** for human-writable secrets.
//!
//! Everything here is pure and side-effect free: safe to call from any
//! number of tasks at once, no locks, no I/O.

pub mod hash;
pub mod keys;
pub mod mnemonic;
pub mod random;
pub mod signatures;

pub use hash::{hash160, sha256, sha256_array};
pub use keys::{KeyError, Keypair, PublicKey, Signature};
pub use mnemonic::{generate_secret, is_valid_secret};
pub use random::{random_nethash, random_string};
pub use signatures::{sign, verify, verify_hex};
