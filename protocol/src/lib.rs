// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # keystone: Identity & Signing Core
//!
//! Everything between "a passphrase the user typed" and "a transaction the
//! network will accept": deterministic Ed25519 keys, prefixed base58check
//! addresses, the canonical byte layout every signature is computed over,
//! two-factor (second-passphrase) signing, and the workflow that registers
//! a second passphrase, including on behalf of a multisignature account.
//!
//! ## Architecture
//!
//! - **crypto**: Hashes, keys, signatures, mnemonics. Pure functions only.
//! - **identity**: Addresses and the allowed-prefix set.
//! - **transaction**: Build, hash, sign, second-sign, verify.
//! - **enrollment**: Second-signature registration, direct or delegated.
//! - **sequence**: The single-writer queue that orders account mutations.
//! - **storage**: Account state and the store trait.
//! - **network**: Transaction admission and the pending pool.
//! - **config**: Protocol constants.
//!
//! ## Design Philosophy
//!
//! 1. Key derivation, hashing, and verification are pure and run anywhere,
//!    in parallel, without locks.
//! 2. Anything that reads account state and then changes it goes through
//!    the balances sequence. One at a time, in order, no exceptions.
//! 3. A signature that fails to verify is `false`. Input that cannot even be
//!    decoded is an error. Never mix the two up.
//! 4. If it touches money, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod enrollment;
pub mod identity;
pub mod network;
pub mod sequence;
pub mod storage;
pub mod transaction;
