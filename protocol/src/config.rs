//! # Protocol Configuration & Constants
//!
//! Every magic number in keystone lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these are consensus-visible: the address prefix ends up in every
//! account ID, the signature width is baked into the canonical byte layout,
//! and the fee is checked by every validator. Change them on devnet, not
//! after launch.

use chrono::{DateTime, TimeZone, Utc};

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Default token prefix prepended to every base58check address.
pub const TOKEN_PREFIX: char = 'D';

/// Length of the RIPEMD-160 digest that an address encodes.
pub const ADDRESS_HASH_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string reported by the node.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Signature scheme used for every account key.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Ed25519 seed length. The seed is `SHA-256(secret)`.
pub const SEED_LENGTH: usize = 32;

/// Public (verifying) key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Expanded private key length: `seed || public_key`, the NaCl layout.
pub const PRIVATE_KEY_LENGTH: usize = 64;

/// Ed25519 signature length. Always 64 bytes. The canonical byte layout
/// appends signatures at this fixed width, so it is not negotiable.
pub const SIGNATURE_LENGTH: usize = 64;

/// Hash output length in bytes (SHA-256).
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Entropy for generated mnemonics, in bytes. 16 bytes = 12 words.
pub const MNEMONIC_ENTROPY_BYTES: usize = 16;

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Number of base units in one whole token.
pub const FIXED_POINT: u64 = 100_000_000;

/// Fee for registering a second signature: 5 tokens.
pub const SIGNATURE_FEE: u64 = 5 * FIXED_POINT;

// ---------------------------------------------------------------------------
// Enrollment input limits
// ---------------------------------------------------------------------------

/// Upper bound on the length of a secret accepted over the API. Mnemonics
/// are well under this; anything longer is a client bug or an attack.
pub const MAX_SECRET_LENGTH: usize = 100;

// ---------------------------------------------------------------------------
// Balances sequence
// ---------------------------------------------------------------------------

/// Default upper bound on tasks waiting in the balances sequence.
pub const DEFAULT_SEQUENCE_MAX_PENDING: usize = 1_000;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Network epoch as a Unix timestamp (2017-11-20T04:00:00Z). Transaction
/// timestamps count seconds from here so they fit in a `u32`.
pub const EPOCH_UNIX_SECONDS: i64 = 1_511_150_400;

/// The network epoch as a `DateTime`.
pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH_UNIX_SECONDS, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Seconds elapsed since the network epoch, saturating at the `u32` range.
pub fn epoch_time(now: DateTime<Utc>) -> u32 {
    let delta = now.timestamp() - EPOCH_UNIX_SECONDS;
    delta.clamp(0, u32::MAX as i64) as u32
}
