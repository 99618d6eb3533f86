//! Core type definitions for keystone transactions.
//!
//! The signing core never interprets asset payloads beyond turning them into
//! canonical bytes. These types exist so that the bytes are well-defined.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction represents.
///
/// The numeric value is the first byte of the canonical encoding, so the
/// discriminants are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Plain value transfer.
    Transfer,
    /// Registration of an account's second-signature public key.
    Signature,
    /// Delegate registration.
    Delegate,
    /// Delegate vote.
    Vote,
    /// Multisignature group registration.
    Multisignature,
}

impl TransactionType {
    /// The byte written at the head of the canonical encoding.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Transfer => 0,
            Self::Signature => 1,
            Self::Delegate => 2,
            Self::Vote => 3,
            Self::Multisignature => 4,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => write!(f, "Transfer"),
            Self::Signature => write!(f, "Signature"),
            Self::Delegate => write!(f, "Delegate"),
            Self::Vote => write!(f, "Vote"),
            Self::Multisignature => write!(f, "Multisignature"),
        }
    }
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// Type-specific payload carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// No payload.
    None,
    /// Registers `public_key` (hex) as the sender's second-signature key.
    Signature {
        #[serde(rename = "publicKey")]
        public_key: String,
    },
    /// Opaque payload for asset types the signing core does not model.
    /// Hashed verbatim.
    Raw(Vec<u8>),
}

impl Default for Asset {
    fn default() -> Self {
        Self::None
    }
}

impl Asset {
    /// The second-signature key this asset registers, if any.
    pub fn second_public_key(&self) -> Option<&str> {
        match self {
            Self::Signature { public_key } => Some(public_key),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
