//! Canonical byte serialization and hashing of transactions.
//!
//! Signatures and IDs are computed over these bytes, so the layout is part of
//! the protocol. Changing it invalidates every signature ever produced.
//!
//! ```text
//! offset  field                   encoding
//! ------  ----------------------  ------------------------------------------
//! 0       type                    u8
//! 1       timestamp               u32 little-endian
//! 5       sender_public_key       32 raw bytes
//! 37      requester_public_key    u8 presence flag, then 32 raw bytes if 1
//!         recipient_id            u8 presence flag, then u32 LE length + utf-8
//!         amount                  u64 little-endian
//!         fee                     u64 little-endian
//!         message                 u8 presence flag, then u32 LE length + utf-8
//!         asset                   u8 tag: 0 none, 1 signature (32 raw bytes),
//!                                 2 raw (u32 LE length + bytes)
//!         signature               64 raw bytes, unless skipped or absent
//!         sign_signature          64 raw bytes, unless skipped or absent
//! ```
//!
//! Every field before the signatures is self-delimiting, so two different
//! transactions never share the same bytes.
//!
//! The two signatures sit at the very end, in that order. That is what makes
//! the skip flags work: bytes with both skipped are exactly the bytes the
//! primary signer saw, and bytes with only the second skipped are exactly
//! what the second signer saw.

use super::builder::Transaction;
use super::types::Asset;
use crate::config::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::hash::sha256_array;
use crate::crypto::keys::{decode_fixed, KeyError};

/// Types with a deterministic, signature-aware byte encoding.
pub trait CanonicalBytes {
    /// Encode `self`, optionally leaving out the trailing signature fields.
    fn canonical_bytes(
        &self,
        skip_signature: bool,
        skip_second_signature: bool,
    ) -> Result<Vec<u8>, KeyError>;
}

impl CanonicalBytes for Transaction {
    fn canonical_bytes(
        &self,
        skip_signature: bool,
        skip_second_signature: bool,
    ) -> Result<Vec<u8>, KeyError> {
        let mut buf = Vec::with_capacity(256);

        buf.push(self.tx_type.as_byte());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&decode_fixed::<PUBLIC_KEY_LENGTH>(&self.sender_public_key)?);

        match &self.requester_public_key {
            Some(requester) => {
                buf.push(1);
                buf.extend_from_slice(&decode_fixed::<PUBLIC_KEY_LENGTH>(requester)?);
            }
            None => buf.push(0),
        }
        put_optional(&mut buf, self.recipient_id.as_deref().map(str::as_bytes))?;

        buf.extend_from_slice(&self.amount.to_le_bytes());
        buf.extend_from_slice(&self.fee.to_le_bytes());

        put_optional(&mut buf, self.message.as_deref().map(str::as_bytes))?;

        match &self.asset {
            Asset::None => buf.push(ASSET_NONE),
            Asset::Signature { public_key } => {
                buf.push(ASSET_SIGNATURE);
                buf.extend_from_slice(&decode_fixed::<PUBLIC_KEY_LENGTH>(public_key)?);
            }
            Asset::Raw(bytes) => {
                buf.push(ASSET_RAW);
                put_prefixed(&mut buf, bytes)?;
            }
        }

        if !skip_signature {
            if let Some(signature) = &self.signature {
                buf.extend_from_slice(&decode_fixed::<SIGNATURE_LENGTH>(signature)?);
            }
        }
        if !skip_second_signature {
            if let Some(sign_signature) = &self.sign_signature {
                buf.extend_from_slice(&decode_fixed::<SIGNATURE_LENGTH>(sign_signature)?);
            }
        }

        Ok(buf)
    }
}

const ASSET_NONE: u8 = 0;
const ASSET_SIGNATURE: u8 = 1;
const ASSET_RAW: u8 = 2;

/// u32 LE length, then the bytes.
fn put_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), KeyError> {
    let len = u32::try_from(bytes.len()).map_err(|_| KeyError::FieldTooLong(bytes.len()))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Presence flag, then the length-prefixed bytes when present.
fn put_optional(buf: &mut Vec<u8>, bytes: Option<&[u8]>) -> Result<(), KeyError> {
    match bytes {
        Some(bytes) => {
            buf.push(1);
            put_prefixed(buf, bytes)
        }
        None => {
            buf.push(0);
            Ok(())
        }
    }
}

/// Canonical bytes of a transaction. See the module docs for the layout.
pub fn get_bytes(
    tx: &Transaction,
    skip_signature: bool,
    skip_second_signature: bool,
) -> Result<Vec<u8>, KeyError> {
    tx.canonical_bytes(skip_signature, skip_second_signature)
}

/// SHA-256 of the canonical bytes.
pub fn hash(
    tx: &Transaction,
    skip_signature: bool,
    skip_second_signature: bool,
) -> Result<[u8; 32], KeyError> {
    Ok(sha256_array(&get_bytes(
        tx,
        skip_signature,
        skip_second_signature,
    )?))
}

/// Transaction ID: lowercase hex of the full hash, signatures included.
pub fn get_id(tx: &Transaction) -> Result<String, KeyError> {
    Ok(hex::encode(hash(tx, false, false)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
