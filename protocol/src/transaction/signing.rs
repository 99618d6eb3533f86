//! Transaction signing and verification.
//!
//! Three kinds of signature can sit on a transaction:
//!
//! | kind       | who signs                 | over                          | stored in        |
//! |------------|---------------------------|-------------------------------|------------------|
//! | primary    | sender (or requester)     | `hash(tx, skip, skip)`        | `signature`      |
//! | second     | sender's second keypair   | `hash(tx, keep, skip)`        | `sign_signature` |
//! | co-signer  | multisignature members    | `hash(tx, skip, skip)`        | returned, not stored |
//!
//! Verification recomputes exactly the digest the signer saw, so the skip
//! flags used here are the only correct ones. Mixing them up produces
//! signatures that verify nowhere.
//!
//! Signing is strictly ordered. Re-signing a signed transaction, or
//! second-signing one that is unsigned or already second-signed, is an
//! error. Nothing is silently overwritten.

use thiserror::Error;

use super::builder::Transaction;
use super::canonical::hash;
use crate::crypto::hash::sha256_array;
use crate::crypto::keys::{KeyError, Keypair, Signature};
use crate::crypto::signatures::{sign, verify_hex};

pub use super::canonical::get_id;

/// Errors from signing or verifying a transaction.
///
/// A signature that is well-formed but wrong is *not* an error: the verify
/// functions return `Ok(false)` for that.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigningError {
    #[error("transaction is already signed")]
    AlreadySigned,

    #[error("transaction must carry a primary signature before it can be second-signed")]
    NotSigned,

    #[error("transaction is already second-signed")]
    AlreadySecondSigned,

    #[error("transaction has no signature to verify")]
    MissingSignature,

    #[error("transaction has no second signature to verify")]
    MissingSecondSignature,

    #[error("decoding failed: {0}")]
    Decode(#[from] KeyError),
}

/// Attach the primary signature.
///
/// Fails with [`SigningError::AlreadySigned`] if `tx.signature` is set.
pub fn sign_in_place(tx: &mut Transaction, keypair: &Keypair) -> Result<(), SigningError> {
    if tx.signature.is_some() {
        return Err(SigningError::AlreadySigned);
    }
    let digest = hash(tx, true, true)?;
    tx.signature = Some(sign(keypair, &digest).to_hex());
    Ok(())
}

/// Produce a co-signature without touching the transaction.
///
/// Co-signers of a multisignature account sign the same digest as the
/// primary signer. Collecting and storing the result is the caller's job.
pub fn co_signature(tx: &Transaction, keypair: &Keypair) -> Result<Signature, SigningError> {
    let digest = hash(tx, true, true)?;
    Ok(sign(keypair, &digest))
}

/// Compute a co-signature and append it to `tx.signatures`.
///
/// Signing twice with the same key leaves a single entry; the digest does
/// not cover `signatures`, so the result is identical both times.
pub fn add_co_signature(tx: &mut Transaction, keypair: &Keypair) -> Result<Signature, SigningError> {
    let signature = co_signature(tx, keypair)?;
    let hex = signature.to_hex();
    if !tx.signatures.contains(&hex) {
        tx.signatures.push(hex);
    }
    Ok(signature)
}

/// Attach the second-factor signature.
///
/// The second signature covers the primary one, so the primary must already
/// be present.
pub fn second_sign(tx: &mut Transaction, keypair: &Keypair) -> Result<(), SigningError> {
    if tx.signature.is_none() {
        return Err(SigningError::NotSigned);
    }
    if tx.sign_signature.is_some() {
        return Err(SigningError::AlreadySecondSigned);
    }
    let digest = hash(tx, false, true)?;
    tx.sign_signature = Some(sign(keypair, &digest).to_hex());
    Ok(())
}

/// Verify the primary signature.
///
/// The signature is checked against the requester's key when one is set,
/// otherwise against the sender's.
pub fn verify(tx: &Transaction) -> Result<bool, SigningError> {
    let signature = tx
        .signature
        .as_deref()
        .ok_or(SigningError::MissingSignature)?;
    let digest = hash(tx, true, true)?;
    Ok(verify_hex(tx.signer_public_key(), &digest, signature)?)
}

/// Verify the second signature against the account's registered second key.
pub fn verify_second_signature(
    tx: &Transaction,
    second_public_key_hex: &str,
) -> Result<bool, SigningError> {
    let signature = tx
        .sign_signature
        .as_deref()
        .ok_or(SigningError::MissingSecondSignature)?;
    let digest = hash(tx, false, true)?;
    Ok(verify_hex(second_public_key_hex, &digest, signature)?)
}

/// Verify a co-signature produced by [`co_signature`].
pub fn verify_co_signature(
    tx: &Transaction,
    public_key_hex: &str,
    signature_hex: &str,
) -> Result<bool, SigningError> {
    let digest = hash(tx, true, true)?;
    Ok(verify_hex(public_key_hex, &digest, signature_hex)?)
}

/// Verify a signature over arbitrary hex-encoded bytes.
///
/// The bytes are hashed with SHA-256 first, the same way transaction digests
/// are produced, so this accepts the output of [`get_bytes`] directly.
///
/// [`get_bytes`]: super::canonical::get_bytes
pub fn verify_bytes(
    bytes_hex: &str,
    signature_hex: &str,
    public_key_hex: &str,
) -> Result<bool, SigningError> {
    let bytes = hex::decode(bytes_hex).map_err(|e| KeyError::MalformedHex(e.to_string()))?;
    Ok(verify_hex(public_key_hex, &sha256_array(&bytes), signature_hex)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
