//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] produces an *unsigned* [`Transaction`] with an
//! empty ID. Signing happens in [`super::signing`], and the ID is computed
//! last with [`Transaction::finalize_id`], because it covers the signature
//! fields.

use serde::{Deserialize, Serialize};

use super::canonical;
use super::types::{Asset, TransactionType};
use crate::config;
use crate::crypto::keys::{KeyError, PublicKey};

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A keystone transaction.
///
/// Keys and signatures are carried as lowercase hex, which is what clients
/// send and what the JSON API returns. They are decoded only when the
/// canonical bytes are built, so a malformed field surfaces as a
/// [`KeyError`] at hash time instead of a panic at parse time.
///
/// # Signature states
///
/// ```text
/// Unsigned  (signature = None, sign_signature = None)
///   -> Signed        (signature = Some)
///   -> DoubleSigned  (signature = Some, sign_signature = Some)   terminal
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// `hex(SHA-256(canonical bytes))`, empty until finalized.
    #[serde(default)]
    pub id: String,

    /// The operation this transaction represents.
    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// Seconds since the network epoch.
    pub timestamp: u32,

    /// Hex public key of the account the transaction acts on.
    pub sender_public_key: String,

    /// Hex public key of the co-signer who built the transaction on the
    /// sender's behalf (multisignature accounts only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_public_key: Option<String>,

    /// Recipient address, for transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,

    /// Amount in base units.
    pub amount: u64,

    /// Fee in base units.
    pub fee: u64,

    /// Optional free-form memo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Type-specific payload.
    #[serde(default)]
    pub asset: Asset,

    /// Primary Ed25519 signature, hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    /// Second-factor signature, hex.
    #[serde(
        default,
        rename = "sign_signature",
        skip_serializing_if = "Option::is_none"
    )]
    pub sign_signature: Option<String>,

    /// Co-signatures collected from multisignature members, hex. Not part
    /// of the canonical bytes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<String>,
}

impl Transaction {
    /// Key that produced the primary signature: the requester when present,
    /// otherwise the sender.
    pub fn signer_public_key(&self) -> &str {
        self.requester_public_key
            .as_deref()
            .unwrap_or(&self.sender_public_key)
    }

    /// Returns `true` if the transaction carries a primary signature.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Returns `true` if the transaction carries a second signature.
    pub fn is_second_signed(&self) -> bool {
        self.sign_signature.is_some()
    }

    /// Recompute and store the ID.
    ///
    /// Call after the last signature has been attached: the ID covers both
    /// signature fields.
    pub fn finalize_id(&mut self) -> Result<&str, KeyError> {
        self.id = canonical::get_id(self)?;
        Ok(&self.id)
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Transaction`]s.
///
/// # Usage
///
/// ```
/// use keystone_protocol::crypto::Keypair;
/// use keystone_protocol::transaction::{Asset, TransactionBuilder, TransactionType};
///
/// let sender = Keypair::from_secret("alpha");
/// let second = Keypair::from_secret("beta");
/// let tx = TransactionBuilder::new(TransactionType::Signature)
///     .sender(&sender.public_key())
///     .fee(500_000_000)
///     .asset(Asset::Signature { public_key: second.public_key_hex() })
///     .build();
/// assert!(!tx.is_signed());
/// ```
///
/// The timestamp defaults to "now" in network-epoch seconds.
pub struct TransactionBuilder {
    tx_type: TransactionType,
    timestamp: Option<u32>,
    sender_public_key: String,
    requester_public_key: Option<String>,
    recipient_id: Option<String>,
    amount: u64,
    fee: u64,
    message: Option<String>,
    asset: Asset,
}

impl TransactionBuilder {
    /// Creates a new builder for the given transaction type.
    pub fn new(tx_type: TransactionType) -> Self {
        Self {
            tx_type,
            timestamp: None,
            sender_public_key: String::new(),
            requester_public_key: None,
            recipient_id: None,
            amount: 0,
            fee: 0,
            message: None,
            asset: Asset::None,
        }
    }

    /// Sets the sender's public key.
    pub fn sender(mut self, public_key: &PublicKey) -> Self {
        self.sender_public_key = public_key.to_hex();
        self
    }

    /// Sets the sender's public key from hex, as stored on an account.
    pub fn sender_hex(mut self, public_key_hex: &str) -> Self {
        self.sender_public_key = public_key_hex.to_string();
        self
    }

    /// Sets the requester (co-signer acting for a multisignature account).
    pub fn requester(mut self, public_key: &PublicKey) -> Self {
        self.requester_public_key = Some(public_key.to_hex());
        self
    }

    /// Sets the recipient address.
    pub fn recipient(mut self, address: &str) -> Self {
        self.recipient_id = Some(address.to_string());
        self
    }

    /// Sets the amount.
    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the fee.
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Sets an explicit timestamp (network-epoch seconds). Mostly for tests.
    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attaches a memo.
    pub fn message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Sets the type-specific payload.
    pub fn asset(mut self, asset: Asset) -> Self {
        self.asset = asset;
        self
    }

    /// Consumes the builder and returns an unsigned transaction.
    pub fn build(self) -> Transaction {
        Transaction {
            id: String::new(),
            tx_type: self.tx_type,
            timestamp: self
                .timestamp
                .unwrap_or_else(|| config::epoch_time(chrono::Utc::now())),
            sender_public_key: self.sender_public_key,
            requester_public_key: self.requester_public_key,
            recipient_id: self.recipient_id,
            amount: self.amount,
            fee: self.fee,
            message: self.message,
            asset: self.asset,
            signature: None,
            sign_signature: None,
            signatures: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn sample() -> Transaction {
        TransactionBuilder::new(TransactionType::Transfer)
            .sender(&Keypair::from_secret("alpha").public_key())
            .recipient("D4pFbVVDvpAHkRr2kw8oJvSsQTdQx")
            .amount(1_000)
            .fee(10)
            .timestamp(42)
            .build()
    }

    #[test]
    fn build_produces_unsigned_transaction() {
        let tx = sample();
        assert!(!tx.is_signed());
        assert!(!tx.is_second_signed());
        assert!(tx.id.is_empty());
        assert_eq!(tx.timestamp, 42);
    }

    #[test]
    fn signer_defaults_to_sender() {
        let tx = sample();
        assert_eq!(tx.signer_public_key(), tx.sender_public_key);

        let requester = Keypair::from_secret("beta").public_key();
        let delegated = TransactionBuilder::new(TransactionType::Signature)
            .sender(&Keypair::from_secret("alpha").public_key())
            .requester(&requester)
            .build();
        assert_eq!(delegated.signer_public_key(), requester.to_hex());
    }

    #[test]
    fn finalize_id_is_64_hex_chars() {
        let mut tx = sample();
        let id = tx.finalize_id().unwrap().to_string();
        assert_eq!(id.len(), 64);
        assert_eq!(tx.id, id);
    }

    #[test]
    fn finalize_id_rejects_malformed_sender() {
        let mut tx = sample();
        tx.sender_public_key = "zz".into();
        assert!(tx.finalize_id().is_err());
    }

    #[test]
    fn json_uses_wire_field_names() {
        let mut tx = sample();
        tx.sign_signature = Some("00".repeat(64));
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("senderPublicKey").is_some());
        assert!(json.get("sign_signature").is_some());
        assert!(json.get("requesterPublicKey").is_none());
        assert_eq!(json["type"], "transfer");

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }
}
