//! The transaction admission contract.
//!
//! Admission is where a signed transaction meets account state: balances are
//! checked, unconfirmed flags are set, and the transaction is pooled. The
//! enrollment workflow talks to it only through [`TransactionAdmission`].

use async_trait::async_trait;
use thiserror::Error;

use crate::crypto::keys::{Keypair, PublicKey};
use crate::storage::account::{Account, StoreError};
use crate::transaction::{Asset, SigningError, Transaction, TransactionType};

/// Everything needed to build and sign a transaction on an account's behalf.
#[derive(Debug, Clone)]
pub struct TransactionParams {
    /// What the transaction does.
    pub tx_type: TransactionType,
    /// The account the transaction acts on.
    pub sender: Account,
    /// Produces the primary signature.
    pub keypair: Keypair,
    /// Set when `keypair` belongs to a co-signer acting for `sender`.
    pub requester: Option<PublicKey>,
    /// Produces `sign_signature`, if present.
    pub second_keypair: Option<Keypair>,
    /// Fee in base units.
    pub fee: u64,
    /// Type-specific payload.
    pub asset: Asset,
}

impl TransactionParams {
    /// Parameters for registering `second_keypair` as `sender`'s second key.
    ///
    /// The transaction is second-signed by the very key it registers, which
    /// proves the registrant holds the second secret.
    pub fn signature_registration(
        sender: Account,
        keypair: Keypair,
        requester: Option<PublicKey>,
        second_keypair: Keypair,
        fee: u64,
    ) -> Self {
        let asset = Asset::Signature {
            public_key: second_keypair.public_key_hex(),
        };
        Self {
            tx_type: TransactionType::Signature,
            sender,
            keypair,
            requester,
            second_keypair: Some(second_keypair),
            fee,
            asset,
        }
    }
}

/// Reasons a transaction is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("transaction signature is invalid")]
    InvalidSignature,

    #[error("requester is not a member of the sender's multisignature group")]
    InvalidRequester,

    #[error("transaction second signature is invalid")]
    InvalidSecondSignature,

    #[error("transaction id mismatch: expected {expected}, got {got}")]
    IdMismatch { expected: String, got: String },

    #[error("signature registration carries no public key")]
    MissingAsset,

    #[error("transaction {0} is already pooled")]
    Duplicate(String),

    #[error("sender account {0} not found")]
    UnknownSender(String),

    #[error("sender already has a second signature registered or pending")]
    SecondSignatureAlreadyRegistered,

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    #[error("fee too low: minimum {min}, got {got}")]
    FeeTooLow { min: u64, got: u64 },

    #[error("sender {sender} exceeded per-sender limit of {limit}")]
    SenderLimitExceeded { sender: String, limit: usize },

    #[error("pool is full ({size} transactions)")]
    Full { size: usize },

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Builds transactions and admits them into the pending pool.
#[async_trait]
pub trait TransactionAdmission: Send + Sync {
    /// Build, sign, second-sign (if requested), and finalize a transaction.
    /// Nothing is pooled.
    async fn create_transaction(
        &self,
        params: TransactionParams,
    ) -> Result<Transaction, AdmissionError>;

    /// Admit transactions in order. Stops at the first rejection; earlier
    /// transactions in the batch stay admitted.
    async fn receive_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, AdmissionError>;
}
