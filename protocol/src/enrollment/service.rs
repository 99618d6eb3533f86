//! The enrollment workflow.
//!
//! ```text
//! validate ─▶ derive keypair ─▶ check publicKey guard
//!                                   │
//!                    ┌──────────────┴─ balances sequence ─────────────┐
//!                    │ direct | delegated account checks               │
//!                    │ derive second keypair                           │
//!                    │ create_transaction ─▶ receive_transactions      │
//!                    └──────────────────────────────────────────────────┘
//! ```
//!
//! Everything that reads account state runs inside the sequence, so a
//! second request for the same account sees the first one's pending
//! registration and is refused.

use std::sync::Arc;

use super::error::EnrollmentError;
use super::request::EnrollmentRequest;
use crate::config::SIGNATURE_FEE;
use crate::crypto::keys::Keypair;
use crate::network::admission::{TransactionAdmission, TransactionParams};
use crate::sequence::{execute, TaskQueue};
use crate::storage::account::{Account, AccountStore};
use crate::transaction::Transaction;

/// Registers second signature keys, directly or on behalf of a
/// multisignature account.
#[derive(Clone)]
pub struct MultisigEnrollment {
    accounts: Arc<dyn AccountStore>,
    admission: Arc<dyn TransactionAdmission>,
    sequence: Arc<dyn TaskQueue>,
}

impl MultisigEnrollment {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        admission: Arc<dyn TransactionAdmission>,
        sequence: Arc<dyn TaskQueue>,
    ) -> Self {
        Self {
            accounts,
            admission,
            sequence,
        }
    }

    /// Fee charged for a second-signature registration.
    pub fn fee(&self) -> u64 {
        SIGNATURE_FEE
    }

    /// Run one enrollment to completion and return the admitted transaction.
    pub async fn enroll(&self, request: EnrollmentRequest) -> Result<Transaction, EnrollmentError> {
        let request = request.validate()?;
        let keypair = Keypair::from_secret(&request.secret);

        if let Some(expected) = &request.public_key {
            if *expected != keypair.public_key_hex() {
                return Err(EnrollmentError::InvalidPassphrase);
            }
        }

        let accounts = Arc::clone(&self.accounts);
        let admission = Arc::clone(&self.admission);
        execute(self.sequence.as_ref(), move || async move {
            enroll_sequenced(accounts.as_ref(), admission.as_ref(), &request, keypair).await
        })
        .await?
    }
}

async fn enroll_sequenced(
    accounts: &dyn AccountStore,
    admission: &dyn TransactionAdmission,
    request: &EnrollmentRequest,
    keypair: Keypair,
) -> Result<Transaction, EnrollmentError> {
    let own_key = keypair.public_key_hex();

    let params = match request.multisig_account_public_key.as_deref() {
        Some(multisig_key) if multisig_key != own_key => {
            tracing::debug!(requester = %own_key, account = %multisig_key, "delegated enrollment");
            delegated(accounts, request, keypair, multisig_key).await?
        }
        _ => {
            tracing::debug!(account = %own_key, "direct enrollment");
            direct(accounts, request, keypair).await?
        }
    };

    let tx = admission.create_transaction(params).await?;
    let admitted = admission.receive_transactions(vec![tx]).await?;
    let tx = admitted
        .into_iter()
        .next()
        .ok_or(EnrollmentError::TransactionCreationFailed)?;

    tracing::info!(
        tx_id = %tx.id,
        sender = %tx.sender_public_key,
        "second signature registration admitted"
    );
    Ok(tx)
}

async fn direct(
    accounts: &dyn AccountStore,
    request: &EnrollmentRequest,
    keypair: Keypair,
) -> Result<TransactionParams, EnrollmentError> {
    let own_key = keypair.public_key_hex();
    let account = fetch(accounts, &own_key).await?;

    // `validate()` already requires a second secret; this guard keeps the
    // path sound for callers that skip validation.
    if account.second_signature && request.second_secret.is_empty() {
        return Err(EnrollmentError::SecondPassphraseRequired);
    }
    if account.has_any_second_signature() {
        return Err(EnrollmentError::SecondPassphraseAlreadySet);
    }

    let second_keypair = Keypair::from_secret(&request.second_secret);
    Ok(TransactionParams::signature_registration(
        account,
        keypair,
        None,
        second_keypair,
        SIGNATURE_FEE,
    ))
}

async fn delegated(
    accounts: &dyn AccountStore,
    request: &EnrollmentRequest,
    keypair: Keypair,
    multisig_key: &str,
) -> Result<TransactionParams, EnrollmentError> {
    let own_key = keypair.public_key_hex();
    let account = fetch(accounts, multisig_key).await?;

    if !account.is_multisig() {
        return Err(EnrollmentError::MultisigNotEnabled);
    }
    if !account.multisignatures.contains(&own_key) {
        return Err(EnrollmentError::NotGroupMember);
    }
    if account.has_any_second_signature() {
        return Err(EnrollmentError::SecondPassphraseAlreadySet);
    }

    let requester = accounts
        .get_account_by_public_key(&own_key)
        .await?
        .filter(|r| !r.public_key.is_empty())
        .ok_or(EnrollmentError::InvalidRequester)?;
    // Same guard as the direct path, on the requester's own account.
    if requester.second_signature && request.second_secret.is_empty() {
        return Err(EnrollmentError::SecondPassphraseRequired);
    }
    if requester.public_key == account.public_key {
        return Err(EnrollmentError::InvalidRequester);
    }

    let second_keypair = Keypair::from_secret(&request.second_secret);
    let requester_key = keypair.public_key();
    Ok(TransactionParams::signature_registration(
        account,
        keypair,
        Some(requester_key),
        second_keypair,
        SIGNATURE_FEE,
    ))
}

async fn fetch(accounts: &dyn AccountStore, public_key: &str) -> Result<Account, EnrollmentError> {
    accounts
        .get_account_by_public_key(public_key)
        .await?
        .ok_or_else(|| EnrollmentError::AccountNotFound(public_key.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
