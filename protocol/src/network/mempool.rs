//! Pending transaction pool and the reference admission pipeline.
//!
//! Thread-safe pool for signed transactions awaiting confirmation.
//! Transactions are indexed by ID for O(1) lookups. Per-sender tracking
//! prevents any single account from monopolizing pool capacity.
//!
//! ## Design
//!
//! - `DashMap` provides lock-free concurrent reads for the hot path (RPC
//!   queries, duplicate detection).
//! - Admission itself is serialized behind a `parking_lot::Mutex`. Checking
//!   the unconfirmed balance and applying the debit must be one step, or
//!   two transactions can spend the same coins.
//! - Admission never awaits, so holding a blocking lock is fine.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::admission::{AdmissionError, TransactionAdmission, TransactionParams};
use crate::storage::account::{Account, MemoryAccountStore};
use crate::transaction::{
    get_id, second_sign, sign_in_place, verify, verify_second_signature, SigningError,
    Transaction, TransactionBuilder, TransactionType,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunable parameters for mempool behaviour.
#[derive(Debug, Clone)]
pub struct MempoolConfig {
    /// Maximum number of transactions the pool will hold.
    pub max_size: usize,

    /// Maximum pending transactions allowed per sender.
    pub max_per_sender: usize,

    /// Minimum acceptable fee in base units. Transactions below this
    /// threshold are rejected outright.
    pub min_fee: u64,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10_000,
            max_per_sender: 100,
            min_fee: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// MempoolEntry
// ---------------------------------------------------------------------------

/// A transaction together with pool-management metadata.
#[derive(Debug, Clone)]
pub struct MempoolEntry {
    /// The transaction itself.
    pub transaction: Transaction,

    /// Admission order, starting at zero.
    pub sequence: u64,

    /// Wall-clock admission time.
    pub added_at: chrono::DateTime<chrono::Utc>,
}

// ---------------------------------------------------------------------------
// Mempool
// ---------------------------------------------------------------------------

/// Pending transactions plus the unconfirmed account state they imply.
pub struct Mempool {
    /// Pending transactions indexed by ID.
    transactions: DashMap<String, MempoolEntry>,

    /// Per-sender transaction count for rate limiting.
    sender_counts: DashMap<String, usize>,

    /// Accounts whose `u_*` fields this pool maintains.
    accounts: Arc<MemoryAccountStore>,

    /// Serializes check-then-apply.
    admission: Mutex<()>,

    next_sequence: AtomicU64,

    config: MempoolConfig,
}

impl fmt::Debug for Mempool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mempool")
            .field("size", &self.transactions.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Mempool {
    /// Creates a new mempool over the given account store.
    pub fn new(config: MempoolConfig, accounts: Arc<MemoryAccountStore>) -> Self {
        Self {
            transactions: DashMap::new(),
            sender_counts: DashMap::new(),
            accounts,
            admission: Mutex::new(()),
            next_sequence: AtomicU64::new(0),
            config,
        }
    }

    /// Admit a signed, finalized transaction.
    ///
    /// Checks, in order:
    ///
    /// 1. **ID** matches the canonical bytes.
    /// 2. **Duplicate**: reject if the ID is already pooled.
    /// 3. **Minimum fee**.
    /// 4. **Capacity**, overall and per sender.
    /// 5. **Primary signature** verifies.
    /// 6. **Sender** exists, any requester belongs to its multisignature
    ///    group, its second-signature state allows the
    ///    transaction, and its unconfirmed balance covers amount plus fee.
    ///
    /// On success the unconfirmed state is updated and the transaction is
    /// pooled. On failure nothing changes.
    pub fn admit(&self, tx: Transaction) -> Result<Transaction, AdmissionError> {
        let _guard = self.admission.lock();

        let expected_id = get_id(&tx).map_err(SigningError::from)?;
        if tx.id != expected_id {
            return Err(AdmissionError::IdMismatch {
                expected: expected_id,
                got: tx.id,
            });
        }

        if self.transactions.contains_key(&tx.id) {
            return Err(AdmissionError::Duplicate(tx.id));
        }

        if tx.fee < self.config.min_fee {
            return Err(AdmissionError::FeeTooLow {
                min: self.config.min_fee,
                got: tx.fee,
            });
        }

        if self.transactions.len() >= self.config.max_size {
            return Err(AdmissionError::Full {
                size: self.config.max_size,
            });
        }

        let sender = tx.sender_public_key.clone();
        let sender_count = self.sender_counts.get(&sender).map(|v| *v).unwrap_or(0);
        if sender_count >= self.config.max_per_sender {
            return Err(AdmissionError::SenderLimitExceeded {
                sender,
                limit: self.config.max_per_sender,
            });
        }

        if !verify(&tx)? {
            return Err(AdmissionError::InvalidSignature);
        }

        self.accounts
            .update(&sender, |account| apply_unconfirmed(account, &tx))
            .ok_or_else(|| AdmissionError::UnknownSender(sender.clone()))??;

        let entry = MempoolEntry {
            transaction: tx.clone(),
            sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
            added_at: chrono::Utc::now(),
        };
        self.transactions.insert(tx.id.clone(), entry);
        *self.sender_counts.entry(sender).or_insert(0) += 1;

        tracing::debug!(
            tx_id = %tx.id,
            tx_type = %tx.tx_type,
            sender = %tx.sender_public_key,
            "transaction admitted"
        );

        Ok(tx)
    }

    /// Drop a pending transaction and roll back its unconfirmed effects.
    pub fn remove(&self, tx_id: &str) -> Option<Transaction> {
        let _guard = self.admission.lock();
        let (_, entry) = self.transactions.remove(tx_id)?;
        let tx = entry.transaction;
        self.accounts
            .update(&tx.sender_public_key, |account| revert_unconfirmed(account, &tx));
        self.decrement_sender_count(&tx.sender_public_key);
        Some(tx)
    }

    /// Confirm every pending transaction in admission order.
    ///
    /// Confirmed balances are debited and pending second-signature
    /// registrations become registered. Returns the confirmed transactions.
    pub fn confirm_all(&self) -> Vec<Transaction> {
        let _guard = self.admission.lock();

        let mut entries: Vec<MempoolEntry> = self
            .transactions
            .iter()
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by_key(|e| e.sequence);

        let mut confirmed = Vec::with_capacity(entries.len());
        for entry in entries {
            let tx = entry.transaction;
            self.transactions.remove(&tx.id);
            self.decrement_sender_count(&tx.sender_public_key);
            self.accounts
                .update(&tx.sender_public_key, |account| apply_confirmed(account, &tx));
            confirmed.push(tx);
        }

        if !confirmed.is_empty() {
            tracing::info!(count = confirmed.len(), "pending transactions confirmed");
        }
        confirmed
    }

    /// Returns a clone of the transaction with the given ID, if present.
    pub fn get(&self, tx_id: &str) -> Option<Transaction> {
        self.transactions.get(tx_id).map(|e| e.transaction.clone())
    }

    /// Returns `true` if the pool contains a transaction with the given ID.
    pub fn contains(&self, tx_id: &str) -> bool {
        self.transactions.contains_key(tx_id)
    }

    /// Returns the current number of transactions in the pool.
    pub fn size(&self) -> usize {
        self.transactions.len()
    }

    /// Returns `true` if the pool has no pending transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Returns all pending transactions for a given sender.
    pub fn pending_for_sender(&self, sender_public_key: &str) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|entry| entry.value().transaction.sender_public_key == sender_public_key)
            .map(|entry| entry.value().transaction.clone())
            .collect()
    }

    /// The account store this pool maintains.
    pub fn accounts(&self) -> &Arc<MemoryAccountStore> {
        &self.accounts
    }

    fn decrement_sender_count(&self, sender: &str) {
        if let Some(mut count) = self.sender_counts.get_mut(sender) {
            if *count <= 1 {
                drop(count);
                self.sender_counts.remove(sender);
            } else {
                *count -= 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Account transitions
// ---------------------------------------------------------------------------

fn total_cost(tx: &Transaction) -> u64 {
    tx.amount.saturating_add(tx.fee)
}

/// Validate `tx` against the sender's unconfirmed state and apply it.
fn apply_unconfirmed(account: &mut Account, tx: &Transaction) -> Result<(), AdmissionError> {
    // A requester signs on the sender's behalf, so it must be a member of
    // the sender's multisignature group.
    if let Some(requester) = tx.requester_public_key.as_deref() {
        if !account.is_multisig() || !account.multisignatures.contains(requester) {
            return Err(AdmissionError::InvalidRequester);
        }
    }

    if tx.tx_type == TransactionType::Signature {
        let second_key = tx
            .asset
            .second_public_key()
            .ok_or(AdmissionError::MissingAsset)?;
        if account.has_any_second_signature() {
            return Err(AdmissionError::SecondSignatureAlreadyRegistered);
        }
        // A registration may carry proof of the new key; if it does, it
        // has to be valid.
        if tx.is_second_signed() && !verify_second_signature(tx, second_key)? {
            return Err(AdmissionError::InvalidSecondSignature);
        }
    } else if account.second_signature {
        let registered = account
            .second_public_key
            .as_deref()
            .ok_or(AdmissionError::InvalidSecondSignature)?;
        if !tx.is_second_signed() || !verify_second_signature(tx, registered)? {
            return Err(AdmissionError::InvalidSecondSignature);
        }
    }

    let needed = total_cost(tx);
    if account.u_balance < needed {
        return Err(AdmissionError::InsufficientBalance {
            needed,
            available: account.u_balance,
        });
    }

    account.u_balance -= needed;
    if let Some(second_key) = tx.asset.second_public_key() {
        account.u_second_signature = true;
        account.second_public_key = Some(second_key.to_string());
    }
    Ok(())
}

fn revert_unconfirmed(account: &mut Account, tx: &Transaction) {
    account.u_balance = account.u_balance.saturating_add(total_cost(tx));
    if tx.asset.second_public_key().is_some() && !account.second_signature {
        account.u_second_signature = false;
        account.second_public_key = None;
    }
}

fn apply_confirmed(account: &mut Account, tx: &Transaction) {
    account.balance = account.balance.saturating_sub(total_cost(tx));
    if tx.asset.second_public_key().is_some() {
        account.second_signature = true;
    }
}

// ---------------------------------------------------------------------------
// TransactionAdmission
// ---------------------------------------------------------------------------

#[async_trait]
impl TransactionAdmission for Mempool {
    async fn create_transaction(
        &self,
        params: TransactionParams,
    ) -> Result<Transaction, AdmissionError> {
        let mut builder = TransactionBuilder::new(params.tx_type)
            .sender_hex(&params.sender.public_key)
            .fee(params.fee)
            .asset(params.asset);
        if let Some(requester) = &params.requester {
            builder = builder.requester(requester);
        }
        let mut tx = builder.build();

        sign_in_place(&mut tx, &params.keypair)?;
        if let Some(second_keypair) = &params.second_keypair {
            second_sign(&mut tx, second_keypair)?;
        }
        tx.finalize_id().map_err(SigningError::from)?;
        Ok(tx)
    }

    async fn receive_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, AdmissionError> {
        let mut admitted = Vec::with_capacity(transactions.len());
        for tx in transactions {
            admitted.push(self.admit(tx)?);
        }
        Ok(admitted)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SIGNATURE_FEE;
    use crate::crypto::Keypair;

    fn pool_with(secret: &str, balance: u64) -> (Mempool, Account) {
        let accounts = Arc::new(MemoryAccountStore::new());
        let account = accounts
            .fund(&Keypair::from_secret(secret).public_key_hex(), balance)
            .unwrap();
        (Mempool::new(MempoolConfig::default(), accounts), account)
    }

    async fn registration(pool: &Mempool, account: &Account, secret: &str) -> Transaction {
        pool.create_transaction(TransactionParams::signature_registration(
            account.clone(),
            Keypair::from_secret(secret),
            None,
            Keypair::from_secret("beta"),
            SIGNATURE_FEE,
        ))
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_transaction_signs_and_finalizes() {
        let (pool, account) = pool_with("alpha", SIGNATURE_FEE);
        let tx = registration(&pool, &account, "alpha").await;

        assert_eq!(verify(&tx), Ok(true));
        assert_eq!(
            verify_second_signature(&tx, &Keypair::from_secret("beta").public_key_hex()),
            Ok(true)
        );
        assert_eq!(tx.id, get_id(&tx).unwrap());
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn admits_registration_and_sets_pending_state() {
        let (pool, account) = pool_with("alpha", SIGNATURE_FEE * 2);
        let tx = registration(&pool, &account, "alpha").await;

        let admitted = pool.receive_transactions(vec![tx.clone()]).await.unwrap();
        assert_eq!(admitted, vec![tx.clone()]);
        assert!(pool.contains(&tx.id));

        let after = pool.accounts().get(&account.public_key).unwrap();
        assert!(after.u_second_signature);
        assert!(!after.second_signature);
        assert_eq!(after.u_balance, SIGNATURE_FEE);
        assert_eq!(after.balance, SIGNATURE_FEE * 2);
        assert_eq!(
            after.second_public_key,
            Some(Keypair::from_secret("beta").public_key_hex())
        );
    }

    #[tokio::test]
    async fn rejects_duplicate() {
        let (pool, account) = pool_with("alpha", SIGNATURE_FEE * 2);
        let tx = registration(&pool, &account, "alpha").await;
        pool.admit(tx.clone()).unwrap();
        assert_eq!(pool.admit(tx.clone()), Err(AdmissionError::Duplicate(tx.id)));
        assert_eq!(pool.size(), 1);
    }

    #[tokio::test]
    async fn rejects_second_registration_while_pending() {
        let (pool, account) = pool_with("alpha", SIGNATURE_FEE * 4);
        pool.admit(registration(&pool, &account, "alpha").await).unwrap();

        let mut again = registration(&pool, &account, "alpha").await;
        again.timestamp += 1;
        again.signature = None;
        again.sign_signature = None;
        sign_in_place(&mut again, &Keypair::from_secret("alpha")).unwrap();
        again.finalize_id().unwrap();

        assert_eq!(
            pool.admit(again),
            Err(AdmissionError::SecondSignatureAlreadyRegistered)
        );
    }

    #[tokio::test]
    async fn rejects_insufficient_balance() {
        let (pool, account) = pool_with("alpha", SIGNATURE_FEE - 1);
        let tx = registration(&pool, &account, "alpha").await;
        assert_eq!(
            pool.admit(tx),
            Err(AdmissionError::InsufficientBalance {
                needed: SIGNATURE_FEE,
                available: SIGNATURE_FEE - 1
            })
        );
        assert!(!pool.accounts().get(&account.public_key).unwrap().u_second_signature);
    }

    #[tokio::test]
    async fn rejects_bad_signature_and_bad_id() {
        let (pool, account) = pool_with("alpha", SIGNATURE_FEE);
        // Signed by someone other than the sender.
        let forged = registration(&pool, &account, "mallory").await;
        assert_eq!(pool.admit(forged), Err(AdmissionError::InvalidSignature));

        let mut stale = registration(&pool, &account, "alpha").await;
        stale.id = "00".repeat(32);
        assert!(matches!(pool.admit(stale), Err(AdmissionError::IdMismatch { .. })));
    }

    async fn delegated(pool: &Mempool, group: &Account, requester: &str, second: &str) -> Transaction {
        let requester = Keypair::from_secret(requester);
        pool.create_transaction(TransactionParams::signature_registration(
            group.clone(),
            requester.clone(),
            Some(requester.public_key()),
            Keypair::from_secret(second),
            SIGNATURE_FEE,
        ))
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn rejects_requester_outside_multisig_group() {
        let (pool, victim) = pool_with("victim", SIGNATURE_FEE * 10);

        // Validly signed by the requester, but the sender has no group.
        let forged = delegated(&pool, &victim, "mallory", "mallory-second").await;
        assert_eq!(verify(&forged), Ok(true));
        assert_eq!(pool.admit(forged), Err(AdmissionError::InvalidRequester));

        // A group that does not list the requester is refused too.
        pool.accounts().update(&victim.public_key, |a| {
            a.multisignatures
                .insert(Keypair::from_secret("carol").public_key_hex());
        });
        let forged = delegated(&pool, &victim, "mallory", "mallory-second").await;
        assert_eq!(pool.admit(forged), Err(AdmissionError::InvalidRequester));

        assert!(pool.is_empty());
        assert!(pool.confirm_all().is_empty());
        let after = pool.accounts().get(&victim.public_key).unwrap();
        assert!(!after.has_any_second_signature());
        assert_eq!(after.second_public_key, None);
        assert_eq!(after.u_balance, SIGNATURE_FEE * 10);
        assert_eq!(after.balance, SIGNATURE_FEE * 10);
    }

    #[tokio::test]
    async fn admits_requester_from_multisig_group() {
        let (pool, group) = pool_with("group", SIGNATURE_FEE);
        pool.accounts().update(&group.public_key, |a| {
            a.multisignatures
                .insert(Keypair::from_secret("carol").public_key_hex());
        });

        let tx = delegated(&pool, &group, "carol", "beta").await;
        assert!(pool.admit(tx).is_ok());
        assert!(pool.accounts().get(&group.public_key).unwrap().u_second_signature);
    }

    #[tokio::test]
    async fn rejects_unknown_sender() {
        let (pool, _) = pool_with("alpha", SIGNATURE_FEE);
        let stranger = Account::new(&Keypair::from_secret("gamma").public_key_hex()).unwrap();
        let tx = registration(&pool, &stranger, "gamma").await;
        assert_eq!(
            pool.admit(tx),
            Err(AdmissionError::UnknownSender(stranger.public_key))
        );
    }

    #[tokio::test]
    async fn enforces_min_fee() {
        let accounts = Arc::new(MemoryAccountStore::new());
        let account = accounts
            .fund(&Keypair::from_secret("alpha").public_key_hex(), SIGNATURE_FEE)
            .unwrap();
        let pool = Mempool::new(
            MempoolConfig {
                min_fee: SIGNATURE_FEE + 1,
                ..Default::default()
            },
            accounts,
        );
        let tx = registration(&pool, &account, "alpha").await;
        assert!(matches!(pool.admit(tx), Err(AdmissionError::FeeTooLow { .. })));
    }

    #[tokio::test]
    async fn confirm_all_promotes_pending_state() {
        let (pool, account) = pool_with("alpha", SIGNATURE_FEE * 3);
        pool.admit(registration(&pool, &account, "alpha").await).unwrap();

        let confirmed = pool.confirm_all();
        assert_eq!(confirmed.len(), 1);
        assert!(pool.is_empty());

        let after = pool.accounts().get(&account.public_key).unwrap();
        assert!(after.second_signature);
        assert_eq!(after.balance, SIGNATURE_FEE * 2);
        assert_eq!(after.u_balance, SIGNATURE_FEE * 2);
    }

    #[tokio::test]
    async fn remove_rolls_back_pending_state() {
        let (pool, account) = pool_with("alpha", SIGNATURE_FEE);
        let tx = registration(&pool, &account, "alpha").await;
        pool.admit(tx.clone()).unwrap();

        assert_eq!(pool.remove(&tx.id), Some(tx));
        let after = pool.accounts().get(&account.public_key).unwrap();
        assert!(!after.u_second_signature);
        assert_eq!(after.u_balance, SIGNATURE_FEE);
        assert!(pool.pending_for_sender(&account.public_key).is_empty());
    }
}
