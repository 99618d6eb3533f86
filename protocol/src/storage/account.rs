//! # Account State
//!
//! The view of an account the signing core needs: keys, balances, and the
//! second-signature and multisignature flags.
//!
//! Every flag comes in two flavours. The plain one (`balance`,
//! `second_signature`) is confirmed state. The `u_` one is *unconfirmed*:
//! it already reflects transactions sitting in the pool. Admission checks
//! read the unconfirmed side so that two pending transactions cannot both
//! spend the same balance or both register a second key.

use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TOKEN_PREFIX;
use crate::crypto::keys::KeyError;
use crate::identity::address::derive_address_hex;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A single account, keyed by its hex public key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Prefixed base58check address.
    pub address: String,
    /// Hex Ed25519 public key.
    pub public_key: String,
    /// Confirmed balance in base units.
    pub balance: u64,
    /// Balance after pending transactions.
    pub u_balance: u64,
    /// A second signature key is registered and confirmed.
    pub second_signature: bool,
    /// A second signature key registration is pending.
    pub u_second_signature: bool,
    /// Hex of the registered (or pending) second public key.
    pub second_public_key: Option<String>,
    /// Hex public keys of the account's multisignature members.
    pub multisignatures: BTreeSet<String>,
}

impl Account {
    /// An empty, unfunded account for `public_key_hex`.
    pub fn new(public_key_hex: &str) -> Result<Self, StoreError> {
        Ok(Self {
            address: derive_address_hex(public_key_hex, TOKEN_PREFIX)
                .map_err(|e| StoreError::InvalidPublicKey(e.to_string()))?,
            public_key: public_key_hex.to_string(),
            balance: 0,
            u_balance: 0,
            second_signature: false,
            u_second_signature: false,
            second_public_key: None,
            multisignatures: BTreeSet::new(),
        })
    }

    /// Returns `true` if the account has a multisignature group.
    pub fn is_multisig(&self) -> bool {
        !self.multisignatures.is_empty()
    }

    /// Returns `true` if a second key is registered or pending.
    pub fn has_any_second_signature(&self) -> bool {
        self.second_signature || self.u_second_signature
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from an account store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("account store unavailable: {0}")]
    Unavailable(String),
}

impl From<KeyError> for StoreError {
    fn from(e: KeyError) -> Self {
        Self::InvalidPublicKey(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// AccountStore
// ---------------------------------------------------------------------------

/// Read access to accounts.
///
/// The enrollment workflow only ever reads. Writes go through the admission
/// pipeline, which owns the unconfirmed state.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account by hex public key. `Ok(None)` if it does not exist.
    async fn get_account_by_public_key(
        &self,
        public_key_hex: &str,
    ) -> Result<Option<Account>, StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryAccountStore
// ---------------------------------------------------------------------------

/// In-memory account store backed by a `DashMap`.
///
/// Used by the node (there is no persistence layer in scope) and by tests.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: DashMap<String, Account>,
}

impl MemoryAccountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account.
    pub fn put(&self, account: Account) {
        self.accounts.insert(account.public_key.clone(), account);
    }

    /// Credit `amount` to both balances, creating the account if needed.
    pub fn fund(&self, public_key_hex: &str, amount: u64) -> Result<Account, StoreError> {
        let mut entry = match self.accounts.entry(public_key_hex.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(e) => e.into_ref(),
            dashmap::mapref::entry::Entry::Vacant(e) => e.insert(Account::new(public_key_hex)?),
        };
        entry.balance = entry.balance.saturating_add(amount);
        entry.u_balance = entry.u_balance.saturating_add(amount);
        tracing::debug!(public_key = %public_key_hex, amount, "account funded");
        Ok(entry.clone())
    }

    /// Run `f` against an account while holding its shard lock.
    ///
    /// Returns `None` if the account does not exist. The closure must not
    /// touch the store itself, or it will deadlock.
    pub fn update<T>(&self, public_key_hex: &str, f: impl FnOnce(&mut Account) -> T) -> Option<T> {
        self.accounts.get_mut(public_key_hex).map(|mut a| f(&mut a))
    }

    /// Synchronous lookup.
    pub fn get(&self, public_key_hex: &str) -> Option<Account> {
        self.accounts.get(public_key_hex).map(|a| a.clone())
    }

    /// Number of known accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` if the store holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get_account_by_public_key(
        &self,
        public_key_hex: &str,
    ) -> Result<Option<Account>, StoreError> {
        Ok(self.get(public_key_hex))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn alpha_hex() -> String {
        Keypair::from_secret("alpha").public_key_hex()
    }

    #[test]
    fn new_account_derives_address() {
        let account = Account::new(&alpha_hex()).unwrap();
        assert!(account.address.starts_with(TOKEN_PREFIX));
        assert_eq!(account.balance, 0);
        assert!(!account.is_multisig());
        assert!(!account.has_any_second_signature());
    }

    #[test]
    fn new_account_rejects_bad_key() {
        assert!(matches!(
            Account::new("beef"),
            Err(StoreError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn fund_creates_then_accumulates() {
        let store = MemoryAccountStore::new();
        store.fund(&alpha_hex(), 10).unwrap();
        let account = store.fund(&alpha_hex(), 5).unwrap();
        assert_eq!(account.balance, 15);
        assert_eq!(account.u_balance, 15);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_mutates_in_place() {
        let store = MemoryAccountStore::new();
        store.fund(&alpha_hex(), 10).unwrap();
        let flagged = store.update(&alpha_hex(), |a| {
            a.u_second_signature = true;
            a.u_second_signature
        });
        assert_eq!(flagged, Some(true));
        assert!(store.get(&alpha_hex()).unwrap().has_any_second_signature());
        assert_eq!(store.update("missing", |_| ()), None);
    }

    #[tokio::test]
    async fn async_lookup_matches_sync() {
        let store = MemoryAccountStore::new();
        assert_eq!(store.get_account_by_public_key(&alpha_hex()).await, Ok(None));
        store.fund(&alpha_hex(), 1).unwrap();
        let found = store.get_account_by_public_key(&alpha_hex()).await.unwrap();
        assert_eq!(found, store.get(&alpha_hex()));
    }
}
