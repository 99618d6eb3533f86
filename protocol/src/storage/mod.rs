//! # Storage Module
//!
//! Account state as seen by the signing core. There is no on-disk
//! persistence here: the store is a trait, and the shipped implementation
//! lives in memory.

pub mod account;

pub use account::{Account, AccountStore, MemoryAccountStore, StoreError};
