//! # Network Module
//!
//! The node-side half of transaction handling: the admission contract and
//! the pending pool that implements it.
//!
//! ```text
//! admission.rs  TransactionAdmission trait, params, and AdmissionError
//! mempool.rs    thread-safe pending pool with unconfirmed account state
//! ```
//!
//! The pool is protected by `DashMap` and a `parking_lot::Mutex` rather
//! than tokio primitives: admission never awaits, and reads vastly
//! outnumber writes.

pub mod admission;
pub mod mempool;

pub use admission::{AdmissionError, TransactionAdmission, TransactionParams};
pub use mempool::{Mempool, MempoolConfig, MempoolEntry};
