//! # Transaction Module
//!
//! Construction, canonical hashing, and signing of keystone transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs      TransactionType and Asset
//! builder.rs    Transaction and the fluent TransactionBuilder
//! canonical.rs  deterministic byte layout, hash, and ID
//! signing.rs    primary, second, and co-signatures, plus verification
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build** with [`TransactionBuilder`].
//! 2. **Sign** with [`sign_in_place`].
//! 3. **Second-sign** with [`second_sign`], if the account has a second key.
//! 4. **Finalize** the ID with [`Transaction::finalize_id`]. The ID covers
//!    both signatures, so this always comes last.

pub mod builder;
pub mod canonical;
pub mod signing;
pub mod types;

pub use builder::{Transaction, TransactionBuilder};
pub use canonical::{get_bytes, get_id, hash, CanonicalBytes};
pub use signing::{
    add_co_signature, co_signature, second_sign, sign_in_place, verify, verify_bytes, verify_co_signature,
    verify_second_signature, SigningError,
};
pub use types::{Asset, TransactionType};
