use thiserror::Error;

use crate::network::admission::AdmissionError;
use crate::sequence::SequenceError;
use crate::storage::account::StoreError;

/// Why an enrollment was refused.
///
/// Validation and account-state failures are detected before anything is
/// built or queued. Store, admission, and sequence failures are passed
/// through unchanged; nothing here retries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnrollmentError {
    #[error("invalid request: {0}")]
    InvalidInput(String),

    #[error("invalid passphrase")]
    InvalidPassphrase,

    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("account does not have multisignatures enabled")]
    MultisigNotEnabled,

    #[error("account does not belong to multisignature group")]
    NotGroupMember,

    #[error("second passphrase is already set")]
    SecondPassphraseAlreadySet,

    #[error("second passphrase is required")]
    SecondPassphraseRequired,

    #[error("invalid requester")]
    InvalidRequester,

    #[error("signature transaction was not admitted")]
    TransactionCreationFailed,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

impl EnrollmentError {
    /// Short stable label, used as a metrics dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidPassphrase => "invalid_passphrase",
            Self::AccountNotFound(_) => "account_not_found",
            Self::MultisigNotEnabled => "multisig_not_enabled",
            Self::NotGroupMember => "not_group_member",
            Self::SecondPassphraseAlreadySet => "second_passphrase_already_set",
            Self::SecondPassphraseRequired => "second_passphrase_required",
            Self::InvalidRequester => "invalid_requester",
            Self::TransactionCreationFailed => "transaction_creation_failed",
            Self::Store(_) => "store",
            Self::Admission(_) => "admission",
            Self::Sequence(_) => "sequence",
        }
    }
}
