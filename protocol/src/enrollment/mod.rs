//! # Second-Signature Enrollment
//!
//! Registers an account's second passphrase. The caller either enrolls its
//! own account or, as a member of a multisignature group, enrolls the group
//! account on its behalf.
//!
//! ```text
//! request.rs  EnrollmentRequest and its schema checks
//! error.rs    EnrollmentError
//! service.rs  MultisigEnrollment, the workflow itself
//! ```

pub mod error;
pub mod request;
pub mod service;

pub use error::EnrollmentError;
pub use request::EnrollmentRequest;
pub use service::MultisigEnrollment;
