//! The enrollment request body and its schema checks.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::EnrollmentError;
use crate::config::{MAX_SECRET_LENGTH, PUBLIC_KEY_LENGTH};
use crate::crypto::keys::decode_fixed;

/// A request to register a second signature key.
///
/// `secret` identifies the caller. `second_secret` is the new second
/// passphrase. When `multisig_account_public_key` names another account,
/// the caller is acting as a co-signer of that account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRequest {
    #[serde(default)]
    pub secret: String,

    #[serde(default)]
    pub second_secret: String,

    /// Expected public key of `secret`, as a guard against typos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multisig_account_public_key: Option<String>,
}

impl EnrollmentRequest {
    /// A direct enrollment for `secret`'s own account.
    pub fn new(secret: impl Into<String>, second_secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            second_secret: second_secret.into(),
            public_key: None,
            multisig_account_public_key: None,
        }
    }

    /// Check the request shape and normalize hex keys to lowercase.
    ///
    /// Both secrets must be 1 to [`MAX_SECRET_LENGTH`] characters. Optional
    /// keys must be 64 hex characters.
    pub fn validate(mut self) -> Result<Self, EnrollmentError> {
        check_secret("secret", &self.secret)?;
        check_secret("secondSecret", &self.second_secret)?;
        self.public_key = normalize_key("publicKey", self.public_key)?;
        self.multisig_account_public_key =
            normalize_key("multisigAccountPublicKey", self.multisig_account_public_key)?;
        Ok(self)
    }
}

impl fmt::Debug for EnrollmentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrollmentRequest")
            .field("secret", &"<redacted>")
            .field("second_secret", &"<redacted>")
            .field("public_key", &self.public_key)
            .field("multisig_account_public_key", &self.multisig_account_public_key)
            .finish()
    }
}

fn check_secret(field: &str, value: &str) -> Result<(), EnrollmentError> {
    let len = value.chars().count();
    if len == 0 || len > MAX_SECRET_LENGTH {
        return Err(EnrollmentError::InvalidInput(format!(
            "{} must be between 1 and {} characters",
            field, MAX_SECRET_LENGTH
        )));
    }
    Ok(())
}

fn normalize_key(field: &str, value: Option<String>) -> Result<Option<String>, EnrollmentError> {
    let Some(key) = value else {
        return Ok(None);
    };
    decode_fixed::<PUBLIC_KEY_LENGTH>(&key)
        .map_err(|e| EnrollmentError::InvalidInput(format!("{} is not a public key: {}", field, e)))?;
    Ok(Some(key.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_minimal_request() {
        let req = EnrollmentRequest::new("alpha", "beta").validate().unwrap();
        assert_eq!(req.secret, "alpha");
        assert!(req.public_key.is_none());
    }

    #[test]
    fn rejects_empty_and_oversized_secrets() {
        for (secret, second) in [("", "beta"), ("alpha", "")] {
            assert!(matches!(
                EnrollmentRequest::new(secret, second).validate(),
                Err(EnrollmentError::InvalidInput(_))
            ));
        }
        let long = "x".repeat(MAX_SECRET_LENGTH + 1);
        assert!(EnrollmentRequest::new(long, "beta").validate().is_err());
        let limit = "x".repeat(MAX_SECRET_LENGTH);
        assert!(EnrollmentRequest::new(limit, "beta").validate().is_ok());
    }

    #[test]
    fn normalizes_and_checks_keys() {
        let mut req = EnrollmentRequest::new("alpha", "beta");
        req.public_key = Some("AB".repeat(32));
        assert_eq!(req.validate().unwrap().public_key, Some("ab".repeat(32)));

        let mut req = EnrollmentRequest::new("alpha", "beta");
        req.multisig_account_public_key = Some("abcd".into());
        assert!(matches!(req.validate(), Err(EnrollmentError::InvalidInput(_))));
    }

    #[test]
    fn deserializes_camel_case_body() {
        let req: EnrollmentRequest = serde_json::from_str(
            r#"{"secret":"alpha","secondSecret":"beta","multisigAccountPublicKey":null}"#,
        )
        .unwrap();
        assert_eq!(req, EnrollmentRequest::new("alpha", "beta"));

        // Missing fields surface as validation errors, not parse errors.
        let req: EnrollmentRequest = serde_json::from_str(r#"{"secret":"alpha"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let shown = format!("{:?}", EnrollmentRequest::new("alpha-secret", "beta-secret"));
        assert!(!shown.contains("alpha-secret"));
        assert!(!shown.contains("beta-secret"));
    }
}
