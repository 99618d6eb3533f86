//! BIP-39 secrets.
//!
//! A secret is just a string as far as [`Keypair::from_secret`] cares, but
//! the ones we hand out are 12-word English mnemonics so that users can
//! write them down and a typo gets caught by the checksum.
//!
//! [`Keypair::from_secret`]: super::keys::Keypair::from_secret

use bip39::Mnemonic;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::config::MNEMONIC_ENTROPY_BYTES;

/// Produce a fresh 12-word mnemonic from OS entropy.
pub fn generate_secret() -> String {
    let mut entropy = [0u8; MNEMONIC_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut entropy);
    Mnemonic::from_entropy(&entropy)
        .expect("16 bytes is a valid BIP-39 entropy length")
        .to_string()
}

/// Structural check of a mnemonic: known words, valid length, valid checksum.
///
/// Says nothing about whether the secret has ever been used on chain.
pub fn is_valid_secret(secret: &str) -> bool {
    Mnemonic::parse(secret).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_is_valid() {
        for _ in 0..16 {
            assert!(is_valid_secret(&generate_secret()));
        }
    }

    #[test]
    fn generated_secret_has_twelve_words() {
        assert_eq!(generate_secret().split_whitespace().count(), 12);
    }

    #[test]
    fn generated_secrets_differ() {
        assert_ne!(generate_secret(), generate_secret());
    }

    #[test]
    fn altered_checksum_word_is_rejected() {
        // The standard all-zero-entropy vector ends in "about"; any other
        // final word breaks the checksum.
        let valid = "abandon abandon abandon abandon abandon abandon \
                     abandon abandon abandon abandon abandon about";
        assert!(is_valid_secret(valid));

        let altered = "abandon abandon abandon abandon abandon abandon \
                       abandon abandon abandon abandon abandon abandon";
        assert!(!is_valid_secret(altered));
    }

    #[test]
    fn plain_passphrase_is_not_a_mnemonic() {
        assert!(!is_valid_secret("alpha"));
        assert!(!is_valid_secret(""));
    }
}
