//! Password generation and at-rest encryption for provisioned users.
//!
//! Encrypted passwords are stored as `base64(nonce || ciphertext)` using
//! AES-256-GCM with the pre-shared `ENCRYPTION_KEY`.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use thiserror::Error;

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;

/// Number of random bytes drawn for a password, and also the number of
/// base64 characters kept from their encoding.
pub const PASSWORD_LENGTH: usize = 10;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid encryption key length: expected {KEY_SIZE} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Generates an initial password for an imported user.
///
/// 10 random bytes are base64-encoded and cut to 10 characters, so the
/// result carries 60 bits of randomness rather than 80.
pub fn generate_password() -> String {
    let mut bytes = [0u8; PASSWORD_LENGTH];
    OsRng.fill_bytes(&mut bytes);

    let mut encoded = STANDARD.encode(bytes);
    encoded.truncate(PASSWORD_LENGTH);
    encoded
}

#[derive(Clone)]
pub struct PasswordCipher {
    cipher: Aes256Gcm,
}

impl PasswordCipher {
    /// Builds a cipher from a hex-encoded 32-byte key.
    pub fn from_hex_key(key_hex: &str) -> Result<Self, CryptoError> {
        let key_bytes = hex::decode(key_hex.trim())
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;

        Self::from_key(&key_bytes)
    }

    pub fn from_key(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength(key.len()));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Encrypts a password with a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut iv = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut iv);
        let nonce = Nonce::from_slice(&iv);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&iv);
        sealed.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(sealed))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let sealed = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        if sealed.len() <= NONCE_SIZE {
            return Err(CryptoError::DecryptionFailed(
                "ciphertext too short".to_string(),
            ));
        }

        let (iv, ciphertext) = sealed.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn is_base64_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '+' || c == '/'
    }

    #[test]
    fn test_generated_password_shape() {
        for _ in 0..200 {
            let password = generate_password();
            assert_eq!(password.len(), PASSWORD_LENGTH);
            assert!(password.chars().all(is_base64_char), "unexpected char in {}", password);
        }
    }

    #[test]
    fn test_generated_passwords_differ() {
        assert_ne!(generate_password(), generate_password());
    }

    #[test]
    fn test_encrypt_is_randomized_but_reversible() {
        let cipher = PasswordCipher::from_hex_key(TEST_KEY).unwrap();

        let first = cipher.encrypt("aB3+x/9QzK").unwrap();
        let second = cipher.encrypt("aB3+x/9QzK").unwrap();

        assert_ne!(first, second);
        assert_eq!(cipher.decrypt(&first).unwrap(), "aB3+x/9QzK");
        assert_eq!(cipher.decrypt(&second).unwrap(), "aB3+x/9QzK");
    }

    #[test]
    fn test_decrypt_with_other_key_fails() {
        let cipher = PasswordCipher::from_hex_key(TEST_KEY).unwrap();
        let other = PasswordCipher::from_key(&[7u8; KEY_SIZE]).unwrap();

        let sealed = cipher.encrypt("secret").unwrap();
        assert!(matches!(other.decrypt(&sealed), Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_rejects_short_key() {
        assert!(matches!(
            PasswordCipher::from_hex_key("00ff"),
            Err(CryptoError::InvalidKeyLength(2))
        ));
        assert!(matches!(
            PasswordCipher::from_hex_key("not-hex"),
            Err(CryptoError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn test_decrypt_rejects_truncated_input() {
        let cipher = PasswordCipher::from_hex_key(TEST_KEY).unwrap();
        assert!(cipher.decrypt("AAAA").is_err());
    }
}
