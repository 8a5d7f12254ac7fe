//! # RSA Key Encryption
//!
//! RSAES-PKCS1-v1_5 and RSAES-OAEP key encryption per [RFC7518] §4.2–4.3.
//!
//! PKCS#1 v1.5 decryption implements the countermeasure of [RFC3218]: a
//! random CEK-sized fallback is generated before the ciphertext is touched
//! and returned on every decryption failure, so a padding failure is not
//! distinguishable from a good decryption until the content-encryption tag
//! check fails.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518
//! [RFC3218]: https://www.rfc-editor.org/rfc/rfc3218

use rand::RngCore;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::Error;
use crate::jwe::{EncryptedKey, KeyAlgorithm, KeyDecrypter, KeyEncrypter};

/// Key encrypter for `RSA1_5`, `RSA-OAEP`, and `RSA-OAEP-256`.
#[derive(Debug)]
pub struct RsaEncrypter {
    alg: KeyAlgorithm,
    public_key: RsaPublicKey,
    key_id: Option<String>,
}

impl RsaEncrypter {
    /// Create an encrypter for the recipient's public key.
    ///
    /// # Errors
    ///
    /// Returns an error unless `alg` is an RSA key encryption algorithm.
    pub fn new(alg: KeyAlgorithm, public_key: RsaPublicKey) -> Result<Self, Error> {
        match alg {
            KeyAlgorithm::Rsa15 | KeyAlgorithm::RsaOaep | KeyAlgorithm::RsaOaep256 => {
                Ok(Self { alg, public_key, key_id: None })
            }
            _ => Err(Error::AlgorithmMismatch(alg)),
        }
    }

    /// Set the key ID.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl KeyEncrypter for RsaEncrypter {
    fn algorithm(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: &[u8]) -> Result<EncryptedKey, Error> {
        let encrypted = match self.alg {
            KeyAlgorithm::Rsa15 => self.public_key.encrypt(&mut OsRng, Pkcs1v15Encrypt, cek),
            KeyAlgorithm::RsaOaep => self.public_key.encrypt(&mut OsRng, Oaep::new::<Sha1>(), cek),
            KeyAlgorithm::RsaOaep256 => {
                self.public_key.encrypt(&mut OsRng, Oaep::new::<Sha256>(), cek)
            }
            _ => return Err(Error::AlgorithmMismatch(self.alg)),
        };

        encrypted.map(EncryptedKey::Bytes).map_err(|e| Error::KeyEncrypt(e.to_string()))
    }
}

/// Key decrypter for `RSA-OAEP` and `RSA-OAEP-256`.
#[derive(Debug)]
pub struct RsaOaepDecrypter {
    alg: KeyAlgorithm,
    private_key: RsaPrivateKey,
    key_id: Option<String>,
}

impl RsaOaepDecrypter {
    /// Create a decrypter from the recipient's private key.
    ///
    /// # Errors
    ///
    /// Returns an error unless `alg` is an RSA-OAEP algorithm.
    pub fn new(alg: KeyAlgorithm, private_key: RsaPrivateKey) -> Result<Self, Error> {
        match alg {
            KeyAlgorithm::RsaOaep | KeyAlgorithm::RsaOaep256 => {
                Ok(Self { alg, private_key, key_id: None })
            }
            _ => Err(Error::AlgorithmMismatch(alg)),
        }
    }

    /// Set the key ID.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl KeyDecrypter for RsaOaepDecrypter {
    fn algorithm(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Vec<u8>, Error> {
        let decrypted = match self.alg {
            KeyAlgorithm::RsaOaep => {
                self.private_key.decrypt_blinded(&mut OsRng, Oaep::new::<Sha1>(), encrypted_key)
            }
            KeyAlgorithm::RsaOaep256 => {
                self.private_key.decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), encrypted_key)
            }
            _ => return Err(Error::AlgorithmMismatch(self.alg)),
        };

        decrypted.map_err(|_| Error::KeyDecrypt)
    }
}

/// Key decrypter for `RSA1_5`, hardened against padding oracles.
///
/// Decryption never reports a padding failure. A random fallback CEK of the
/// expected length is prepared before the ciphertext is examined and is
/// returned whenever the primitive fails or recovers a key of the wrong
/// length, leaving the failure to surface at the content decryption step.
#[derive(Debug)]
pub struct RsaPkcs15Decrypter {
    alg: KeyAlgorithm,
    private_key: RsaPrivateKey,
    cek_size: usize,
    key_id: Option<String>,
}

impl RsaPkcs15Decrypter {
    /// Create a decrypter from the recipient's private key and the CEK
    /// length expected by the content encryption algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error unless `alg` is `RSA1_5`.
    pub fn new(
        alg: KeyAlgorithm, private_key: RsaPrivateKey, cek_size: usize,
    ) -> Result<Self, Error> {
        if alg != KeyAlgorithm::Rsa15 {
            return Err(Error::AlgorithmMismatch(alg));
        }
        Ok(Self { alg, private_key, cek_size, key_id: None })
    }

    /// Set the key ID.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl KeyDecrypter for RsaPkcs15Decrypter {
    fn algorithm(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Vec<u8>, Error> {
        // the fallback must exist before the ciphertext is examined
        let mut fallback = vec![0u8; self.cek_size];
        OsRng.fill_bytes(&mut fallback);

        // the ciphertext always matches the modulus width; anything else is
        // rejected before the primitive runs
        let expected_len = self.private_key.size();
        if encrypted_key.len() != expected_len {
            fallback.zeroize();
            return Err(Error::InputShape(format!(
                "encrypted key must be {expected_len} bytes, got {}",
                encrypted_key.len()
            )));
        }

        match self.private_key.decrypt_blinded(&mut OsRng, Pkcs1v15Encrypt, encrypted_key) {
            Ok(plaintext) if plaintext.len() == self.cek_size => {
                fallback.zeroize();
                Ok(plaintext)
            }
            Ok(mut plaintext) => {
                plaintext.zeroize();
                Ok(fallback)
            }
            Err(_) => Ok(fallback),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::LazyLock;

    use super::*;

    static TEST_KEY: LazyLock<RsaPrivateKey> =
        LazyLock::new(|| RsaPrivateKey::new(&mut OsRng, 2048).expect("should generate"));

    #[test]
    fn pkcs15_round_trips() {
        let encrypter = RsaEncrypter::new(KeyAlgorithm::Rsa15, TEST_KEY.to_public_key())
            .expect("should build");
        let decrypter = RsaPkcs15Decrypter::new(KeyAlgorithm::Rsa15, TEST_KEY.clone(), 32)
            .expect("should build");

        let cek = [0x42u8; 32];
        let encrypted = encrypter.encrypt(&cek).expect("should encrypt");
        assert_eq!(encrypted.bytes().len(), 256);
        assert_eq!(decrypter.decrypt(encrypted.bytes()).expect("should decrypt"), cek);
    }

    #[test]
    fn oaep_round_trips() {
        for alg in [KeyAlgorithm::RsaOaep, KeyAlgorithm::RsaOaep256] {
            let encrypter =
                RsaEncrypter::new(alg, TEST_KEY.to_public_key()).expect("should build");
            let decrypter =
                RsaOaepDecrypter::new(alg, TEST_KEY.clone()).expect("should build");

            let cek = [0x42u8; 32];
            let encrypted = encrypter.encrypt(&cek).expect("should encrypt");
            assert_eq!(decrypter.decrypt(encrypted.bytes()).expect("should decrypt"), cek);
        }
    }

    #[test]
    fn oaep_reports_decrypt_failure() {
        let decrypter =
            RsaOaepDecrypter::new(KeyAlgorithm::RsaOaep, TEST_KEY.clone()).expect("should build");

        let mut garbage = vec![0u8; 256];
        OsRng.fill_bytes(&mut garbage);
        garbage[0] = 0;

        let err = decrypter.decrypt(&garbage).expect_err("should fail");
        assert!(matches!(err, Error::KeyDecrypt));
    }

    #[test]
    fn pkcs15_garbage_yields_a_plausible_key_not_an_error() {
        let decrypter = RsaPkcs15Decrypter::new(KeyAlgorithm::Rsa15, TEST_KEY.clone(), 32)
            .expect("should build");

        let mut garbage = vec![0u8; 256];
        OsRng.fill_bytes(&mut garbage);
        garbage[0] = 0;

        let first = decrypter.decrypt(&garbage).expect("should yield a key");
        assert_eq!(first.len(), 32);

        // the fallback is freshly drawn per call
        let second = decrypter.decrypt(&garbage).expect("should yield a key");
        assert_eq!(second.len(), 32);
        assert_ne!(first, second);
    }

    #[test]
    fn pkcs15_mismatched_padding_yields_a_plausible_key() {
        // valid OAEP ciphertext is garbage to the v1.5 padding check
        let encrypter = RsaEncrypter::new(KeyAlgorithm::RsaOaep, TEST_KEY.to_public_key())
            .expect("should build");
        let encrypted = encrypter.encrypt(&[0x42u8; 32]).expect("should encrypt");

        let decrypter = RsaPkcs15Decrypter::new(KeyAlgorithm::Rsa15, TEST_KEY.clone(), 32)
            .expect("should build");
        let recovered = decrypter.decrypt(encrypted.bytes()).expect("should yield a key");
        assert_eq!(recovered.len(), 32);
        assert_ne!(recovered, vec![0x42u8; 32]);
    }

    #[test]
    fn pkcs15_rejects_mismatched_ciphertext_length_up_front() {
        let decrypter = RsaPkcs15Decrypter::new(KeyAlgorithm::Rsa15, TEST_KEY.clone(), 32)
            .expect("should build");

        let err = decrypter.decrypt(&[0u8; 255]).expect_err("should reject");
        assert!(matches!(err, Error::InputShape(_)));
    }

    #[test]
    fn constructors_validate_the_algorithm() {
        let err = RsaEncrypter::new(KeyAlgorithm::A128Kw, TEST_KEY.to_public_key())
            .expect_err("should reject");
        assert!(matches!(err, Error::AlgorithmMismatch(KeyAlgorithm::A128Kw)));

        let err = RsaOaepDecrypter::new(KeyAlgorithm::Rsa15, TEST_KEY.clone())
            .expect_err("should reject");
        assert!(matches!(err, Error::AlgorithmMismatch(KeyAlgorithm::Rsa15)));

        let err = RsaPkcs15Decrypter::new(KeyAlgorithm::RsaOaep, TEST_KEY.clone(), 32)
            .expect_err("should reject");
        assert!(matches!(err, Error::AlgorithmMismatch(KeyAlgorithm::RsaOaep)));
    }
}
