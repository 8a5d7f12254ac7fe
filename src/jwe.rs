//! # JWE Key Management
//!
//! The algorithms used to produce or recover the content encryption key
//! (CEK) of a JWE ([RFC7516]), as registered in JWA ([RFC7518] §4): direct
//! use of a shared key, AES Key Wrap, ECDH-ES key agreement (with and
//! without key wrapping), ECMR blinded key agreement, and RSA key
//! encryption.
//!
//! Each algorithm is exposed as a paired encrypter/decrypter tied to a
//! single recipient. Encrypters consume the CEK and return an
//! [`EncryptedKey`] carrying the wire-form encrypted key plus any header
//! contribution (the ephemeral public key for key agreement). Decrypters
//! consume the wire-form encrypted key and return the recovered CEK.
//!
//! All types are immutable after construction and safe to share across
//! threads. Content encryption itself (AES-GCM, AES-CBC-HMAC) is a separate
//! concern; this module only consults [`ContentAlgorithm`] for CEK sizes.
//!
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

mod ecdh;
mod ecmr;
mod kdf;
mod keywrap;
mod rsa;

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::Error;
pub use self::ecdh::{EcdhEsAgreement, EcdhEsDecrypter, EcdhEsEncrypter};
pub use self::ecmr::EcmrDecrypter;
pub use self::keywrap::AesKw;
pub use self::rsa::{RsaEncrypter, RsaOaepDecrypter, RsaPkcs15Decrypter};

/// The algorithm used to encrypt or determine the value of the content
/// encryption key (CEK). Serialized names follow the IANA JOSE registry.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyAlgorithm {
    /// Direct use of a shared symmetric key as the CEK.
    #[serde(rename = "dir")]
    Dir,

    /// AES Key Wrap using a 128-bit key.
    #[serde(rename = "A128KW")]
    A128Kw,

    /// AES Key Wrap using a 192-bit key.
    #[serde(rename = "A192KW")]
    A192Kw,

    /// AES Key Wrap using a 256-bit key.
    #[serde(rename = "A256KW")]
    A256Kw,

    /// Elliptic Curve Diffie-Hellman Ephemeral-Static key agreement using
    /// Concat KDF.
    #[default]
    #[serde(rename = "ECDH-ES")]
    EcdhEs,

    /// ECDH-ES with the derived key wrapping the CEK using A128KW.
    #[serde(rename = "ECDH-ES+A128KW")]
    EcdhEsA128Kw,

    /// ECDH-ES with the derived key wrapping the CEK using A192KW.
    #[serde(rename = "ECDH-ES+A192KW")]
    EcdhEsA192Kw,

    /// ECDH-ES with the derived key wrapping the CEK using A256KW.
    #[serde(rename = "ECDH-ES+A256KW")]
    EcdhEsA256Kw,

    /// Blinded key agreement through an exchange oracle, so the holder of
    /// the long-term private key can remain offline.
    #[serde(rename = "ECMR")]
    Ecmr,

    /// RSAES-PKCS1-v1_5.
    #[serde(rename = "RSA1_5")]
    Rsa15,

    /// RSAES OAEP using SHA-1 and MGF1 with SHA-1.
    #[serde(rename = "RSA-OAEP")]
    RsaOaep,

    /// RSAES OAEP using SHA-256 and MGF1 with SHA-256.
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
}

impl Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dir => write!(f, "dir"),
            Self::A128Kw => write!(f, "A128KW"),
            Self::A192Kw => write!(f, "A192KW"),
            Self::A256Kw => write!(f, "A256KW"),
            Self::EcdhEs => write!(f, "ECDH-ES"),
            Self::EcdhEsA128Kw => write!(f, "ECDH-ES+A128KW"),
            Self::EcdhEsA192Kw => write!(f, "ECDH-ES+A192KW"),
            Self::EcdhEsA256Kw => write!(f, "ECDH-ES+A256KW"),
            Self::Ecmr => write!(f, "ECMR"),
            Self::Rsa15 => write!(f, "RSA1_5"),
            Self::RsaOaep => write!(f, "RSA-OAEP"),
            Self::RsaOaep256 => write!(f, "RSA-OAEP-256"),
        }
    }
}

/// The algorithm used to perform authenticated encryption on the plaintext.
/// Consulted here only to determine the CEK length.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum ContentAlgorithm {
    /// AES GCM using a 128-bit key.
    #[serde(rename = "A128GCM")]
    A128Gcm,

    /// AES GCM using a 192-bit key.
    #[serde(rename = "A192GCM")]
    A192Gcm,

    /// AES GCM using a 256-bit key.
    #[default]
    #[serde(rename = "A256GCM")]
    A256Gcm,

    /// AES-128 CBC with HMAC SHA-256.
    #[serde(rename = "A128CBC-HS256")]
    A128CbcHs256,

    /// AES-192 CBC with HMAC SHA-384.
    #[serde(rename = "A192CBC-HS384")]
    A192CbcHs384,

    /// AES-256 CBC with HMAC SHA-512.
    #[serde(rename = "A256CBC-HS512")]
    A256CbcHs512,
}

impl ContentAlgorithm {
    /// The CEK length in bytes. CBC-HMAC algorithms use a double-length key
    /// (MAC key ‖ encryption key).
    #[must_use]
    pub const fn key_size(self) -> usize {
        match self {
            Self::A128Gcm => 16,
            Self::A192Gcm => 24,
            Self::A256Gcm | Self::A128CbcHs256 => 32,
            Self::A192CbcHs384 => 48,
            Self::A256CbcHs512 => 64,
        }
    }
}

impl Display for ContentAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A128Gcm => write!(f, "A128GCM"),
            Self::A192Gcm => write!(f, "A192GCM"),
            Self::A256Gcm => write!(f, "A256GCM"),
            Self::A128CbcHs256 => write!(f, "A128CBC-HS256"),
            Self::A192CbcHs384 => write!(f, "A192CBC-HS384"),
            Self::A256CbcHs512 => write!(f, "A256CBC-HS512"),
        }
    }
}

/// The output of key encryption: the wire-form encrypted key plus whatever
/// the recipient needs in its per-recipient header to reverse it.
#[derive(Clone, Debug)]
pub enum EncryptedKey {
    /// Encrypted key bytes only (AES-KW, RSA).
    Bytes(Vec<u8>),

    /// Encrypted key bytes plus the ephemeral public key the recipient
    /// needs as its `epk` header (ECDH-ES).
    Ephemeral {
        /// The wire-form encrypted key. Empty for direct key agreement.
        bytes: Vec<u8>,

        /// The sender's ephemeral public key.
        ephemeral_public: credence_ecc::PublicKey,
    },
}

impl EncryptedKey {
    /// The wire-form encrypted key bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) | Self::Ephemeral { bytes, .. } => bytes,
        }
    }

    /// The ephemeral public key, for algorithms that contribute one to the
    /// recipient header.
    #[must_use]
    pub const fn ephemeral_public(&self) -> Option<&credence_ecc::PublicKey> {
        match self {
            Self::Bytes(_) => None,
            Self::Ephemeral { ephemeral_public, .. } => Some(ephemeral_public),
        }
    }
}

/// Encrypts the content encryption key for a single recipient.
pub trait KeyEncrypter {
    /// The key encryption algorithm being used.
    fn algorithm(&self) -> KeyAlgorithm;

    /// The key ID associated with this encrypter, if any.
    fn key_id(&self) -> Option<&str> {
        None
    }

    /// Encrypt the content encryption key.
    ///
    /// # Errors
    ///
    /// Returns an error if the CEK is malformed for the algorithm or the
    /// underlying primitive fails.
    fn encrypt(&self, cek: &[u8]) -> Result<EncryptedKey, Error>;
}

/// Recovers the content encryption key for a single recipient.
pub trait KeyDecrypter {
    /// The key encryption algorithm being used.
    fn algorithm(&self) -> KeyAlgorithm;

    /// The key ID associated with this decrypter, if any.
    fn key_id(&self) -> Option<&str> {
        None
    }

    /// Recover the content encryption key from its wire form. The returned
    /// buffer is owned by the caller, who is responsible for wiping it.
    ///
    /// # Errors
    ///
    /// Returns an error if the encrypted key is malformed or fails to
    /// decrypt.
    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Direct use of a shared symmetric key: the embedded key *is* the CEK.
///
/// No cryptographic operation occurs. Decryption returns a fresh copy so
/// the caller can wipe it independently of this value.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DirectKey {
    #[zeroize(skip)]
    key_id: Option<String>,
    key: Vec<u8>,
}

impl DirectKey {
    /// Create a direct-mode key from the shared symmetric key.
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        Self { key_id: None, key: key.to_vec() }
    }

    /// Set the key ID.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl KeyEncrypter for DirectKey {
    fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Dir
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    // The CEK is the shared key itself, so nothing travels on the wire.
    fn encrypt(&self, _cek: &[u8]) -> Result<EncryptedKey, Error> {
        Ok(EncryptedKey::Bytes(Vec::new()))
    }
}

impl KeyDecrypter for DirectKey {
    fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Dir
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn decrypt(&self, _encrypted_key: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(self.key.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_algorithm_wire_names() {
        let names = [
            (KeyAlgorithm::Dir, "dir"),
            (KeyAlgorithm::A128Kw, "A128KW"),
            (KeyAlgorithm::A256Kw, "A256KW"),
            (KeyAlgorithm::EcdhEs, "ECDH-ES"),
            (KeyAlgorithm::EcdhEsA192Kw, "ECDH-ES+A192KW"),
            (KeyAlgorithm::Ecmr, "ECMR"),
            (KeyAlgorithm::Rsa15, "RSA1_5"),
            (KeyAlgorithm::RsaOaep256, "RSA-OAEP-256"),
        ];

        for (alg, name) in names {
            assert_eq!(alg.to_string(), name);
            let json = serde_json::to_string(&alg).expect("should serialize");
            assert_eq!(json, format!("\"{name}\""));
            let parsed: KeyAlgorithm = serde_json::from_str(&json).expect("should deserialize");
            assert_eq!(parsed, alg);
        }
    }

    #[test]
    fn content_algorithm_key_sizes() {
        assert_eq!(ContentAlgorithm::A128Gcm.key_size(), 16);
        assert_eq!(ContentAlgorithm::A192Gcm.key_size(), 24);
        assert_eq!(ContentAlgorithm::A256Gcm.key_size(), 32);
        assert_eq!(ContentAlgorithm::A128CbcHs256.key_size(), 32);
        assert_eq!(ContentAlgorithm::A192CbcHs384.key_size(), 48);
        assert_eq!(ContentAlgorithm::A256CbcHs512.key_size(), 64);
    }

    #[test]
    fn direct_returns_an_independent_copy() {
        let direct = DirectKey::new(&[7u8; 32]);

        let mut cek = direct.decrypt(&[]).expect("should decrypt");
        assert_eq!(cek, vec![7u8; 32]);

        // mutating the returned buffer must not affect later copies
        cek[0] = 0;
        assert_eq!(direct.decrypt(&[]).expect("should decrypt"), vec![7u8; 32]);
    }

    #[test]
    fn direct_contributes_no_encrypted_key() {
        let direct = DirectKey::new(&[7u8; 32]).with_key_id("key-1");
        assert_eq!(KeyEncrypter::key_id(&direct), Some("key-1"));
        assert_eq!(KeyEncrypter::algorithm(&direct), KeyAlgorithm::Dir);

        let encrypted = direct.encrypt(&[7u8; 32]).expect("should encrypt");
        assert!(encrypted.bytes().is_empty());
        assert!(encrypted.ephemeral_public().is_none());
    }
}
