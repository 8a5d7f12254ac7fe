//! # AES Key Wrap
//!
//! AES Key Wrap with the default initial value, as specified in [RFC3394]
//! and used by the A128KW, A192KW, and A256KW JWE algorithms and by the
//! ECDH-ES key-wrapping variants.
//!
//! [RFC3394]: https://www.rfc-editor.org/rfc/rfc3394

use aes::cipher::{BlockDecrypt, BlockEncrypt, Key, KeyInit};
use aes::{Aes128, Aes192, Aes256, Block};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::Error;
use crate::jwe::{EncryptedKey, KeyAlgorithm, KeyDecrypter, KeyEncrypter};

/// Default initial value, RFC 3394 §2.2.3.1.
const DEFAULT_IV: [u8; 8] = [0xa6, 0xa6, 0xa6, 0xa6, 0xa6, 0xa6, 0xa6, 0xa6];

/// Width of a wrap register in bytes.
const SEMIBLOCK: usize = 8;

/// A key encryption key: an AES cipher selected by KEK length.
pub(crate) enum Kek {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl Kek {
    /// Build a KEK from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not 16, 24, or 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        match key.len() {
            16 => Ok(Self::Aes128(Aes128::new(Key::<Aes128>::from_slice(key)))),
            24 => Ok(Self::Aes192(Aes192::new(Key::<Aes192>::from_slice(key)))),
            32 => Ok(Self::Aes256(Aes256::new(Key::<Aes256>::from_slice(key)))),
            _ => Err(Error::InputShape("key wrap key must be 16, 24, or 32 bytes".to_string())),
        }
    }

    fn encrypt_block(&self, block: &mut Block) {
        match self {
            Self::Aes128(cipher) => cipher.encrypt_block(block),
            Self::Aes192(cipher) => cipher.encrypt_block(block),
            Self::Aes256(cipher) => cipher.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut Block) {
        match self {
            Self::Aes128(cipher) => cipher.decrypt_block(block),
            Self::Aes192(cipher) => cipher.decrypt_block(block),
            Self::Aes256(cipher) => cipher.decrypt_block(block),
        }
    }

    /// Wrap a key. The plaintext length must be a positive multiple of
    /// 8 bytes; the output is 8 bytes longer.
    ///
    /// # Errors
    ///
    /// Returns an error if the plaintext length is invalid.
    pub fn wrap(&self, cek: &[u8]) -> Result<Vec<u8>, Error> {
        if cek.is_empty() || cek.len() % SEMIBLOCK != 0 {
            return Err(Error::InputShape(format!(
                "key wrap input must be {SEMIBLOCK} byte blocks"
            )));
        }

        let n = cek.len() / SEMIBLOCK;
        let mut registers = cek.to_vec();

        // block = A ‖ R[i] throughout; A lives in the first semiblock
        let mut block = Block::default();
        block[..SEMIBLOCK].copy_from_slice(&DEFAULT_IV);

        for t in 1..=(6 * n) as u64 {
            let offset = ((t - 1) as usize % n) * SEMIBLOCK;
            block[SEMIBLOCK..].copy_from_slice(&registers[offset..offset + SEMIBLOCK]);

            self.encrypt_block(&mut block);

            for (a, ctr) in block[..SEMIBLOCK].iter_mut().zip(t.to_be_bytes()) {
                *a ^= ctr;
            }
            registers[offset..offset + SEMIBLOCK].copy_from_slice(&block[SEMIBLOCK..]);
        }

        let mut out = Vec::with_capacity((n + 1) * SEMIBLOCK);
        out.extend_from_slice(&block[..SEMIBLOCK]);
        out.extend_from_slice(&registers);

        block.as_mut_slice().zeroize();
        Ok(out)
    }

    /// Unwrap a key and verify its integrity. The ciphertext length must be
    /// at least 24 bytes and a multiple of 8.
    ///
    /// # Errors
    ///
    /// Returns an error if the ciphertext length is invalid or the
    /// integrity check fails.
    pub fn unwrap(&self, ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
        if ciphertext.len() < 3 * SEMIBLOCK || ciphertext.len() % SEMIBLOCK != 0 {
            return Err(Error::InputShape(format!(
                "key unwrap input must be at least {} bytes of {SEMIBLOCK} byte blocks",
                3 * SEMIBLOCK
            )));
        }

        let n = ciphertext.len() / SEMIBLOCK - 1;
        let mut registers = ciphertext[SEMIBLOCK..].to_vec();

        let mut block = Block::default();
        block[..SEMIBLOCK].copy_from_slice(&ciphertext[..SEMIBLOCK]);

        for t in (1..=(6 * n) as u64).rev() {
            for (a, ctr) in block[..SEMIBLOCK].iter_mut().zip(t.to_be_bytes()) {
                *a ^= ctr;
            }
            let offset = ((t - 1) as usize % n) * SEMIBLOCK;
            block[SEMIBLOCK..].copy_from_slice(&registers[offset..offset + SEMIBLOCK]);

            self.decrypt_block(&mut block);

            registers[offset..offset + SEMIBLOCK].copy_from_slice(&block[SEMIBLOCK..]);
        }

        let matches = block[..SEMIBLOCK].ct_eq(&DEFAULT_IV);
        block.as_mut_slice().zeroize();

        if matches.unwrap_u8() == 0 {
            registers.zeroize();
            return Err(Error::UnwrapIntegrity);
        }
        Ok(registers)
    }
}

/// AES Key Wrap with a shared symmetric key (A128KW, A192KW, A256KW).
///
/// The same value encrypts and decrypts. The shared key is wiped on drop.
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct AesKw {
    #[zeroize(skip)]
    alg: KeyAlgorithm,
    #[zeroize(skip)]
    key_id: Option<String>,
    key: Vec<u8>,
}

impl AesKw {
    /// Create a key wrapper for the given algorithm and shared key.
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm is not an AES Key Wrap algorithm
    /// or the key length does not match it.
    pub fn new(alg: KeyAlgorithm, key: &[u8]) -> Result<Self, Error> {
        let size = match alg {
            KeyAlgorithm::A128Kw => 16,
            KeyAlgorithm::A192Kw => 24,
            KeyAlgorithm::A256Kw => 32,
            _ => return Err(Error::AlgorithmMismatch(alg)),
        };
        if key.len() != size {
            return Err(Error::InputShape(format!("{alg} requires a {size} byte key")));
        }

        Ok(Self { alg, key_id: None, key: key.to_vec() })
    }

    /// Set the key ID.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl KeyEncrypter for AesKw {
    fn algorithm(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: &[u8]) -> Result<EncryptedKey, Error> {
        let wrapped = Kek::new(&self.key)?.wrap(cek)?;
        Ok(EncryptedKey::Bytes(wrapped))
    }
}

impl KeyDecrypter for AesKw {
    fn algorithm(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Vec<u8>, Error> {
        Kek::new(&self.key)?.unwrap(encrypted_key)
    }
}
