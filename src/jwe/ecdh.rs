//! # ECDH-ES Key Agreement
//!
//! Elliptic Curve Diffie-Hellman Ephemeral-Static key agreement with the
//! Concat KDF, per [RFC7518] §4.6. In direct mode (`ECDH-ES`) the derived
//! key *is* the CEK; in the wrapping modes (`ECDH-ES+A128KW` and friends)
//! it becomes the KEK that wraps a caller-provided CEK.
//!
//! The sender's ephemeral public key travels to the recipient in the
//! per-recipient `epk` header.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use credence_ecc::{PublicKey, SecretKey};
use zeroize::Zeroizing;

use crate::Error;
use crate::jwe::kdf::concat_kdf;
use crate::jwe::keywrap::Kek;
use crate::jwe::{ContentAlgorithm, EncryptedKey, KeyAlgorithm, KeyDecrypter, KeyEncrypter};

/// Derive key material from an ECDH shared secret.
///
/// The shared secret Z is the fixed-width X coordinate of `d · P`; it is
/// fed to the Concat KDF with `alg`, the party info strings, and the output
/// length in bits, then wiped.
pub(crate) fn derive_ecdh_es(
    alg: &[u8], apu: &[u8], apv: &[u8], secret: &SecretKey, public: &PublicKey, keysize: usize,
) -> Result<Zeroizing<Vec<u8>>, Error> {
    let z = secret.diffie_hellman(public)?;
    Ok(concat_kdf(alg, z.as_bytes(), apu, apv, keysize))
}

/// The KEK length for an ECDH-ES key-wrapping algorithm.
fn wrap_key_size(alg: KeyAlgorithm) -> Result<usize, Error> {
    match alg {
        KeyAlgorithm::EcdhEsA128Kw => Ok(16),
        KeyAlgorithm::EcdhEsA192Kw => Ok(24),
        KeyAlgorithm::EcdhEsA256Kw => Ok(32),
        _ => Err(Error::AlgorithmMismatch(alg)),
    }
}

/// Direct ECDH-ES key agreement (`ECDH-ES` without key wrapping).
///
/// The agreed key is used directly as the CEK, so there is no encrypted key
/// to transport; the JWE encrypted key field is left empty.
pub struct EcdhEsAgreement {
    content_alg: ContentAlgorithm,
    recipient: PublicKey,
    apu: Vec<u8>,
    apv: Vec<u8>,
}

impl EcdhEsAgreement {
    /// Create a key agreement for the recipient's public key. The CEK
    /// length is taken from the content encryption algorithm.
    #[must_use]
    pub fn new(content_alg: ContentAlgorithm, recipient: PublicKey, apu: &[u8], apv: &[u8]) -> Self {
        Self { content_alg, recipient, apu: apu.to_vec(), apv: apv.to_vec() }
    }

    /// The key encryption algorithm being used.
    #[must_use]
    pub const fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::EcdhEs
    }

    /// Generate an ephemeral key pair and agree on the CEK. Returns the CEK
    /// together with the ephemeral public key the recipient needs as its
    /// `epk` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the recipient key is unusable for agreement.
    pub fn agree(&self) -> Result<(Zeroizing<Vec<u8>>, PublicKey), Error> {
        let ephemeral = SecretKey::generate(self.recipient.curve());
        let cek = derive_ecdh_es(
            self.content_alg.to_string().as_bytes(),
            &self.apu,
            &self.apv,
            &ephemeral,
            &self.recipient,
            self.content_alg.key_size(),
        )?;
        Ok((cek, ephemeral.public_key()?))
    }
}

/// Key encrypter for the ECDH-ES key-wrapping algorithms.
#[derive(Debug)]
pub struct EcdhEsEncrypter {
    alg: KeyAlgorithm,
    recipient: PublicKey,
    apu: Vec<u8>,
    apv: Vec<u8>,
    key_id: Option<String>,
}

impl EcdhEsEncrypter {
    /// Create an encrypter for the recipient's public key.
    ///
    /// # Errors
    ///
    /// Returns an error unless `alg` is one of `ECDH-ES+A128KW`,
    /// `ECDH-ES+A192KW`, or `ECDH-ES+A256KW`. Direct `ECDH-ES` produces the
    /// CEK rather than encrypting one; use [`EcdhEsAgreement`].
    pub fn new(
        alg: KeyAlgorithm, recipient: PublicKey, apu: &[u8], apv: &[u8],
    ) -> Result<Self, Error> {
        wrap_key_size(alg)?;
        Ok(Self { alg, recipient, apu: apu.to_vec(), apv: apv.to_vec(), key_id: None })
    }

    /// Set the key ID.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl KeyEncrypter for EcdhEsEncrypter {
    fn algorithm(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: &[u8]) -> Result<EncryptedKey, Error> {
        let ephemeral = SecretKey::generate(self.recipient.curve());
        let kek = derive_ecdh_es(
            self.alg.to_string().as_bytes(),
            &self.apu,
            &self.apv,
            &ephemeral,
            &self.recipient,
            wrap_key_size(self.alg)?,
        )?;

        let bytes = Kek::new(&kek)?.wrap(cek)?;
        Ok(EncryptedKey::Ephemeral { bytes, ephemeral_public: ephemeral.public_key()? })
    }
}

/// Key decrypter for ECDH-ES, direct or key-wrapping.
#[derive(Debug)]
pub struct EcdhEsDecrypter {
    alg: KeyAlgorithm,
    content_alg: ContentAlgorithm,
    sender_public: PublicKey,
    apu: Vec<u8>,
    apv: Vec<u8>,
    secret: SecretKey,
    key_id: Option<String>,
}

impl EcdhEsDecrypter {
    /// Create a decrypter from the recipient's private key and the sender's
    /// ephemeral public key (the `epk` header value).
    ///
    /// # Errors
    ///
    /// Returns an error unless `alg` is an ECDH-ES algorithm.
    pub fn new(
        alg: KeyAlgorithm, content_alg: ContentAlgorithm, sender_public: PublicKey, apu: &[u8],
        apv: &[u8], secret: SecretKey,
    ) -> Result<Self, Error> {
        if alg != KeyAlgorithm::EcdhEs {
            wrap_key_size(alg)?;
        }
        Ok(Self {
            alg,
            content_alg,
            sender_public,
            apu: apu.to_vec(),
            apv: apv.to_vec(),
            secret,
            key_id: None,
        })
    }

    /// Set the key ID.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl KeyDecrypter for EcdhEsDecrypter {
    fn algorithm(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Vec<u8>, Error> {
        // direct mode binds the KDF to the content algorithm, wrapping
        // modes to the key algorithm
        let (alg_name, keysize) = if self.alg == KeyAlgorithm::EcdhEs {
            (self.content_alg.to_string(), self.content_alg.key_size())
        } else {
            (self.alg.to_string(), wrap_key_size(self.alg)?)
        };

        let key = derive_ecdh_es(
            alg_name.as_bytes(),
            &self.apu,
            &self.apv,
            &self.secret,
            &self.sender_public,
            keysize,
        )?;

        if self.alg == KeyAlgorithm::EcdhEs {
            return Ok(key.to_vec());
        }
        Kek::new(&key)?.unwrap(encrypted_key)
    }
}

#[cfg(test)]
mod test {
    use base64ct::{Base64UrlUnpadded, Encoding};
    use credence_ecc::Curve;

    use super::*;

    fn appendix_c_ephemeral() -> SecretKey {
        let d = Base64UrlUnpadded::decode_vec("0_NxaRPUMQoAJt50Gz8YiTr8gRTwyEaCumd-MToTmIo")
            .expect("should decode");
        SecretKey::from_bytes(Curve::P256, &d).expect("should build")
    }

    fn appendix_c_ephemeral_public() -> PublicKey {
        let x = Base64UrlUnpadded::decode_vec("gI0GAILBdu7T53akrFmMyGcsF3n5dO7MmwNBHKW5SV0")
            .expect("should decode");
        let y = Base64UrlUnpadded::decode_vec("SLW_xSffzlPWrHEVI30DHM_4egVwt3NQqeUD7nMFpps")
            .expect("should decode");
        PublicKey::from_coordinates(Curve::P256, &x, &y).expect("should build")
    }

    fn appendix_c_static() -> SecretKey {
        let d = Base64UrlUnpadded::decode_vec("VEmDZpDXXK8p8N0Cndsxs924q6nS1RXFASRl6BfUqdw")
            .expect("should decode");
        SecretKey::from_bytes(Curve::P256, &d).expect("should build")
    }

    fn appendix_c_static_public() -> PublicKey {
        let x = Base64UrlUnpadded::decode_vec("weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ")
            .expect("should decode");
        let y = Base64UrlUnpadded::decode_vec("e8lnCO-AlStT-NJVX-crhB7QRYhiix03illJOVAOyck")
            .expect("should decode");
        PublicKey::from_coordinates(Curve::P256, &x, &y).expect("should build")
    }

    // RFC 7518 Appendix C
    #[test]
    fn derives_appendix_c_key() {
        let derived = derive_ecdh_es(
            b"A128GCM",
            b"Alice",
            b"Bob",
            &appendix_c_ephemeral(),
            &appendix_c_static_public(),
            16,
        )
        .expect("should derive");

        let expected =
            Base64UrlUnpadded::decode_vec("VqqN6vgjbSBcIijNcacQGg").expect("should decode");
        assert_eq!(derived.as_slice(), expected.as_slice());
    }

    #[test]
    fn both_parties_derive_the_same_key() {
        let sender = derive_ecdh_es(
            b"A128GCM",
            b"Alice",
            b"Bob",
            &appendix_c_ephemeral(),
            &appendix_c_static_public(),
            16,
        )
        .expect("should derive");

        let recipient = derive_ecdh_es(
            b"A128GCM",
            b"Alice",
            b"Bob",
            &appendix_c_static(),
            &appendix_c_ephemeral_public(),
            16,
        )
        .expect("should derive");

        assert_eq!(sender.as_slice(), recipient.as_slice());
    }

    #[test]
    fn wrapped_cek_round_trips() {
        for (alg, curve) in [
            (KeyAlgorithm::EcdhEsA128Kw, Curve::P256),
            (KeyAlgorithm::EcdhEsA192Kw, Curve::P384),
            (KeyAlgorithm::EcdhEsA256Kw, Curve::P521),
        ] {
            let recipient_secret = SecretKey::generate(curve);
            let recipient_public = recipient_secret.public_key().expect("should derive");

            let encrypter = EcdhEsEncrypter::new(alg, recipient_public, b"Alice", b"Bob")
                .expect("should build");
            let cek = [0x27u8; 32];
            let encrypted = encrypter.encrypt(&cek).expect("should encrypt");

            let epk = encrypted.ephemeral_public().expect("should carry epk").clone();
            let decrypter = EcdhEsDecrypter::new(
                alg,
                ContentAlgorithm::A256Gcm,
                epk,
                b"Alice",
                b"Bob",
                recipient_secret,
            )
            .expect("should build");

            assert_eq!(decrypter.decrypt(encrypted.bytes()).expect("should decrypt"), cek);
        }
    }

    #[test]
    fn direct_agreement_round_trips() {
        let recipient_secret = SecretKey::generate(Curve::P256);
        let recipient_public = recipient_secret.public_key().expect("should derive");

        let agreement =
            EcdhEsAgreement::new(ContentAlgorithm::A256Gcm, recipient_public, b"Alice", b"Bob");
        assert_eq!(agreement.algorithm(), KeyAlgorithm::EcdhEs);

        let (cek, epk) = agreement.agree().expect("should agree");
        assert_eq!(cek.len(), 32);

        let decrypter = EcdhEsDecrypter::new(
            KeyAlgorithm::EcdhEs,
            ContentAlgorithm::A256Gcm,
            epk,
            b"Alice",
            b"Bob",
            recipient_secret,
        )
        .expect("should build");

        assert_eq!(decrypter.decrypt(&[]).expect("should decrypt"), cek.to_vec());
    }

    #[test]
    fn decrypt_rejects_foreign_curve_epk() {
        let recipient_secret = SecretKey::generate(Curve::P256);
        let foreign_epk =
            SecretKey::generate(Curve::P384).public_key().expect("should derive");

        let decrypter = EcdhEsDecrypter::new(
            KeyAlgorithm::EcdhEs,
            ContentAlgorithm::A256Gcm,
            foreign_epk,
            b"",
            b"",
            recipient_secret,
        )
        .expect("should build");

        let err = decrypter.decrypt(&[]).expect_err("should reject");
        assert!(matches!(err, Error::CurveMismatch(_)));
    }

    #[test]
    fn constructors_validate_the_algorithm() {
        let public = SecretKey::generate(Curve::P256).public_key().expect("should derive");

        let err = EcdhEsEncrypter::new(KeyAlgorithm::EcdhEs, public.clone(), b"", b"")
            .expect_err("should reject");
        assert!(matches!(err, Error::AlgorithmMismatch(KeyAlgorithm::EcdhEs)));

        let err = EcdhEsDecrypter::new(
            KeyAlgorithm::Rsa15,
            ContentAlgorithm::A256Gcm,
            public,
            b"",
            b"",
            SecretKey::generate(Curve::P256),
        )
        .expect_err("should reject");
        assert!(matches!(err, Error::AlgorithmMismatch(KeyAlgorithm::Rsa15)));
    }

    #[test]
    fn tampered_wrapped_key_fails_integrity_check() {
        let recipient_secret = SecretKey::generate(Curve::P256);
        let recipient_public = recipient_secret.public_key().expect("should derive");

        let encrypter = EcdhEsEncrypter::new(
            KeyAlgorithm::EcdhEsA256Kw,
            recipient_public,
            b"",
            b"",
        )
        .expect("should build");
        let encrypted = encrypter.encrypt(&[0x27u8; 32]).expect("should encrypt");

        let mut tampered = encrypted.bytes().to_vec();
        tampered[0] ^= 0x01;

        let decrypter = EcdhEsDecrypter::new(
            KeyAlgorithm::EcdhEsA256Kw,
            ContentAlgorithm::A256Gcm,
            encrypted.ephemeral_public().expect("should carry epk").clone(),
            b"",
            b"",
            recipient_secret,
        )
        .expect("should build");

        let err = decrypter.decrypt(&tampered).expect_err("should reject");
        assert!(matches!(err, Error::UnwrapIntegrity));
    }
}
