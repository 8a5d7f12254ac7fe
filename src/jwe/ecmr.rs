//! # ECMR Key Agreement
//!
//! A blinded variant of ECDH in which the private-key operation is
//! performed by an external exchange oracle, so the holder of the long-term
//! private key (an HSM, a remote service) never reveals it and can stay
//! offline from the message flow.
//!
//! The decrypter blinds the key-agreement point `P` with a fresh ephemeral
//! pair `(t, T)` and sends `X = T + P` to the oracle. The oracle applies
//! the private key `d` and answers with `R = d·X` and its own public key
//! `S = d·G`. Unblinding recovers `Z = R − t·S = d·P` without either party
//! learning the other's secret, and `Z` feeds the same Concat KDF contract
//! as ECDH-ES.

use credence_ecc::{PublicKey, SecretKey};
use zeroize::Zeroizing;

use crate::Error;
use crate::jwe::kdf::concat_kdf;
use crate::jwe::{ContentAlgorithm, KeyAlgorithm, KeyDecrypter};

/// Derive key material through the exchange oracle.
///
/// Each invocation generates a fresh blinding key and performs one
/// exchange; the oracle is stateless from this side.
pub(crate) fn derive_ecmr<F>(
    alg: &[u8], apu: &[u8], apv: &[u8], exchange: &F, public: &PublicKey, keysize: usize,
) -> Result<Zeroizing<Vec<u8>>, Error>
where
    F: Fn(&PublicKey) -> anyhow::Result<(PublicKey, PublicKey)>,
{
    let curve = public.curve();

    let blinding = SecretKey::generate(curve);
    let blinded = blinding.public_key()?.add(public)?;

    let (response, server) = exchange(&blinded).map_err(Error::Exchange)?;
    if response.curve() != curve {
        return Err(Error::CurveMismatch(format!(
            "exchange response must be on curve {curve}, found {}",
            response.curve()
        )));
    }
    if server.curve() != curve {
        return Err(Error::CurveMismatch(format!(
            "exchange server key must be on curve {curve}, found {}",
            server.curve()
        )));
    }

    // Z = R − t·S
    let mask = blinding.scalar_mul(&server)?;
    let z = response.sub(&mask)?;

    Ok(concat_kdf(alg, z.as_bytes(), apu, apv, keysize))
}

/// Key decrypter for ECMR.
///
/// `public_key` is the key-agreement point — for JWE decryption, the
/// sender's ephemeral public key from the `epk` header. The exchange
/// function is invoked once per decryption; implementations may block on
/// I/O, which is the caller's concern.
pub struct EcmrDecrypter<F>
where
    F: Fn(&PublicKey) -> anyhow::Result<(PublicKey, PublicKey)>,
{
    alg: KeyAlgorithm,
    content_alg: ContentAlgorithm,
    public_key: PublicKey,
    apu: Vec<u8>,
    apv: Vec<u8>,
    exchange: F,
    key_id: Option<String>,
}

impl<F> std::fmt::Debug for EcmrDecrypter<F>
where
    F: Fn(&PublicKey) -> anyhow::Result<(PublicKey, PublicKey)>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcmrDecrypter")
            .field("alg", &self.alg)
            .field("content_alg", &self.content_alg)
            .field("public_key", &self.public_key)
            .field("apu", &self.apu)
            .field("apv", &self.apv)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl<F> EcmrDecrypter<F>
where
    F: Fn(&PublicKey) -> anyhow::Result<(PublicKey, PublicKey)>,
{
    /// Create a decrypter around an exchange function.
    ///
    /// # Errors
    ///
    /// Returns an error unless `alg` is `ECMR`.
    pub fn new(
        alg: KeyAlgorithm, content_alg: ContentAlgorithm, public_key: PublicKey, apu: &[u8],
        apv: &[u8], exchange: F,
    ) -> Result<Self, Error> {
        if alg != KeyAlgorithm::Ecmr {
            return Err(Error::AlgorithmMismatch(alg));
        }
        Ok(Self {
            alg,
            content_alg,
            public_key,
            apu: apu.to_vec(),
            apv: apv.to_vec(),
            exchange,
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

impl<F> KeyDecrypter for EcmrDecrypter<F>
where
    F: Fn(&PublicKey) -> anyhow::Result<(PublicKey, PublicKey)>,
{
    fn algorithm(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    // ECMR does not wrap keys: the derived key is the CEK, sized by the
    // content encryption algorithm.
    fn decrypt(&self, _encrypted_key: &[u8]) -> Result<Vec<u8>, Error> {
        let key = derive_ecmr(
            self.content_alg.to_string().as_bytes(),
            &self.apu,
            &self.apv,
            &self.exchange,
            &self.public_key,
            self.content_alg.key_size(),
        )?;
        Ok(key.to_vec())
    }
}
