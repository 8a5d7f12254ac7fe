use thiserror::Error;

use crate::jwe::KeyAlgorithm;

/// Errors returned by key management operations.
///
/// Messages never carry key material, intermediate plaintext, or anything
/// that would let a caller distinguish padding failures from other failures.
#[derive(Debug, Error)]
pub enum Error {
    /// The algorithm identifier is not supported by the operation it was
    /// handed to.
    #[error("key algorithm {0} is not supported by this operation")]
    AlgorithmMismatch(KeyAlgorithm),

    /// An input has the wrong length or structure.
    #[error("{0}")]
    InputShape(String),

    /// EC keys or points do not belong to the expected curve.
    #[error("{0}")]
    CurveMismatch(String),

    /// The key encryption primitive failed.
    #[error("failed to encrypt key: {0}")]
    KeyEncrypt(String),

    /// The key decryption primitive failed.
    #[error("failed to decrypt key")]
    KeyDecrypt,

    /// AES key unwrap failed its integrity check.
    #[error("failed to unwrap key")]
    UnwrapIntegrity,

    /// The ECMR exchange oracle failed or returned malformed data.
    #[error("key exchange failed")]
    Exchange(#[source] anyhow::Error),
}

impl From<credence_ecc::Error> for Error {
    fn from(err: credence_ecc::Error) -> Self {
        use credence_ecc::Error as Ecc;

        match err {
            Ecc::InvalidLength { .. } | Ecc::InvalidSecretKey(_) => {
                Self::InputShape(err.to_string())
            }
            Ecc::CurveMismatch { .. } | Ecc::NotOnCurve(_) | Ecc::PointAtInfinity => {
                Self::CurveMismatch(err.to_string())
            }
        }
    }
}
