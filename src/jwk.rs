//! # JSON Web Key (JWK)
//!
//! The EC public key representation of JWK ([RFC7517]) as used for the
//! `epk` header of ECDH-ES recipients: `{"kty":"EC","crv":…,"x":…,"y":…}`
//! with coordinates base64url-encoded at the curve's fixed width.
//!
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

use base64ct::{Base64UrlUnpadded, Encoding};
use credence_ecc::{Curve, PublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Error;

/// Cryptographic key type.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyType {
    /// Elliptic curve key pair.
    #[default]
    #[serde(rename = "EC")]
    Ec,
}

/// A public key in JWK format, as carried in the `epk` recipient header.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct PublicKeyJwk {
    /// Key type.
    pub kty: KeyType,

    /// Cryptographic curve.
    pub crv: Curve,

    /// X coordinate, base64url-encoded at the curve's fixed width.
    pub x: String,

    /// Y coordinate, base64url-encoded at the curve's fixed width.
    pub y: String,
}

impl PublicKeyJwk {
    /// The JWK thumbprint per [RFC7638]: the SHA-256 hash of the required
    /// members in lexicographic order, base64url-encoded.
    ///
    /// [RFC7638]: https://www.rfc-editor.org/rfc/rfc7638
    #[must_use]
    pub fn thumbprint(&self) -> String {
        let pre_image =
            format!(r#"{{"crv":"{}","kty":"EC","x":"{}","y":"{}"}}"#, self.crv, self.x, self.y);
        Base64UrlUnpadded::encode_string(&Sha256::digest(pre_image.as_bytes()))
    }
}

impl From<&PublicKey> for PublicKeyJwk {
    fn from(key: &PublicKey) -> Self {
        Self {
            kty: KeyType::Ec,
            crv: key.curve(),
            x: Base64UrlUnpadded::encode_string(key.x()),
            y: Base64UrlUnpadded::encode_string(key.y()),
        }
    }
}

impl TryFrom<&PublicKeyJwk> for PublicKey {
    type Error = Error;

    fn try_from(jwk: &PublicKeyJwk) -> Result<Self, Self::Error> {
        let x = Base64UrlUnpadded::decode_vec(&jwk.x)
            .map_err(|e| Error::InputShape(format!("issue decoding `x`: {e}")))?;
        let y = Base64UrlUnpadded::decode_vec(&jwk.y)
            .map_err(|e| Error::InputShape(format!("issue decoding `y`: {e}")))?;

        Ok(Self::from_coordinates(jwk.crv, &x, &y)?)
    }
}
