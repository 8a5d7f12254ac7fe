//! # JSON Object Signing and Encryption (JOSE) Key Management
//!
//! This crate implements the key management layer of JWE ([RFC7516]): the
//! JWA ([RFC7518]) algorithms that produce or recover the content
//! encryption key (CEK) a recipient needs to decrypt a message body.
//!
//! Supported algorithms:
//!
//! - `dir` — direct use of a shared symmetric key
//! - `A128KW` / `A192KW` / `A256KW` — AES Key Wrap ([RFC3394])
//! - `ECDH-ES` and `ECDH-ES+A128KW` / `+A192KW` / `+A256KW` — Ephemeral-
//!   Static key agreement with the Concat KDF (NIST SP 800-56A §5.8.1)
//! - `ECMR` — blinded key agreement through an external exchange oracle
//! - `RSA1_5`, `RSA-OAEP`, `RSA-OAEP-256` — RSA key encryption
//!
//! Message parsing and serialization, the authenticated content ciphers,
//! and JWS/JWT are deliberately out of scope: callers hand each recipient's
//! key material and algorithm to an encrypter or decrypter and place the
//! results in the JWE envelope themselves.
//!
//! [RFC3394]: https://www.rfc-editor.org/rfc/rfc3394
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

mod error;
pub mod jwe;
pub mod jwk;

pub use credence_ecc::{Curve, PublicKey, SecretKey, SharedSecret};
pub use error::Error;
