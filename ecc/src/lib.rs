//! # Elliptic Curve Cryptography (ECC) Utilities
//!
//! This crate provides common elliptic curve utilities for the Credence
//! project and is not intended to be used directly.
//!
//! Supported curves are the NIST prime curves P-256, P-384, and P-521,
//! the curves registered for JOSE key agreement in JWA ([RFC7518]).
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

mod codec;
mod core;
mod error;

pub use self::codec::to_fixed_width;
pub use self::core::{Curve, PublicKey, SecretKey, SharedSecret};
pub use self::error::Error;
