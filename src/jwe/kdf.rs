//! # Concat KDF
//!
//! The single-step key derivation function of NIST SP 800-56A §5.8.1 with
//! SHA-256 as the auxiliary function, as profiled for JOSE key agreement in
//! [RFC7518] §4.6.2. Derived key material is the leading `keysize` bytes of
//! `H(1 ‖ Z ‖ OtherInfo) ‖ H(2 ‖ Z ‖ OtherInfo) ‖ …` with a 32-bit
//! big-endian round counter.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

const HASH_SIZE: usize = 32;

/// Derive `keysize` bytes of key material from the shared secret `z`.
///
/// `OtherInfo` is `AlgorithmID ‖ PartyUInfo ‖ PartyVInfo ‖ SuppPubInfo`:
/// the first three fields carry a 32-bit big-endian length prefix,
/// `SuppPubInfo` is the output length in bits, and `SuppPrivInfo` is empty.
pub(crate) fn concat_kdf(
    alg: &[u8], z: &[u8], apu: &[u8], apv: &[u8], keysize: usize,
) -> Zeroizing<Vec<u8>> {
    let mut other_info = Vec::new();
    for field in [alg, apu, apv] {
        other_info.extend_from_slice(&(field.len() as u32).to_be_bytes());
        other_info.extend_from_slice(field);
    }
    other_info.extend_from_slice(&((keysize * 8) as u32).to_be_bytes());

    let mut derived = Zeroizing::new(Vec::with_capacity(keysize.div_ceil(HASH_SIZE) * HASH_SIZE));
    let mut round: u32 = 0;
    while derived.len() < keysize {
        round += 1;

        let mut hasher = Sha256::new();
        hasher.update(round.to_be_bytes());
        hasher.update(z);
        hasher.update(&other_info);
        derived.extend_from_slice(&hasher.finalize());
    }

    derived.truncate(keysize);
    derived
}
