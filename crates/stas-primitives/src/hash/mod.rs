//! Hash function primitives.
//!
//! Provides SHA-256, double SHA-256, RIPEMD-160 and Hash160, the digests
//! used for transaction ids, signature hashes and address derivation.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of the input data.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 32-byte SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Compute double SHA-256 (SHA-256d) hash of the input data.
///
/// Used for transaction ids, sighash digests and Base58Check checksums.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 32-byte double-SHA-256 digest.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute RIPEMD-160 hash of the input data.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// Compute Hash160: RIPEMD-160(SHA-256(data)).
///
/// This is the public-key-hash committed to by P2PKH and token scripts.
///
/// # Arguments
/// * `data` - Byte slice to hash (normally a compressed public key).
///
/// # Returns
/// A 20-byte Hash160 digest.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}
