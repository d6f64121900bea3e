//! secp256k1 public key with Bitcoin-specific functionality.
//!
//! Supports compressed/uncompressed SEC1 serialization, Hash160 derivation
//! and verification of signatures over precomputed digests.

use std::fmt;

use k256::ecdsa::VerifyingKey;

use crate::ec::signature::Signature;
use crate::hash::hash160;
use crate::PrimitivesError;

/// Length of a compressed public key in bytes (prefix + 32 byte x-coordinate).
pub const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed public key in bytes (prefix + 32 byte x + 32 byte y).
pub const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key.
#[derive(Clone)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    /// Create a PublicKey from SEC1 encoded bytes.
    ///
    /// Accepts both compressed (33-byte) and uncompressed (65-byte) formats.
    ///
    /// # Arguments
    /// * `bytes` - SEC1-encoded public key bytes.
    ///
    /// # Returns
    /// `Ok(PublicKey)` on success, or an error if the bytes are not a curve point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != COMPRESSED_LEN && bytes.len() != UNCOMPRESSED_LEN {
            return Err(PrimitivesError::InvalidPublicKey(format!(
                "unexpected key length {}",
                bytes.len()
            )));
        }
        let inner = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
        Ok(PublicKey { inner })
    }

    /// Create a PublicKey from a hex-encoded SEC1 string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_k256_verifying_key(vk: &VerifyingKey) -> Self {
        PublicKey { inner: *vk }
    }

    /// Serialize the public key in compressed SEC1 format (33 bytes).
    ///
    /// # Returns
    /// A 33-byte array: `0x02`/`0x03` followed by the X coordinate.
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Serialize the public key in uncompressed SEC1 format (65 bytes).
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Compressed key as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Compute the Hash160 of the compressed public key.
    ///
    /// This is the public-key-hash that P2PKH and token locking scripts
    /// commit to.
    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.to_compressed())
    }

    /// Verify an ECDSA signature against a 32-byte digest.
    ///
    /// # Arguments
    /// * `hash` - The digest that was signed.
    /// * `sig` - The signature to check.
    ///
    /// # Returns
    /// `true` if the signature is valid for this key and digest.
    pub fn verify(&self, hash: &[u8; 32], sig: &Signature) -> bool {
        sig.verify(hash, self)
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_compressed() == other.to_compressed()
    }
}

impl Eq for PublicKey {}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}
