//! secp256k1 private key with Bitcoin-specific functionality.
//!
//! Wraps the k256 signing key and adds WIF encoding and deterministic
//! signing of precomputed digests.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;

use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::hash::sha256d;
use crate::PrimitivesError;

/// Length of a serialized private key in bytes.
const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// Mainnet WIF prefix byte.
pub const MAINNET_WIF_PREFIX: u8 = 0x80;

/// Testnet WIF prefix byte.
pub const TESTNET_WIF_PREFIX: u8 = 0xef;

/// Compression flag byte appended to WIF for compressed public keys.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 private key used to sign transaction inputs.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a new random private key using the OS random number generator.
    ///
    /// # Returns
    /// A new randomly generated `PrivateKey`.
    pub fn new() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
        }
    }

    /// Create a private key from a raw 32-byte scalar.
    ///
    /// # Arguments
    /// * `bytes` - A 32-byte big-endian scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` if the scalar is in `[1, n)`, or an error otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey { inner })
    }

    /// Create a private key from a 64-character hexadecimal string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Create a private key from a WIF (Wallet Import Format) string.
    ///
    /// Accepts both compressed (38 decoded bytes) and uncompressed
    /// (37 decoded bytes) encodings with any network prefix.
    ///
    /// # Arguments
    /// * `wif` - A Base58Check-encoded WIF string.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` on success, or an error if the WIF is malformed or the checksum fails.
    pub fn from_wif(wif: &str) -> Result<Self, PrimitivesError> {
        let decoded = bs58::decode(wif)
            .into_vec()
            .map_err(|e| PrimitivesError::InvalidWif(e.to_string()))?;

        let payload_len = match decoded.len() {
            38 if decoded[33] == COMPRESS_MAGIC => 34,
            38 => {
                return Err(PrimitivesError::InvalidWif(
                    "invalid compression flag".to_string(),
                ))
            }
            37 => 33,
            n => {
                return Err(PrimitivesError::InvalidWif(format!(
                    "invalid decoded length {}",
                    n
                )))
            }
        };

        let (payload, checksum) = decoded.split_at(payload_len);
        if sha256d(payload)[..4] != *checksum {
            return Err(PrimitivesError::ChecksumMismatch);
        }
        Self::from_bytes(&payload[1..1 + PRIVATE_KEY_BYTES_LEN])
    }

    /// Encode the key as a compressed mainnet WIF string.
    pub fn to_wif(&self) -> String {
        self.to_wif_prefix(MAINNET_WIF_PREFIX)
    }

    /// Encode the key as a compressed WIF string with the given network prefix.
    ///
    /// # Arguments
    /// * `prefix` - `MAINNET_WIF_PREFIX` or `TESTNET_WIF_PREFIX`.
    ///
    /// # Returns
    /// A Base58Check-encoded WIF string.
    pub fn to_wif_prefix(&self, prefix: u8) -> String {
        let mut payload = Vec::with_capacity(1 + PRIVATE_KEY_BYTES_LEN + 1 + 4);
        payload.push(prefix);
        payload.extend_from_slice(&self.to_bytes());
        payload.push(COMPRESS_MAGIC);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }

    /// Serialize the private key as a 32-byte big-endian array.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    /// Serialize the private key as a lowercase hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Derive the corresponding public key.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_k256_verifying_key(self.inner.verifying_key())
    }

    /// Sign a 32-byte digest using deterministic RFC6979 nonces.
    ///
    /// The result is low-S normalized, as required for standard BSV
    /// transactions.
    ///
    /// # Arguments
    /// * `hash` - The digest to sign, typically a transaction signature hash.
    ///
    /// # Returns
    /// `Ok(Signature)` on success, or an error if signing fails.
    pub fn sign(&self, hash: &[u8; 32]) -> Result<Signature, PrimitivesError> {
        Signature::sign(hash, self)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PrivateKey {}

/// Keys never print their scalar.
impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey(pub={})", self.pub_key().to_hex())
    }
}
