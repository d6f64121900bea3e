//! Transaction identifier type.
//!
//! A `Txid` stores the 32 bytes in internal (hash output) order and renders
//! them reversed, which is how explorers and RPC interfaces show txids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Size of a txid in bytes.
pub const TXID_SIZE: usize = 32;

/// A 32-byte transaction identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Txid([u8; TXID_SIZE]);

impl Txid {
    /// Wrap bytes that are already in internal order.
    pub fn new(bytes: [u8; TXID_SIZE]) -> Self {
        Txid(bytes)
    }

    /// Compute the txid of a serialized transaction (SHA-256d of its bytes).
    ///
    /// # Arguments
    /// * `raw_tx` - The full wire serialization of the transaction.
    ///
    /// # Returns
    /// The transaction's identifier.
    pub fn from_raw_tx(raw_tx: &[u8]) -> Self {
        Txid(sha256d(raw_tx))
    }

    /// Create a txid from a slice in internal byte order.
    ///
    /// # Arguments
    /// * `bytes` - Exactly 32 bytes.
    ///
    /// # Returns
    /// `Ok(Txid)` or an error when the length is wrong.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let arr: [u8; TXID_SIZE] = bytes.try_into().map_err(|_| {
            PrimitivesError::InvalidTxid(format!(
                "expected {} bytes, got {}",
                TXID_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Txid(arr))
    }

    /// Parse a txid from its display form (byte-reversed hex, 64 characters).
    ///
    /// # Arguments
    /// * `hex_str` - The txid as shown by explorers.
    ///
    /// # Returns
    /// `Ok(Txid)` in internal byte order, or an error for malformed input.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.len() != TXID_SIZE * 2 {
            return Err(PrimitivesError::InvalidTxid(format!(
                "expected {} hex characters, got {}",
                TXID_SIZE * 2,
                hex_str.len()
            )));
        }
        let mut bytes = hex::decode(hex_str)?;
        bytes.reverse();
        Self::from_slice(&bytes)
    }

    /// Access the bytes in internal order, as written into outpoints.
    pub fn as_bytes(&self) -> &[u8; TXID_SIZE] {
        &self.0
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.write_str(&hex::encode(reversed))
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({})", self)
    }
}

impl FromStr for Txid {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Txid::from_hex(s)
    }
}

impl Serialize for Txid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Txid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Txid::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
