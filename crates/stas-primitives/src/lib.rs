/// STAS toolkit - cryptographic primitives, hashing, and wire utilities.
///
/// This crate provides the foundational building blocks for the rest of the workspace:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - Transaction identifiers displayed in Bitcoin's reversed byte order
/// - secp256k1 private keys, public keys and ECDSA signatures
/// - Variable-length integer encoding and a binary reader/writer pair

pub mod hash;
pub mod txid;
pub mod util;
pub mod ec;

mod error;
pub use error::PrimitivesError;
