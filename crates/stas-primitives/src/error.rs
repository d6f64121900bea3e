/// Unified error type for all primitives operations.
///
/// Covers errors from key parsing, signature handling, hex decoding and
/// binary reading.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid WIF format: {0}")]
    InvalidWif(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid txid: {0}")]
    InvalidTxid(String),

    #[error("unexpected end of data: wanted {wanted} bytes, {remaining} remaining")]
    UnexpectedEof { wanted: usize, remaining: usize },
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}
