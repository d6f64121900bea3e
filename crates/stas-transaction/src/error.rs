/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The transaction structure is invalid (e.g. input index out of range).
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    /// Signing could not proceed (e.g. missing source output).
    #[error("signing error: {0}")]
    SigningError(String),
    /// Binary or hex decoding failed.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// A sighash preimage did not have the expected layout.
    #[error("malformed preimage: {0}")]
    MalformedPreimage(String),
    /// An underlying script error.
    #[error(transparent)]
    Script(#[from] stas_script::ScriptError),
    /// An underlying primitives error.
    #[error(transparent)]
    Primitives(#[from] stas_primitives::PrimitivesError),
}
