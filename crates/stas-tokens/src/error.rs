//! Token error types.

use stas_primitives::PrimitivesError;
use stas_script::ScriptError;
use stas_transaction::TransactionError;

/// Errors that can occur while building, signing or checking a redeem-split.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// A token or payment UTXO is missing data or is not of the expected kind.
    #[error("invalid utxo: {0}")]
    InvalidUtxo(String),

    /// A split destination is malformed or the destination list is out of bounds.
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    /// A token script could not be built or read.
    #[error("invalid script: {0}")]
    InvalidScript(String),

    /// The destinations ask for more than the token UTXO holds.
    #[error("insufficient token amount: requested {requested}, available {available}")]
    InsufficientTokenAmount {
        /// Sum of the destination amounts.
        requested: u64,
        /// Value of the token UTXO.
        available: u64,
    },

    /// A re-templated destination output does not satisfy the token's rules.
    #[error("incompatible destination {index}: {reason}")]
    IncompatibleDestination {
        /// Position of the destination in the split list.
        index: usize,
        /// What did not match.
        reason: String,
    },

    /// The token UTXO is frozen and cannot be split or redeemed.
    #[error("token is frozen")]
    TokenFrozen,

    /// The payment UTXO cannot cover the fee plus a non-dust change output.
    #[error("insufficient change: {available} cannot cover fee {fee} plus dust limit {dust_limit}")]
    InsufficientChange {
        /// Value of the payment UTXO.
        available: u64,
        /// Transaction cost charged to the payment UTXO.
        fee: u64,
        /// Smallest change output allowed.
        dust_limit: u64,
    },

    /// The payment UTXO cannot cover the fee.
    #[error("insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds {
        /// Amount needed.
        needed: u64,
        /// Amount available.
        available: u64,
    },

    /// The signed build was asked to sign an input without a private key.
    #[error("missing private key for input {input_index}")]
    MissingPrivateKey {
        /// Index of the input without a key.
        input_index: usize,
    },

    /// Signing, or applying an external signature, failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// A signed transaction was requested but some inputs still need signatures.
    #[error("inputs still unsigned: {0:?}")]
    UnsignedInputs(Vec<usize>),

    /// A transaction does not satisfy the redeem-split commitments.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// Transaction error.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Script error.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Primitives error.
    #[error(transparent)]
    Primitives(#[from] PrimitivesError),

    /// JSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
