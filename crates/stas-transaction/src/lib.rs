//! Transaction model for token spends.
//!
//! Provides the `Transaction` type with inputs, outputs, wire
//! serialization, the FORKID sighash preimage and the P2PKH template.

pub mod input;
pub mod output;
pub mod sighash;
pub mod template;
pub mod transaction;

mod error;
pub use error::TransactionError;
pub use input::TransactionInput;
pub use output::TransactionOutput;
pub use transaction::Transaction;
