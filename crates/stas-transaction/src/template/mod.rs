//! Script templates for producing unlocking scripts.
//!
//! Provides the `UnlockingScriptTemplate` trait and the P2PKH template.

pub mod p2pkh;

use stas_primitives::ec::Signature;
use stas_script::Script;

use crate::transaction::Transaction;
use crate::TransactionError;

/// A signing strategy that produces the unlocking script for one input.
pub trait UnlockingScriptTemplate {
    /// Produce the unlocking script for `input_index`.
    ///
    /// # Arguments
    /// * `tx` - The transaction being signed, with source outputs recorded.
    /// * `input_index` - The input to sign.
    ///
    /// # Returns
    /// `Ok(Script)` containing the unlocking script, or an error on failure.
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError>;

    /// Upper bound on the unlocking script length, for size estimates.
    fn estimate_length(&self, tx: &Transaction, input_index: usize) -> usize;
}

/// Encode a signature the way scripts push it: DER followed by the sighash byte.
pub fn signature_with_flag(signature: &Signature, sighash_flag: u32) -> Vec<u8> {
    let mut out = signature.to_der();
    out.push(sighash_flag as u8);
    out
}
