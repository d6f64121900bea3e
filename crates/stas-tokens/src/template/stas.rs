//! STAS unlocking script template.
//!
//! A token input is unlocked with a fragment that commits to every
//! value-carrying output, the data slot, the funding outpoint and the
//! signature preimage, followed by `<sig> <pubkey>`:
//!
//! ```text
//! <amount> <pkh>          for redeem, each destination, and change
//! <payload> | OP_FALSE    only for kinds that carry data
//! <vout> <txid> | OP_FALSE OP_FALSE
//! <preimage>
//! <sig> <pubkey>
//! ```

use stas_primitives::ec::{PrivateKey, PublicKey, Signature};
use stas_primitives::txid::Txid;
use stas_script::opcodes::OP_FALSE;
use stas_script::{Script, ScriptError};
use stas_transaction::sighash::SIGHASH_ALL_FORKID;
use stas_transaction::template::{signature_with_flag, UnlockingScriptTemplate};
use stas_transaction::transaction::Transaction;
use stas_transaction::TransactionError;

use crate::error::TokenError;
use crate::kind::TokenKind;
use crate::types::OutputPlanEntry;

/// The token input is always first.
pub const TOKEN_INPUT_INDEX: usize = 0;

/// The payment input, when present, follows the token input.
pub const PAYMENT_INPUT_INDEX: usize = 1;

/// Assemble the unsigned fragment from its parts.
///
/// # Arguments
/// * `kind` - Token kind; decides whether a data slot is emitted.
/// * `entries` - Output plan, in output order.
/// * `data` - Payload of the data output, if one exists.
/// * `funding` - Payment outpoint, or `None` on the zero-fee path.
/// * `preimage` - Sighash preimage of the token input.
///
/// # Returns
/// The fragment script, or an error if a push exceeds the script limits.
pub fn build_fragment(
    kind: TokenKind,
    entries: &[OutputPlanEntry],
    data: Option<&[u8]>,
    funding: Option<(&Txid, u32)>,
    preimage: &[u8],
) -> Result<Script, TokenError> {
    let mut script = Script::new();

    for entry in entries {
        script.append_number(entry.satoshis);
        script.append_push_data(&entry.pkh)?;
    }

    if kind.supports_data() {
        match data {
            Some(payload) => script.append_push_data(payload)?,
            None => script.append_opcodes(&[OP_FALSE])?,
        }
    }

    match funding {
        Some((txid, vout)) => {
            script.append_number(vout as u64);
            script.append_push_data(txid.as_bytes())?;
        }
        None => script.append_opcodes(&[OP_FALSE, OP_FALSE])?,
    }

    script.append_push_data(preimage)?;
    Ok(script)
}

/// Compute the fragment for the token input of `tx`.
///
/// All inputs and outputs must already be in place: the preimage commits
/// to them. The funding outpoint is read from the payment input slot.
pub fn unlocking_fragment(
    tx: &Transaction,
    kind: TokenKind,
    entries: &[OutputPlanEntry],
    data: Option<&[u8]>,
    sighash_flag: u32,
) -> Result<Script, TokenError> {
    let preimage = tx.calc_input_preimage(TOKEN_INPUT_INDEX, sighash_flag)?;
    let funding = tx
        .inputs
        .get(PAYMENT_INPUT_INDEX)
        .map(|input| (&input.source_txid, input.source_tx_out_index));
    build_fragment(kind, entries, data, funding, &preimage)
}

/// Append `<sig || flag> <pubkey>` to an unsigned prefix.
///
/// An empty prefix yields a plain P2PKH unlocking script.
pub fn complete_unlocking_script(
    prefix: &Script,
    signature: &Signature,
    sighash_flag: u32,
    public_key: &PublicKey,
) -> Result<Script, ScriptError> {
    let mut script = prefix.clone();
    script.append_push_data(&signature_with_flag(signature, sighash_flag))?;
    script.append_push_data(&public_key.to_compressed())?;
    Ok(script)
}

/// Signs a token input whose fragment has already been computed.
pub struct StasUnlocker {
    private_key: PrivateKey,
    fragment: Script,
    sighash_flag: u32,
}

/// Create a STAS unlocker.
///
/// # Arguments
/// * `private_key` - The token owner's key.
/// * `fragment` - Output of `unlocking_fragment` for the same transaction.
/// * `sighash_flag` - Optional flag; defaults to `SIGHASH_ALL_FORKID`.
pub fn unlock(
    private_key: PrivateKey,
    fragment: Script,
    sighash_flag: Option<u32>,
) -> StasUnlocker {
    StasUnlocker {
        private_key,
        fragment,
        sighash_flag: sighash_flag.unwrap_or(SIGHASH_ALL_FORKID),
    }
}

impl UnlockingScriptTemplate for StasUnlocker {
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError> {
        let sig_hash = tx.calc_input_signature_hash(input_index, self.sighash_flag)?;
        let signature = self.private_key.sign(&sig_hash)?;
        Ok(complete_unlocking_script(
            &self.fragment,
            &signature,
            self.sighash_flag,
            &self.private_key.pub_key(),
        )?)
    }

    fn estimate_length(&self, _tx: &Transaction, _input_index: usize) -> usize {
        self.fragment.len() + stas_transaction::template::p2pkh::P2PKH_UNLOCK_MAX_LEN
    }
}
