//! Signing coordination.
//!
//! Each input either gets its unlocking script completed with a local key
//! or is left for an external signer, described by a `SigningDescriptor`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use stas_primitives::ec::{PublicKey, Signature};
use stas_script::Script;
use stas_transaction::sighash::{self, SIGHASH_ALL_FORKID};
use stas_transaction::template::p2pkh;
use stas_transaction::template::UnlockingScriptTemplate;
use stas_transaction::transaction::Transaction;

use crate::error::TokenError;
use crate::template::stas::{self as stas_template, complete_unlocking_script};
use crate::template::{PAYMENT_INPUT_INDEX, TOKEN_INPUT_INDEX};
use crate::types::InputSigner;

/// What an external signer needs to complete one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningDescriptor {
    /// Index of the input to sign.
    pub input_index: usize,
    /// Value of the output the input spends.
    pub satoshis: u64,
    /// Locking script of the output the input spends.
    pub locking_script: Script,
    /// Sighash flags the signature must carry.
    pub sighash_flag: u32,
    /// Key the signature must verify against.
    #[serde(with = "public_key_hex")]
    pub public_key: PublicKey,
    /// `true` for the token input, whose unlocking script already holds the fragment.
    pub is_token_input: bool,
}

impl SigningDescriptor {
    /// The hash the external signer must sign.
    ///
    /// Computed from the descriptor's own spent-output fields, so `tx` may be
    /// a copy parsed back from hex.
    pub fn signature_hash(&self, tx: &Transaction) -> Result<[u8; 32], TokenError> {
        Ok(sighash::signature_hash(
            tx,
            self.input_index,
            self.locking_script.to_bytes(),
            self.sighash_flag,
            self.satoshis,
        )?)
    }

    /// Check an external signature and append `<sig> <pubkey>` to the input.
    ///
    /// # Arguments
    /// * `tx` - The transaction returned with this descriptor.
    /// * `signature` - Signature over `signature_hash(tx)`.
    ///
    /// # Returns
    /// `Ok(())`, or `SigningFailed` if the signature does not verify.
    pub fn apply_signature(
        &self,
        tx: &mut Transaction,
        signature: &Signature,
    ) -> Result<(), TokenError> {
        let hash = self.signature_hash(tx)?;
        if !self.public_key.verify(&hash, signature) {
            return Err(TokenError::SigningFailed(format!(
                "signature for input {} does not verify",
                self.input_index
            )));
        }
        let input = tx.inputs.get_mut(self.input_index).ok_or_else(|| {
            TokenError::SigningFailed(format!("input {} out of range", self.input_index))
        })?;
        let prefix = input.unlocking_script.take().unwrap_or_default();
        input.unlocking_script = Some(complete_unlocking_script(
            &prefix,
            signature,
            self.sighash_flag,
            &self.public_key,
        )?);
        debug!(input_index = self.input_index, "applied external signature");
        Ok(())
    }
}

/// Sign or describe every input of a fully planned transaction.
///
/// The token input receives `fragment` first; with a local key it is then
/// completed with `<sig> <pubkey>`. The payment input is plain P2PKH.
///
/// # Returns
/// Descriptors for the inputs left unsigned, in input order.
pub(crate) fn sign_inputs(
    tx: &mut Transaction,
    fragment: Script,
    owner: &InputSigner,
    payment: Option<&InputSigner>,
) -> Result<Vec<SigningDescriptor>, TokenError> {
    let mut pending = Vec::new();

    match owner {
        InputSigner::Local(key) => {
            let unlocker = stas_template::unlock(key.clone(), fragment, None);
            let script = unlocker
                .sign(tx, TOKEN_INPUT_INDEX)
                .map_err(|e| TokenError::SigningFailed(e.to_string()))?;
            tx.inputs[TOKEN_INPUT_INDEX].unlocking_script = Some(script);
        }
        InputSigner::Deferred(public_key) => {
            pending.push(describe(tx, TOKEN_INPUT_INDEX, public_key, true)?);
            tx.inputs[TOKEN_INPUT_INDEX].unlocking_script = Some(fragment);
        }
    }

    if let Some(signer) = payment {
        match signer {
            InputSigner::Local(key) => {
                let script = p2pkh::unlock(key.clone(), None)
                    .sign(tx, PAYMENT_INPUT_INDEX)
                    .map_err(|e| TokenError::SigningFailed(e.to_string()))?;
                tx.inputs[PAYMENT_INPUT_INDEX].unlocking_script = Some(script);
            }
            InputSigner::Deferred(public_key) => {
                pending.push(describe(tx, PAYMENT_INPUT_INDEX, public_key, false)?);
            }
        }
    }

    debug!(
        inputs = tx.inputs.len(),
        deferred = pending.len(),
        "signed redeem-split inputs"
    );
    Ok(pending)
}

fn describe(
    tx: &Transaction,
    input_index: usize,
    public_key: &PublicKey,
    is_token_input: bool,
) -> Result<SigningDescriptor, TokenError> {
    let source = tx
        .inputs
        .get(input_index)
        .and_then(|input| input.source_tx_output())
        .ok_or_else(|| {
            TokenError::SigningFailed(format!("input {} has no source output", input_index))
        })?;
    Ok(SigningDescriptor {
        input_index,
        satoshis: source.satoshis,
        locking_script: source.locking_script.clone(),
        sighash_flag: SIGHASH_ALL_FORKID,
        public_key: public_key.clone(),
        is_token_input,
    })
}

mod public_key_hex {
    use serde::{Deserialize, Deserializer, Serializer};
    use stas_primitives::ec::PublicKey;

    pub fn serialize<S: Serializer>(key: &PublicKey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&key.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PublicKey, D::Error> {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
