//! Redeem-split verification.
//!
//! Checks the token input of a finished transaction using nothing but the
//! transaction: the preimage embedded in the unlocking script supplies the
//! spent token script and amount, and the fragment is recomputed from the
//! outputs and compared byte for byte.

use tracing::debug;

use stas_primitives::ec::{PublicKey, Signature};
use stas_primitives::hash::sha256d;
use stas_script::Script;
use stas_transaction::sighash::{
    outputs_hash, prevouts_hash, sequence_hash, Preimage, SIGHASH_ALL_FORKID,
};
use stas_transaction::transaction::Transaction;

use crate::error::TokenError;
use crate::kind::TokenKind;
use crate::script::data::read_data_payload;
use crate::template::stas::{build_fragment, PAYMENT_INPUT_INDEX, TOKEN_INPUT_INDEX};
use crate::types::OutputPlanEntry;

fn fail(reason: impl Into<String>) -> TokenError {
    TokenError::VerificationFailed(reason.into())
}

/// Verify the token input of a redeem-split.
///
/// # Arguments
/// * `tx` - A signed redeem-split, e.g. parsed back from its hex.
///
/// # Returns
/// `Ok(())` if the unlocking script commits to exactly the transaction's
/// outputs and funding input and carries a valid owner signature;
/// `VerificationFailed` naming the first mismatch otherwise.
pub fn verify_redeem_split(tx: &Transaction) -> Result<(), TokenError> {
    let input = tx
        .inputs
        .get(TOKEN_INPUT_INDEX)
        .ok_or_else(|| fail("transaction has no inputs"))?;
    let unlocking = input
        .unlocking_script
        .as_ref()
        .ok_or_else(|| fail("token input is unsigned"))?;
    let chunks = unlocking.chunks()?;
    if chunks.len() < 3 {
        return Err(fail("token unlocking script is too short"));
    }
    let n = chunks.len();
    let (preimage_bytes, sig_bytes, pubkey_bytes) = match (
        chunks[n - 3].push_bytes(),
        chunks[n - 2].push_bytes(),
        chunks[n - 1].push_bytes(),
    ) {
        (Some(p), Some(s), Some(k)) if !s.is_empty() => (p, s, k),
        _ => return Err(fail("token unlocking script does not end in preimage, signature, key")),
    };

    // -------------------------------------------------------------------
    // Preimage against the transaction
    // -------------------------------------------------------------------

    let preimage = Preimage::parse(preimage_bytes)?;
    if preimage.outpoint_txid != input.source_txid
        || preimage.outpoint_index != input.source_tx_out_index
    {
        return Err(fail("preimage outpoint is not the token input"));
    }
    if preimage.version != tx.version || preimage.lock_time != tx.lock_time {
        return Err(fail("preimage version or lock time differs"));
    }
    if preimage.sequence != input.sequence_number
        || preimage.hash_sequence != sequence_hash(tx)
    {
        return Err(fail("preimage sequence commitment differs"));
    }
    if preimage.hash_prevouts != prevouts_hash(tx) {
        return Err(fail("preimage prevouts hash differs"));
    }
    if preimage.hash_outputs != outputs_hash(tx) {
        return Err(fail("preimage outputs hash differs"));
    }
    if preimage.sighash_type != SIGHASH_ALL_FORKID {
        return Err(fail(format!(
            "unexpected sighash type {:#x}",
            preimage.sighash_type
        )));
    }

    // -------------------------------------------------------------------
    // Owner
    // -------------------------------------------------------------------

    let token_script = &preimage.script_code;
    let kind = TokenKind::detect(token_script)?;
    let public_key = PublicKey::from_bytes(pubkey_bytes)?;
    if public_key.hash160() != kind.owner_hash(token_script)? {
        return Err(fail("signing key does not own the token"));
    }

    // -------------------------------------------------------------------
    // Outputs back to plan entries
    // -------------------------------------------------------------------

    let plan = recover_plan(tx, kind, token_script)?;
    let token_total = plan.entries[..plan.token_outputs]
        .iter()
        .try_fold(0u64, |acc, entry| acc.checked_add(entry.satoshis))
        .ok_or_else(|| fail("output amounts overflow"))?;
    if token_total != preimage.satoshis {
        return Err(fail(format!(
            "token outputs carry {}, token input holds {}",
            token_total, preimage.satoshis
        )));
    }

    // -------------------------------------------------------------------
    // Fragment and signature
    // -------------------------------------------------------------------

    let funding = tx
        .inputs
        .get(PAYMENT_INPUT_INDEX)
        .map(|payment| (&payment.source_txid, payment.source_tx_out_index));
    let mut expected = build_fragment(
        kind,
        &plan.entries,
        plan.data.as_deref(),
        funding,
        preimage_bytes,
    )?;
    expected.append_push_data(sig_bytes)?;
    expected.append_push_data(pubkey_bytes)?;
    if expected != *unlocking {
        return Err(fail("unlocking script does not commit to this transaction"));
    }

    let (flag, der) = sig_bytes
        .split_last()
        .ok_or_else(|| fail("empty signature"))?;
    if u32::from(*flag) != SIGHASH_ALL_FORKID {
        return Err(fail(format!("signature carries sighash flag {:#x}", flag)));
    }
    let signature = Signature::from_der(der)?;
    if !public_key.verify(&sha256d(preimage_bytes), &signature) {
        return Err(fail("owner signature does not verify"));
    }

    debug!(
        kind = %kind,
        outputs = tx.outputs.len(),
        token_total,
        "verified redeem-split"
    );
    Ok(())
}

struct RecoveredPlan {
    entries: Vec<OutputPlanEntry>,
    /// Redeem plus destination entries; change, if any, follows them.
    token_outputs: usize,
    data: Option<Vec<u8>>,
}

/// Read the outputs back into plan entries and the data payload.
///
/// Layout: P2PKH redeem, one or more token outputs, an optional P2PKH
/// change output, an optional data output.
fn recover_plan(
    tx: &Transaction,
    kind: TokenKind,
    token_script: &Script,
) -> Result<RecoveredPlan, TokenError> {
    let mut outputs = tx.outputs.iter().peekable();

    let redeem = outputs.next().ok_or_else(|| fail("transaction has no outputs"))?;
    let redemption = kind.redemption_hash(token_script)?;
    if redeem.locking_script.public_key_hash().ok() != Some(redemption) {
        return Err(fail("output 0 does not pay the redemption key"));
    }
    let mut entries = vec![OutputPlanEntry {
        pkh: redemption,
        satoshis: redeem.satoshis,
    }];

    while let Some(output) = outputs.next_if(|o| kind.parse(&o.locking_script).is_ok()) {
        let owner = kind.owner_hash(&output.locking_script)?;
        kind.check_destination(token_script, &output.locking_script, &owner)
            .map_err(|e| fail(format!("output {}: {}", entries.len(), e)))?;
        entries.push(OutputPlanEntry {
            pkh: owner,
            satoshis: output.satoshis,
        });
    }
    let token_outputs = entries.len();
    if token_outputs == 1 {
        return Err(fail("no token outputs"));
    }

    if let Some(change) = outputs.next_if(|o| o.locking_script.is_p2pkh()) {
        entries.push(OutputPlanEntry {
            pkh: change.locking_script.public_key_hash()?,
            satoshis: change.satoshis,
        });
    }

    let data = match outputs.next() {
        Some(output) if kind.supports_data() && output.satoshis == 0 => Some(
            read_data_payload(&output.locking_script)
                .ok_or_else(|| fail("trailing output is not a data output"))?,
        ),
        Some(_) => return Err(fail("unexpected trailing output")),
        None => None,
    };
    if outputs.next().is_some() {
        return Err(fail("unexpected trailing output"));
    }
    Ok(RecoveredPlan {
        entries,
        token_outputs,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stas_primitives::ec::PrivateKey;
    use stas_primitives::txid::Txid;
    use stas_script::{Address, Network};
    use stas_transaction::template::p2pkh;

    use crate::factory::fee::FeeSettings;
    use crate::factory::redeem_split::{
        build_redeem_split_tx, build_unsigned_redeem_split_tx, RedeemSplitConfig,
    };
    use crate::types::{Destination, InputSigner, PaymentInput, Utxo};

    fn config(kind: TokenKind, with_payment: bool) -> RedeemSplitConfig {
        let owner = PrivateKey::from_bytes(&[0x31; 32]).unwrap();
        let payer = PrivateKey::from_bytes(&[0x32; 32]).unwrap();
        RedeemSplitConfig {
            token_utxo: Utxo {
                txid: Txid::new([0x41; 32]),
                vout: 2,
                satoshis: 9000,
                locking_script: kind
                    .template_script(&owner.pub_key().hash160(), &[0x0e; 20])
                    .unwrap(),
            },
            owner: InputSigner::Local(owner),
            destinations: vec![
                Destination {
                    address: Address::from_public_key_hash(&[0xb1; 20], Network::Mainnet),
                    satoshis: 2500,
                },
                Destination {
                    address: Address::from_public_key_hash(&[0xb2; 20], Network::Mainnet),
                    satoshis: 3500,
                },
            ],
            payment: with_payment.then(|| PaymentInput {
                utxo: Utxo {
                    txid: Txid::new([0x42; 32]),
                    vout: 0,
                    satoshis: 40_000,
                    locking_script: p2pkh::lock_hash(&payer.pub_key().hash160()),
                },
                signer: InputSigner::Local(payer),
            }),
            data: None,
            change: true,
            fee: FeeSettings::default(),
        }
    }

    #[test]
    fn signed_builds_verify() {
        for kind in [TokenKind::Stas, TokenKind::Dstas] {
            for with_payment in [true, false] {
                let tx = build_redeem_split_tx(&config(kind, with_payment)).unwrap();
                verify_redeem_split(&tx).unwrap();
            }
        }
    }

    #[test]
    fn reparsed_hex_verifies() {
        let mut cfg = config(TokenKind::Dstas, true);
        cfg.data = Some(b"order #7".to_vec());
        let tx = build_redeem_split_tx(&cfg).unwrap();
        let parsed = Transaction::from_hex(&tx.to_hex()).unwrap();
        verify_redeem_split(&parsed).unwrap();
    }

    #[test]
    fn tampered_outputs_fail() {
        let tx = build_redeem_split_tx(&config(TokenKind::Stas, true)).unwrap();

        let mut bumped = tx.clone();
        bumped.outputs[1].satoshis += 1;
        assert!(matches!(
            verify_redeem_split(&bumped),
            Err(TokenError::VerificationFailed(_))
        ));

        let mut dropped = tx.clone();
        dropped.outputs.pop();
        assert!(matches!(
            verify_redeem_split(&dropped),
            Err(TokenError::VerificationFailed(_))
        ));

        let mut rerouted = tx;
        rerouted.outputs[0].locking_script = p2pkh::lock_hash(&[0x99; 20]);
        assert!(matches!(
            verify_redeem_split(&rerouted),
            Err(TokenError::VerificationFailed(_))
        ));
    }

    #[test]
    fn fragment_without_signature_fails() {
        let mut cfg = config(TokenKind::Stas, true);
        if let InputSigner::Local(key) = &cfg.owner {
            cfg.owner = InputSigner::Deferred(key.pub_key());
        }
        let outcome = build_unsigned_redeem_split_tx(&cfg).unwrap();
        assert!(verify_redeem_split(outcome.transaction()).is_err());
    }

    #[test]
    fn externally_signed_token_input_verifies() {
        let owner = PrivateKey::from_bytes(&[0x31; 32]).unwrap();
        let mut cfg = config(TokenKind::Dstas, true);
        cfg.owner = InputSigner::Deferred(owner.pub_key());

        let outcome = build_unsigned_redeem_split_tx(&cfg).unwrap();
        let descriptor = &outcome.unsigned_data()[0];
        assert!(descriptor.is_token_input);
        let hash = descriptor.signature_hash(outcome.transaction()).unwrap();
        let signature = owner.sign(&hash).unwrap();

        let tx = outcome.complete(&[signature]).unwrap();
        verify_redeem_split(&tx).unwrap();
    }

    #[test]
    fn plain_p2pkh_spend_is_rejected() {
        let mut tx = Transaction::new();
        tx.add_input(stas_transaction::TransactionInput::new(Txid::new([0x01; 32]), 0));
        assert!(matches!(
            verify_redeem_split(&tx),
            Err(TokenError::VerificationFailed(_))
        ));
    }
}
