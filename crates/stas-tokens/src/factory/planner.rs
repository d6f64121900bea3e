//! Output planning.
//!
//! Builds the ordered output list of a redeem-split together with the plan
//! entries the token unlocking script commits to:
//!
//! 1. redeem output, P2PKH to the token's redemption hash;
//! 2. one re-templated token output per destination, in order;
//! 3. change to the payment key, when a payment input exists and change is requested;
//! 4. a zero-value data output, when the kind supports one and a payload is given.

use tracing::debug;

use stas_transaction::template::p2pkh;
use stas_transaction::TransactionOutput;

use crate::error::TokenError;
use crate::kind::TokenKind;
use crate::script::data::data_output_script;
use crate::types::{Destination, InputSigner, OutputPlanEntry, PaymentInput, Utxo};

/// Everything one pass of the build needs.
pub(crate) struct SplitRequest<'a> {
    pub kind: TokenKind,
    pub token_utxo: &'a Utxo,
    pub owner: &'a InputSigner,
    pub destinations: &'a [Destination],
    pub payment: Option<&'a PaymentInput>,
    pub change: bool,
    pub data: Option<&'a [u8]>,
    /// Fee charged to the payment input; 0 on the estimation pass.
    pub tx_cost: u64,
    pub dust_limit: u64,
    /// Skips the change and funds sufficiency checks.
    pub estimating: bool,
}

/// Planned outputs and the matching commitments.
#[derive(Debug, Clone)]
pub struct RedeemSplitPlan {
    /// Outputs in transaction order.
    pub outputs: Vec<TransactionOutput>,
    /// One entry per value-carrying output (redeem, destinations, change).
    pub entries: Vec<OutputPlanEntry>,
    /// Payload of the data output, if one was planned.
    pub data: Option<Vec<u8>>,
}

/// Sum of the destination amounts, or `None` on overflow.
pub fn destination_total(destinations: &[Destination]) -> Option<u64> {
    destinations
        .iter()
        .try_fold(0u64, |acc, d| acc.checked_add(d.satoshis))
}

/// Plan the outputs for one build pass.
pub(crate) fn plan_outputs(req: &SplitRequest<'_>) -> Result<RedeemSplitPlan, TokenError> {
    let token_script = &req.token_utxo.locking_script;
    let available = req.token_utxo.satoshis;
    let requested = destination_total(req.destinations).ok_or(
        TokenError::InsufficientTokenAmount {
            requested: u64::MAX,
            available,
        },
    )?;
    let redeem_sats = available
        .checked_sub(requested)
        .ok_or(TokenError::InsufficientTokenAmount {
            requested,
            available,
        })?;

    let redemption = req.kind.redemption_hash(token_script)?;
    let mut outputs = Vec::with_capacity(req.destinations.len() + 3);
    let mut entries = Vec::with_capacity(req.destinations.len() + 2);

    outputs.push(TransactionOutput::new(redeem_sats, p2pkh::lock_hash(&redemption)));
    entries.push(OutputPlanEntry {
        pkh: redemption,
        satoshis: redeem_sats,
    });

    for (index, destination) in req.destinations.iter().enumerate() {
        let pkh = destination.address.public_key_hash;
        let locking_script = req.kind.retemplate(token_script, &pkh)?;
        req.kind
            .check_destination(token_script, &locking_script, &pkh)
            .map_err(|e| match e {
                TokenError::TokenFrozen => TokenError::TokenFrozen,
                other => TokenError::IncompatibleDestination {
                    index,
                    reason: other.to_string(),
                },
            })?;
        outputs.push(TransactionOutput::new(destination.satoshis, locking_script));
        entries.push(OutputPlanEntry {
            pkh,
            satoshis: destination.satoshis,
        });
    }

    if let Some(payment) = req.payment {
        let funds = payment.utxo.satoshis;
        if req.change {
            let needed = req.tx_cost.saturating_add(req.dust_limit);
            if !req.estimating && funds < needed {
                return Err(TokenError::InsufficientChange {
                    available: funds,
                    fee: req.tx_cost,
                    dust_limit: req.dust_limit,
                });
            }
            let change_sats = funds.saturating_sub(req.tx_cost);
            let pkh = payment.signer.public_key().hash160();
            outputs.push(TransactionOutput::new(change_sats, p2pkh::lock_hash(&pkh)));
            entries.push(OutputPlanEntry {
                pkh,
                satoshis: change_sats,
            });
        } else if !req.estimating && funds < req.tx_cost {
            return Err(TokenError::InsufficientFunds {
                needed: req.tx_cost,
                available: funds,
            });
        }
    }

    let data = match req.data {
        Some(payload) if req.kind.supports_data() => {
            outputs.push(TransactionOutput::new(0, data_output_script(payload)?));
            Some(payload.to_vec())
        }
        _ => None,
    };

    debug!(
        kind = %req.kind,
        destinations = req.destinations.len(),
        redeem_sats,
        outputs = outputs.len(),
        estimating = req.estimating,
        "planned redeem-split outputs"
    );

    Ok(RedeemSplitPlan {
        outputs,
        entries,
        data,
    })
}
