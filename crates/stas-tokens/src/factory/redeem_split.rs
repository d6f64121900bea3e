//! Redeem-split entry points.
//!
//! A redeem-split spends one token UTXO (input 0) and optionally one P2PKH
//! payment UTXO (input 1). Output 0 returns the unsplit remainder to the
//! token's redemption key; the rest is re-issued to up to three new owners.

use tracing::{debug, warn};

use stas_primitives::ec::Signature;
use stas_transaction::input::TransactionInput;
use stas_transaction::sighash::SIGHASH_ALL_FORKID;
use stas_transaction::transaction::Transaction;

use crate::error::TokenError;
use crate::factory::fee::{estimate_redeem_split_fee, FeeSettings, RedeemSplitShape};
use crate::factory::planner::{destination_total, plan_outputs, SplitRequest};
use crate::factory::signing::{sign_inputs, SigningDescriptor};
use crate::kind::TokenKind;
use crate::template::stas::{unlocking_fragment, PAYMENT_INPUT_INDEX, TOKEN_INPUT_INDEX};
use crate::types::{Destination, InputSigner, PaymentInput, Utxo};

/// Most destinations one redeem-split can pay. Together with the redeem
/// output this is the number of token outputs the unlocking script commits to.
pub const MAX_SPLIT_DESTINATIONS: usize = 3;

// -----------------------------------------------------------------------
// Config and outcome
// -----------------------------------------------------------------------

/// Configuration for a redeem-split.
#[derive(Debug, Clone)]
pub struct RedeemSplitConfig {
    /// The token UTXO being redeemed and split.
    pub token_utxo: Utxo,
    /// Signer for the token input; must own the token UTXO.
    pub owner: InputSigner,
    /// Split destinations, in output order.
    pub destinations: Vec<Destination>,
    /// Fee-paying input. `None` builds a zero-fee transaction.
    pub payment: Option<PaymentInput>,
    /// Payload for a data-carrier output (dSTAS only).
    pub data: Option<Vec<u8>>,
    /// Return the payment remainder as change.
    pub change: bool,
    /// Fee rate and dust limit.
    pub fee: FeeSettings,
}

/// Result of a redeem-split build.
#[derive(Debug, Clone)]
pub enum RedeemSplitOutcome {
    /// Every input carries a complete unlocking script.
    Signed(Transaction),
    /// Some inputs still need external signatures.
    Unsigned {
        /// One descriptor per unsigned input, in input order.
        unsigned_data: Vec<SigningDescriptor>,
        /// The transaction; the token input already holds its fragment.
        tx: Transaction,
    },
}

impl RedeemSplitOutcome {
    /// The built transaction, signed or not.
    pub fn transaction(&self) -> &Transaction {
        match self {
            RedeemSplitOutcome::Signed(tx) => tx,
            RedeemSplitOutcome::Unsigned { tx, .. } => tx,
        }
    }

    /// Descriptors of the inputs still unsigned; empty when signed.
    pub fn unsigned_data(&self) -> &[SigningDescriptor] {
        match self {
            RedeemSplitOutcome::Signed(_) => &[],
            RedeemSplitOutcome::Unsigned { unsigned_data, .. } => unsigned_data,
        }
    }

    /// `true` when no input is waiting for a signature.
    pub fn is_signed(&self) -> bool {
        matches!(self, RedeemSplitOutcome::Signed(_))
    }

    /// The signed transaction, or `UnsignedInputs` naming the inputs left.
    pub fn into_signed(self) -> Result<Transaction, TokenError> {
        match self {
            RedeemSplitOutcome::Signed(tx) => Ok(tx),
            RedeemSplitOutcome::Unsigned { unsigned_data, .. } => Err(TokenError::UnsignedInputs(
                unsigned_data.iter().map(|d| d.input_index).collect(),
            )),
        }
    }

    /// Apply external signatures, one per descriptor in order.
    ///
    /// # Arguments
    /// * `signatures` - Signatures over each descriptor's `signature_hash`.
    ///
    /// # Returns
    /// The completed transaction, or `SigningFailed` if the count is wrong
    /// or a signature does not verify.
    pub fn complete(self, signatures: &[Signature]) -> Result<Transaction, TokenError> {
        let (unsigned_data, mut tx) = match self {
            RedeemSplitOutcome::Signed(tx) => (Vec::new(), tx),
            RedeemSplitOutcome::Unsigned { unsigned_data, tx } => (unsigned_data, tx),
        };
        if signatures.len() != unsigned_data.len() {
            return Err(TokenError::SigningFailed(format!(
                "expected {} signatures, got {}",
                unsigned_data.len(),
                signatures.len()
            )));
        }
        for (descriptor, signature) in unsigned_data.iter().zip(signatures) {
            descriptor.apply_signature(&mut tx, signature)?;
        }
        Ok(tx)
    }
}

// -----------------------------------------------------------------------
// Validation
// -----------------------------------------------------------------------

pub(crate) fn check_destination_count(count: usize) -> Result<(), TokenError> {
    if count == 0 {
        return Err(TokenError::InvalidDestination(
            "at least one destination is required".into(),
        ));
    }
    if count > MAX_SPLIT_DESTINATIONS {
        return Err(TokenError::InvalidDestination(format!(
            "{} destinations exceed the maximum of {}",
            count, MAX_SPLIT_DESTINATIONS
        )));
    }
    Ok(())
}

/// Check the config before anything is built and resolve the token kind.
fn validate(config: &RedeemSplitConfig) -> Result<TokenKind, TokenError> {
    let token = &config.token_utxo;
    if token.locking_script.is_empty() {
        return Err(TokenError::InvalidUtxo(
            "token UTXO has an empty locking script".into(),
        ));
    }
    if let Some(payment) = &config.payment {
        if payment.utxo.locking_script.is_empty() {
            return Err(TokenError::InvalidUtxo(
                "payment UTXO has an empty locking script".into(),
            ));
        }
    }

    let kind = TokenKind::detect(&token.locking_script)?;

    check_destination_count(config.destinations.len())?;
    if let Some(index) = config.destinations.iter().position(|d| d.satoshis == 0) {
        return Err(TokenError::InvalidDestination(format!(
            "destination {} has a zero amount",
            index
        )));
    }
    let requested = destination_total(&config.destinations).ok_or(
        TokenError::InsufficientTokenAmount {
            requested: u64::MAX,
            available: token.satoshis,
        },
    )?;
    if requested > token.satoshis {
        return Err(TokenError::InsufficientTokenAmount {
            requested,
            available: token.satoshis,
        });
    }

    let owner_hash = kind.owner_hash(&token.locking_script)?;
    if config.owner.public_key().hash160() != owner_hash {
        return Err(TokenError::InvalidUtxo(
            "owner key does not own the token UTXO".into(),
        ));
    }
    Ok(kind)
}

/// The payload that will actually be written, if any.
fn effective_data(kind: TokenKind, data: Option<&[u8]>) -> Option<&[u8]> {
    match data {
        Some(payload) if payload.is_empty() => None,
        Some(payload) if !kind.supports_data() => {
            warn!(
                kind = %kind,
                len = payload.len(),
                "dropping data payload, token kind has no data output"
            );
            None
        }
        other => other,
    }
}

// -----------------------------------------------------------------------
// Entry points
// -----------------------------------------------------------------------

/// Build a fully signed redeem-split.
///
/// Every input present needs a local private key.
///
/// # Arguments
/// * `config` - Token UTXO, owner key, destinations, payment, data and fee settings.
///
/// # Returns
/// The signed transaction.
pub fn build_redeem_split_tx(config: &RedeemSplitConfig) -> Result<Transaction, TokenError> {
    if config.owner.private_key().is_none() {
        return Err(TokenError::MissingPrivateKey {
            input_index: TOKEN_INPUT_INDEX,
        });
    }
    if let Some(payment) = &config.payment {
        if payment.signer.private_key().is_none() {
            return Err(TokenError::MissingPrivateKey {
                input_index: PAYMENT_INPUT_INDEX,
            });
        }
    }
    build_unsigned_redeem_split_tx(config)?.into_signed()
}

/// Build a redeem-split, signing only the inputs with local keys.
///
/// With a payment input the fee is estimated first from a placeholder
/// build of the same shape, then charged against the payment UTXO.
///
/// # Arguments
/// * `config` - As for `build_redeem_split_tx`; signers may be `Deferred`.
///
/// # Returns
/// `Signed` if every input could be signed, otherwise `Unsigned` with a
/// descriptor per input left for an external signer.
pub fn build_unsigned_redeem_split_tx(
    config: &RedeemSplitConfig,
) -> Result<RedeemSplitOutcome, TokenError> {
    let kind = validate(config)?;
    let data = effective_data(kind, config.data.as_deref());

    let tx_cost = match &config.payment {
        Some(_) => {
            estimate_redeem_split_fee(&RedeemSplitShape::from_config(config), &config.fee)?
        }
        None => 0,
    };

    let request = SplitRequest {
        kind,
        token_utxo: &config.token_utxo,
        owner: &config.owner,
        destinations: &config.destinations,
        payment: config.payment.as_ref(),
        change: config.change,
        data,
        tx_cost,
        dust_limit: config.fee.dust_limit,
        estimating: false,
    };
    let outcome = assemble(&request)?;
    debug!(
        kind = %kind,
        destinations = config.destinations.len(),
        tx_cost,
        size = outcome.transaction().size(),
        signed = outcome.is_signed(),
        "built redeem-split"
    );
    Ok(outcome)
}

/// One build pass: inputs, planned outputs, fragment, signatures.
pub(crate) fn assemble(req: &SplitRequest<'_>) -> Result<RedeemSplitOutcome, TokenError> {
    let mut tx = Transaction::new();
    let token = req.token_utxo;
    tx.add_input(TransactionInput::spending(
        token.txid,
        token.vout,
        token.satoshis,
        token.locking_script.clone(),
    ));
    if let Some(payment) = req.payment {
        let utxo = &payment.utxo;
        tx.add_input(TransactionInput::spending(
            utxo.txid,
            utxo.vout,
            utxo.satoshis,
            utxo.locking_script.clone(),
        ));
    }

    let plan = plan_outputs(req)?;
    for output in plan.outputs {
        tx.add_output(output);
    }

    let fragment = unlocking_fragment(
        &tx,
        req.kind,
        &plan.entries,
        plan.data.as_deref(),
        SIGHASH_ALL_FORKID,
    )?;
    let unsigned_data = sign_inputs(
        &mut tx,
        fragment,
        req.owner,
        req.payment.map(|p| &p.signer),
    )?;

    if unsigned_data.is_empty() {
        Ok(RedeemSplitOutcome::Signed(tx))
    } else {
        Ok(RedeemSplitOutcome::Unsigned { unsigned_data, tx })
    }
}
