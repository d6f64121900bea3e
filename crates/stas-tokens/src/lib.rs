#![deny(missing_docs)]
//! STAS token redeem-split support.
//!
//! Builds transactions that redeem part of a STAS or dSTAS token output to
//! its issuer and split the remainder across new owners, with an optional
//! fee-paying input, change and data-carrier output. Inputs can be signed
//! locally or left to an external signer.

pub mod error;
pub mod factory;
pub mod kind;
pub mod script;
pub mod template;
pub mod types;

pub use error::TokenError;
pub use factory::{
    build_redeem_split_tx, build_unsigned_redeem_split_tx, estimate_redeem_split_fee,
    verify_redeem_split, FeeSettings, RedeemSplitConfig, RedeemSplitOutcome, RedeemSplitShape,
    SigningDescriptor, MAX_SPLIT_DESTINATIONS,
};
pub use kind::TokenKind;
pub use types::{Destination, InputSigner, OutputPlanEntry, PaymentInput, Utxo};
