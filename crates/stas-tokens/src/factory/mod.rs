//! Transaction factories for redeem-split operations.
//!
//! Build, estimate and check token transactions that redeem part of a STAS
//! output to its issuer and split the rest across new owners.

pub mod fee;
pub mod planner;
pub mod redeem_split;
pub mod signing;
pub mod verify;

pub use fee::{estimate_redeem_split_fee, FeeSettings, RedeemSplitShape};
pub use redeem_split::{
    build_redeem_split_tx, build_unsigned_redeem_split_tx, RedeemSplitConfig, RedeemSplitOutcome,
    MAX_SPLIT_DESTINATIONS,
};
pub use signing::SigningDescriptor;
pub use verify::verify_redeem_split;
