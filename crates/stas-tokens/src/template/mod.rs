//! Unlocking script templates for token inputs.

pub mod stas;

pub use stas::{
    build_fragment, complete_unlocking_script, unlock, unlocking_fragment, StasUnlocker,
    PAYMENT_INPUT_INDEX, TOKEN_INPUT_INDEX,
};
