#![deny(missing_docs)]

//! STAS redeem-split SDK.
//!
//! Re-exports every component for convenient single-crate usage.

pub use stas_primitives as primitives;
pub use stas_script as script;
pub use stas_tokens as tokens;
pub use stas_transaction as transaction;
