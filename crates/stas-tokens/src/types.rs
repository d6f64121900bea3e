//! Common types for redeem-split operations.

use stas_primitives::ec::{PrivateKey, PublicKey};
use stas_primitives::txid::Txid;
use stas_script::{Address, Script};

/// An unspent output the transaction will spend.
#[derive(Debug, Clone)]
pub struct Utxo {
    /// Id of the transaction holding the output.
    pub txid: Txid,
    /// Output index within that transaction.
    pub vout: u32,
    /// Value of the output.
    pub satoshis: u64,
    /// The output's locking script.
    pub locking_script: Script,
}

/// A destination for part of the split token value.
#[derive(Debug, Clone)]
pub struct Destination {
    /// The recipient address.
    pub address: Address,
    /// Satoshi amount to send.
    pub satoshis: u64,
}

/// How an input gets its signature.
#[derive(Debug, Clone)]
pub enum InputSigner {
    /// Sign during the build with this key.
    Local(PrivateKey),
    /// Leave unsigned; an external signer holding the matching private key
    /// completes the input from a `SigningDescriptor`.
    Deferred(PublicKey),
}

impl InputSigner {
    /// The public key the input's signature must verify against.
    pub fn public_key(&self) -> PublicKey {
        match self {
            InputSigner::Local(key) => key.pub_key(),
            InputSigner::Deferred(key) => key.clone(),
        }
    }

    /// The private key, when the input is signed locally.
    pub fn private_key(&self) -> Option<&PrivateKey> {
        match self {
            InputSigner::Local(key) => Some(key),
            InputSigner::Deferred(_) => None,
        }
    }
}

/// A fee-paying P2PKH input and its signer.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    /// The payment UTXO.
    pub utxo: Utxo,
    /// Signer for the payment input. Its public key also receives change.
    pub signer: InputSigner,
}

/// One value-carrying output as the token unlocking script commits to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPlanEntry {
    /// Public key hash the output pays to (owner for token outputs).
    pub pkh: [u8; 20],
    /// Output value.
    pub satoshis: u64,
}
