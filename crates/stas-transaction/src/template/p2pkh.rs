//! Pay-to-Public-Key-Hash (P2PKH) script template.
//!
//! Creates `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG` locking
//! scripts and `<sig> <pubkey>` unlocking scripts.

use stas_primitives::ec::PrivateKey;
use stas_script::opcodes::*;
use stas_script::{Address, Script};

use crate::sighash::SIGHASH_ALL_FORKID;
use crate::template::{signature_with_flag, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Upper bound for a P2PKH unlocking script: two push prefixes, a 72-byte
/// DER signature with flag byte and a 33-byte compressed key.
pub const P2PKH_UNLOCK_MAX_LEN: usize = 1 + 73 + 1 + 33;

/// Create a P2PKH locking script paying to an address.
pub fn lock(address: &Address) -> Script {
    lock_hash(&address.public_key_hash)
}

/// Create a P2PKH locking script paying to a raw public key hash.
///
/// # Arguments
/// * `pkh` - The 20-byte Hash160 of the recipient's public key.
///
/// # Returns
/// The 25-byte locking script.
pub fn lock_hash(pkh: &[u8; 20]) -> Script {
    let mut bytes = Vec::with_capacity(25);
    bytes.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
    bytes.extend_from_slice(pkh);
    bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    Script::from(bytes)
}

/// Create a P2PKH unlocker.
///
/// # Arguments
/// * `private_key` - The signing key.
/// * `sighash_flag` - Optional flag; defaults to `SIGHASH_ALL_FORKID`.
pub fn unlock(private_key: PrivateKey, sighash_flag: Option<u32>) -> P2pkhUnlocker {
    P2pkhUnlocker {
        private_key,
        sighash_flag: sighash_flag.unwrap_or(SIGHASH_ALL_FORKID),
    }
}

/// P2PKH signing template holding a private key and sighash flag.
pub struct P2pkhUnlocker {
    private_key: PrivateKey,
    sighash_flag: u32,
}

impl UnlockingScriptTemplate for P2pkhUnlocker {
    /// Sign the input and return `<DER sig || flag> <compressed pubkey>`.
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError> {
        let sig_hash = tx.calc_input_signature_hash(input_index, self.sighash_flag)?;
        let signature = self.private_key.sign(&sig_hash)?;

        let mut script = Script::new();
        script.append_push_data(&signature_with_flag(&signature, self.sighash_flag))?;
        script.append_push_data(&self.private_key.pub_key().to_compressed())?;
        Ok(script)
    }

    fn estimate_length(&self, _tx: &Transaction, _input_index: usize) -> usize {
        P2PKH_UNLOCK_MAX_LEN
    }
}
