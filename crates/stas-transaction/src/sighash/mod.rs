//! Signature hash computation for transaction signing.
//!
//! BSV signs a BIP-143-style preimage under the FORKID flag. The same
//! preimage layout is parsed back by `Preimage::parse` so token unlocking
//! scripts that embed it can be checked against the spending transaction.
//!
//! See <https://github.com/bitcoin-sv/bitcoin-sv/blob/master/doc/abc/replay-protected-sighash.md#digest-algorithm>

use stas_primitives::hash::sha256d;
use stas_primitives::txid::Txid;
use stas_primitives::util::{BsvReader, BsvWriter};
use stas_script::Script;

use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs.
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index as the signed input.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Only sign the current input.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Replay-protection flag required on all BSV signatures.
pub const SIGHASH_FORKID: u32 = 0x40;

/// The standard BSV sighash type: ALL | FORKID.
pub const SIGHASH_ALL_FORKID: u32 = SIGHASH_ALL | SIGHASH_FORKID;

/// Mask applied to extract the base sighash type.
pub const SIGHASH_MASK: u32 = 0x1f;

// -----------------------------------------------------------------------
// BIP-143 (FORKID) signature hash
// -----------------------------------------------------------------------

/// Compute the signature hash for an input.
///
/// # Arguments
/// * `tx`                  - The transaction being signed.
/// * `input_index`         - Index of the input being signed.
/// * `prev_output_script`  - The locking script (scriptCode) of the spent output.
/// * `sighash_type`        - Combined sighash flags.
/// * `satoshis`            - Value of the spent output.
///
/// # Returns
/// SHA-256d of the preimage.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    prev_output_script: &[u8],
    sighash_type: u32,
    satoshis: u64,
) -> Result<[u8; 32], TransactionError> {
    let preimage = calc_preimage(tx, input_index, prev_output_script, sighash_type, satoshis)?;
    Ok(sha256d(&preimage))
}

/// Build the preimage bytes that `signature_hash` double-hashes.
///
/// Layout:
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes)
/// 3. hashSequence (32 bytes)
/// 4. outpoint (32+4 bytes)
/// 5. scriptCode (varint + script)
/// 6. value (8 bytes LE)
/// 7. nSequence (4 bytes LE)
/// 8. hashOutputs (32 bytes)
/// 9. nLocktime (4 bytes LE)
/// 10. sighashType (4 bytes LE)
///
/// # Returns
/// The raw preimage, or an error when `input_index` is out of range.
pub fn calc_preimage(
    tx: &Transaction,
    input_index: usize,
    prev_output_script: &[u8],
    sighash_type: u32,
    satoshis: u64,
) -> Result<Vec<u8>, TransactionError> {
    let input = tx.inputs.get(input_index).ok_or_else(|| {
        TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        ))
    })?;
    let base_type = sighash_type & SIGHASH_MASK;
    let anyone_can_pay = sighash_type & SIGHASH_ANYONECANPAY != 0;

    let hash_prevouts = if anyone_can_pay {
        [0u8; 32]
    } else {
        prevouts_hash(tx)
    };

    let hash_sequence =
        if anyone_can_pay || base_type == SIGHASH_SINGLE || base_type == SIGHASH_NONE {
            [0u8; 32]
        } else {
            sequence_hash(tx)
        };

    let hash_outputs = match base_type {
        SIGHASH_SINGLE if input_index < tx.outputs.len() => {
            sha256d(&tx.outputs[input_index].to_bytes())
        }
        SIGHASH_SINGLE | SIGHASH_NONE => [0u8; 32],
        _ => outputs_hash(tx),
    };

    let mut writer = BsvWriter::with_capacity(160 + prev_output_script.len());
    writer.write_u32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    input.write_outpoint(&mut writer);
    writer.write_var_bytes(prev_output_script);
    writer.write_u64_le(satoshis);
    writer.write_u32_le(input.sequence_number);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_type);
    Ok(writer.into_bytes())
}

/// SHA-256d over every input outpoint.
pub fn prevouts_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = BsvWriter::with_capacity(tx.inputs.len() * 36);
    for input in &tx.inputs {
        input.write_outpoint(&mut writer);
    }
    sha256d(writer.as_bytes())
}

/// SHA-256d over every input sequence number.
pub fn sequence_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = BsvWriter::with_capacity(tx.inputs.len() * 4);
    for input in &tx.inputs {
        writer.write_u32_le(input.sequence_number);
    }
    sha256d(writer.as_bytes())
}

/// SHA-256d over every serialized output.
pub fn outputs_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = BsvWriter::new();
    for output in &tx.outputs {
        output.write_to(&mut writer);
    }
    sha256d(writer.as_bytes())
}

// -----------------------------------------------------------------------
// Preimage parsing
// -----------------------------------------------------------------------

/// A decoded FORKID sighash preimage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preimage {
    pub version: u32,
    pub hash_prevouts: [u8; 32],
    pub hash_sequence: [u8; 32],
    pub outpoint_txid: Txid,
    pub outpoint_index: u32,
    pub script_code: Script,
    pub satoshis: u64,
    pub sequence: u32,
    pub hash_outputs: [u8; 32],
    pub lock_time: u32,
    pub sighash_type: u32,
}

impl Preimage {
    /// Decode preimage bytes produced by `calc_preimage`.
    ///
    /// # Arguments
    /// * `bytes` - The raw preimage.
    ///
    /// # Returns
    /// The decoded fields, or `MalformedPreimage` if the bytes are short or
    /// have trailing data.
    pub fn parse(bytes: &[u8]) -> Result<Self, TransactionError> {
        let malformed = |e: stas_primitives::PrimitivesError| {
            TransactionError::MalformedPreimage(e.to_string())
        };
        let mut reader = BsvReader::new(bytes);
        let preimage = Preimage {
            version: reader.read_u32_le().map_err(malformed)?,
            hash_prevouts: reader.read_array().map_err(malformed)?,
            hash_sequence: reader.read_array().map_err(malformed)?,
            outpoint_txid: Txid::new(reader.read_array().map_err(malformed)?),
            outpoint_index: reader.read_u32_le().map_err(malformed)?,
            script_code: Script::from_bytes(reader.read_var_bytes().map_err(malformed)?),
            satoshis: reader.read_u64_le().map_err(malformed)?,
            sequence: reader.read_u32_le().map_err(malformed)?,
            hash_outputs: reader.read_array().map_err(malformed)?,
            lock_time: reader.read_u32_le().map_err(malformed)?,
            sighash_type: reader.read_u32_le().map_err(malformed)?,
        };
        if reader.remaining() != 0 {
            return Err(TransactionError::MalformedPreimage(format!(
                "{} trailing bytes",
                reader.remaining()
            )));
        }
        Ok(preimage)
    }
}
