//! Transaction input referencing a previous output.
//!
//! Besides the wire fields, an input can carry the output it spends
//! (value and locking script) so it can be signed without the full
//! previous transaction.

use stas_primitives::txid::Txid;
use stas_primitives::util::{BsvReader, BsvWriter};
use stas_script::Script;

use crate::output::TransactionOutput;
use crate::TransactionError;

/// Default sequence number indicating a finalized input.
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// A single input in a transaction.
///
/// # Wire format
///
/// | Field              | Size             |
/// |--------------------|------------------|
/// | source_txid        | 32 bytes         |
/// | source_tx_out_index| 4 bytes (LE)     |
/// | script length      | VarInt           |
/// | unlocking_script   | variable         |
/// | sequence_number    | 4 bytes (LE)     |
#[derive(Clone, Debug)]
pub struct TransactionInput {
    /// Id of the transaction holding the spent output.
    pub source_txid: Txid,

    /// Index of the spent output within that transaction.
    pub source_tx_out_index: u32,

    /// Sequence number. Defaults to `0xFFFFFFFF` (finalized).
    pub sequence_number: u32,

    /// The unlocking script. `None` until the input is (partially) signed.
    pub unlocking_script: Option<Script>,

    source_output: Option<TransactionOutput>,
}

impl TransactionInput {
    /// Create an input spending `source_txid:vout` with a finalized sequence.
    pub fn new(source_txid: Txid, source_tx_out_index: u32) -> Self {
        TransactionInput {
            source_txid,
            source_tx_out_index,
            sequence_number: DEFAULT_SEQUENCE_NUMBER,
            unlocking_script: None,
            source_output: None,
        }
    }

    /// Create an input that also records the output it spends.
    ///
    /// # Arguments
    /// * `source_txid` - Id of the previous transaction.
    /// * `vout` - Output index in the previous transaction.
    /// * `satoshis` - Value of the spent output.
    /// * `locking_script` - Locking script of the spent output.
    ///
    /// # Returns
    /// An unsigned input ready for signature hashing.
    pub fn spending(source_txid: Txid, vout: u32, satoshis: u64, locking_script: Script) -> Self {
        let mut input = Self::new(source_txid, vout);
        input.set_source_output(Some(TransactionOutput::new(satoshis, locking_script)));
        input
    }

    /// Deserialize an input from a reader.
    ///
    /// The spent output is not part of the wire format, so parsed inputs
    /// carry none.
    pub fn read_from(reader: &mut BsvReader) -> Result<Self, TransactionError> {
        let source_txid = Txid::new(reader.read_array()?);
        let source_tx_out_index = reader.read_u32_le()?;
        let script = reader.read_var_bytes()?;
        let sequence_number = reader.read_u32_le()?;
        Ok(TransactionInput {
            source_txid,
            source_tx_out_index,
            sequence_number,
            unlocking_script: (!script.is_empty()).then(|| Script::from_bytes(script)),
            source_output: None,
        })
    }

    /// Serialize this input into a writer.
    pub fn write_to(&self, writer: &mut BsvWriter) {
        self.write_outpoint(writer);
        let script = self
            .unlocking_script
            .as_ref()
            .map(Script::to_bytes)
            .unwrap_or_default();
        writer.write_var_bytes(script);
        writer.write_u32_le(self.sequence_number);
    }

    /// Write the 36-byte outpoint (txid then LE index).
    pub fn write_outpoint(&self, writer: &mut BsvWriter) {
        writer.write_bytes(self.source_txid.as_bytes());
        writer.write_u32_le(self.source_tx_out_index);
    }

    /// Record (or clear) the output this input spends.
    pub fn set_source_output(&mut self, output: Option<TransactionOutput>) {
        self.source_output = output;
    }

    /// The output this input spends, if known.
    pub fn source_tx_output(&self) -> Option<&TransactionOutput> {
        self.source_output.as_ref()
    }

    /// Value of the spent output, if known.
    pub fn source_tx_satoshis(&self) -> Option<u64> {
        self.source_output.as_ref().map(|o| o.satoshis)
    }
}
