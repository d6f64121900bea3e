//! Core transaction type.
//!
//! Represents a transaction with version, inputs, outputs and lock time,
//! with wire (de)serialization, txid computation and per-input signature
//! hashing.

use stas_primitives::txid::Txid;
use stas_primitives::util::{BsvReader, BsvWriter, VarInt};

use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::sighash;
use crate::TransactionError;

/// A transaction.
#[derive(Clone, Debug)]
pub struct Transaction {
    /// Transaction format version.
    pub version: u32,

    /// Inputs, in signing order.
    pub inputs: Vec<TransactionInput>,

    /// Outputs, in serialization order.
    pub outputs: Vec<TransactionOutput>,

    /// Lock time (block height or timestamp). 0 means no lock.
    pub lock_time: u32,
}

impl Transaction {
    /// Create an empty version-1 transaction.
    pub fn new() -> Self {
        Transaction {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a transaction from hex.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::SerializationError(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a transaction from its wire bytes.
    ///
    /// # Arguments
    /// * `bytes` - The complete serialization.
    ///
    /// # Returns
    /// The transaction, or an error for truncated input or trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = BsvReader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::SerializationError(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Read a transaction from a reader, leaving any following bytes unread.
    pub fn read_from(reader: &mut BsvReader) -> Result<Self, TransactionError> {
        let version = reader.read_u32_le()?;

        let input_count = reader.read_varint()?.value();
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            inputs.push(TransactionInput::read_from(reader)?);
        }

        let output_count = reader.read_varint()?.value();
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            outputs.push(TransactionOutput::read_from(reader)?);
        }

        let lock_time = reader.read_u32_le()?;
        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Serialize to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BsvWriter::with_capacity(256);
        writer.write_u32_le(self.version);
        writer.write_varint(VarInt::from(self.inputs.len()));
        for input in &self.inputs {
            input.write_to(&mut writer);
        }
        writer.write_varint(VarInt::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(&mut writer);
        }
        writer.write_u32_le(self.lock_time);
        writer.into_bytes()
    }

    /// Serialize to lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Serialized size in bytes, the basis for fee calculation.
    pub fn size(&self) -> usize {
        self.to_bytes().len()
    }

    // -----------------------------------------------------------------
    // Transaction ID
    // -----------------------------------------------------------------

    /// The transaction id (SHA-256d of the serialization).
    pub fn tx_id(&self) -> Txid {
        Txid::from_raw_tx(&self.to_bytes())
    }

    /// The transaction id in display (reversed hex) form.
    pub fn tx_id_hex(&self) -> String {
        self.tx_id().to_string()
    }

    // -----------------------------------------------------------------
    // Inputs and outputs
    // -----------------------------------------------------------------

    pub fn add_input(&mut self, input: TransactionInput) {
        self.inputs.push(input);
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn add_output(&mut self, output: TransactionOutput) {
        self.outputs.push(output);
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Sum of all output values.
    pub fn total_output_satoshis(&self) -> u64 {
        self.outputs.iter().map(|o| o.satoshis).sum()
    }

    // -----------------------------------------------------------------
    // Signature hash
    // -----------------------------------------------------------------

    /// Compute the sighash preimage for an input from its recorded source output.
    ///
    /// # Arguments
    /// * `input_index` - Index of the input.
    /// * `sighash_flag` - Combined sighash flags.
    ///
    /// # Returns
    /// The preimage bytes, or an error if the index is out of range or the
    /// input has no source output recorded.
    pub fn calc_input_preimage(
        &self,
        input_index: usize,
        sighash_flag: u32,
    ) -> Result<Vec<u8>, TransactionError> {
        let input = self.inputs.get(input_index).ok_or_else(|| {
            TransactionError::InvalidTransaction(format!(
                "input index {} out of range (tx has {} inputs)",
                input_index,
                self.inputs.len()
            ))
        })?;
        let source = input.source_tx_output().ok_or_else(|| {
            TransactionError::SigningError(format!(
                "input {} has no source output recorded",
                input_index
            ))
        })?;
        sighash::calc_preimage(
            self,
            input_index,
            source.locking_script.to_bytes(),
            sighash_flag,
            source.satoshis,
        )
    }

    /// Compute the signature hash for an input from its recorded source output.
    pub fn calc_input_signature_hash(
        &self,
        input_index: usize,
        sighash_flag: u32,
    ) -> Result<[u8; 32], TransactionError> {
        let preimage = self.calc_input_preimage(input_index, sighash_flag)?;
        Ok(stas_primitives::hash::sha256d(&preimage))
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
