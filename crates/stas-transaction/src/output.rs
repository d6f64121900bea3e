//! Transaction output with satoshi value and locking script.

use stas_primitives::util::{BsvReader, BsvWriter};
use stas_script::Script;

use crate::TransactionError;

/// A single output in a transaction.
///
/// # Wire format
///
/// | Field            | Size           |
/// |------------------|----------------|
/// | satoshis         | 8 bytes (LE)   |
/// | script length    | VarInt         |
/// | locking_script   | variable       |
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionOutput {
    /// The value locked by this output.
    pub satoshis: u64,

    /// The locking script that defines the spending conditions.
    pub locking_script: Script,
}

impl TransactionOutput {
    /// Create an output paying `satoshis` to `locking_script`.
    pub fn new(satoshis: u64, locking_script: Script) -> Self {
        TransactionOutput {
            satoshis,
            locking_script,
        }
    }

    /// Deserialize an output from a reader.
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of an encoded output.
    ///
    /// # Returns
    /// `Ok(TransactionOutput)`, or a `TransactionError` if the data is truncated.
    pub fn read_from(reader: &mut BsvReader) -> Result<Self, TransactionError> {
        let satoshis = reader.read_u64_le()?;
        let script = reader.read_var_bytes()?;
        Ok(TransactionOutput {
            satoshis,
            locking_script: Script::from_bytes(script),
        })
    }

    /// Serialize this output into a writer.
    pub fn write_to(&self, writer: &mut BsvWriter) {
        writer.write_u64_le(self.satoshis);
        writer.write_var_bytes(self.locking_script.to_bytes());
    }

    /// Serialize this output to bytes.
    ///
    /// This is also the per-output encoding hashed into `hashOutputs`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BsvWriter::with_capacity(9 + self.locking_script.len());
        self.write_to(&mut writer);
        writer.into_bytes()
    }
}
