/// Script type - a sequence of opcodes and data pushes.
///
/// Scripts appear in transaction outputs (locking) and inputs (unlocking).
/// `Script` wraps a `Vec<u8>` and provides construction, classification,
/// serialization and ASM rendering.

use std::fmt;

use crate::chunk::{decode_script, encode_number_le, push_data_prefix, read_chunk, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// A script, represented as a byte vector newtype.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new empty script.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from a hex-encoded string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string (e.g. "76a914...88ac").
    ///
    /// # Returns
    /// A `Script` wrapping the decoded bytes, or an error if the hex is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        Ok(Script(hex::decode(hex_str)?))
    }

    /// Create a script from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Create a script from an ASM string.
    ///
    /// Known opcode names are emitted directly; every other token is
    /// treated as hex push data.
    ///
    /// # Arguments
    /// * `asm` - A space-separated ASM string.
    ///
    /// # Returns
    /// A `Script`, or an error if a token is neither an opcode nor hex.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for token in asm.split_whitespace() {
            match string_to_opcode(token) {
                Some(op) => script.0.push(op),
                None => {
                    let data = hex::decode(token)
                        .map_err(|_| ScriptError::InvalidAsmToken(token.to_string()))?;
                    script.append_push_data(&data)?;
                }
            }
        }
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Encode the script as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Render the script as space-separated ASM.
    ///
    /// # Returns
    /// The ASM string, or an empty string if the script cannot be tokenized.
    pub fn to_asm(&self) -> String {
        match self.chunks() {
            Ok(chunks) => chunks
                .iter()
                .map(ScriptChunk::to_asm_string)
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => String::new(),
        }
    }

    /// Borrow the underlying bytes.
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the script and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length of the script in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the script has no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // -----------------------------------------------------------------------
    // Script classification
    // -----------------------------------------------------------------------

    /// Check for a Pay-to-Public-Key-Hash output script.
    ///
    /// Pattern: OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
    pub fn is_p2pkh(&self) -> bool {
        let b = &self.0;
        b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == OP_DATA_20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
    }

    /// Check for a data-carrier script (`OP_RETURN ...` or `OP_FALSE OP_RETURN ...`).
    pub fn is_data(&self) -> bool {
        match self.0.as_slice() {
            [OP_RETURN, ..] => true,
            [OP_FALSE, OP_RETURN, ..] => true,
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Data extraction
    // -----------------------------------------------------------------------

    /// Extract the public key hash from a P2PKH script.
    ///
    /// # Returns
    /// The 20-byte hash, or `NotP2PKH` for any other script.
    pub fn public_key_hash(&self) -> Result<[u8; 20], ScriptError> {
        if self.0.is_empty() {
            return Err(ScriptError::EmptyScript);
        }
        if !self.is_p2pkh() {
            return Err(ScriptError::NotP2PKH);
        }
        let mut pkh = [0u8; 20];
        pkh.copy_from_slice(&self.0[3..23]);
        Ok(pkh)
    }

    /// Parse the script into chunks.
    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    /// Byte offset of the first top-level occurrence of `op`.
    ///
    /// Push payloads are skipped, so an opcode byte that merely appears
    /// inside pushed data is not reported.
    pub fn find_opcode(&self, op: u8) -> Option<usize> {
        let mut pos = 0;
        while pos < self.0.len() {
            if self.0[pos] == op {
                return Some(pos);
            }
            match read_chunk(&self.0, pos) {
                Ok((_, next)) => pos = next,
                Err(_) => return None,
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Mutation / building
    // -----------------------------------------------------------------------

    /// Append data with its minimal push prefix.
    ///
    /// Empty data encodes as OP_0.
    ///
    /// # Arguments
    /// * `data` - The bytes to push.
    ///
    /// # Returns
    /// `Ok(())`, or `DataTooBig` above the protocol limit.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        let prefix = push_data_prefix(data.len())?;
        self.0.extend_from_slice(&prefix);
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Append an unsigned value as a minimal little-endian number push.
    ///
    /// Zero encodes as OP_0; every other value is a raw data push, never an
    /// OP_1..OP_16 shortcut, so readers can always take the pushed bytes.
    pub fn append_number(&mut self, value: u64) {
        let bytes = encode_number_le(value);
        self.0.push(bytes.len() as u8);
        self.0.extend_from_slice(&bytes);
    }

    /// Append bare opcodes.
    ///
    /// Push opcodes (OP_DATA_1..OP_PUSHDATA4) are rejected; use
    /// `append_push_data` for those.
    pub fn append_opcodes(&mut self, opcodes: &[u8]) -> Result<(), ScriptError> {
        if let Some(op) = opcodes
            .iter()
            .find(|op| (OP_DATA_1..=OP_PUSHDATA4).contains(*op))
        {
            return Err(ScriptError::InvalidOpcodeType(opcode_to_string(*op)));
        }
        self.0.extend_from_slice(opcodes);
        Ok(())
    }

    /// Append another script's bytes verbatim.
    pub fn append_script(&mut self, other: &Script) {
        self.0.extend_from_slice(&other.0);
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P2PKH_HEX: &str = "76a914e2a623699e81b291c0327f408fea765d534baa2a88ac";
    const P2PKH_ASM: &str =
        "OP_DUP OP_HASH160 e2a623699e81b291c0327f408fea765d534baa2a OP_EQUALVERIFY OP_CHECKSIG";

    #[test]
    fn test_hex_and_asm_forms_agree() {
        let script = Script::from_hex(P2PKH_HEX).unwrap();
        assert_eq!(script.to_asm(), P2PKH_ASM);
        assert_eq!(Script::from_asm(P2PKH_ASM).unwrap(), script);
        assert_eq!(script.to_string(), P2PKH_HEX);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(Script::from_hex("ZZZZ").is_err());
        assert!(matches!(
            Script::from_asm("OP_DUP nothex"),
            Err(ScriptError::InvalidAsmToken(_))
        ));
        assert!(Script::from_asm("").unwrap().is_empty());
    }

    #[test]
    fn test_p2pkh_classification_and_hash() {
        let script = Script::from_hex(P2PKH_HEX).unwrap();
        assert!(script.is_p2pkh());
        assert!(!script.is_data());
        assert_eq!(
            hex::encode(script.public_key_hash().unwrap()),
            "e2a623699e81b291c0327f408fea765d534baa2a"
        );
        let p2sh = Script::from_hex("a9149de5aeaff9c48431ba4dd6e8af73d51f38e451cb87").unwrap();
        assert!(!p2sh.is_p2pkh());
        assert!(matches!(p2sh.public_key_hash(), Err(ScriptError::NotP2PKH)));
        assert!(matches!(Script::new().public_key_hash(), Err(ScriptError::EmptyScript)));
    }

    #[test]
    fn test_data_scripts() {
        assert!(Script::from_hex("006a0568656c6c6f").unwrap().is_data());
        assert!(Script::from_hex("6a").unwrap().is_data());
        assert!(!Script::from_hex("00").unwrap().is_data());
    }

    #[test]
    fn test_append_number_layout() {
        let mut script = Script::new();
        script.append_number(0);
        script.append_number(3000);
        script.append_number(128);
        assert_eq!(script.to_hex(), "0002b80b028000");
        let values: Vec<u64> = script
            .chunks()
            .unwrap()
            .iter()
            .map(|c| c.as_number().unwrap())
            .collect();
        assert_eq!(values, vec![0, 3000, 128]);
    }

    #[test]
    fn test_append_opcodes_rejects_pushes() {
        let mut script = Script::new();
        assert!(script.append_opcodes(&[OP_DUP, OP_HASH160]).is_ok());
        assert!(script.append_opcodes(&[OP_DATA_20]).is_err());
        assert!(script.append_opcodes(&[OP_PUSHDATA1]).is_err());
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn test_find_opcode_skips_push_payloads() {
        // <6a 6a> OP_RETURN: the first two 0x6a bytes are push data
        let script = Script::from_hex("026a6a6a").unwrap();
        assert_eq!(script.find_opcode(OP_RETURN), Some(3));
        assert_eq!(script.find_opcode(OP_CHECKSIG), None);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let script = Script::from_hex(P2PKH_HEX).unwrap();
        let json = serde_json::to_string(&script).unwrap();
        assert_eq!(json, format!("\"{}\"", P2PKH_HEX));
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
