/// Error types for script operations.
///
/// Covers tokenizing, push encoding, ASM parsing and address handling.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Generic invalid script error.
    #[error("invalid script: {0}")]
    InvalidScript(String),

    /// An ASM token that is neither an opcode name nor hex data.
    #[error("invalid ASM token '{0}'")]
    InvalidAsmToken(String),

    /// Attempted to use `append_opcodes` for a push opcode.
    #[error("use append_push_data for push data opcodes: {0}")]
    InvalidOpcodeType(String),

    /// Invalid address string.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Address version byte is neither mainnet nor testnet P2PKH.
    #[error("unsupported address version 0x{0:02x}")]
    UnsupportedAddress(u8),

    /// Base58Check checksum does not match.
    #[error("address checksum failed")]
    ChecksumFailed,

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Script is empty when a non-empty script was expected.
    #[error("script is empty")]
    EmptyScript,

    /// Script is not a P2PKH script.
    #[error("not a P2PKH script")]
    NotP2PKH,

    /// A push runs past the end of the script.
    #[error("not enough data")]
    DataTooSmall,

    /// Push data exceeds the maximum push size.
    #[error("data too big")]
    DataTooBig,

    /// Error from the primitives crate.
    #[error(transparent)]
    Primitives(#[from] stas_primitives::PrimitivesError),
}
