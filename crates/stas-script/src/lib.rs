/// STAS toolkit - script representation and P2PKH addresses.
///
/// Provides the `Script` byte type, opcode tables, chunk tokenizing and
/// push encoding, and Base58Check P2PKH address handling.

pub mod script;
pub mod opcodes;
pub mod chunk;
pub mod address;

mod error;
pub use error::ScriptError;
pub use script::Script;
pub use address::{Address, Network};
pub use chunk::ScriptChunk;
