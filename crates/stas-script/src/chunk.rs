//! Script chunk parsing and encoding.
//!
//! A chunk is either a bare opcode or a data push together with its bytes.
//! Decoding here is a plain tokenizer: OP_RETURN is emitted as an opcode
//! and whatever follows it is tokenized like any other script bytes, which
//! is what token scripts with trailing metadata pushes require.

use crate::opcodes::*;
use crate::ScriptError;

/// A single parsed element of a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes), this is the length.
    pub op: u8,
    /// The pushed bytes, if this chunk is a push operation.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// `true` for OP_0 and every data push.
    pub fn is_push(&self) -> bool {
        self.op == OP_0 || self.data.is_some()
    }

    /// The bytes this chunk leaves on the stack when it is a push.
    ///
    /// OP_0 yields an empty slice; non-push opcodes yield `None`.
    pub fn push_bytes(&self) -> Option<&[u8]> {
        match (&self.data, self.op) {
            (Some(data), _) => Some(data.as_slice()),
            (None, OP_0) => Some(&[]),
            _ => None,
        }
    }

    /// Interpret the pushed bytes as an unsigned script number.
    ///
    /// # Returns
    /// The value, or `None` if this is not a push or the encoding is
    /// negative or wider than 8 bytes.
    pub fn as_number(&self) -> Option<u64> {
        decode_number_le(self.push_bytes()?)
    }

    /// ASM token for this chunk: hex for data pushes, the opcode name otherwise.
    pub fn to_asm_string(&self) -> String {
        match &self.data {
            Some(data) if !data.is_empty() => hex::encode(data),
            _ => opcode_to_string(self.op),
        }
    }
}

/// Decode raw script bytes into chunks.
///
/// # Arguments
/// * `bytes` - The raw script bytes.
///
/// # Returns
/// The parsed chunks, or `DataTooSmall` if a push runs past the end.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (chunk, next) = read_chunk(bytes, pos)?;
        chunks.push(chunk);
        pos = next;
    }
    Ok(chunks)
}

/// Read the chunk starting at `pos`, returning it with the offset just past it.
pub fn read_chunk(bytes: &[u8], pos: usize) -> Result<(ScriptChunk, usize), ScriptError> {
    let op = bytes[pos];
    let (header, length) = match op {
        OP_DATA_1..=OP_DATA_75 => (1, op as usize),
        OP_PUSHDATA1 => (2, read_len(bytes, pos + 1, 1)?),
        OP_PUSHDATA2 => (3, read_len(bytes, pos + 1, 2)?),
        OP_PUSHDATA4 => (5, read_len(bytes, pos + 1, 4)?),
        _ => return Ok((ScriptChunk { op, data: None }, pos + 1)),
    };
    let start = pos + header;
    let end = start
        .checked_add(length)
        .filter(|end| *end <= bytes.len())
        .ok_or(ScriptError::DataTooSmall)?;
    let chunk = ScriptChunk {
        op,
        data: Some(bytes[start..end].to_vec()),
    };
    Ok((chunk, end))
}

fn read_len(bytes: &[u8], at: usize, width: usize) -> Result<usize, ScriptError> {
    let field = bytes.get(at..at + width).ok_or(ScriptError::DataTooSmall)?;
    let mut le = [0u8; 4];
    le[..width].copy_from_slice(field);
    Ok(u32::from_le_bytes(le) as usize)
}

/// Compute the minimal push prefix for a payload of `data_len` bytes.
///
/// # Arguments
/// * `data_len` - The length of the data to be pushed.
///
/// # Returns
/// The prefix bytes, or `DataTooBig` above the OP_PUSHDATA4 limit.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    match data_len {
        0..=75 => Ok(vec![data_len as u8]),
        76..=0xff => Ok(vec![OP_PUSHDATA1, data_len as u8]),
        0x100..=0xffff => {
            let mut buf = vec![OP_PUSHDATA2];
            buf.extend_from_slice(&(data_len as u16).to_le_bytes());
            Ok(buf)
        }
        _ => {
            let len = u32::try_from(data_len).map_err(|_| ScriptError::DataTooBig)?;
            let mut buf = vec![OP_PUSHDATA4];
            buf.extend_from_slice(&len.to_le_bytes());
            Ok(buf)
        }
    }
}

/// Encode a non-negative value as a minimal little-endian script number.
///
/// Zero encodes as the empty byte string. A trailing `0x00` is added when
/// the top bit of the last byte is set so the value stays positive.
pub fn encode_number_le(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(9);
    let mut rest = value;
    while rest > 0 {
        out.push((rest & 0xff) as u8);
        rest >>= 8;
    }
    if out.last().is_some_and(|b| b & 0x80 != 0) {
        out.push(0x00);
    }
    out
}

/// Decode a little-endian script number produced by `encode_number_le`.
///
/// # Returns
/// `None` for negative numbers or encodings that do not fit in a `u64`.
pub fn decode_number_le(bytes: &[u8]) -> Option<u64> {
    let Some(&last) = bytes.last() else {
        return Some(0);
    };
    if last & 0x80 != 0 {
        return None;
    }
    let significant = match bytes {
        [head @ .., 0x00] if head.last().is_some_and(|b| b & 0x80 != 0) => head,
        _ => bytes,
    };
    if significant.len() > 8 {
        return None;
    }
    Some(
        significant
            .iter()
            .rev()
            .fold(0u64, |acc, b| (acc << 8) | *b as u64),
    )
}
