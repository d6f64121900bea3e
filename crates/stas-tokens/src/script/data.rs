//! Data-carrier outputs: `OP_FALSE OP_RETURN <payload>`.

use stas_script::opcodes::{OP_FALSE, OP_RETURN};
use stas_script::Script;

use crate::error::TokenError;

/// Build an unspendable data-carrier locking script.
///
/// # Arguments
/// * `payload` - The bytes to embed.
///
/// # Returns
/// `OP_FALSE OP_RETURN <payload>`, or an error if the payload exceeds the push limit.
pub fn data_output_script(payload: &[u8]) -> Result<Script, TokenError> {
    let mut script = Script::new();
    script.append_opcodes(&[OP_FALSE, OP_RETURN])?;
    script.append_push_data(payload)?;
    Ok(script)
}

/// Extract the payload of a script built by `data_output_script`.
pub fn read_data_payload(script: &Script) -> Option<Vec<u8>> {
    let chunks = script.chunks().ok()?;
    match chunks.as_slice() {
        [zero, ret, payload] if zero.op == OP_FALSE && ret.op == OP_RETURN => {
            payload.push_bytes().map(<[u8]>::to_vec)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_script_layout() {
        let script = data_output_script(b"hello").unwrap();
        assert_eq!(script.to_hex(), "006a0568656c6c6f");
        assert!(script.is_data());
        assert_eq!(read_data_payload(&script), Some(b"hello".to_vec()));
    }

    #[test]
    fn large_payload_uses_pushdata() {
        let payload = vec![0xee; 300];
        let script = data_output_script(&payload).unwrap();
        assert_eq!(&script.to_bytes()[..5], &[0x00, 0x6a, 0x4d, 0x2c, 0x01]);
        assert_eq!(read_data_payload(&script), Some(payload));
    }

    #[test]
    fn other_scripts_have_no_payload() {
        assert_eq!(read_data_payload(&Script::from_hex("6a0568656c6c6f").unwrap()), None);
        let p2pkh = Script::from_hex("76a914000000000000000000000000000000000000000088ac").unwrap();
        assert_eq!(read_data_payload(&p2pkh), None);
    }
}
