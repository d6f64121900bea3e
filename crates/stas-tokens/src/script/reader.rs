//! Reader for STAS v2 and dSTAS locking scripts.

use stas_script::chunk::{decode_script, read_chunk};
use stas_script::opcodes::{OP_2, OP_DATA_20, OP_RETURN};

use crate::kind::TokenKind;
use crate::script::templates::*;

/// Fields extracted from a STAS v2 locking script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StasFields {
    /// The owner public key hash.
    pub owner_hash: [u8; 20],
    /// The redemption public key hash (the token id).
    pub redemption_hash: [u8; 20],
    /// First push after the template.
    pub flags: Vec<u8>,
    /// Any further pushes (symbol, issuer data).
    pub metadata: Vec<Vec<u8>>,
}

/// Fields extracted from a dSTAS locking script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DstasFields {
    /// The owner public key hash.
    pub owner_hash: [u8; 20],
    /// The redemption public key hash.
    pub redemption_hash: [u8; 20],
    /// Pushed action data; empty for OP_0 and for the frozen marker.
    pub action_data: Vec<u8>,
    /// Whether the action slot holds the frozen marker.
    pub frozen: bool,
    /// Flags push following the redemption hash.
    pub flags: Vec<u8>,
    /// Pushes after the flags.
    pub service_fields: Vec<Vec<u8>>,
}

/// A recognized token locking script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenScript {
    /// STAS v2.
    Stas(StasFields),
    /// dSTAS.
    Dstas(DstasFields),
}

impl TokenScript {
    /// The token kind this script belongs to.
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenScript::Stas(_) => TokenKind::Stas,
            TokenScript::Dstas(_) => TokenKind::Dstas,
        }
    }

    /// The owner public key hash.
    pub fn owner_hash(&self) -> [u8; 20] {
        match self {
            TokenScript::Stas(f) => f.owner_hash,
            TokenScript::Dstas(f) => f.owner_hash,
        }
    }

    /// The redemption public key hash.
    pub fn redemption_hash(&self) -> [u8; 20] {
        match self {
            TokenScript::Stas(f) => f.redemption_hash,
            TokenScript::Dstas(f) => f.redemption_hash,
        }
    }

    /// `true` for a dSTAS script carrying the frozen marker.
    pub fn is_frozen(&self) -> bool {
        matches!(self, TokenScript::Dstas(f) if f.frozen)
    }
}

/// Parse a locking script as a token script.
///
/// # Arguments
/// * `script` - Raw locking script bytes.
///
/// # Returns
/// The parsed fields, or `None` if the script is neither STAS v2 nor dSTAS.
pub fn read_token_script(script: &[u8]) -> Option<TokenScript> {
    if let Some(fields) = read_stas_v2(script) {
        return Some(TokenScript::Stas(fields));
    }
    read_dstas(script).map(TokenScript::Dstas)
}

/// Check whether a script is any recognized token script.
pub fn is_token_script(script: &[u8]) -> bool {
    read_token_script(script).is_some()
}

fn read_stas_v2(script: &[u8]) -> Option<StasFields> {
    if script.len() < STAS_V2_MIN_LEN
        || script[..STAS_V2_OWNER_OFFSET] != STAS_V2_PREFIX
        || script[STAS_V2_MARKER_OFFSET..STAS_V2_MARKER_OFFSET + STAS_V2_MARKER.len()]
            != STAS_V2_MARKER
        || script[STAS_V2_OP_RETURN_OFFSET] != OP_RETURN
        || script[STAS_V2_REDEMPTION_OFFSET - 1] != OP_DATA_20
    {
        return None;
    }

    let owner_hash = hash_at(script, STAS_V2_OWNER_OFFSET)?;
    let redemption_hash = hash_at(script, STAS_V2_REDEMPTION_OFFSET)?;

    let mut items = push_items(&script[STAS_V2_TEMPLATE_LEN..])?.into_iter();
    let flags = items.next().unwrap_or_default();

    Some(StasFields {
        owner_hash,
        redemption_hash,
        flags,
        metadata: items.collect(),
    })
}

fn read_dstas(script: &[u8]) -> Option<DstasFields> {
    // <owner> must be a 20-byte push followed by at least the action slot
    if script.len() <= 1 + PKH_LEN || script[0] != OP_DATA_20 {
        return None;
    }
    let owner_hash = hash_at(script, 1)?;

    let (action, template_start) = read_chunk(script, 1 + PKH_LEN).ok()?;
    let (action_data, frozen) = match action.push_bytes() {
        Some(bytes) => (bytes.to_vec(), false),
        None if action.op == OP_2 => (Vec::new(), true),
        None => return None,
    };

    let template_end = template_start.checked_add(DSTAS_BASE_TEMPLATE_LEN)?;
    let template = script.get(template_start..template_end)?;
    if template[..DSTAS_BASE_PREFIX.len()] != DSTAS_BASE_PREFIX
        || template[DSTAS_BASE_TEMPLATE_LEN - 1] != OP_RETURN
    {
        return None;
    }

    let mut items = push_items(&script[template_end..])?.into_iter();
    let redemption = items.next()?;
    let redemption_hash: [u8; 20] = redemption.as_slice().try_into().ok()?;
    let flags = items.next().unwrap_or_default();

    Some(DstasFields {
        owner_hash,
        redemption_hash,
        action_data,
        frozen,
        flags,
        service_fields: items.collect(),
    })
}

fn hash_at(script: &[u8], offset: usize) -> Option<[u8; 20]> {
    script.get(offset..offset + PKH_LEN)?.try_into().ok()
}

/// Decode a run of data pushes. Any non-push opcode rejects the run.
fn push_items(bytes: &[u8]) -> Option<Vec<Vec<u8>>> {
    decode_script(bytes)
        .ok()?
        .iter()
        .map(|chunk| chunk.push_bytes().map(<[u8]>::to_vec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::dstas_builder::{build_dstas_locking_script, DstasLockingParams};
    use crate::script::stas_builder::build_stas_locking_script;

    #[test]
    fn reads_stas_v2_fields() {
        let script = build_stas_locking_script(&[0xaa; 20], &[0xbb; 20], &[0x00], &[]).unwrap();
        let parsed = read_token_script(script.to_bytes()).unwrap();
        assert_eq!(parsed.kind(), TokenKind::Stas);
        assert_eq!(parsed.owner_hash(), [0xaa; 20]);
        assert_eq!(parsed.redemption_hash(), [0xbb; 20]);
        assert!(!parsed.is_frozen());
        match parsed {
            TokenScript::Stas(fields) => {
                assert_eq!(fields.flags, vec![0x00]);
                assert!(fields.metadata.is_empty());
            }
            other => panic!("expected STAS, got {:?}", other),
        }
    }

    #[test]
    fn reads_stas_v2_metadata() {
        let metadata = vec![b"TOK".to_vec(), vec![0x42; 80]];
        let script =
            build_stas_locking_script(&[0x01; 20], &[0x02; 20], &[0x01], &metadata).unwrap();
        match read_token_script(script.to_bytes()) {
            Some(TokenScript::Stas(fields)) => {
                assert_eq!(fields.flags, vec![0x01]);
                assert_eq!(fields.metadata, metadata);
            }
            other => panic!("expected STAS, got {:?}", other),
        }
    }

    #[test]
    fn reads_dstas_fields() {
        let params = DstasLockingParams {
            owner_hash: [0xcc; 20],
            redemption_hash: [0xdd; 20],
            action_data: vec![],
            frozen: false,
            flags: vec![0x01],
            service_fields: vec![vec![0x0a, 0x0b]],
        };
        let script = build_dstas_locking_script(&params).unwrap();
        match read_token_script(script.to_bytes()) {
            Some(TokenScript::Dstas(fields)) => {
                assert_eq!(fields.owner_hash, [0xcc; 20]);
                assert_eq!(fields.redemption_hash, [0xdd; 20]);
                assert!(!fields.frozen);
                assert_eq!(fields.flags, vec![0x01]);
                assert_eq!(fields.service_fields, vec![vec![0x0a, 0x0b]]);
            }
            other => panic!("expected dSTAS, got {:?}", other),
        }
    }

    #[test]
    fn reads_frozen_dstas() {
        let params = DstasLockingParams {
            owner_hash: [0x11; 20],
            redemption_hash: [0x22; 20],
            action_data: vec![],
            frozen: true,
            flags: vec![0x01],
            service_fields: vec![],
        };
        let script = build_dstas_locking_script(&params).unwrap();
        let parsed = read_token_script(script.to_bytes()).unwrap();
        assert_eq!(parsed.kind(), TokenKind::Dstas);
        assert!(parsed.is_frozen());
    }

    #[test]
    fn rejects_other_scripts() {
        let p2pkh = hex::decode("76a91489abcdefabbaabbaabbaabbaabbaabbaabbaabba88ac").unwrap();
        assert!(!is_token_script(&p2pkh));
        assert!(!is_token_script(&hex::decode("006a0568656c6c6f").unwrap()));
        assert!(!is_token_script(&[]));

        // a STAS v2 script cut inside the template
        let stas = build_stas_locking_script(&[0xaa; 20], &[0xbb; 20], &[0x00], &[]).unwrap();
        assert!(!is_token_script(&stas.to_bytes()[..1000]));
    }

    #[test]
    fn garbage_bytes_do_not_panic() {
        for len in 0..64 {
            let script: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
            assert!(read_token_script(&script).is_none());
        }
        let mut dstas_like = vec![OP_DATA_20];
        dstas_like.extend_from_slice(&[0u8; 20]);
        dstas_like.push(0x4c);
        assert!(read_token_script(&dstas_like).is_none());
    }
}
