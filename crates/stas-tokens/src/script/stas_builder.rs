//! Builder for STAS v2 locking scripts.

use stas_script::Script;

use crate::error::TokenError;
use crate::script::templates::{
    PKH_LEN, STAS_V2_OWNER_OFFSET, STAS_V2_REDEMPTION_OFFSET, STAS_V2_TEMPLATE_LEN,
};

/// The STAS v2 template with zeroed owner (bytes 3..23) and redemption
/// hash (bytes 1411..1431).
const STAS_V2_TEMPLATE_HEX: &str = concat!(
    "76a914", "0000000000000000000000000000000000000000",
    "88ac6976aa607f5f7f7c5e7f7c5d7f7c5c7f7c5b7f7c5a7f7c597f7c587f7c577f7c567f7c557f7c547f7c537f7c527f7c517f7c7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e",
    "7c5f7f7c5e7f7c5d7f7c5c7f7c5b7f7c5a7f7c597f7c587f7c577f7c567f7c557f7c547f7c537f7c527f7c517f7c7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e",
    "01007e818b21414136d08c5ed2bf3ba048afe6dcaebafeffffffffffffffffffffffffffffff00",
    "7d976e7c5296a06394677768827601249301307c7e23022079be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798027e7c7e7c",
    "8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c",
    "8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c",
    "8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c",
    "8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c8276638c687f7c",
    "7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e",
    "01417e21038ff83d8cf12121491609c4939dc11c4aa35503508fe432dc5a5c1905608b9218ad",
    "547f7701207f01207f7701247f517f7801007e8102fd00a063546752687f7801007e817f727e7b01177f777b557a766471567a577a786354807e7e676d68",
    "aa880067765158a569765187645294567a5379587a7e7e78637c8c7c53797e577a7e6878637c8c7c53797e577a7e6878637c8c7c53797e577a7e68",
    "78637c8c7c53797e577a7e6878637c8c7c53797e577a7e6867567a6876aa587a7d54807e577a597a5a7a786354807e6f7e7eaa727c7e676d6e7eaa7c687b7eaa",
    "587a7d877663516752687c72879b69537a647500687c7b547f77517f7853a0916901247f77517f7c01007e817602fc00a06302fd00a063546752687f7c01007e81",
    "6854937f77788c6301247f77517f7c01007e817602fc00a06302fd00a063546752687f7c01007e816854937f777852946301247f77517f7c01007e81",
    "7602fc00a06302fd00a063546752687f7c01007e816854937f77686877517f7c52797d8b9f7c53a09b91697c76638c7c587f77517f7c01007e81",
    "7602fc00a06302fd00a063546752687f7c01007e81687f777c6876638c7c587f77517f7c01007e817602fc00a06302fd00a063546752687f7c01007e81",
    "687f777c6863587f77517f7c01007e817602fc00a06302fd00a063546752687f7c01007e81687f7768587f517f7801007e81",
    "7602fc00a06302fd00a063546752687f7801007e81727e7b7b687f75537f7c0376a9148801147f775379645579887567726881766968789263556753687a76",
    "026c057f7701147f8263517f7c766301007e817f7c6775006877686b537992635379528763547a6b547a6b677c6b567a6b537a7c717c71716868",
    "547a587f7c81547a557964936755795187637c686b687c547f7701207f75748c7a7669765880748c7a76567a876457790376a9147e7c7e557967",
    "041976a9147c7e0288ac687e7e5579636c766976748c7a9d58807e6c0376a9147e748c7a7e6c7e7e676c766b8263828c007c80517e846864745aa063",
    "7c748c7a76697d937b7b58807e56790376a9147e748c7a7e55797e7e6868686c567a5187637500678263828c007c80517e846868647459a063",
    "7c748c7a76697d937b7b58807e55790376a9147e748c7a7e55797e7e687459a0637c748c7a76697d937b7b58807e55790376a9147e748c7a7e55797e7e",
    "68687c537a9d547963557958807e041976a91455797e0288ac7e7e68aa87726d77776a14",
    "0000000000000000000000000000000000000000"
);

/// Build a STAS v2 locking script.
///
/// # Arguments
/// * `owner` - Public key hash that can spend the token.
/// * `redemption` - Public key hash of the issuer that can redeem it.
/// * `flags` - Flags push following the template.
/// * `metadata` - Further pushes (symbol, issuer data).
///
/// # Returns
/// The locking script, or an error if a push exceeds the script limits.
pub fn build_stas_locking_script(
    owner: &[u8; 20],
    redemption: &[u8; 20],
    flags: &[u8],
    metadata: &[Vec<u8>],
) -> Result<Script, TokenError> {
    let mut bytes = hex::decode(STAS_V2_TEMPLATE_HEX)
        .map_err(|e| TokenError::InvalidScript(format!("template decode error: {e}")))?;
    debug_assert_eq!(bytes.len(), STAS_V2_TEMPLATE_LEN);

    bytes[STAS_V2_OWNER_OFFSET..STAS_V2_OWNER_OFFSET + PKH_LEN].copy_from_slice(owner);
    bytes[STAS_V2_REDEMPTION_OFFSET..STAS_V2_REDEMPTION_OFFSET + PKH_LEN]
        .copy_from_slice(redemption);

    let mut script = Script::from(bytes);
    script.append_push_data(flags)?;
    for item in metadata {
        script.append_push_data(item)?;
    }
    Ok(script)
}

/// Rebind a STAS v2 script to a new owner, keeping every other byte.
pub fn rebind_stas_owner(script: &Script, owner: &[u8; 20]) -> Result<Script, TokenError> {
    let mut bytes = script.to_bytes().to_vec();
    let slot = bytes
        .get_mut(STAS_V2_OWNER_OFFSET..STAS_V2_OWNER_OFFSET + PKH_LEN)
        .ok_or_else(|| TokenError::InvalidScript("STAS script too short".into()))?;
    slot.copy_from_slice(owner);
    Ok(Script::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::reader::{read_token_script, TokenScript};

    #[test]
    fn template_has_expected_length() {
        assert_eq!(hex::decode(STAS_V2_TEMPLATE_HEX).unwrap().len(), STAS_V2_TEMPLATE_LEN);
    }

    #[test]
    fn built_script_layout() {
        let script = build_stas_locking_script(&[0xaa; 20], &[0xbb; 20], &[0x01], &[]).unwrap();
        let bytes = script.to_bytes();
        assert_eq!(bytes.len(), STAS_V2_TEMPLATE_LEN + 2);
        assert_eq!(&bytes[3..23], &[0xaa; 20]);
        assert_eq!(&bytes[1411..1431], &[0xbb; 20]);
        assert_eq!(&bytes[1431..], &[0x01, 0x01]);
    }

    #[test]
    fn rebind_keeps_redemption_and_metadata() {
        let metadata = vec![b"GOLD".to_vec()];
        let source =
            build_stas_locking_script(&[0x01; 20], &[0x02; 20], &[0x00], &metadata).unwrap();
        let rebound = rebind_stas_owner(&source, &[0x03; 20]).unwrap();
        assert_eq!(rebound.len(), source.len());

        match read_token_script(rebound.to_bytes()) {
            Some(TokenScript::Stas(fields)) => {
                assert_eq!(fields.owner_hash, [0x03; 20]);
                assert_eq!(fields.redemption_hash, [0x02; 20]);
                assert_eq!(fields.metadata, metadata);
            }
            other => panic!("expected STAS, got {:?}", other),
        }
    }

    #[test]
    fn rebind_rejects_short_script() {
        let short = Script::from_bytes(&[0x76, 0xa9]);
        assert!(matches!(
            rebind_stas_owner(&short, &[0u8; 20]),
            Err(TokenError::InvalidScript(_))
        ));
    }
}
