//! Fee settings and the estimation pass.
//!
//! The change output depends on the fee and the fee on the size of the
//! transaction including that output. The estimator breaks the loop by
//! building a throwaway transaction of the same shape with placeholder
//! keys, outpoints and amounts at cost 0, then pricing its size.

use serde::{Deserialize, Serialize};
use tracing::debug;

use stas_primitives::ec::PrivateKey;
use stas_primitives::txid::Txid;
use stas_script::{Address, Network, Script};
use stas_transaction::template::p2pkh;

use crate::error::TokenError;
use crate::factory::planner::SplitRequest;
use crate::factory::redeem_split::{assemble, check_destination_count, RedeemSplitConfig};
use crate::kind::TokenKind;
use crate::types::{Destination, InputSigner, PaymentInput, Utxo};

/// Default fee rate in satoshis per 1000 bytes.
pub const DEFAULT_SATS_PER_KB: u64 = 500;

/// Default smallest change output.
pub const DEFAULT_DUST_LIMIT: u64 = 546;

/// Placeholder amounts are chosen so every amount push takes eight bytes,
/// the widest any real value below 2^63 needs.
const PLACEHOLDER_TOKEN_SATS: u64 = 1 << 62;
const PLACEHOLDER_DESTINATION_SATS: u64 = 1 << 56;
const PLACEHOLDER_PAYMENT_SATS: u64 = 1 << 62;

const PLACEHOLDER_KEY: [u8; 32] = [0x01; 32];

/// Fee policy for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSettings {
    /// Fee rate in satoshis per 1000 bytes.
    #[serde(default = "default_sats_per_kb")]
    pub sats_per_kb: u64,
    /// Change outputs below this value are refused.
    #[serde(default = "default_dust_limit")]
    pub dust_limit: u64,
}

fn default_sats_per_kb() -> u64 {
    DEFAULT_SATS_PER_KB
}

fn default_dust_limit() -> u64 {
    DEFAULT_DUST_LIMIT
}

impl Default for FeeSettings {
    fn default() -> Self {
        FeeSettings {
            sats_per_kb: DEFAULT_SATS_PER_KB,
            dust_limit: DEFAULT_DUST_LIMIT,
        }
    }
}

impl FeeSettings {
    /// Load settings from a JSON object; missing fields take their defaults.
    ///
    /// Anything but an object is refused, including the array form serde
    /// would otherwise accept for a struct.
    pub fn from_json(json: &str) -> Result<Self, TokenError> {
        let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        Ok(serde_json::from_value(serde_json::Value::Object(fields))?)
    }

    /// Fee for a transaction of `size` bytes, rounded up.
    pub fn fee_for_size(&self, size: usize) -> u64 {
        (size as u64).saturating_mul(self.sats_per_kb).div_ceil(1000)
    }
}

/// The properties of a redeem-split that determine its size.
#[derive(Debug, Clone)]
pub struct RedeemSplitShape {
    /// Locking script of the token UTXO (only its kind and length matter).
    pub token_script: Script,
    /// Number of split destinations.
    pub destination_count: usize,
    /// Length of the data payload, if one is attached.
    pub data_len: Option<usize>,
    /// Whether a change output is returned to the payment key.
    pub change: bool,
}

impl RedeemSplitShape {
    /// A shape with no data and a change output.
    pub fn new(token_script: Script, destination_count: usize) -> Self {
        RedeemSplitShape {
            token_script,
            destination_count,
            data_len: None,
            change: true,
        }
    }

    /// Attach a data payload of `len` bytes.
    pub fn with_data(mut self, len: usize) -> Self {
        self.data_len = Some(len);
        self
    }

    /// Set whether change is returned.
    pub fn with_change(mut self, change: bool) -> Self {
        self.change = change;
        self
    }

    /// The shape of the transaction `config` would build.
    pub fn from_config(config: &RedeemSplitConfig) -> Self {
        RedeemSplitShape {
            token_script: config.token_utxo.locking_script.clone(),
            destination_count: config.destinations.len(),
            data_len: config.data.as_ref().map(Vec::len).filter(|len| *len > 0),
            change: config.change,
        }
    }
}

/// Estimate the fee of a redeem-split with a payment input.
///
/// Runs the full signed build over placeholders at cost 0 with the change
/// check suppressed and prices the serialized size.
///
/// # Arguments
/// * `shape` - Token script, destination count, data and change flags.
/// * `settings` - Fee rate.
///
/// # Returns
/// The fee in satoshis. Equal shapes give equal fees, and the fee does not
/// decrease as destinations are added.
pub fn estimate_redeem_split_fee(
    shape: &RedeemSplitShape,
    settings: &FeeSettings,
) -> Result<u64, TokenError> {
    let kind = TokenKind::detect(&shape.token_script)?;
    check_destination_count(shape.destination_count)?;

    let key = PrivateKey::from_bytes(&PLACEHOLDER_KEY)?;
    let pkh = key.pub_key().hash160();
    let signer = InputSigner::Local(key);

    let token_utxo = Utxo {
        txid: Txid::new([0xee; 32]),
        vout: 0,
        satoshis: PLACEHOLDER_TOKEN_SATS,
        locking_script: shape.token_script.clone(),
    };
    let payment = PaymentInput {
        utxo: Utxo {
            txid: Txid::new([0xef; 32]),
            vout: u32::MAX,
            satoshis: PLACEHOLDER_PAYMENT_SATS,
            locking_script: p2pkh::lock_hash(&pkh),
        },
        signer: signer.clone(),
    };
    let destinations: Vec<Destination> = (0..shape.destination_count)
        .map(|i| Destination {
            address: Address::from_public_key_hash(&[0xd0 + i as u8; 20], Network::Mainnet),
            satoshis: PLACEHOLDER_DESTINATION_SATS,
        })
        .collect();
    let payload = shape
        .data_len
        .filter(|_| kind.supports_data())
        .map(|len| vec![0u8; len]);

    let request = SplitRequest {
        kind,
        token_utxo: &token_utxo,
        owner: &signer,
        destinations: &destinations,
        payment: Some(&payment),
        change: shape.change,
        data: payload.as_deref(),
        tx_cost: 0,
        dust_limit: settings.dust_limit,
        estimating: true,
    };
    let tx = assemble(&request)?.into_signed()?;

    let size = tx.size();
    let fee = settings.fee_for_size(size);
    debug!(
        kind = %kind,
        destinations = shape.destination_count,
        data = shape.data_len.is_some(),
        change = shape.change,
        size,
        fee,
        "estimated redeem-split fee"
    );
    Ok(fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_script(kind: TokenKind) -> Script {
        kind.template_script(&[0x01; 20], &[0x02; 20]).unwrap()
    }

    #[test]
    fn fee_rounds_up() {
        let settings = FeeSettings::default();
        assert_eq!(settings.fee_for_size(0), 0);
        assert_eq!(settings.fee_for_size(1), 1);
        assert_eq!(settings.fee_for_size(2000), 1000);
        assert_eq!(settings.fee_for_size(2001), 1001);
    }

    #[test]
    fn settings_from_json_fill_defaults() {
        let settings = FeeSettings::from_json(r#"{"sats_per_kb": 50}"#).unwrap();
        assert_eq!(settings.sats_per_kb, 50);
        assert_eq!(settings.dust_limit, DEFAULT_DUST_LIMIT);
        assert_eq!(FeeSettings::from_json("{}").unwrap(), FeeSettings::default());
    }

    #[test]
    fn settings_from_json_reject_non_objects() {
        for json in ["[1]", "[1, 546]", "500", r#"{"sats_per_kb": "fast"}"#, "{"] {
            assert!(
                matches!(FeeSettings::from_json(json), Err(TokenError::Json(_))),
                "accepted {}",
                json
            );
        }
    }

    #[test]
    fn estimate_is_deterministic() {
        let shape = RedeemSplitShape::new(token_script(TokenKind::Stas), 2);
        let settings = FeeSettings::default();
        let first = estimate_redeem_split_fee(&shape, &settings).unwrap();
        let second = estimate_redeem_split_fee(&shape, &settings).unwrap();
        assert_eq!(first, second);
        assert!(first > 0);
    }

    #[test]
    fn estimate_grows_with_destinations() {
        let settings = FeeSettings::default();
        let mut previous = 0;
        for count in 1..=3 {
            let shape = RedeemSplitShape::new(token_script(TokenKind::Dstas), count);
            let fee = estimate_redeem_split_fee(&shape, &settings).unwrap();
            assert!(fee >= previous);
            previous = fee;
        }
    }

    #[test]
    fn estimate_accounts_for_data_and_change() {
        let settings = FeeSettings::default();
        let base = RedeemSplitShape::new(token_script(TokenKind::Dstas), 1);
        let plain = estimate_redeem_split_fee(&base, &settings).unwrap();
        let with_data = estimate_redeem_split_fee(&base.clone().with_data(500), &settings).unwrap();
        let no_change =
            estimate_redeem_split_fee(&base.clone().with_change(false), &settings).unwrap();
        assert!(with_data > plain);
        assert!(no_change < plain);

        // STAS v2 has no data output, so a payload changes nothing
        let stas = RedeemSplitShape::new(token_script(TokenKind::Stas), 1);
        assert_eq!(
            estimate_redeem_split_fee(&stas.clone().with_data(500), &settings).unwrap(),
            estimate_redeem_split_fee(&stas, &settings).unwrap()
        );
    }

    #[test]
    fn estimate_rejects_bad_shapes() {
        let settings = FeeSettings::default();
        let p2pkh_script = p2pkh::lock_hash(&[0x01; 20]);
        assert!(matches!(
            estimate_redeem_split_fee(&RedeemSplitShape::new(p2pkh_script, 1), &settings),
            Err(TokenError::InvalidUtxo(_))
        ));
        assert!(matches!(
            estimate_redeem_split_fee(
                &RedeemSplitShape::new(token_script(TokenKind::Stas), 0),
                &settings
            ),
            Err(TokenError::InvalidDestination(_))
        ));
    }
}
