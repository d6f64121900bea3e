//! End-to-end redeem-split flows through the public API.

use stas_sdk::primitives::ec::PrivateKey;
use stas_sdk::primitives::txid::Txid;
use stas_sdk::script::{Address, Network};
use stas_sdk::tokens::{
    build_redeem_split_tx, build_unsigned_redeem_split_tx, estimate_redeem_split_fee,
    verify_redeem_split, Destination, FeeSettings, InputSigner, PaymentInput, RedeemSplitConfig,
    RedeemSplitShape, SigningDescriptor, TokenError, TokenKind, Utxo,
};
use stas_sdk::transaction::template::p2pkh;
use stas_sdk::transaction::Transaction;

const REDEMPTION_PKH: [u8; 20] = [0x3c; 20];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn owner_key() -> PrivateKey {
    PrivateKey::from_hex("8a2f1e4b7c6d5e3f2a1b0c9d8e7f6a5b4c3d2e1f0a9b8c7d6e5f4a3b2c1d0e9f").unwrap()
}

fn payment_key() -> PrivateKey {
    PrivateKey::from_hex("1b2c3d4e5f60718293a4b5c6d7e8f9011223344556677889900aabbccddeeff0").unwrap()
}

fn recipient(seed: u8) -> Address {
    let key = PrivateKey::from_bytes(&[seed; 32]).unwrap();
    Address::from_public_key(&key.pub_key(), Network::Mainnet)
}

fn token_utxo(kind: TokenKind, satoshis: u64) -> Utxo {
    Utxo {
        txid: Txid::from_hex("4d3c2b1a00112233445566778899aabbccddeeff0123456789abcdef01234567")
            .unwrap(),
        vout: 1,
        satoshis,
        locking_script: kind
            .template_script(&owner_key().pub_key().hash160(), &REDEMPTION_PKH)
            .unwrap(),
    }
}

fn payment(satoshis: u64, signer: InputSigner) -> PaymentInput {
    PaymentInput {
        utxo: Utxo {
            txid: Txid::new([0x9a; 32]),
            vout: 0,
            satoshis,
            locking_script: p2pkh::lock_hash(&payment_key().pub_key().hash160()),
        },
        signer,
    }
}

fn split_config(kind: TokenKind) -> RedeemSplitConfig {
    RedeemSplitConfig {
        token_utxo: token_utxo(kind, 10_000),
        owner: InputSigner::Local(owner_key()),
        destinations: vec![
            Destination {
                address: recipient(0x21),
                satoshis: 3000,
            },
            Destination {
                address: recipient(0x22),
                satoshis: 4000,
            },
        ],
        payment: Some(payment(100_000, InputSigner::Local(payment_key()))),
        data: None,
        change: true,
        fee: FeeSettings::default(),
    }
}

#[test]
fn split_example_outputs() {
    init_tracing();
    let cfg = split_config(TokenKind::Stas);
    let fee = estimate_redeem_split_fee(&RedeemSplitShape::from_config(&cfg), &cfg.fee).unwrap();
    let tx = build_redeem_split_tx(&cfg).unwrap();

    let amounts: Vec<u64> = tx.outputs.iter().map(|o| o.satoshis).collect();
    assert_eq!(amounts, vec![3000, 3000, 4000, 100_000 - fee]);
    assert_eq!(
        TokenKind::Stas.owner_hash(&tx.outputs[1].locking_script).unwrap(),
        recipient(0x21).public_key_hash
    );
    assert_eq!(
        TokenKind::Stas.owner_hash(&tx.outputs[2].locking_script).unwrap(),
        recipient(0x22).public_key_hash
    );
}

#[test]
fn signed_hex_round_trip_verifies() {
    init_tracing();
    for kind in [TokenKind::Stas, TokenKind::Dstas] {
        let mut cfg = split_config(kind);
        if kind.supports_data() {
            cfg.data = Some(b"redeem batch 12".to_vec());
        }
        let tx = build_redeem_split_tx(&cfg).unwrap();
        let parsed = Transaction::from_hex(&tx.to_hex()).unwrap();
        assert_eq!(parsed.tx_id(), tx.tx_id());
        verify_redeem_split(&parsed).unwrap();
    }
}

#[test]
fn zero_fee_redeem_without_payment() {
    init_tracing();
    let mut cfg = split_config(TokenKind::Stas);
    cfg.payment = None;
    let tx = build_redeem_split_tx(&cfg).unwrap();
    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(tx.outputs.len(), 3);
    assert_eq!(tx.outputs[0].satoshis, 3000);
    verify_redeem_split(&tx).unwrap();
}

#[test]
fn payment_too_small_for_change() {
    init_tracing();
    let mut cfg = split_config(TokenKind::Stas);
    cfg.payment = Some(payment(800, InputSigner::Local(payment_key())));
    assert!(matches!(
        build_redeem_split_tx(&cfg),
        Err(TokenError::InsufficientChange { available: 800, .. })
    ));
}

#[test]
fn deferred_signing_via_json_descriptors() {
    init_tracing();
    let mut cfg = split_config(TokenKind::Dstas);
    cfg.owner = InputSigner::Deferred(owner_key().pub_key());
    cfg.payment = Some(payment(100_000, InputSigner::Deferred(payment_key().pub_key())));

    let outcome = build_unsigned_redeem_split_tx(&cfg).unwrap();
    let indices: Vec<usize> = outcome.unsigned_data().iter().map(|d| d.input_index).collect();
    assert_eq!(indices, vec![0, 1]);

    // hand the descriptors and the raw transaction to a remote signer
    let json = serde_json::to_string(outcome.unsigned_data()).unwrap();
    let hex = outcome.transaction().to_hex();

    let remote_tx = Transaction::from_hex(&hex).unwrap();
    let descriptors: Vec<SigningDescriptor> = serde_json::from_str(&json).unwrap();
    let signatures: Vec<_> = descriptors
        .iter()
        .map(|d| {
            let key = if d.is_token_input { owner_key() } else { payment_key() };
            key.sign(&d.signature_hash(&remote_tx).unwrap()).unwrap()
        })
        .collect();

    let tx = outcome.complete(&signatures).unwrap();
    assert!(tx.inputs.iter().all(|i| i.unlocking_script.is_some()));
    verify_redeem_split(&tx).unwrap();
}

#[test]
fn only_missing_key_is_described() {
    init_tracing();
    let mut cfg = split_config(TokenKind::Stas);
    cfg.owner = InputSigner::Deferred(owner_key().pub_key());
    let outcome = build_unsigned_redeem_split_tx(&cfg).unwrap();
    assert_eq!(outcome.unsigned_data().len(), 1);
    let descriptor = &outcome.unsigned_data()[0];
    assert_eq!(descriptor.input_index, 0);
    assert!(descriptor.is_token_input);
    assert_eq!(descriptor.satoshis, 10_000);
    assert_eq!(descriptor.locking_script, cfg.token_utxo.locking_script);
}

#[test]
fn fee_estimate_is_stable_and_monotonic() {
    init_tracing();
    let settings = FeeSettings::from_json(r#"{"sats_per_kb": 1000}"#).unwrap();
    let script = token_utxo(TokenKind::Stas, 1).locking_script;
    let fees: Vec<u64> = (1..=3)
        .map(|n| {
            estimate_redeem_split_fee(&RedeemSplitShape::new(script.clone(), n), &settings)
                .unwrap()
        })
        .collect();
    assert!(fees.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(
        fees[0],
        estimate_redeem_split_fee(&RedeemSplitShape::new(script, 1), &settings).unwrap()
    );
}
