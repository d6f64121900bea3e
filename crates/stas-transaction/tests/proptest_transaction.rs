use proptest::prelude::*;

use stas_primitives::txid::Txid;
use stas_script::Script;
use stas_transaction::sighash::{self, Preimage};
use stas_transaction::{Transaction, TransactionInput, TransactionOutput};

fn arb_transaction() -> impl Strategy<Value = Transaction> {
    let arb_input = (
        prop::array::uniform32(any::<u8>()),
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 1..64),
        any::<u32>(),
    )
        .prop_map(|(txid, vout, script, sequence)| {
            let mut input = TransactionInput::new(Txid::new(txid), vout);
            input.unlocking_script = Some(Script::from_bytes(&script));
            input.sequence_number = sequence;
            input
        });

    let arb_output = (any::<u64>(), prop::collection::vec(any::<u8>(), 0..64))
        .prop_map(|(satoshis, script)| TransactionOutput::new(satoshis, Script::from(script)));

    (
        any::<u32>(),
        prop::collection::vec(arb_input, 1..4),
        prop::collection::vec(arb_output, 1..4),
        any::<u32>(),
    )
        .prop_map(|(version, inputs, outputs, lock_time)| Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reparsed_transaction_keeps_its_id(tx in arb_transaction()) {
        let parsed = Transaction::from_bytes(&tx.to_bytes()).unwrap();
        prop_assert_eq!(parsed.tx_id(), tx.tx_id());
        prop_assert_eq!(parsed.size(), tx.size());
    }

    #[test]
    fn every_input_preimage_parses(
        tx in arb_transaction(),
        script in prop::collection::vec(any::<u8>(), 0..200),
        satoshis in any::<u64>(),
    ) {
        for index in 0..tx.inputs.len() {
            let raw =
                sighash::calc_preimage(&tx, index, &script, sighash::SIGHASH_ALL_FORKID, satoshis)
                    .unwrap();
            let parsed = Preimage::parse(&raw).unwrap();
            prop_assert_eq!(parsed.outpoint_txid, tx.inputs[index].source_txid);
            prop_assert_eq!(parsed.satoshis, satoshis);
            prop_assert_eq!(parsed.script_code.to_bytes(), &script[..]);
            prop_assert_eq!(parsed.hash_outputs, sighash::outputs_hash(&tx));
        }
    }
}
