use proptest::prelude::*;

use stas_script::chunk::{decode_number_le, encode_number_le};
use stas_script::Script;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn pushed_data_comes_back_as_one_chunk(data in prop::collection::vec(any::<u8>(), 1..600)) {
        let mut script = Script::new();
        script.append_push_data(&data).unwrap();
        let chunks = script.chunks().unwrap();
        prop_assert_eq!(chunks.len(), 1);
        prop_assert_eq!(chunks[0].data.as_deref(), Some(&data[..]));
    }

    #[test]
    fn number_pushes_decode_to_the_same_value(value in any::<u64>()) {
        prop_assert_eq!(decode_number_le(&encode_number_le(value)), Some(value));
        let mut script = Script::new();
        script.append_number(value);
        let chunks = script.chunks().unwrap();
        prop_assert_eq!(chunks[0].as_number(), Some(value));
    }
}
