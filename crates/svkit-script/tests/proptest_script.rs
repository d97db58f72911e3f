use proptest::prelude::*;

use svkit_script::interpreter::scriptnum::{check_minimal_data_encoding, ScriptNumber};
use svkit_script::Script;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn script_number_encode_decode_roundtrip(val in -0x7FFFFFFFi64..=0x7FFFFFFFi64) {
        let bytes = ScriptNumber::new(val).to_bytes();
        // The encoder always emits the minimal form.
        prop_assert!(check_minimal_data_encoding(&bytes).is_ok());
        let sn2 = ScriptNumber::from_bytes(&bytes, 4, true).unwrap();
        prop_assert_eq!(val, sn2.value());
    }

    #[test]
    fn script_bytes_roundtrip(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let script = Script::from_bytes(&data);
        let out = script.to_bytes();
        prop_assert_eq!(&data[..], out);
    }

    #[test]
    fn script_hex_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let script = Script::from_bytes(&data);
        let hex_str = script.to_hex();
        let script2 = Script::from_hex(&hex_str).unwrap();
        prop_assert_eq!(script.to_bytes(), script2.to_bytes());
    }

    #[test]
    fn push_data_script_chunks_roundtrip(data in prop::collection::vec(any::<u8>(), 0..300)) {
        let mut script = Script::new();
        script.append_push_data(&data).unwrap();
        let chunks = script.chunks().unwrap();
        prop_assert_eq!(chunks.len(), 1);
        prop_assert_eq!(chunks[0].data.as_deref().unwrap_or(&[]), &data[..]);
        // Re-encoding the chunk reproduces the script bytes.
        prop_assert_eq!(chunks[0].to_bytes(), script.to_bytes());
    }
}
