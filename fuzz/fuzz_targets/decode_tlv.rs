#![no_main]

use libfuzzer_sys::fuzz_target;
use rfc3161::asn1::{Value, convert_to_der};

fuzz_target!(|data: &[u8]| {
    let value = match Value::decode(data) {
        Ok(value) => value,
        Err(_) => return,
    };
    let der = value.to_vec();
    assert_eq!(der.len(), value.encoded_len());
    assert!(der.len() <= data.len());
    assert_eq!(convert_to_der(&der).unwrap(), der);
});
