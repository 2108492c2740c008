#![no_main]

use libfuzzer_sys::fuzz_target;
use rfc3161::cert::Cert;
use rfc3161::cms::SignedData;
use rfc3161::tsp::{TimeStampReq, TimeStampResp};

fuzz_target!(|data: &[u8]| {
    let (which, data) = match data.split_first() {
        Some((first, data)) => (*first, data),
        None => return,
    };

    match which % 4 {
        0 => { let _ = Cert::decode(data); },
        1 => {
            if let Ok(signed) = SignedData::decode(data) {
                for signer in signed.signer_infos() {
                    let _ = signer.content_type();
                    let _ = signer.message_digest();
                    let _ = signer.signing_time();
                }
            }
        }
        2 => { let _ = TimeStampReq::decode(data); },
        3 => {
            if let Ok(resp) = TimeStampResp::decode(data) {
                let _ = resp.tst_info();
            }
        }
        _ => panic!("what?"),
    }
});
