use std::{env, fs};
use rfc3161::cert::TrustRoots;
use rfc3161::tsp::{MessageImprint, TimeStampReq, TimeStampResp};


fn main() {
    let args: Vec<_> = env::args().skip(1).collect();
    if args.len() != 1 && args.len() != 3 {
        println!("Usage: readtsr <response> [<roots.pem> <data>]");
        return
    }
    let data = match fs::read(&args[0]) {
        Ok(data) => data,
        Err(err) => {
            println!("Can’t read file: {}", err);
            return;
        }
    };
    let resp = match TimeStampResp::decode(data.as_ref()) {
        Ok(resp) => resp,
        Err(err) => {
            println!("Can’t decode response: {}", err);
            return
        }
    };

    println!("Status: {}", resp.status());
    let info = match resp.tst_info() {
        Ok(info) => info,
        Err(err) => {
            println!("No time-stamp: {}", err);
            return
        }
    };
    println!("Version: {}", info.version());
    println!("Policy: {}", info.policy());
    println!(
        "Message imprint: {} {}",
        info.message_imprint().hash_algorithm(),
        rfc3161::util::hex::Hex(info.message_imprint().hashed_message())
    );
    println!("Serial number: {}", info.serial_number());
    println!("Time: {}", info.gen_time());
    if let Some(accuracy) = info.accuracy() {
        println!("Accuracy: {}", accuracy);
    }
    println!("Ordering: {}", info.ordering());
    if let Some(nonce) = info.nonce() {
        println!("Nonce: {}", nonce);
    }
    if let Some(tsa) = info.tsa() {
        println!("TSA: {}", tsa);
    }

    if args.len() != 3 {
        return
    }
    let roots = match fs::read(&args[1]) {
        Ok(pem) => match TrustRoots::from_pem(&pem) {
            Ok(roots) => roots,
            Err(err) => {
                println!("Can’t parse trust roots: {}", err);
                return
            }
        },
        Err(err) => {
            println!("Can’t read trust roots: {}", err);
            return
        }
    };
    let content = match fs::read(&args[2]) {
        Ok(content) => content,
        Err(err) => {
            println!("Can’t read data: {}", err);
            return
        }
    };
    let req = TimeStampReq::new(MessageImprint::from_data(
        info.message_imprint().hash_algorithm(), &content
    ));
    match resp.verify(&req, &roots) {
        Ok(_) => println!("Verification: OK"),
        Err(err) => println!("Verification failed: {}", err),
    }
}
