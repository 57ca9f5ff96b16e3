//! Generate test vectors for interop testing.
//!
//! Run with: cargo run --package clink-protocol --example test_vectors

use clink_protocol::framing;
use clink_protocol::payload;
use clink_protocol::{OaepEncoder, DEBUG_SEED};

fn main() {
    // Test vector 1: Padded block for the debug seed
    let em = OaepEncoder::new().pad("", DEBUG_SEED).expect("padding failed");
    print_test_vector("padded_block_debug_seed", &em);

    // Test vector 2: Connection payload
    let body = payload::encode(5, "abc", "dev1", "acct").expect("payload encoding failed");
    print_test_vector("connection_payload", &body);

    // Test vector 3: Connection payload as a build message
    print_test_vector("connection_frame", &framing::encode(1, &body, true));

    // Test vector 4: Empty frame
    print_test_vector("empty_frame", &framing::encode(1, &[], false));
}

fn print_test_vector(name: &str, bytes: &[u8]) {
    print!("export const {} = new Uint8Array([", name);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            print!(", ");
        }
        print!("{}", b);
    }
    println!("]);");
}
