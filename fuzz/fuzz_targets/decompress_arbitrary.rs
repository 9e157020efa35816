#![no_main]

use libfuzzer_sys::fuzz_target;
use lzdict::decompress;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    // first byte sizes the dictionary slice, the rest is the stream
    let split = (data[0] as usize).min(data.len() - 1);
    let (dict, stream) = data[1..].split_at(split);

    // Decoding may fail on malformed input - that's OK
    // We're looking for panics/crashes, not errors
    let _ = decompress(stream, dict);
});
