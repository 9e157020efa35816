#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lzdict::{decompress, Compressor, MAX_DICT_SIZE, MAX_INPUT_SIZE};

#[derive(Arbitrary, Debug)]
struct Case<'a> {
    input: &'a [u8],
    dict: &'a [u8],
    chunk: u16,
    revert: bool,
}

fuzz_target!(|case: Case| {
    if case.input.len() > MAX_INPUT_SIZE || case.dict.len() > MAX_DICT_SIZE {
        return;
    }

    let mut compressor = match Compressor::new(case.dict) {
        Ok(c) => c,
        Err(_) => return,
    };

    // one-shot round trip
    let compressed = compressor.compress(case.input).expect("compress");
    let back = decompress(&compressed, case.dict).expect("decompress");
    assert_eq!(case.input, back.as_slice());

    // incremental round trip, optionally exercising revert on every chunk
    let chunk = (case.chunk as usize % 64) + 1;
    compressor.reset();
    for piece in case.input.chunks(chunk) {
        compressor.write(piece).expect("write");
        if case.revert {
            compressor.revert().expect("revert");
            compressor.write(piece).expect("rewrite");
        }
    }
    let back = decompress(compressor.bytes(), case.dict).expect("decompress incremental");
    assert_eq!(case.input, back.as_slice());
});
