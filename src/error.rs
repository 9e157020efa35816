use thiserror::Error;

use crate::{MAX_DICT_SIZE, MAX_INPUT_SIZE};

#[derive(Error, Debug)]
pub enum Error {
    // Compressor preconditions; the instance stays usable
    #[error("dictionary too large: {size} bytes (max {})", MAX_DICT_SIZE)]
    DictTooLarge { size: usize },

    #[error("input too large: {size} bytes (max {})", MAX_INPUT_SIZE)]
    InputTooLarge { size: usize },

    #[error("revert called twice without an intervening write or reset")]
    AlreadyReverted,

    // Fatal compression error; the compressor must be reset before reuse
    #[error("compression failed; the compressor requires a reset")]
    WriteFailed,

    // Decoder errors
    #[error("unsupported compressor version: {0}")]
    UnsupportedVersion(u16),

    #[error("invalid header flag: 0x{0:02x}")]
    BadFlag(u8),

    #[error(
        "invalid back-reference: copy of {length} bytes from distance {distance} with {available} bytes available"
    )]
    InvalidBackref { distance: usize, length: usize, available: usize },

    #[error("unexpected end of compressed stream")]
    Truncated,
}

pub type Result<T> = std::result::Result<T, Error>;
