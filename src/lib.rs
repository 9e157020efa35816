pub mod backref;
pub mod bits;
pub mod compress;
pub mod decompress;
pub mod dict;
pub mod error;
pub mod header;
pub mod suffix;

pub use backref::{BackrefKind, SYM_DYNAMIC, SYM_SHORT};
pub use compress::Compressor;
pub use decompress::{decompress, phrases_to_csv, stream_info, Phrase, PhraseKind};
pub use dict::augment_dict;
pub use error::{Error, Result};
pub use header::{Header, HEADER_SIZE, VERSION};

/// Maximum number of input bytes a compressor accepts between resets.
pub const MAX_INPUT_SIZE: usize = 1 << 22;

/// Maximum dictionary size after augmentation.
pub const MAX_DICT_SIZE: usize = 1 << 22;
