use crate::backref::{SYM_DYNAMIC, SYM_SHORT};
use crate::error::{Error, Result};
use crate::suffix::SuffixIndex;
use crate::MAX_DICT_SIZE;

/// Ensure the dictionary contains both reserved delimiter bytes, appending
/// whichever is missing. Idempotent; both endpoints must apply it.
pub fn augment_dict(dict: &[u8]) -> Vec<u8> {
    let mut augmented = dict.to_vec();
    if !dict.contains(&SYM_SHORT) {
        augmented.push(SYM_SHORT);
    }
    if !dict.contains(&SYM_DYNAMIC) {
        augmented.push(SYM_DYNAMIC);
    }
    augmented
}

/// The compressor's view of the shared dictionary: augmented bytes, the
/// suffix index over them, and the positions backing length-1 references
/// for the reserved bytes. Read-only after construction.
pub(crate) struct Dict {
    data: Vec<u8>,
    index: SuffixIndex,
    sym_short_at: usize,
    sym_dynamic_at: usize,
}

impl Dict {
    pub fn new(raw: &[u8]) -> Result<Self> {
        let data = augment_dict(raw);
        if data.len() > MAX_DICT_SIZE {
            return Err(Error::DictTooLarge { size: data.len() });
        }
        let index = SuffixIndex::new(&data);
        let sym_short_at = data
            .iter()
            .position(|&b| b == SYM_SHORT)
            .expect("augmented dictionary contains the short delimiter");
        let sym_dynamic_at = data
            .iter()
            .position(|&b| b == SYM_DYNAMIC)
            .expect("augmented dictionary contains the dynamic delimiter");
        Ok(Self { data, index, sym_short_at, sym_dynamic_at })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn index(&self) -> &SuffixIndex {
        &self.index
    }

    /// First dictionary offset holding the reserved byte `b`.
    pub fn reserved_index(&self, b: u8) -> usize {
        match b {
            SYM_SHORT => self.sym_short_at,
            _ => self.sym_dynamic_at,
        }
    }
}
