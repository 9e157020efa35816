use crate::bits::{BitReader, BitSink};
use crate::error::Result;

/// Delimiter announcing a short back-reference.
pub const SYM_SHORT: u8 = 0xFE;
/// Delimiter announcing a dynamic back-reference.
pub const SYM_DYNAMIC: u8 = 0xFF;

/// Bits used for the `length - 1` field of every token.
pub(crate) const NB_BITS_LENGTH: u8 = 8;
/// Longest span a single token can cover.
pub(crate) const MAX_BACKREF_LENGTH: usize = 1 << NB_BITS_LENGTH;

const SHORT_ADDR_BITS: u8 = 14;
const DYNAMIC_ADDR_BITS: u8 = 21;

/// True if `b` can be written as a literal byte.
pub(crate) fn can_encode_symbol(b: u8) -> bool {
    b != SYM_SHORT && b != SYM_DYNAMIC
}

/// The two token kinds sharing the wire shape
/// `[delimiter:8][length-1:8][addr:NbAddr]`, MSB-first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackrefKind {
    /// 14-bit address, input window only
    Short,
    /// 21-bit address, reaches the dictionary
    Dynamic,
}

impl BackrefKind {
    pub fn delimiter(self) -> u8 {
        match self {
            BackrefKind::Short => SYM_SHORT,
            BackrefKind::Dynamic => SYM_DYNAMIC,
        }
    }

    pub fn nb_bits_address(self) -> u8 {
        match self {
            BackrefKind::Short => SHORT_ADDR_BITS,
            BackrefKind::Dynamic => DYNAMIC_ADDR_BITS,
        }
    }

    /// Total bits of one token of this kind.
    pub fn nb_bits_backref(self) -> u8 {
        8 + NB_BITS_LENGTH + self.nb_bits_address()
    }

    /// Token size rounded up to bytes; doubles as the minimum match length
    /// below which a back-reference cannot pay for itself.
    pub fn nb_bytes_backref(self) -> usize {
        (self.nb_bits_backref() as usize + 7) / 8
    }

    /// Largest back distance the address field can carry.
    pub fn max_address(self) -> usize {
        1 << self.nb_bits_address()
    }

    pub fn max_length(self) -> usize {
        MAX_BACKREF_LENGTH
    }

    /// Decoder side: the length and back distance following the delimiter.
    /// Not symmetrical with `Backref::write_to`, which works in absolute
    /// offsets rather than back distances.
    pub(crate) fn read_fields(self, r: &mut BitReader) -> Result<(usize, usize)> {
        let length = r.read_bits(NB_BITS_LENGTH)? as usize + 1;
        let distance = r.read_bits(self.nb_bits_address())? as usize + 1;
        Ok((length, distance))
    }
}

/// An encoder-side back-reference.
///
/// `ref_offset` is the absolute position of the first referenced byte in
/// the logical buffer `dict ++ input`; input matches therefore carry
/// `dict_len + position`. Keeping the `+ dict_len` adjustment behind this
/// convention confines the address arithmetic to `write_to`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Backref {
    pub kind: BackrefKind,
    pub length: usize,
    pub ref_offset: usize,
}

impl Backref {
    /// Emit the token for a match starting at input position `pos`.
    pub fn write_to<S: BitSink>(&self, sink: &mut S, pos: usize, dict_len: usize) {
        debug_assert!(self.length >= 1 && self.length <= self.kind.max_length());

        sink.write_byte(self.kind.delimiter());
        sink.write_bits((self.length - 1) as u64, NB_BITS_LENGTH);

        let address = pos + dict_len - self.ref_offset - 1;
        debug_assert!(address < self.kind.max_address());
        sink.write_bits(address as u64, self.kind.nb_bits_address());
    }

    /// Net bit gain of this token over emitting its bytes literally.
    pub fn savings(&self) -> i64 {
        8 * self.length as i64 - self.kind.nb_bits_backref() as i64
    }
}
