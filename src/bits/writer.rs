use super::BitSink;

/// Bit-level writer for the compressed stream.
///
/// Writes bits MSB-first into an owned byte buffer. Between public
/// operations either the partial-byte cell is empty (the stream is
/// byte-aligned) or the last flushed byte has been reabsorbed by
/// `start_session`.
///
/// The writer also owns the per-write checkpoint: `start_session` records
/// the current length and padding so that `revert` can restore the stream
/// to its pre-write state bit for bit.
pub struct BitWriter {
    /// Flushed output bytes
    buf: Vec<u8>,
    /// Partial byte being built, bits occupy the high positions
    cache: u8,
    /// Bits currently in the cache (0-7)
    cache_bits: u8,
    /// Zero padding bits in the low positions of the last flushed byte
    nb_skipped_bits: u8,
    /// Checkpoint: buffer length at the last `start_session`
    last_len: usize,
    /// Checkpoint: padding at the last `start_session`
    last_nb_skipped_bits: u8,
}

impl BitWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            cache: 0,
            cache_bits: 0,
            nb_skipped_bits: 0,
            last_len: 0,
            last_nb_skipped_bits: 0,
        }
    }

    /// Write the low `nb_bits` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, nb_bits: u8) {
        debug_assert!(nb_bits <= 64);

        let mut remaining = nb_bits;
        while remaining > 0 {
            let space = 8 - self.cache_bits;
            let take = remaining.min(space);

            let chunk = ((value >> (remaining - take)) & ((1u64 << take) - 1)) as u8;
            self.cache |= chunk << (space - take);
            self.cache_bits += take;
            remaining -= take;

            if self.cache_bits == 8 {
                self.buf.push(self.cache);
                self.cache = 0;
                self.cache_bits = 0;
            }
        }
    }

    /// Write a full byte.
    pub fn write_byte(&mut self, b: u8) {
        if self.cache_bits == 0 {
            self.buf.push(b);
        } else {
            self.write_bits(b as u64, 8);
        }
    }

    /// Append raw bytes; the stream must be byte-aligned.
    pub fn append_raw(&mut self, bytes: &[u8]) {
        debug_assert_eq!(self.cache_bits, 0);
        self.buf.extend_from_slice(bytes);
    }

    /// Pad the partial byte with zeros and flush it; returns the number of
    /// padding bits added.
    fn align(&mut self) -> u8 {
        if self.cache_bits == 0 {
            return 0;
        }
        let padding = 8 - self.cache_bits;
        self.buf.push(self.cache);
        self.cache = 0;
        self.cache_bits = 0;
        padding
    }

    /// Pull the last flushed byte back into the partial-byte cell, dropping
    /// its padding, so that subsequent bits land at the correct position.
    fn rehydrate(&mut self) {
        debug_assert_eq!(self.cache_bits, 0);
        let last = self.buf.pop().expect("rehydrate on an empty output buffer");
        self.write_bits((last >> self.nb_skipped_bits) as u64, 8 - self.nb_skipped_bits);
    }

    /// Checkpoint the current stream state and resume bit-level appends.
    pub fn start_session(&mut self) {
        self.last_len = self.buf.len();
        self.last_nb_skipped_bits = self.nb_skipped_bits;
        self.rehydrate();
    }

    /// Align to a byte boundary, recording the padding for the next session.
    pub fn end_session(&mut self) {
        self.nb_skipped_bits = self.align();
    }

    /// Rewind to the state checkpointed by the last `start_session`.
    pub fn revert(&mut self) {
        debug_assert_eq!(self.cache_bits, 0);
        self.buf.truncate(self.last_len);
        self.nb_skipped_bits = self.last_nb_skipped_bits;
        // the reverted session reused the padding positions of the last
        // byte; zero them again so the stream ends canonically
        if self.nb_skipped_bits > 0 {
            if let Some(last) = self.buf.last_mut() {
                *last &= !((1u8 << self.nb_skipped_bits) - 1);
            }
        }
    }

    /// Overwrite the checkpoint, e.g. after the stream has been rebuilt.
    pub fn set_checkpoint(&mut self, len: usize, nb_skipped_bits: u8) {
        self.last_len = len;
        self.last_nb_skipped_bits = nb_skipped_bits;
    }

    /// Clear the writer for reuse.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.cache = 0;
        self.cache_bits = 0;
        self.nb_skipped_bits = 0;
        self.last_len = 0;
        self.last_nb_skipped_bits = 0;
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn nb_skipped_bits(&self) -> u8 {
        self.nb_skipped_bits
    }
}

impl BitSink for BitWriter {
    fn write_bits(&mut self, value: u64, nb_bits: u8) {
        BitWriter::write_bits(self, value, nb_bits);
    }

    fn write_byte(&mut self, b: u8) {
        BitWriter::write_byte(self, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bits_msb_first() {
        let mut w = BitWriter::with_capacity(8);
        w.write_bits(0b101, 3);
        w.write_bits(0b10011, 5);
        assert_eq!(w.bytes(), &[0b1011_0011]);
    }

    #[test]
    fn test_write_bits_cross_byte() {
        let mut w = BitWriter::with_capacity(8);
        w.write_bits(0xABC, 12);
        w.end_session();
        // 1010 1011 1100 + 4 padding zeros
        assert_eq!(w.bytes(), &[0xAB, 0xC0]);
        assert_eq!(w.nb_skipped_bits(), 4);
    }

    #[test]
    fn test_write_byte_unaligned() {
        let mut w = BitWriter::with_capacity(8);
        w.write_bits(0b1111, 4);
        w.write_byte(0x00);
        w.end_session();
        assert_eq!(w.bytes(), &[0xF0, 0x00]);
        assert_eq!(w.nb_skipped_bits(), 4);
    }

    #[test]
    fn test_rehydrate_continues_mid_byte() {
        let mut w = BitWriter::with_capacity(8);
        w.append_raw(&[0xAA]);
        w.start_session();
        w.write_bits(0b110, 3);
        w.end_session();
        assert_eq!(w.nb_skipped_bits(), 5);

        // Continuing after rehydration must land the next bits right after
        // the previous ones, as if the stream had never been aligned.
        w.start_session();
        w.write_bits(0b10101, 5);
        w.end_session();
        assert_eq!(w.nb_skipped_bits(), 0);
        assert_eq!(w.bytes(), &[0xAA, 0b1101_0101]);
    }

    #[test]
    fn test_revert_restores_length_and_padding() {
        let mut w = BitWriter::with_capacity(8);
        w.append_raw(&[0x01]);
        w.start_session();
        w.write_bits(0b101, 3);
        w.end_session();
        let snapshot = w.bytes().to_vec();
        let skipped = w.nb_skipped_bits();

        w.start_session();
        w.write_bits(0xFFFF, 16);
        w.end_session();
        assert_ne!(w.bytes(), snapshot.as_slice());

        w.revert();
        assert_eq!(w.bytes(), snapshot.as_slice());
        assert_eq!(w.nb_skipped_bits(), skipped);
    }

    #[test]
    fn test_aligned_session_is_identity() {
        let mut w = BitWriter::with_capacity(8);
        w.append_raw(&[0x12, 0x34]);
        w.start_session();
        w.end_session();
        assert_eq!(w.bytes(), &[0x12, 0x34]);
        assert_eq!(w.nb_skipped_bits(), 0);
    }
}
