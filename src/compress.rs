use crate::backref::{can_encode_symbol, Backref, BackrefKind, MAX_BACKREF_LENGTH};
use crate::bits::{BitCounter, BitSink, BitWriter};
use crate::dict::Dict;
use crate::error::{Error, Result};
use crate::header::{Header, HEADER_SIZE};
use crate::suffix::SuffixIndex;
use crate::MAX_INPUT_SIZE;

/// Runs of identical bytes at least this long skip the suffix-array search.
const RUN_LENGTH_THRESHOLD: usize = 160;

/// Largest input accepted by `compressed_size_256k`.
const MAX_ESTIMATE_INPUT_SIZE: usize = 1 << 18;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Level {
    NoCompression,
    Compression,
}

/// Incremental, revertible LZSS compressor over a shared dictionary.
///
/// Single-threaded and stateful: one instance per producer. Bytes are fed
/// through `write`; after every completed call the output is byte-aligned
/// and `bytes` returns the full compressed stream so far. The most recent
/// `write` can be undone once with `revert`, and `consider_bypassing`
/// rewrites the stream as a verbatim copy when compression is a net loss.
pub struct Compressor {
    /// All input accepted since the last reset
    input: Vec<u8>,
    /// Header plus bit-packed phrases; aliases the compressed output
    out: BitWriter,
    dict: Dict,
    intended_level: Level,
    level: Level,
    /// Input length before the last write; `None` once reverted
    last_in_len: Option<usize>,
    /// Whether the most recent mutation switched the stream to bypass
    just_bypassed: bool,
    /// Set by a failed write; only `reset` clears it
    poisoned: bool,
}

impl Compressor {
    /// Create a compressor over `dict`, which is augmented with the
    /// reserved delimiter bytes before use. The decompressor must be given
    /// the same (pre-augmentation) dictionary.
    pub fn new(dict: &[u8]) -> Result<Self> {
        let dict = Dict::new(dict)?;
        let mut compressor = Self {
            input: Vec::new(),
            out: BitWriter::with_capacity(4096),
            dict,
            intended_level: Level::Compression,
            level: Level::Compression,
            last_in_len: Some(0),
            just_bypassed: false,
            poisoned: false,
        };
        compressor.reset();
        Ok(compressor)
    }

    /// One-shot compression: equivalent to `reset` + `write` + `bytes`.
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.reset();
        self.write(data)?;
        Ok(self.out.bytes().to_vec())
    }

    /// Append `payload` to the stream. Returns the number of bytes
    /// accepted. A `WriteFailed` error poisons the compressor until the
    /// next `reset`.
    pub fn write(&mut self, payload: &[u8]) -> Result<usize> {
        if self.poisoned {
            return Err(Error::WriteFailed);
        }
        let total = self.input.len() + payload.len();
        if total > MAX_INPUT_SIZE {
            return Err(Error::InputTooLarge { size: total });
        }

        self.out.start_session();
        self.just_bypassed = false;
        self.last_in_len = Some(self.input.len());
        self.input.extend_from_slice(payload);

        if self.level == Level::NoCompression {
            self.out.append_raw(payload);
            self.out.end_session();
            return Ok(payload.len());
        }

        let input_index = SuffixIndex::new(&self.input);
        let start = self.input.len() - payload.len();
        if let Err(e) = emit_phrases(&self.input, start, &input_index, &self.dict, &mut self.out)
        {
            self.poisoned = true;
            return Err(e);
        }
        self.out.end_session();
        Ok(payload.len())
    }

    /// Undo the most recent `write`. At most one revert is allowed between
    /// mutating operations.
    pub fn revert(&mut self) -> Result<()> {
        if self.poisoned {
            return Err(Error::WriteFailed);
        }
        let Some(last_in_len) = self.last_in_len else {
            return Err(Error::AlreadyReverted);
        };
        self.input.truncate(last_in_len);

        if self.just_bypassed {
            // The write being undone also triggered the bypass, and the
            // pre-bypass output was overwritten: recompress the surviving
            // input from scratch. Slow path.
            let input = std::mem::take(&mut self.input);
            self.reset();
            self.write(&input)?;
        } else {
            self.out.revert();
        }
        self.last_in_len = None;
        Ok(())
    }

    /// Switch to a verbatim copy of the input if compression has been a
    /// net loss including the header. Returns whether the switch happened;
    /// once bypassed, subsequent writes append raw bytes.
    pub fn consider_bypassing(&mut self) -> bool {
        if self.poisoned || self.out.len() <= self.input.len() + HEADER_SIZE {
            return false;
        }

        self.level = Level::NoCompression;
        self.just_bypassed = true;
        self.out.reset();
        self.out.append_raw(&Header::new(true).to_bytes());
        self.out.append_raw(&self.input);
        if let Some(last_in_len) = self.last_in_len {
            // what a revert of the last write would leave, at bypass rates
            self.out.set_checkpoint(HEADER_SIZE + last_in_len, 0);
        }
        true
    }

    /// Clear both buffers and re-emit the header. Universal recovery.
    pub fn reset(&mut self) {
        self.input.clear();
        self.level = self.intended_level;
        self.out.reset();
        self.out.append_raw(&Header::new(self.level == Level::NoCompression).to_bytes());
        // a revert with no write to undo must rewind to the header, not
        // past it
        self.out.set_checkpoint(self.out.len(), 0);
        self.last_in_len = Some(0);
        self.just_bypassed = false;
        self.poisoned = false;
    }

    /// Compressed size `data` would occupy, without touching the stream.
    ///
    /// Runs the chooser through a counting sink over a temporary index;
    /// only the shared dictionary index is read, so concurrent calls on
    /// the same compressor are safe.
    pub fn compressed_size_256k(&self, data: &[u8]) -> Result<usize> {
        if data.len() > MAX_ESTIMATE_INPUT_SIZE {
            return Err(Error::InputTooLarge { size: data.len() });
        }
        let index = SuffixIndex::new(data);
        let mut counter = BitCounter::new();
        emit_phrases(data, 0, &index, &self.dict, &mut counter)?;
        Ok(HEADER_SIZE + counter.byte_len())
    }

    /// The compressed stream: header plus all phrases emitted so far.
    pub fn bytes(&self) -> &[u8] {
        self.out.bytes()
    }

    /// Length of the compressed stream in bytes.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Number of input bytes accepted since the last reset.
    pub fn written(&self) -> usize {
        self.input.len()
    }
}

/// Three-slot ring over the most recent `best_backref` results, so the
/// lookahead peeks at `i + 1` and `i + 2` are not recomputed when the
/// chooser lands on those positions.
#[derive(Default)]
struct BestCache {
    slots: [Option<(usize, Option<Backref>)>; 3],
}

impl BestCache {
    fn get(&self, i: usize) -> Option<Option<Backref>> {
        match self.slots[i % 3] {
            Some((pos, best)) if pos == i => Some(best),
            _ => None,
        }
    }

    fn put(&mut self, i: usize, best: Option<Backref>) {
        self.slots[i % 3] = Some((i, best));
    }
}

fn savings_of(best: &Option<Backref>) -> i64 {
    best.as_ref().map_or(i64::MIN, Backref::savings)
}

/// Token chooser: encode `d[start..]` into `sink`.
///
/// Greedy with a one/two-byte literal lookahead, a run-length fast path,
/// and mandatory back-references for the reserved delimiter bytes.
fn emit_phrases<S: BitSink>(
    d: &[u8],
    start: usize,
    input_index: &SuffixIndex,
    dict: &Dict,
    sink: &mut S,
) -> Result<()> {
    let dict_len = dict.len();
    let mut cache = BestCache::default();

    let mut i = start;
    while i < d.len() {
        let run = run_length(d, i);
        if run >= RUN_LENGTH_THRESHOLD {
            emit_run(d, i, run, input_index, dict, sink)?;
            i += run;
            continue;
        }

        let best = best_backref(d, i, input_index, dict, &mut cache);

        if !can_encode_symbol(d[i]) {
            // the augmented dictionary guarantees at least a length-1 match
            let Some(b) = best else {
                return Err(Error::WriteFailed);
            };
            b.write_to(sink, i, dict_len);
            i += b.length;
            continue;
        }

        let best = match best {
            Some(b) if b.savings() >= 0 => b,
            _ => {
                sink.write_byte(d[i]);
                i += 1;
                continue;
            }
        };

        // Skipping one or two literals may expose a better match; the +1/+2
        // offsets charge the literals in the same bit-saving units.
        let here = best.savings();
        let at_next = savings_of(&best_backref(d, i + 1, input_index, dict, &mut cache));
        if at_next > here + 1 {
            sink.write_byte(d[i]);
            i += 1;
            continue;
        }
        if i + 2 < d.len() && can_encode_symbol(d[i + 1]) {
            let after_next = savings_of(&best_backref(d, i + 2, input_index, dict, &mut cache));
            if after_next > here + 2 {
                sink.write_byte(d[i]);
                sink.write_byte(d[i + 1]);
                i += 2;
                continue;
            }
        }

        best.write_to(sink, i, dict_len);
        i += best.length;
    }
    Ok(())
}

/// Length of the run of `d[i]` starting at `i`, capped at one token's span.
fn run_length(d: &[u8], i: usize) -> usize {
    let cap = (d.len() - i).min(MAX_BACKREF_LENGTH);
    d[i..i + cap].iter().take_while(|&&b| b == d[i]).count()
}

/// Fast path for a run of `run >= RUN_LENGTH_THRESHOLD` identical bytes.
fn emit_run<S: BitSink>(
    d: &[u8],
    i: usize,
    run: usize,
    input_index: &SuffixIndex,
    dict: &Dict,
    sink: &mut S,
) -> Result<()> {
    let dict_len = dict.len();

    if i > 0 && d[i - 1] == d[i] {
        // the run continues the previous byte: one token covers all of it
        let b = Backref { kind: BackrefKind::Short, length: run, ref_offset: dict_len + i - 1 };
        b.write_to(sink, i, dict_len);
        return Ok(());
    }

    // Seed the run with its first byte, then reference it for the rest.
    if can_encode_symbol(d[i]) {
        sink.write_byte(d[i]);
    } else {
        let Some(head) = find_reserved_ref(d, i, input_index, dict) else {
            return Err(Error::WriteFailed);
        };
        head.write_to(sink, i, dict_len);
    }

    let short = Backref { kind: BackrefKind::Short, length: run - 1, ref_offset: dict_len + i };
    let dynamic =
        Backref { kind: BackrefKind::Dynamic, length: run - 1, ref_offset: dict_len + i };
    let tail = if short.savings() > dynamic.savings() { short } else { dynamic };
    tail.write_to(sink, i + 1, dict_len);
    Ok(())
}

/// Length-1 reference for the reserved byte at `i`.
///
/// The precomputed dictionary position serves the common case; when the
/// write position has moved too far for that occurrence's address to fit
/// the 21-bit field, fall back to any occurrence that is still
/// addressable, in the dictionary or in the accumulated input. `None`
/// only when the address field cannot express any reference at all.
fn find_reserved_ref(
    d: &[u8],
    i: usize,
    input_index: &SuffixIndex,
    dict: &Dict,
) -> Option<Backref> {
    let dict_len = dict.len();
    let kind = BackrefKind::Dynamic;

    let tabled = dict.reserved_index(d[i]);
    if i + dict_len - tabled - 1 < kind.max_address() {
        return Some(Backref { kind, length: 1, ref_offset: tabled });
    }

    let query = &d[i..i + 1];
    let window_start = (i + dict_len).saturating_sub(kind.max_address());
    if let Some((q, _)) = dict.index().lookup_longest(query, 1, 1, window_start, dict_len) {
        return Some(Backref { kind, length: 1, ref_offset: q });
    }
    input_index
        .lookup_longest(query, 1, 1, i.saturating_sub(kind.max_address()), i)
        .map(|(p, _)| Backref { kind, length: 1, ref_offset: dict_len + p })
}

/// The highest-savings back-reference at `i`, or `None` if neither kind
/// has a viable match. Results are memoized in the ring cache.
fn best_backref(
    d: &[u8],
    i: usize,
    input_index: &SuffixIndex,
    dict: &Dict,
    cache: &mut BestCache,
) -> Option<Backref> {
    if i >= d.len() {
        return None;
    }
    if let Some(cached) = cache.get(i) {
        return cached;
    }

    let reserved = !can_encode_symbol(d[i]);
    let short = find_backref(d, i, BackrefKind::Short, reserved, input_index, dict);
    let dynamic = find_backref(d, i, BackrefKind::Dynamic, reserved, input_index, dict);

    let best = match (short, dynamic) {
        (Some(s), Some(dy)) if s.savings() > dy.savings() => Some(s),
        (short, dynamic) => dynamic.or(short),
    };
    cache.put(i, best);
    best
}

/// Longest usable match of the given kind at position `i`.
///
/// SHORT queries the accumulated input only; DYNAMIC also queries the
/// dictionary, clamped so the encoded address always fits its field. The
/// longer match wins, the input winning ties.
fn find_backref(
    d: &[u8],
    i: usize,
    kind: BackrefKind,
    reserved: bool,
    input_index: &SuffixIndex,
    dict: &Dict,
) -> Option<Backref> {
    let min_len = if reserved { 1 } else { kind.nb_bytes_backref() };
    if i + min_len > d.len() {
        return None;
    }
    let max_len = kind.max_length().min(d.len() - i);
    if min_len > max_len {
        return None;
    }
    let query = &d[i..i + max_len];
    let dict_len = dict.len();

    let input_match = input_index.lookup_longest(
        query,
        min_len,
        max_len,
        i.saturating_sub(kind.max_address()),
        i,
    );

    let dict_match = if kind == BackrefKind::Dynamic {
        let window_start = (i + dict_len).saturating_sub(kind.max_address());
        dict.index().lookup_longest(query, min_len, max_len, window_start, dict_len)
    } else {
        None
    };

    let (ref_offset, length) = match (input_match, dict_match) {
        (Some((p, l)), Some((_, m))) if l >= m => (dict_len + p, l),
        (_, Some((q, m))) => (q, m),
        (Some((p, l)), None) => (dict_len + p, l),
        (None, None) => return None,
    };
    Some(Backref { kind, length, ref_offset })
}
