use crate::backref::{BackrefKind, SYM_DYNAMIC, SYM_SHORT};
use crate::bits::BitReader;
use crate::dict::augment_dict;
use crate::error::{Error, Result};
use crate::header::{Header, HEADER_SIZE};
use crate::MAX_INPUT_SIZE;

/// Decompress a whole buffer produced by the compressor.
///
/// `dict` must be byte-identical to the one the compressor was built with;
/// it is augmented here the same way. The decoder is single-pass with a
/// constant structure: one byte of lookahead dispatches between literals
/// and the two token kinds. It is not hardened against arbitrary
/// corruption beyond the explicit bounds checks; trailing zero padding in
/// the final byte is accepted silently.
pub fn decompress(data: &[u8], dict: &[u8]) -> Result<Vec<u8>> {
    let header = Header::parse(data)?;
    let payload = &data[HEADER_SIZE..];
    if header.bypassed {
        return Ok(payload.to_vec());
    }

    let dict = augment_dict(dict);
    let mut reader = BitReader::new(payload);
    let mut out = Vec::with_capacity(payload.len().saturating_mul(7).min(MAX_INPUT_SIZE));

    while let Some(symbol) = reader.try_read_byte() {
        match symbol {
            SYM_SHORT => {
                let (length, distance) = BackrefKind::Short.read_fields(&mut reader)?;
                if distance > out.len() {
                    return Err(Error::InvalidBackref {
                        distance,
                        length,
                        available: out.len(),
                    });
                }
                copy_within(&mut out, distance, length);
            }
            SYM_DYNAMIC => {
                let (length, distance) = BackrefKind::Dynamic.read_fields(&mut reader)?;
                if distance <= out.len() {
                    copy_within(&mut out, distance, length);
                } else {
                    // the reference starts inside the dictionary
                    let overshoot = distance - out.len();
                    if overshoot > dict.len() || length > overshoot {
                        return Err(Error::InvalidBackref {
                            distance,
                            length,
                            available: out.len() + dict.len(),
                        });
                    }
                    let dict_start = dict.len() - overshoot;
                    out.extend_from_slice(&dict[dict_start..dict_start + length]);
                }
            }
            literal => out.push(literal),
        }
    }

    Ok(out)
}

/// Copy `length` bytes starting `distance` back, one by one so that
/// overlapping run-length references replicate naturally.
fn copy_within(out: &mut Vec<u8>, distance: usize, length: usize) {
    for _ in 0..length {
        let b = out[out.len() - distance];
        out.push(b);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhraseKind {
    Literal,
    Short,
    Dynamic,
}

impl PhraseKind {
    fn label(self) -> &'static str {
        match self {
            PhraseKind::Literal => "literal",
            PhraseKind::Short => "short",
            PhraseKind::Dynamic => "dynamic",
        }
    }
}

/// One decoded phrase of a compressed stream, for inspection tooling.
///
/// Positions are absolute within the logical buffer `dict ++ output`, so
/// dictionary-reaching references report where in the dictionary they
/// landed. Consecutive literal bytes are grouped into a single phrase.
#[derive(Clone, Debug)]
pub struct Phrase {
    pub kind: PhraseKind,
    pub length: usize,
    /// Start of the referenced span (equals `start_decompressed` for literals)
    pub reference_address: usize,
    /// Start of the span this phrase produced
    pub start_decompressed: usize,
    /// Bit offset of the phrase within the phrase stream, after the header
    pub start_compressed_bits: usize,
    pub content: Vec<u8>,
}

/// Decode `data` into its phrase list instead of plain bytes.
///
/// Diagnostic counterpart of `decompress`: same dispatch, but every token
/// is reported with its source and destination. The decode runs over the
/// dictionary-prefixed buffer, so it accepts a superset of what the strict
/// decoder does.
pub fn stream_info(data: &[u8], dict: &[u8]) -> Result<Vec<Phrase>> {
    let header = Header::parse(data)?;
    let payload = &data[HEADER_SIZE..];
    if header.bypassed {
        return Ok(vec![Phrase {
            kind: PhraseKind::Literal,
            length: payload.len(),
            reference_address: 0,
            start_decompressed: 0,
            start_compressed_bits: 0,
            content: payload.to_vec(),
        }]);
    }

    // decode into the logical buffer with the dictionary prepended
    let mut out = augment_dict(dict);
    let mut reader = BitReader::new(payload);
    let mut phrases = Vec::new();
    let mut literal_start: Option<(usize, usize)> = None;

    fn flush_literals(
        phrases: &mut Vec<Phrase>,
        out: &[u8],
        literal_start: &mut Option<(usize, usize)>,
    ) {
        if let Some((start, bit_start)) = literal_start.take() {
            phrases.push(Phrase {
                kind: PhraseKind::Literal,
                length: out.len() - start,
                reference_address: start,
                start_decompressed: start,
                start_compressed_bits: bit_start,
                content: out[start..].to_vec(),
            });
        }
    }

    loop {
        let token_bits = reader.bit_position();
        let Some(symbol) = reader.try_read_byte() else {
            break;
        };

        let (kind, backref_kind) = match symbol {
            SYM_SHORT => (PhraseKind::Short, BackrefKind::Short),
            SYM_DYNAMIC => (PhraseKind::Dynamic, BackrefKind::Dynamic),
            literal => {
                if literal_start.is_none() {
                    literal_start = Some((out.len(), token_bits));
                }
                out.push(literal);
                continue;
            }
        };
        flush_literals(&mut phrases, &out, &mut literal_start);

        let (length, distance) = backref_kind.read_fields(&mut reader)?;
        if distance > out.len() {
            return Err(Error::InvalidBackref { distance, length, available: out.len() });
        }
        let reference_address = out.len() - distance;
        copy_within(&mut out, distance, length);
        phrases.push(Phrase {
            kind,
            length,
            reference_address,
            start_decompressed: out.len() - length,
            start_compressed_bits: token_bits,
            content: out[out.len() - length..].to_vec(),
        });
    }
    flush_literals(&mut phrases, &out, &mut literal_start);

    Ok(phrases)
}

/// Render a phrase list as CSV, one row per phrase.
pub fn phrases_to_csv(phrases: &[Phrase]) -> String {
    use std::fmt::Write;

    let mut csv = String::from(
        "type,length,start_decompressed (bytes),start_compressed (bits),reference_address,content (hex)\n",
    );
    for p in phrases {
        let hex: String = p.content.iter().map(|b| format!("{:02x}", b)).collect();
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{}",
            p.kind.label(),
            p.length,
            p.start_decompressed,
            p.start_compressed_bits,
            p.reference_address,
            hex
        );
    }
    csv
}
