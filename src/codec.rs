//! Per-encoding byte-to-codepoint decoding.
//!
//! A [`Codec`] is the encoding-agnostic seam the rest of the crate is built
//! on: [`crate::text_decoder`] and [`crate::parser`] are both generic over
//! `C: Codec` and call only the four operations defined here. Three codecs
//! are provided — [`Utf8Codec`], [`Utf16BeCodec`], [`Utf16LeCodec`] — and the
//! parser is monomorphized per codec rather than boxing a trait object, so
//! there is no virtual dispatch on the decode hot path.

use crate::chars::is_valid_codepoint;

/// Result of decoding one codepoint from the front of a byte slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A codepoint was decoded, consuming `len` bytes.
    Ok { codepoint: u32, len: u8 },
    /// The slice is a valid but truncated prefix of an encoded codepoint;
    /// more bytes are needed before this call can be retried.
    Incomplete,
    /// The bytes at the front of the slice cannot form a valid codepoint in
    /// this encoding (malformed lead/continuation bytes, an overlong
    /// encoding, an unpaired surrogate, or a decoded value outside the legal
    /// codepoint range).
    Invalid,
}

/// A source-encoding codec: the byte-level decoder/encoder pair feeding the
/// parser's codepoint-at-a-time reader.
///
/// Implementations carry no state (there is one stateless instance per
/// encoding) and are selected as a generic parameter, never behind `dyn`.
pub trait Codec {
    /// Decode exactly one codepoint from the front of `bytes`.
    fn parse_next(bytes: &[u8]) -> ParseOutcome;

    /// Whether `name` (the already-decoded value of an `encoding="..."`
    /// attribute) is a name this codec accepts for itself.
    ///
    /// Matching is case-sensitive, per spec.
    fn is_supported_encoding(name: &[u8]) -> bool;

    /// Whether `byte` is plain ASCII. Meaningful only for the UTF-8 codec,
    /// where it is used to shortcut scalar classification; the default
    /// (byte-value) definition is harmless for the UTF-16 codecs, which
    /// never call it on the hot path.
    #[inline]
    fn is_ascii(byte: u8) -> bool {
        byte < 0x80
    }

    /// Canonical UTF-8 encoding of `cp`, appended to `out`.
    ///
    /// This always produces UTF-8 regardless of the codec's own source
    /// encoding: by the time a codepoint reaches this call it has already
    /// been decoded into a Unicode scalar value, so there is nothing
    /// encoding-specific left to do. `Err` is returned only if `cp` is not a
    /// legal Unicode scalar value (callers are expected to have already
    /// checked [`crate::chars::is_xml_char`] before encoding).
    #[inline]
    fn encode_char(cp: u32, out: &mut Vec<u8>) -> Result<(), ()> {
        match char::from_u32(cp) {
            Some(c) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                Ok(())
            }
            None => Err(()),
        }
    }

    /// Whether `Name` ranges decoded with this codec can be borrowed
    /// directly from the input buffer instead of being copied into the name
    /// scratch area. True only for [`Utf8Codec`], since there the source
    /// bytes already *are* the normalized UTF-8 form.
    #[inline]
    fn borrows_names() -> bool {
        false
    }

    /// The byte order mark this codec recognizes and consumes at the start
    /// of a document, if any.
    fn bom() -> Option<&'static [u8]>;
}

/// UTF-8 source codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl Codec for Utf8Codec {
    fn parse_next(bytes: &[u8]) -> ParseOutcome {
        let b0 = match bytes.first() {
            Some(&b) => b,
            None => return ParseOutcome::Incomplete,
        };
        if b0 < 0x80 {
            return ParseOutcome::Ok {
                codepoint: b0 as u32,
                len: 1,
            };
        }
        let (len, lead_bits, min) = if b0 & 0xE0 == 0xC0 {
            (2usize, (b0 & 0x1F) as u32, 0x80u32)
        } else if b0 & 0xF0 == 0xE0 {
            (3, (b0 & 0x0F) as u32, 0x800)
        } else if b0 & 0xF8 == 0xF0 {
            (4, (b0 & 0x07) as u32, 0x1_0000)
        } else {
            // Lone continuation byte or an invalid lead byte (0x80-0xBF,
            // 0xF8-0xFF).
            return ParseOutcome::Invalid;
        };

        let available = bytes.len().min(len);
        let mut cp = lead_bits;
        for &b in &bytes[1..available] {
            if b & 0xC0 != 0x80 {
                return ParseOutcome::Invalid;
            }
            cp = (cp << 6) | (b & 0x3F) as u32;
        }
        if available < len {
            return ParseOutcome::Incomplete;
        }
        if cp < min || !is_valid_codepoint(cp) {
            return ParseOutcome::Invalid;
        }
        ParseOutcome::Ok {
            codepoint: cp,
            len: len as u8,
        }
    }

    #[inline]
    fn is_supported_encoding(name: &[u8]) -> bool {
        name == b"UTF-8"
    }

    #[inline]
    fn borrows_names() -> bool {
        true
    }

    #[inline]
    fn bom() -> Option<&'static [u8]> {
        Some(&[0xEF, 0xBB, 0xBF])
    }
}

/// Shared UTF-16 decode logic, parameterized on byte order. Both
/// [`Utf16BeCodec`] and [`Utf16LeCodec`] are thin `Codec` wrappers around
/// this so the surrogate-pairing logic is written once.
#[inline]
fn parse_next_utf16(bytes: &[u8], big_endian: bool) -> ParseOutcome {
    if bytes.len() < 2 {
        return ParseOutcome::Incomplete;
    }
    let unit = |b: &[u8]| -> u16 {
        if big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        }
    };
    let u0 = unit(&bytes[0..2]);

    if (0xD800..=0xDBFF).contains(&u0) {
        // High surrogate: must be followed by a low surrogate.
        if bytes.len() < 4 {
            return ParseOutcome::Incomplete;
        }
        let u1 = unit(&bytes[2..4]);
        if !(0xDC00..=0xDFFF).contains(&u1) {
            return ParseOutcome::Invalid;
        }
        let cp = 0x1_0000 + (((u0 as u32 - 0xD800) << 10) | (u1 as u32 - 0xDC00));
        return ParseOutcome::Ok { codepoint: cp, len: 4 };
    }
    if (0xDC00..=0xDFFF).contains(&u0) {
        // Unpaired low surrogate.
        return ParseOutcome::Invalid;
    }
    if u0 == 0xFFFE || u0 == 0xFFFF {
        return ParseOutcome::Invalid;
    }
    ParseOutcome::Ok {
        codepoint: u0 as u32,
        len: 2,
    }
}

/// UTF-16, big-endian source codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf16BeCodec;

impl Codec for Utf16BeCodec {
    #[inline]
    fn parse_next(bytes: &[u8]) -> ParseOutcome {
        parse_next_utf16(bytes, true)
    }

    #[inline]
    fn is_supported_encoding(name: &[u8]) -> bool {
        name == b"UTF-16" || name == b"UTF-16BE"
    }

    #[inline]
    fn bom() -> Option<&'static [u8]> {
        Some(&[0xFE, 0xFF])
    }
}

/// UTF-16, little-endian source codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf16LeCodec;

impl Codec for Utf16LeCodec {
    #[inline]
    fn parse_next(bytes: &[u8]) -> ParseOutcome {
        parse_next_utf16(bytes, false)
    }

    #[inline]
    fn is_supported_encoding(name: &[u8]) -> bool {
        name == b"UTF-16" || name == b"UTF-16LE"
    }

    #[inline]
    fn bom() -> Option<&'static [u8]> {
        Some(&[0xFF, 0xFE])
    }
}
