//! Incremental UTF-8 decoding.
//!
//! Mirrors the behaviour of a streaming text decoder: a multi-byte sequence
//! split across reads is held back until it completes, malformed bytes become
//! U+FFFD, and a byte-order mark at the very start of the stream is dropped.

use std::borrow::Cow;

const REPLACEMENT: char = '\u{FFFD}';
const BOM: char = '\u{FEFF}';

/// Stateful decoder for one byte stream.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Leading bytes of an incomplete sequence (never more than 3).
    pending: Vec<u8>,
    seen_text: bool,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next read. May return an empty string when the read only
    /// contained the start of a multi-byte character.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let data: Cow<'_, [u8]> = if self.pending.is_empty() {
            Cow::Borrowed(bytes)
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(bytes);
            Cow::Owned(joined)
        };

        let mut out = String::with_capacity(data.len());
        let mut rest: &[u8] = &data;
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    out.push_str(s);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    if let Some(bad) = e.error_len() {
                        out.push(REPLACEMENT);
                        rest = &after[bad..];
                    } else {
                        self.pending = after.to_vec();
                        break;
                    }
                }
            }
        }
        self.strip_bom(out)
    }

    /// Flush at end of input. A dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        self.strip_bom(REPLACEMENT.to_string())
    }

    fn strip_bom(&mut self, text: String) -> String {
        if self.seen_text || text.is_empty() {
            return text;
        }
        self.seen_text = true;
        match text.strip_prefix(BOM) {
            Some(stripped) => stripped.to_string(),
            None => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"hello"), "hello");
        assert_eq!(d.finish(), "");
    }

    #[test]
    fn split_multibyte_character_is_held_back() {
        let bytes = "é€".as_bytes();
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(&bytes[..1]), "");
        assert_eq!(d.decode(&bytes[1..3]), "é");
        assert_eq!(d.decode(&bytes[3..]), "€");
        assert_eq!(d.finish(), "");
    }

    #[test]
    fn invalid_byte_becomes_replacement() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"a\xFFb"), "a\u{FFFD}b");
    }

    #[test]
    fn dangling_sequence_flushes_as_replacement() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(&"€".as_bytes()[..2]), "");
        assert_eq!(d.finish(), "\u{FFFD}");
    }

    #[test]
    fn leading_bom_is_dropped_once() {
        let mut d = Utf8Decoder::new();
        let bom = "\u{FEFF}".as_bytes();
        assert_eq!(d.decode(&bom[..2]), "");
        assert_eq!(d.decode(&[bom[2], b'x']), "x");
        assert_eq!(d.decode("\u{FEFF}y".as_bytes()), "\u{FEFF}y");
    }
}
