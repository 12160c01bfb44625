//! Chunk decoding for streamed HTTP bodies.
//!
//! Turns the text of a response body into [`StreamChunk`]s, either one chunk
//! per read (raw mode) or one chunk per newline-delimited record (NDJSON mode).
//! Records that are not valid JSON are passed through as raw text.

mod decoder;
mod types;
mod utf8;

pub use decoder::{DecodeBuffer, DecodeMode, decode_record, decode_whole};
pub use types::*;
pub use utf8::Utf8Decoder;
