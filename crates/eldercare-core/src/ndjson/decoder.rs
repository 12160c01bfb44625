//! Record extraction for raw and NDJSON bodies.
//!
//! Implements tolerant reader pattern: a line that is not valid JSON is
//! surfaced as raw text rather than dropped or treated as a stream failure.

use serde_json::Value;
use tracing::debug;

use super::types::{ChunkValue, StreamChunk};
use super::utf8::Utf8Decoder;

/// How a response body is split into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// One text chunk per incremental read.
    #[default]
    Raw,
    /// One chunk per newline-delimited record, JSON-decoded when possible.
    Ndjson,
}

impl DecodeMode {
    pub const fn from_ndjson_flag(ndjson: bool) -> Self {
        if ndjson { Self::Ndjson } else { Self::Raw }
    }
}

/// Decode a single NDJSON line.
///
/// Returns `None` for blank lines. Lines that fail to parse come back as
/// [`ChunkValue::Text`] holding the trimmed line.
pub fn decode_record(line: &str) -> Option<ChunkValue> {
    let line = line.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}');
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(line) {
        Ok(value) => Some(ChunkValue::Json(value)),
        Err(e) => {
            debug!(error = %e, len = line.len(), "NDJSON record is not JSON, passing through as text");
            Some(ChunkValue::Text(line.to_string()))
        }
    }
}

/// Accumulates not-yet-delimited text for one in-flight read.
#[derive(Debug, Default)]
pub struct DecodeBuffer {
    mode: DecodeMode,
    utf8: Utf8Decoder,
    pending: String,
}

impl DecodeBuffer {
    pub fn new(mode: DecodeMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub const fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Text received but not yet emitted.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Feed one incremental read and return the chunks it completes, in
    /// arrival order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamChunk> {
        let text = self.utf8.decode(bytes);
        self.pending.push_str(&text);
        match self.mode {
            DecodeMode::Raw => self.take_raw().into_iter().collect(),
            DecodeMode::Ndjson => self.take_records(),
        }
    }

    /// Flush whatever is left once the source is exhausted.
    pub fn finish(mut self) -> Vec<StreamChunk> {
        let tail = self.utf8.finish();
        self.pending.push_str(&tail);
        match self.mode {
            DecodeMode::Raw => self.take_raw().into_iter().collect(),
            DecodeMode::Ndjson => {
                let last = std::mem::take(&mut self.pending);
                decode_record(&last)
                    .map(StreamChunk::Data)
                    .into_iter()
                    .collect()
            }
        }
    }

    fn take_raw(&mut self) -> Option<StreamChunk> {
        if self.pending.is_empty() {
            return None;
        }
        Some(StreamChunk::text(std::mem::take(&mut self.pending)))
    }

    fn take_records(&mut self) -> Vec<StreamChunk> {
        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };
        let chunks = self.pending[..last_newline]
            .split('\n')
            .filter_map(decode_record)
            .map(StreamChunk::Data)
            .collect();
        // Keep only the undelimited tail.
        self.pending = self.pending[last_newline + 1..].to_string();
        chunks
    }
}

/// Decode a body that was read in full.
///
/// Raw mode always yields exactly one text chunk, even for an empty body.
/// NDJSON follows the same per-line rules as the incremental path.
pub fn decode_whole(body: &[u8], mode: DecodeMode) -> Vec<StreamChunk> {
    match mode {
        DecodeMode::Raw => {
            let mut utf8 = Utf8Decoder::new();
            let mut text = utf8.decode(body);
            text.push_str(&utf8.finish());
            vec![StreamChunk::text(text)]
        }
        DecodeMode::Ndjson => {
            let mut buffer = DecodeBuffer::new(mode);
            let mut chunks = buffer.push(body);
            chunks.extend(buffer.finish());
            chunks
        }
    }
}
