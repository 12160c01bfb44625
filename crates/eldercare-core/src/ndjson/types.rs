//! Chunk types produced by the streaming reader.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A single element of a streamed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StreamChunk {
    /// A decoded record or raw text fragment.
    Data(ChunkValue),
    /// Terminal marker. Emitted once, always last.
    End,
}

impl StreamChunk {
    /// Build a data chunk holding raw text.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Data(ChunkValue::Text(s.into()))
    }

    /// Build a data chunk holding a decoded JSON value.
    pub const fn json(v: Value) -> Self {
        Self::Data(ChunkValue::Json(v))
    }

    pub const fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// The payload of a data chunk, `None` for the end marker.
    pub fn into_value(self) -> Option<ChunkValue> {
        match self {
            Self::Data(v) => Some(v),
            Self::End => None,
        }
    }
}

/// Payload of a [`StreamChunk::Data`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChunkValue {
    /// A record that parsed as JSON.
    Json(Value),
    /// Raw text: a raw-mode fragment or an NDJSON line that failed to parse.
    Text(String),
}

impl ChunkValue {
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(_) => None,
        }
    }

    /// Convert a decoded record into a caller type.
    ///
    /// Raw text is offered to the deserializer as a JSON string, so a target
    /// type of `String` accepts both variants.
    pub fn deserialize<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        match self {
            Self::Json(v) => serde_json::from_value(v),
            Self::Text(s) => serde_json::from_value(Value::String(s)),
        }
    }
}
