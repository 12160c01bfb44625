//! `Eldercare` Core Library
//!
//! Shared functionality for `Eldercare` components:
//! - Chunked / NDJSON response streaming with deadline cancellation
//! - Configuration resolution and hierarchy
//! - Common error types
//! - Tracing initialisation

pub mod config;
pub mod error;
pub mod ndjson;
pub mod stream;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
pub use ndjson::{ChunkValue, StreamChunk};
pub use stream::{ChunkedResponseReader, Payload, RequestConfig, collect_stream};
