//! Streamed HTTP responses.
//!
//! [`ChunkedResponseReader`] sends one request per call and exposes the
//! response body as a lazy, ordered sequence of [`StreamChunk`]s that always
//! ends with [`StreamChunk::End`] unless the transport fails.
//!
//! [`StreamChunk`]: crate::ndjson::StreamChunk
//! [`StreamChunk::End`]: crate::ndjson::StreamChunk::End

mod deadline;
mod reader;
mod request;
mod transport;

pub use reader::{ChunkStream, ChunkedResponseReader, ValueStream, collect_stream};
pub use request::{FormData, FormPart, FormValue, OutboundRequest, Payload, RequestBody, RequestConfig};
pub use transport::{
    BodyFuture, ByteStream, HttpTransport, ResponseBody, Transport, TransportResponse,
};
