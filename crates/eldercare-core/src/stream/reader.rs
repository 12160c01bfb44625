//! The chunked response reader.

use std::pin::Pin;
use std::sync::Arc;

use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use super::deadline::Deadline;
use super::request::{Payload, RequestConfig};
use super::transport::{HttpTransport, ResponseBody, Transport};
use crate::error::Result;
use crate::ndjson::{ChunkValue, DecodeBuffer, DecodeMode, StreamChunk, decode_whole};

/// Lazy sequence of chunks for one request.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// Lazy sequence of data payloads, without the end marker.
pub type ValueStream = Pin<Box<dyn Stream<Item = Result<ChunkValue>> + Send>>;

/// Issues requests and decodes their bodies into [`StreamChunk`]s.
///
/// Cloning is cheap; every call to [`stream_request`](Self::stream_request)
/// is independent of every other.
#[derive(Clone)]
pub struct ChunkedResponseReader {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ChunkedResponseReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedResponseReader").finish_non_exhaustive()
    }
}

impl ChunkedResponseReader {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Reader over a default reqwest transport.
    pub fn http() -> Result<Self> {
        Ok(Self::new(HttpTransport::new(None)?))
    }

    /// Send a request and stream the decoded response body.
    ///
    /// Nothing is sent until the stream is first polled. The sequence ends with
    /// exactly one [`StreamChunk::End`] on completion and when the deadline or
    /// cancellation token fires. A transport failure is yielded as `Err` and
    /// ends the sequence without an end marker.
    pub fn stream_request(
        &self,
        url: &str,
        payload: Option<Payload>,
        config: RequestConfig,
    ) -> ChunkStream {
        let transport = Arc::clone(&self.transport);
        let url = url.to_string();

        Box::pin(async_stream::stream! {
            let request = match config.build_request(&url, payload) {
                Ok(r) => r,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let mode = DecodeMode::from_ndjson_flag(config.is_ndjson());
            let mut deadline = Deadline::new(
                config.timeout_duration(),
                config.cancellation().cloned(),
            );

            debug!(
                method = %request.method,
                url = %request.url,
                ?mode,
                timeout_ms = config.timeout_duration().map(|d| d.as_millis()),
                "Sending streamed request"
            );

            let response = match deadline.run(transport.send(request)).await {
                Some(Ok(response)) => response,
                Some(Err(e)) => {
                    warn!(url = %url, error = %e, "Streamed request failed");
                    yield Err(e);
                    return;
                }
                None => {
                    debug!(url = %url, "Request cancelled before response");
                    yield Ok(StreamChunk::End);
                    return;
                }
            };
            if !response.status.is_success() {
                debug!(url = %url, status = %response.status, "Non-success status, decoding body anyway");
            }

            match response.body {
                ResponseBody::Incremental(mut bytes) => {
                    let mut buffer = DecodeBuffer::new(mode);
                    loop {
                        match deadline.run(bytes.next()).await {
                            Some(Some(Ok(read))) => {
                                for chunk in buffer.push(&read) {
                                    yield Ok(chunk);
                                }
                            }
                            Some(Some(Err(e))) => {
                                warn!(url = %url, error = %e, "Body read failed");
                                yield Err(e);
                                return;
                            }
                            Some(None) => break,
                            None => {
                                debug!(url = %url, pending = buffer.pending().len(), "Stream cancelled mid-body");
                                yield Ok(StreamChunk::End);
                                return;
                            }
                        }
                    }
                    for chunk in buffer.finish() {
                        yield Ok(chunk);
                    }
                }
                ResponseBody::Buffered(body) => {
                    match deadline.run(body).await {
                        Some(Ok(body)) => {
                            for chunk in decode_whole(&body, mode) {
                                yield Ok(chunk);
                            }
                        }
                        Some(Err(e)) => {
                            warn!(url = %url, error = %e, "Body read failed");
                            yield Err(e);
                            return;
                        }
                        None => {
                            debug!(url = %url, "Stream cancelled before body completed");
                            yield Ok(StreamChunk::End);
                            return;
                        }
                    }
                }
            }

            debug!(url = %url, "Stream complete");
            yield Ok(StreamChunk::End);
        })
    }

    /// NDJSON projection of [`stream_request`](Self::stream_request): yields
    /// only the decoded (or raw) records.
    pub fn stream_json(
        &self,
        url: &str,
        payload: Option<Payload>,
        config: RequestConfig,
    ) -> ValueStream {
        let chunks = self.stream_request(url, payload, config.ndjson(true));
        Box::pin(chunks.filter_map(|item| match item {
            Ok(StreamChunk::Data(value)) => Some(Ok(value)),
            Ok(StreamChunk::End) => None,
            Err(e) => Some(Err(e)),
        }))
    }
}

/// Drain a stream into a `Vec`, stopping at the first error.
pub async fn collect_stream<S, T>(stream: S) -> Result<Vec<T>>
where
    S: Stream<Item = Result<T>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut out = Vec::new();
    while let Some(item) = stream.next().await {
        out.push(item?);
    }
    Ok(out)
}
