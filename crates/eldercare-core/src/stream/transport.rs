//! Transport seam between the reader and the network.
//!
//! A transport answers with either an incremental byte stream or a future for
//! the whole body. The reader picks its decoding path from that answer, once
//! per request.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use super::request::{OutboundRequest, RequestBody};
use crate::error::{Error, Result};

/// Body bytes delivered as they arrive.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Body bytes delivered once, in full.
pub type BodyFuture = Pin<Box<dyn Future<Output = Result<Bytes>> + Send>>;

/// What the transport can offer for reading a response body.
pub enum ResponseBody {
    Incremental(ByteStream),
    Buffered(BodyFuture),
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incremental(_) => f.write_str("ResponseBody::Incremental"),
            Self::Buffered(_) => f.write_str("ResponseBody::Buffered"),
        }
    }
}

/// Response headers have arrived; the body has not been read yet.
#[derive(Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
}

/// Sends an [`OutboundRequest`] and hands back the unread response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    buffered: bool,
}

impl HttpTransport {
    /// Create a transport with an optional `User-Agent`.
    pub fn new(user_agent: Option<&str>) -> Result<Self> {
        // Ensure a TLS crypto provider is installed (reqwest uses rustls-no-provider).
        // The `Err` case just means it was already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut builder = reqwest::Client::builder();
        if let Some(ua) = user_agent {
            builder = builder.user_agent(ua.to_string());
        }
        Ok(Self {
            http: builder.build()?,
            buffered: false,
        })
    }

    /// Wrap an existing client.
    pub const fn from_client(http: reqwest::Client) -> Self {
        Self {
            http,
            buffered: false,
        }
    }

    /// Read bodies in full instead of incrementally.
    #[must_use]
    pub const fn buffered(mut self, buffered: bool) -> Self {
        self.buffered = buffered;
        self
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse> {
        let mut builder = self
            .http
            .request(request.method, request.url.as_str())
            .headers(request.headers);
        builder = match request.body {
            Some(RequestBody::Text(text)) => builder.body(text),
            Some(RequestBody::Form(form)) => builder.multipart(form.into_multipart()?),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        debug!(%status, buffered = self.buffered, "Response headers received");

        let body = if self.buffered {
            ResponseBody::Buffered(Box::pin(async move { Ok(response.bytes().await?) }))
        } else {
            ResponseBody::Incremental(Box::pin(response.bytes_stream().map(|r| r.map_err(Error::from))))
        };
        Ok(TransportResponse { status, body })
    }
}
