//! Request description and payload serialization.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Options for a single streamed request.
///
/// Built by value; a config is never mutated once a request is in flight.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    method: Option<Method>,
    headers: HeaderMap,
    timeout: Option<Duration>,
    ndjson: bool,
    cancel: Option<CancellationToken>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the method. Defaults to `POST` with a payload, `GET` without.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Add a header. Names are case-insensitive.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Replace all headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Abort the request if it has not completed within `timeout`.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Millisecond form of [`timeout`](Self::timeout). Zero means no deadline.
    #[must_use]
    pub const fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = if ms > 0 {
            Some(Duration::from_millis(ms))
        } else {
            None
        };
        self
    }

    /// Decode the body as newline-delimited JSON instead of raw text.
    #[must_use]
    pub const fn ndjson(mut self, ndjson: bool) -> Self {
        self.ndjson = ndjson;
        self
    }

    /// Abort the request when `token` is cancelled. Behaves like an elapsed
    /// deadline.
    #[must_use]
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub const fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
    }

    pub const fn is_ndjson(&self) -> bool {
        self.ndjson
    }

    pub const fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    pub const fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// The method that will be sent for a request with or without a payload.
    pub fn resolve_method(&self, has_payload: bool) -> Method {
        self.method.clone().unwrap_or(if has_payload {
            Method::POST
        } else {
            Method::GET
        })
    }

    /// Build the wire request for `url`.
    ///
    /// A JSON content type is added when a payload is present and the caller
    /// did not set one. Multipart forms are left alone so the transport can
    /// supply the boundary.
    pub fn build_request(&self, url: &str, payload: Option<Payload>) -> Result<OutboundRequest> {
        let method = self.resolve_method(payload.is_some());
        let mut headers = self.headers.clone();

        let body = match payload {
            None => None,
            Some(payload) => {
                if !payload.is_form() && !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                Some(payload.into_body()?)
            }
        };

        Ok(OutboundRequest {
            method,
            url: url.to_string(),
            headers,
            body,
        })
    }
}

/// Request payload as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured value, serialized to JSON text before sending.
    Json(Value),
    /// Sent verbatim.
    Text(String),
    /// Multipart form, sent verbatim.
    Form(FormData),
}

impl Payload {
    /// Serialize any value into a structured payload.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    const fn is_form(&self) -> bool {
        matches!(self, Self::Form(_))
    }

    fn into_body(self) -> Result<RequestBody> {
        Ok(match self {
            Self::Json(value) => RequestBody::Text(serde_json::to_string(&value)?),
            Self::Text(text) => RequestBody::Text(text),
            Self::Form(form) => RequestBody::Form(form),
        })
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<FormData> for Payload {
    fn from(form: FormData) -> Self {
        Self::Form(form)
    }
}

/// Multipart form payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    pub parts: Vec<FormPart>,
}

/// One named field of a [`FormData`].
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    Bytes {
        data: Bytes,
        file_name: Option<String>,
        mime: Option<String>,
    },
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: FormValue::Text(value.into()),
        });
        self
    }

    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        data: impl Into<Bytes>,
        file_name: impl Into<String>,
        mime: Option<&str>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: FormValue::Bytes {
                data: data.into(),
                file_name: Some(file_name.into()),
                mime: mime.map(String::from),
            },
        });
        self
    }

    /// Convert into a reqwest multipart form.
    pub fn into_multipart(self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part.value {
                FormValue::Text(text) => form.text(part.name, text),
                FormValue::Bytes {
                    data,
                    file_name,
                    mime,
                } => {
                    let mut p = reqwest::multipart::Part::bytes(data.to_vec());
                    if let Some(file_name) = file_name {
                        p = p.file_name(file_name);
                    }
                    if let Some(mime) = mime {
                        p = p.mime_str(&mime)?;
                    }
                    form.part(part.name, p)
                }
            };
        }
        Ok(form)
    }
}

/// A fully resolved request, ready for a [`Transport`](super::Transport).
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

/// Serialized request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Text(String),
    Form(FormData),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_defaults_to_get_without_payload() {
        let req = RequestConfig::new().build_request("http://x/", None).unwrap();
        assert_eq!(req.method, Method::GET);
        assert!(req.body.is_none());
        assert!(!req.headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn method_defaults_to_post_with_payload() {
        let req = RequestConfig::new()
            .build_request("http://x/", Some("hi".into()))
            .unwrap();
        assert_eq!(req.method, Method::POST);
    }

    #[test]
    fn explicit_method_wins() {
        let req = RequestConfig::new()
            .method(Method::PUT)
            .build_request("http://x/", None)
            .unwrap();
        assert_eq!(req.method, Method::PUT);
    }

    #[test]
    fn structured_payload_is_serialized_with_json_content_type() {
        let req = RequestConfig::new()
            .build_request("http://x/", Some(json!({"q": "hello"}).into()))
            .unwrap();
        assert_eq!(req.body, Some(RequestBody::Text(r#"{"q":"hello"}"#.into())));
        assert_eq!(req.headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn text_payload_is_sent_verbatim() {
        let req = RequestConfig::new()
            .build_request("http://x/", Some("{not json".into()))
            .unwrap();
        assert_eq!(req.body, Some(RequestBody::Text("{not json".into())));
    }

    #[test]
    fn caller_content_type_is_kept_case_insensitively() {
        let req = RequestConfig::new()
            .header("content-type", "text/plain")
            .unwrap()
            .build_request("http://x/", Some("hi".into()))
            .unwrap();
        assert_eq!(req.headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(req.headers[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn form_payload_gets_no_json_content_type() {
        let form = FormData::new().text("lang", "en").file(
            "audio",
            vec![0u8, 1, 2],
            "clip.wav",
            Some("audio/wav"),
        );
        let req = RequestConfig::new()
            .build_request("http://x/", Some(form.clone().into()))
            .unwrap();
        assert!(!req.headers.contains_key(CONTENT_TYPE));
        assert_eq!(req.body, Some(RequestBody::Form(form.clone())));
        assert!(form.into_multipart().is_ok());
    }

    #[test]
    fn invalid_header_is_rejected() {
        assert!(RequestConfig::new().header("bad header", "x").is_err());
        assert!(RequestConfig::new().header("x-ok", "bad\nvalue").is_err());
    }

    #[test]
    fn zero_timeout_means_unbounded() {
        assert_eq!(RequestConfig::new().timeout_ms(0).timeout_duration(), None);
        assert_eq!(
            RequestConfig::new().timeout_ms(250).timeout_duration(),
            Some(Duration::from_millis(250))
        );
    }
}
