//! Stream subcommands: stream, collect.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};

use anyhow::Context;
use reqwest::Method;
use serde_json::Value;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use eldercare_core::config::{Config, StreamDefaults};
use eldercare_core::stream::{ChunkStream, HttpTransport};
use eldercare_core::{ChunkValue, ChunkedResponseReader, Payload, RequestConfig, StreamChunk, collect_stream};

/// Request options shared by `stream` and `collect`.
#[derive(clap::Args, Debug, Clone)]
pub struct StreamArgs {
    /// URL to request.
    pub url: String,

    /// Decode the body as newline-delimited JSON.
    #[arg(long)]
    pub ndjson: bool,

    /// Abort after this many milliseconds. 0 disables the deadline.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// HTTP method. Defaults to POST with --data, GET without.
    #[arg(short = 'X', long)]
    pub method: Option<String>,

    /// Extra header as "Name: value". Repeatable.
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Request body.
    #[arg(long)]
    pub data: Option<String>,

    /// Parse --data as JSON instead of sending it as text.
    #[arg(long, requires = "data")]
    pub json: bool,

    /// Read the whole body before decoding.
    #[arg(long)]
    pub buffered: bool,
}

/// Execute `eldercare stream`.
pub async fn run_stream(args: StreamArgs, config: &Config) -> anyhow::Result<()> {
    let request = request_config(&args, &config.stream)?;
    let ndjson = request.is_ndjson();
    let (reader, cancel) = prepare(&args, config)?;
    let payload = payload(&args)?;

    let stream = reader.stream_request(&args.url, payload, request.cancel_on(cancel.clone()));
    let printed = print_chunks(stream, ndjson, &mut io::stdout()).await;
    cancel.cancel();

    let printed = printed?;
    debug!(chunks = printed, url = %args.url, "Stream finished");
    Ok(())
}

/// Execute `eldercare collect`.
pub async fn run_collect(args: StreamArgs, config: &Config) -> anyhow::Result<()> {
    let request = request_config(&args, &config.stream)?;
    let (reader, cancel) = prepare(&args, config)?;
    let payload = payload(&args)?;

    let stream = reader.stream_json(&args.url, payload, request.cancel_on(cancel.clone()));
    let values: anyhow::Result<Vec<ChunkValue>> = collect_stream(stream).await.map_err(Into::into);
    cancel.cancel();

    let values = values?;
    debug!(records = values.len(), url = %args.url, "Collected response");
    writeln!(io::stdout(), "{}", render_collected(&values)?)?;
    Ok(())
}

/// Build the reader and a token that fires on Ctrl-C.
fn prepare(args: &StreamArgs, config: &Config) -> anyhow::Result<(ChunkedResponseReader, CancellationToken)> {
    let transport = HttpTransport::new(Some(config.stream.user_agent.as_str()))
        .context("Failed to build HTTP client")?
        .buffered(args.buffered);

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {}
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    debug!("Interrupted, cancelling request");
                    token.cancel();
                }
            }
        }
    });

    Ok((ChunkedResponseReader::new(transport), cancel))
}

/// Layer command-line flags over the configured defaults.
pub fn request_config(args: &StreamArgs, defaults: &StreamDefaults) -> anyhow::Result<RequestConfig> {
    let mut config = defaults.request_config();
    if args.ndjson {
        config = config.ndjson(true);
    }
    if let Some(ms) = args.timeout_ms {
        config = config.timeout_ms(ms);
    }
    if let Some(method) = &args.method {
        config = config.method(parse_method(method)?);
    }
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        config = config
            .header(name, value)
            .with_context(|| format!("Invalid header: {raw}"))?;
    }
    Ok(config)
}

/// Build the request body from `--data` and `--json`.
pub fn payload(args: &StreamArgs) -> anyhow::Result<Option<Payload>> {
    let Some(data) = &args.data else {
        return Ok(None);
    };
    if args.json {
        let value: Value = serde_json::from_str(data).context("--data is not valid JSON")?;
        Ok(Some(Payload::Json(value)))
    } else {
        Ok(Some(Payload::Text(data.clone())))
    }
}

/// Split `"Name: value"` into its trimmed parts.
pub fn parse_header(raw: &str) -> anyhow::Result<(&str, &str)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Header must look like 'Name: value', got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Header name is empty in {raw:?}");
    }
    Ok((name, value.trim()))
}

pub fn parse_method(raw: &str) -> anyhow::Result<Method> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow::anyhow!("Invalid HTTP method: {raw}"))
}

/// Text for one data chunk. JSON is compact with a trailing newline; raw
/// fragments are printed as they came.
pub fn render_chunk(value: &ChunkValue, ndjson: bool) -> String {
    match value {
        ChunkValue::Json(v) => format!("{v}\n"),
        ChunkValue::Text(t) if ndjson => format!("{t}\n"),
        ChunkValue::Text(t) => t.clone(),
    }
}

pub fn render_collected(values: &[ChunkValue]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(values)?)
}

/// Write every data chunk to `out`, flushing after each. Returns how many were
/// written.
pub async fn print_chunks<W: Write>(mut stream: ChunkStream, ndjson: bool, out: &mut W) -> anyhow::Result<usize> {
    let mut printed = 0;
    while let Some(chunk) = stream.next().await {
        match chunk? {
            StreamChunk::Data(value) => {
                write!(out, "{}", render_chunk(&value, ndjson))?;
                out.flush()?;
                printed += 1;
            }
            StreamChunk::End => break,
        }
    }
    Ok(printed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use serde_json::json;

    use super::*;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        args: StreamArgs,
    }

    fn parse(argv: &[&str]) -> StreamArgs {
        TestCli::try_parse_from(std::iter::once("eldercare").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn parses_curl_style_flags() {
        let args = parse(&[
            "http://localhost/chat",
            "--ndjson",
            "-X",
            "put",
            "-H",
            "Authorization: Bearer abc",
            "-H",
            "X-Trace:1",
            "--data",
            r#"{"q":"hi"}"#,
            "--json",
            "--timeout-ms",
            "500",
        ]);
        assert_eq!(args.url, "http://localhost/chat");
        assert!(args.ndjson);
        assert!(args.json);
        assert_eq!(args.method.as_deref(), Some("put"));
        assert_eq!(args.headers.len(), 2);
        assert_eq!(args.timeout_ms, Some(500));
    }

    #[test]
    fn json_flag_requires_data() {
        let res = TestCli::try_parse_from(["eldercare", "http://x", "--json"]);
        assert!(res.is_err());
    }

    #[test]
    fn header_parsing() {
        assert_eq!(parse_header("Accept: text/plain").unwrap(), ("Accept", "text/plain"));
        assert_eq!(parse_header("X-Empty:").unwrap(), ("X-Empty", ""));
        assert_eq!(parse_header("X-Url: http://a:1").unwrap(), ("X-Url", "http://a:1"));
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(" : value").is_err());
    }

    #[test]
    fn method_is_case_insensitive() {
        assert_eq!(parse_method("patch").unwrap(), Method::PATCH);
        assert!(parse_method("BAD METHOD").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let defaults = StreamDefaults {
            timeout_ms: Some(1_000),
            ndjson: false,
            ..StreamDefaults::default()
        };

        let config = request_config(&parse(&["http://x"]), &defaults).unwrap();
        assert_eq!(config.timeout_duration(), Some(Duration::from_secs(1)));
        assert!(!config.is_ndjson());
        assert_eq!(config.resolve_method(false), Method::GET);

        let args = parse(&["http://x", "--ndjson", "--timeout-ms", "0", "-X", "DELETE", "-H", "x-a: b"]);
        let config = request_config(&args, &defaults).unwrap();
        assert_eq!(config.timeout_duration(), None);
        assert!(config.is_ndjson());
        assert_eq!(config.resolve_method(true), Method::DELETE);
        assert_eq!(config.header_map()["x-a"], "b");
    }

    #[test]
    fn bad_header_value_is_reported() {
        let args = parse(&["http://x", "-H", "X-Bad: a\nb"]);
        assert!(request_config(&args, &StreamDefaults::default()).is_err());
    }

    #[test]
    fn payload_from_data() {
        assert!(payload(&parse(&["http://x"])).unwrap().is_none());

        let text = payload(&parse(&["http://x", "--data", "hello"])).unwrap();
        assert!(matches!(text, Some(Payload::Text(t)) if t == "hello"));

        let json = payload(&parse(&["http://x", "--data", r#"{"a":1}"#, "--json"])).unwrap();
        assert!(matches!(json, Some(Payload::Json(v)) if v == json!({"a": 1})));

        assert!(payload(&parse(&["http://x", "--data", "{oops", "--json"])).is_err());
    }

    #[test]
    fn chunk_rendering() {
        assert_eq!(render_chunk(&ChunkValue::Json(json!({"a": [1, 2]})), true), "{\"a\":[1,2]}\n");
        assert_eq!(render_chunk(&ChunkValue::Text("plain".into()), true), "plain\n");
        assert_eq!(render_chunk(&ChunkValue::Text("par".into()), false), "par");
    }

    #[test]
    fn collected_output_is_one_array() {
        let values = vec![ChunkValue::Json(json!({"n": 1})), ChunkValue::Text("oops".into())];
        let rendered = render_collected(&values).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, json!([{"n": 1}, "oops"]));
    }

    #[tokio::test]
    async fn prints_data_until_end() {
        let stream: ChunkStream = Box::pin(tokio_stream::iter(vec![
            Ok(StreamChunk::Data(ChunkValue::Json(json!(1)))),
            Ok(StreamChunk::Data(ChunkValue::Text("two".into()))),
            Ok(StreamChunk::End),
        ]));
        let mut out = Vec::new();
        let printed = print_chunks(stream, true, &mut out).await.unwrap();
        assert_eq!(printed, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "1\ntwo\n");
    }

    #[tokio::test]
    async fn raw_fragments_are_concatenated() {
        let stream: ChunkStream = Box::pin(tokio_stream::iter(vec![
            Ok(StreamChunk::Data(ChunkValue::Text("hel".into()))),
            Ok(StreamChunk::Data(ChunkValue::Text("lo\n".into()))),
            Ok(StreamChunk::End),
        ]));
        let mut out = Vec::new();
        print_chunks(stream, false, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "hello\n");
    }
}
