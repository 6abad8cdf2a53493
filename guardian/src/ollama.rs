//! Streaming client for an Ollama-compatible model service.
//!
//! One request per review: `POST {url}/api/generate` with the prompt and
//! `stream: true`. The response body is NDJSON, decoded incrementally by
//! `guardian_core::decode::ChunkDecoder`. The stream is pull-based — the
//! orchestrator calls [`FragmentStream::next_fragment`] and fans each
//! fragment out to the renderer and the extractor itself, so there is no
//! callback ordering to reason about.

use std::collections::VecDeque;
use std::time::Duration;

use guardian_core::decode::{ChunkDecoder, StreamEnd};

use crate::review::ReviewError;

/// Default model service endpoint (a local Ollama instance).
pub const DEFAULT_URL: &str = "http://localhost:11434";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemma:2b";

/// Default idle timeout: abort the request when no data arrives for this long.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(180);

/// HTTP client for the model service. Cheap to clone per request; holds no
/// per-review state.
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
    idle_timeout: Duration,
}

impl OllamaClient {
    /// Builds a client for `url` (no trailing slash) and `model`.
    ///
    /// No overall request timeout is set — reviews legitimately run for
    /// minutes; staleness is policed per-read by `idle_timeout` instead.
    pub fn new(url: &str, model: &str, idle_timeout: Duration) -> Result<Self, ReviewError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ReviewError::Connection { url: url.to_owned(), source: e })?;
        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_owned(),
            model: model.to_owned(),
            idle_timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Opens one streaming generation request.
    ///
    /// An unreachable service or a non-success status maps to
    /// `ReviewError::Connection` — the request never reached the streaming
    /// phase.
    pub async fn generate(&self, prompt: &str) -> Result<FragmentStream, ReviewError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": true,
        });

        let response = self
            .http
            .post(format!("{}/api/generate", self.url))
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ReviewError::Connection { url: self.url.clone(), source: e })?;

        Ok(FragmentStream {
            response,
            decoder: ChunkDecoder::new(),
            pending: VecDeque::new(),
            idle_timeout: self.idle_timeout,
            ended: false,
        })
    }
}

/// Pull-based sequence of text fragments for one review.
///
/// Wraps the live HTTP response; dropped mid-stream it simply closes the
/// connection (used when a request errors out).
pub struct FragmentStream {
    response: reqwest::Response,
    decoder: ChunkDecoder,
    pending: VecDeque<String>,
    idle_timeout: Duration,
    ended: bool,
}

impl FragmentStream {
    /// Returns the next fragment, `Ok(None)` at end of stream.
    ///
    /// Each underlying read is bounded by the idle timeout; a stalled
    /// service yields `ReviewError::Timeout` and a transport failure
    /// `ReviewError::Stream`. Once the decoder has seen the done marker no
    /// further reads are attempted.
    pub async fn next_fragment(&mut self) -> Result<Option<String>, ReviewError> {
        loop {
            if let Some(fragment) = self.pending.pop_front() {
                return Ok(Some(fragment));
            }
            if self.ended {
                return Ok(None);
            }
            if self.decoder.is_done() {
                self.end_of_stream();
                return Ok(None);
            }

            let read = tokio::time::timeout(self.idle_timeout, self.response.chunk())
                .await
                .map_err(|_| ReviewError::Timeout(self.idle_timeout))?;

            match read.map_err(ReviewError::Stream)? {
                Some(bytes) => {
                    self.pending.extend(self.decoder.push(&bytes));
                }
                None => {
                    self.end_of_stream();
                    if self.pending.is_empty() {
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn end_of_stream(&mut self) {
        self.ended = true;
        if self.decoder.finish() == StreamEnd::Unexpected {
            // Surfaced but not fatal: the review text rendered so far stands.
            tracing::warn!("model stream closed without a done marker");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP/1.1 stub: accepts one request, streams `lines` as chunked
    /// NDJSON, then either finishes the response or stalls with the
    /// connection held open.
    async fn serve_once(lines: Vec<String>, stall: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 65536];
            let mut seen = Vec::new();
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                seen.extend_from_slice(&buf[..n]);
                if seen.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let head = "HTTP/1.1 200 OK\r\n\
                        content-type: application/x-ndjson\r\n\
                        transfer-encoding: chunked\r\n\r\n";
            sock.write_all(head.as_bytes()).await.unwrap();
            for line in lines {
                let chunk = format!("{:x}\r\n{}\r\n", line.len(), line);
                sock.write_all(chunk.as_bytes()).await.unwrap();
            }
            if stall {
                tokio::time::sleep(Duration::from_secs(30)).await;
            } else {
                sock.write_all(b"0\r\n\r\n").await.unwrap();
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn stalled_stream_times_out_after_yielding_earlier_fragments() {
        let url = serve_once(
            vec!["{\"response\":\"Hello\",\"done\":false}\n".to_owned()],
            true,
        )
        .await;
        let client = OllamaClient::new(&url, "test", Duration::from_millis(200)).unwrap();
        let mut stream = client.generate("hi").await.unwrap();

        assert_eq!(stream.next_fragment().await.unwrap().as_deref(), Some("Hello"));
        match stream.next_fragment().await {
            Err(ReviewError::Timeout(_)) => {}
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn done_marker_ends_the_stream_without_further_reads() {
        // The server stalls after the done record; reading past it would
        // hang, so a prompt None proves no further read is attempted.
        let url = serve_once(
            vec![
                "{\"response\":\"Hi\",\"done\":false}\n".to_owned(),
                "{\"response\":\"\",\"done\":true}\n".to_owned(),
            ],
            true,
        )
        .await;
        let client = OllamaClient::new(&url, "test", Duration::from_secs(5)).unwrap();
        let mut stream = client.generate("hi").await.unwrap();

        assert_eq!(stream.next_fragment().await.unwrap().as_deref(), Some("Hi"));
        assert_eq!(stream.next_fragment().await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreachable_service_maps_to_connection_error() {
        // Reserved port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = OllamaClient::new(&url, "test", Duration::from_secs(1)).unwrap();
        match client.generate("hi").await {
            Err(ReviewError::Connection { .. }) => {}
            other => panic!("expected connection error, got {:?}", other.map(|_| ())),
        }
    }
}
