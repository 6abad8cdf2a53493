//! Review orchestration: one model request per input, fanned out to the
//! live renderer and the issue extractor as fragments arrive.

use std::io::{self, Write};
use std::time::Duration;

use guardian_core::db;
use guardian_core::extract::IssueExtractor;
use guardian_core::types::IssueDraft;
use thiserror::Error;

use crate::ollama::OllamaClient;
use crate::prompt::build_prompt;
use crate::render::LiveRenderer;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("cannot reach model service at {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("model stream idle for {0:?}, giving up")]
    Timeout(Duration),
    #[error("model stream failed mid-review")]
    Stream(#[from] reqwest::Error),
    #[error("terminal output failed")]
    Output(#[from] io::Error),
}

/// One unit of work: a named piece of code to review.
pub struct ReviewRequest {
    pub source_name: String,
    pub code: String,
}

/// Streams one review end to end. Returns the number of issues stored.
///
/// Extracted issues are buffered while streaming and handed to the store
/// only once the stream has completed: a request that fails mid-stream
/// persists nothing, though everything already rendered stays on screen.
pub async fn run_one<W: Write>(
    client: &OllamaClient,
    store: &tokio_rusqlite::Connection,
    request: &ReviewRequest,
    custom_rules: &str,
    renderer: &mut LiveRenderer<W>,
) -> Result<usize, ReviewError> {
    tracing::debug!(source = %request.source_name, "building prompt");
    let prompt = build_prompt(&request.code, custom_rules);

    tracing::debug!(source = %request.source_name, url = client.url(), "streaming review");
    let mut stream = client.generate(&prompt).await?;
    let mut extractor = IssueExtractor::new(&request.source_name);
    let mut drafts = Vec::new();

    loop {
        let fragment = match stream.next_fragment().await {
            Ok(Some(fragment)) => fragment,
            Ok(None) => break,
            Err(e) => {
                renderer.finish()?;
                return Err(e);
            }
        };
        renderer.push(&fragment)?;
        drafts.extend(extractor.push(&fragment));
    }
    renderer.finish()?;
    drafts.extend(extractor.finish());

    tracing::debug!(source = %request.source_name, pending = drafts.len(), "persisting issues");
    let mut stored = 0usize;
    for draft in drafts {
        stored += persist(store, draft).await;
    }

    if extractor.dropped() > 0 {
        tracing::debug!(
            source = %request.source_name,
            dropped = extractor.dropped(),
            "discarded malformed issue blocks"
        );
    }
    tracing::debug!(source = %request.source_name, stored, "review complete");
    Ok(stored)
}

/// A failed insert loses one issue, not the review.
async fn persist(store: &tokio_rusqlite::Connection, draft: IssueDraft) -> usize {
    let title = draft.title.clone();
    match db::create_issue(store, draft).await {
        Ok(_) => 1,
        Err(e) => {
            tracing::warn!(error = %e, title = %title, "failed to persist issue");
            0
        }
    }
}

/// Runs every request in order against one store. Returns the number of
/// failed reviews; a failure on one input never stops the rest.
pub async fn run_reviews(
    client: &OllamaClient,
    store: &tokio_rusqlite::Connection,
    requests: &[ReviewRequest],
    custom_rules: &str,
    plain: bool,
) -> usize {
    let mut failures = 0usize;
    for request in requests {
        banner(plain, "ANALYZE", &request.source_name);
        let mut renderer = LiveRenderer::new(io::stdout(), !plain);
        match run_one(client, store, request, custom_rules, &mut renderer).await {
            Ok(stored) => {
                banner(plain, "OK", &format!("{} ({stored} issues recorded)", request.source_name));
            }
            Err(e) => {
                failures += 1;
                eprintln!("guardian: review of {} failed: {e}", request.source_name);
            }
        }
    }
    failures
}

fn banner(plain: bool, label: &str, text: &str) {
    if plain {
        println!("[{label}] {text}");
    } else {
        println!("\n\x1b[1;36m[{label}]\x1b[0m {text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_core::types::IssueFilter;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// A review whose first issue block is closed by the following heading,
    /// so the extractor yields it while the stream is still open.
    const REVIEW_TEXT: &str = "## Bugs & Security\n\
        * **[Issue]:** Unchecked index\n\
        * **[Explanation]:** Input reaches the list unvalidated.\n\
        * **[Remediation Effort]:** Low\n\
        ## Standards\n";

    fn record(text: &str, done: bool) -> String {
        format!("{}\n", serde_json::json!({ "response": text, "done": done }))
    }

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

    async fn temp_store() -> tokio_rusqlite::Connection {
        let dir = tempfile::TempDir::new().unwrap().keep();
        let path = dir.join("issues.db");
        db::open_db(path.to_str().unwrap()).await.unwrap()
    }

    fn request() -> ReviewRequest {
        ReviewRequest { source_name: "app.py".to_owned(), code: "x = 1\n".to_owned() }
    }

    #[tokio::test]
    async fn failed_stream_commits_no_issues() {
        // One complete issue block arrives, then the service stalls out.
        let url = serve_once(vec![record(REVIEW_TEXT, false)], true).await;
        let client = OllamaClient::new(&url, "test", Duration::from_millis(200)).unwrap();
        let store = temp_store().await;

        let mut out = Vec::new();
        let result = {
            let mut renderer = LiveRenderer::new(&mut out, false);
            run_one(&client, &store, &request(), "", &mut renderer).await
        };

        match result {
            Err(ReviewError::Timeout(_)) => {}
            other => panic!("expected timeout, got {other:?}"),
        }
        // The rendered text stands, but nothing reached the store.
        assert!(String::from_utf8(out).unwrap().contains("Unchecked index"));
        let issues = db::list_issues(&store, IssueFilter::default()).await.unwrap();
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn completed_stream_commits_extracted_issues() {
        let url = serve_once(vec![record(REVIEW_TEXT, false), record("", true)], true).await;
        let client = OllamaClient::new(&url, "test", Duration::from_secs(5)).unwrap();
        let store = temp_store().await;

        let mut out = Vec::new();
        let stored = {
            let mut renderer = LiveRenderer::new(&mut out, false);
            run_one(&client, &store, &request(), "", &mut renderer).await.unwrap()
        };

        assert_eq!(stored, 1);
        let issues = db::list_issues(&store, IssueFilter::default()).await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "Unchecked index");
    }
}
