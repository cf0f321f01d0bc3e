use std::time::Instant;

use anyhow::Result;
use reqwest::Client;
use url::Url;

use crate::config::FetchConfig;

/// What one page retrieval produced. Transport failures land in
/// `error` instead of bubbling up; a dead page is a failed check, not
/// a crashed cycle.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub html: Option<String>,
    pub status_code: Option<i64>,
    pub duration_ms: i64,
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn success(&self) -> bool {
        self.html.is_some() && self.error.is_none()
    }
}

/// Plain HTTP fetcher. No JS rendering; pages that need a browser are
/// out of scope here.
pub struct PageFetcher {
    client: Client,
    config: FetchConfig,
}

impl PageFetcher {
    pub fn new(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub async fn fetch(&self, raw_url: &str) -> FetchOutcome {
        let started = Instant::now();
        // The server may well have answered before the request failed
        // (4xx/5xx); that status is worth persisting with the check.
        let mut status_code = None;
        let result = self.fetch_inner(raw_url, &mut status_code).await;
        let duration_ms = started.elapsed().as_millis() as i64;
        match result {
            Ok(html) => FetchOutcome {
                html: Some(html),
                status_code,
                duration_ms,
                error: None,
            },
            Err(err) => {
                tracing::warn!(target: "fetch", url = raw_url, error = %err, "page fetch failed");
                FetchOutcome {
                    html: None,
                    status_code,
                    duration_ms,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn fetch_inner(&self, raw_url: &str, status_code: &mut Option<i64>) -> Result<String> {
        let url = Url::parse(raw_url)?;
        let response = self
            .client
            .get(url)
            .timeout(self.config.timeout)
            .send()
            .await?;
        *status_code = Some(response.status().as_u16() as i64);
        let body = response.error_for_status()?.text().await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{addr}/")
    }

    fn fetcher() -> PageFetcher {
        PageFetcher::new(
            Client::new(),
            FetchConfig {
                timeout: Duration::from_secs(5),
            },
        )
    }

    #[tokio::test]
    async fn successful_fetch_returns_body_and_status() {
        let url = serve_once("200 OK", "<p>liegeplatz frei</p>").await;
        let outcome = fetcher().fetch(&url).await;
        assert!(outcome.success());
        assert_eq!(outcome.status_code, Some(200));
        assert_eq!(outcome.html.as_deref(), Some("<p>liegeplatz frei</p>"));
    }

    #[tokio::test]
    async fn non_2xx_response_keeps_status_code() {
        let url = serve_once("404 Not Found", "weg").await;
        let outcome = fetcher().fetch(&url).await;
        assert!(!outcome.success());
        assert_eq!(outcome.status_code, Some(404));
        assert!(outcome.html.is_none());
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn unreachable_server_has_no_status_code() {
        let outcome = fetcher().fetch("http://127.0.0.1:1/").await;
        assert!(!outcome.success());
        assert_eq!(outcome.status_code, None);
        assert!(outcome.error.is_some());
    }
}
