use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, RETRY_AFTER};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Result, ScienceError};

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// HTTP client that keeps a minimum spacing between requests and retries
/// transport failures and 429s a bounded number of times.
pub struct RateLimitedClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
    max_retries: u32,
}

impl RateLimitedClient {
    pub fn new(min_interval: Duration, max_retries: u32, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
            max_retries,
        })
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    pub async fn get_with_headers(&self, url: &str, headers: HeaderMap) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            self.wait_for_rate_limit().await;
            debug!("GET {}", url);
            let resp = self.client.get(url).headers(headers.clone()).send().await;
            match resp {
                Ok(r) if r.status() == 429 => {
                    let wait = r
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    if attempt >= self.max_retries {
                        return Err(ScienceError::RateLimit(host_of(url), wait));
                    }
                    warn!("Rate limited by {}, retrying in {}s", host_of(url), wait);
                    sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                Ok(r) if !r.status().is_success() => {
                    let status = r.status().as_u16();
                    let body = r.text().await.unwrap_or_default();
                    return Err(ScienceError::ApiError(
                        url.to_string(),
                        format!("HTTP {status}: {body}"),
                    ));
                }
                Ok(r) => return r.text().await.map_err(ScienceError::Http),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(ScienceError::Http(e));
                    }
                    let backoff = 2u64.pow(attempt);
                    warn!("Request to {} failed ({}), retrying in {}s", host_of(url), e, backoff);
                    sleep(Duration::from_secs(backoff)).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "server".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn returns_body_on_success() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body("hello")
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::ZERO, 0, "r1papers-test").unwrap();
        let body = client.get(&format!("{}/ok", server.url())).await.unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn error_status_is_api_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::ZERO, 0, "r1papers-test").unwrap();
        let err = client
            .get(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScienceError::ApiError(_, msg) if msg.contains("HTTP 500")));
    }

    #[tokio::test]
    async fn rate_limit_without_retries() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/busy")
            .with_status(429)
            .with_header("retry-after", "7")
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::ZERO, 0, "r1papers-test").unwrap();
        let err = client.get(&format!("{}/busy", server.url())).await.unwrap_err();
        assert!(matches!(err, ScienceError::RateLimit(_, 7)));
    }
}
