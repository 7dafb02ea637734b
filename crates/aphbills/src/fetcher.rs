use reqwest::{Client, StatusCode};
use std::time::Duration;

/// aph.gov.au rejects requests that do not look like they come from a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to download {url} after {attempts} attempt(s) (last status {status})")]
    DownloadFailed {
        url: String,
        attempts: u32,
        status: StatusCode,
    },
}

#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(policy: RetryPolicy, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self { client, policy })
    }
}

impl Fetcher for RetryingFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let attempts = self.policy.attempts.max(1);
        let mut status = StatusCode::OK;

        for attempt in 1..=attempts {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

            status = response.status();
            if status.is_success() {
                return Ok(response
                    .text()
                    .await
                    .inspect_err(|e| log::error!("Decode error: {e:?}"))?);
            }

            log::warn!(
                "Retrying download of {} (error {}, attempt {}/{})",
                url,
                status.as_u16(),
                attempt,
                attempts
            );
            if attempt < attempts {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        Err(FetchError::DownloadFailed {
            url: url.to_string(),
            attempts,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serves one canned response per accepted connection, in order. The receiver
    /// yields the request heads once every response has been sent.
    async fn serve(
        responses: Vec<(u16, &'static str)>,
    ) -> (String, oneshot::Receiver<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut heads = Vec::new();
            for (code, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap();
                heads.push(String::from_utf8_lossy(&buf[..n]).to_lowercase());

                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    code,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
            let _ = tx.send(heads);
        });

        (format!("http://{}/page", addr), rx)
    }

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_fetch_retries_until_success() {
        let (url, _) = serve(vec![(503, "busy"), (429, "slow down"), (200, "<html>ok</html>")]).await;
        let fetcher = RetryingFetcher::new(fast_policy(5), Duration::from_secs(5)).unwrap();

        let body = fetcher.fetch(&url).await.expect("Should eventually succeed");
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_exhaustion_is_download_failed() {
        let (url, _) = serve(vec![(500, "a"), (500, "b")]).await;
        let fetcher = RetryingFetcher::new(fast_policy(2), Duration::from_secs(5)).unwrap();

        match fetcher.fetch(&url).await {
            Err(FetchError::DownloadFailed {
                attempts, status, ..
            }) => {
                assert_eq!(attempts, 2);
                assert_eq!(status.as_u16(), 500);
            }
            other => panic!("Expected DownloadFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let (url, heads) = serve(vec![(503, "busy"), (200, "ok")]).await;
        let fetcher = RetryingFetcher::new(fast_policy(2), Duration::from_secs(5)).unwrap();

        fetcher.fetch(&url).await.unwrap();

        let heads = heads.await.expect("Server should report requests");
        assert_eq!(heads.len(), 2);
        let expected = format!("user-agent: {}", BROWSER_USER_AGENT.to_lowercase());
        for head in heads {
            assert!(head.contains(&expected), "Every attempt carries the browser UA: {}", head);
        }
    }
}
