//! HTTP client with retry and cooperative cancellation.

use crate::error::{FetchError, Result};
use backon::{ExponentialBuilder, Retryable};
use bytes::Bytes;
use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Fetcher configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum retry attempts for retryable failures.
    pub max_retries: u32,
    /// Base delay for backoff between attempts.
    pub base_delay: Duration,
    /// Total request timeout.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("smuggler/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP fetcher shared by metadata loading and package downloads.
///
/// Redirects are followed (reqwest default policy, method preserved for
/// GET). Retryable failures back off with the configured base delay; 4xx
/// other than 408/429 fail immediately.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl Fetcher {
    /// Create a fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| FetchError::Connection(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Create a fetcher with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(FetchConfig::default())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.config.base_delay)
            .with_max_times(self.config.max_retries as usize)
    }

    /// Issue a single GET attempt with no retry. Callers that run their
    /// own retry policy (the download manager) build on this.
    pub async fn get_once(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Issue a GET and return the successful response, retrying retryable
    /// failures.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let op = || async move {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            Ok(response)
        };

        op.retry(self.backoff())
            .when(|e: &FetchError| {
                let retry = e.is_retryable();
                if retry {
                    debug!(url, error = %e, "retrying fetch");
                }
                retry
            })
            .notify(|e: &FetchError, delay: Duration| {
                warn!(url, error = %e, delay = ?delay, "fetch failed, backing off");
            })
            .await
    }

    /// GET the full body as bytes.
    pub async fn get_bytes(&self, url: &str, cancel: Option<&CancellationToken>) -> Result<Bytes> {
        let fetch = async {
            let response = self.get(url).await?;
            response.bytes().await.map_err(FetchError::from)
        };

        match cancel {
            Some(token) => tokio::select! {
                () = token.cancelled() => Err(FetchError::Cancelled),
                result = fetch => result,
            },
            None => fetch.await,
        }
    }

    /// GET the full body as UTF-8 text.
    pub async fn get_text(&self, url: &str, cancel: Option<&CancellationToken>) -> Result<String> {
        let bytes = self.get_bytes(url, cancel).await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| FetchError::Decode(format!("response is not UTF-8: {e}")))
    }

    /// Stream a GET body into a file, reporting each chunk's size through
    /// `on_chunk`.
    ///
    /// On cancellation the partially written file is deleted before
    /// returning [`FetchError::Cancelled`].
    pub async fn fetch_to_file(
        &self,
        url: &str,
        dest: &Path,
        cancel: Option<&CancellationToken>,
        mut on_chunk: impl FnMut(u64),
    ) -> Result<u64> {
        let response = self.get(url).await?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| FetchError::io(dest, e))?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        loop {
            let chunk = match cancel {
                Some(token) => tokio::select! {
                    () = token.cancelled() => {
                        drop(file);
                        let _ = tokio::fs::remove_file(dest).await;
                        return Err(FetchError::Cancelled);
                    }
                    chunk = stream.next() => chunk,
                },
                None => stream.next().await,
            };

            let Some(chunk) = chunk else { break };
            let chunk = chunk.map_err(FetchError::from)?;
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(dest, e))?;
            written += chunk.len() as u64;
            on_chunk(chunk.len() as u64);
        }

        file.flush().await.map_err(|e| FetchError::io(dest, e))?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_bytes_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repomd.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<repomd/>".to_vec()))
            .mount(&server)
            .await;

        let fetcher = Fetcher::with_defaults().unwrap();
        let body = fetcher
            .get_bytes(&format!("{}/repomd.xml", server.uri()), None)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<repomd/>");
    }

    #[tokio::test]
    async fn non_retryable_status_fails_fast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::with_defaults().unwrap();
        let err = fetcher
            .get_bytes(&format!("{}/missing", server.uri()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let config = FetchConfig {
            base_delay: Duration::from_millis(10),
            ..FetchConfig::default()
        };
        let fetcher = Fetcher::new(config).unwrap();
        let body = fetcher
            .get_bytes(&format!("{}/flaky", server.uri()), None)
            .await
            .unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn cancelled_file_fetch_removes_partial() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg.rpm"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0u8; 1 << 20])
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pkg.rpm");
        let fetcher = Fetcher::with_defaults().unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let err = fetcher
            .fetch_to_file(&format!("{}/pkg.rpm", server.uri()), &dest, Some(&token), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
        assert!(!dest.exists());
    }
}
