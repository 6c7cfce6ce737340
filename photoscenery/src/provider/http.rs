//! HTTP client abstraction for testability

use super::types::ProviderError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Async HTTP GET, the only operation the fetch pipeline needs.
///
/// Implemented by [`AsyncReqwestClient`] in production and by mocks in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Fetch `url` and return the response body.
    ///
    /// Non-success statuses are returned as [`ProviderError::Status`].
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// Default User-Agent string for HTTP requests.
/// Some WMS front-ends reject requests without a browser-like User-Agent.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Per-request timeout for sub-image downloads.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for building an [`AsyncReqwestClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub referer: Option<String>,
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: None,
            proxy: None,
        }
    }
}

impl ClientOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}

/// HTTP client backed by reqwest with connection pooling.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    pub fn new(options: &ClientOptions) -> Result<Self, ProviderError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(referer) = &options.referer {
            let value = reqwest::header::HeaderValue::from_str(referer)
                .map_err(|e| ProviderError::ClientBuild(format!("referer: {}", e)))?;
            headers.insert(reqwest::header::REFERER, value);
        }

        let mut builder = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str())
            .default_headers(headers)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30));

        if let Some(proxy) = &options.proxy {
            let proxy =
                reqwest::Proxy::all(proxy).map_err(|e| ProviderError::ClientBuild(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ProviderError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) if e.is_timeout() => {
                warn!(url = url, "HTTP request timed out");
                return Err(ProviderError::Timeout(url.to_string()));
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    "HTTP request failed"
                );
                return Err(ProviderError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "HTTP error status");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) if e.is_timeout() => Err(ProviderError::Timeout(url.to_string())),
            Err(e) => {
                warn!(url = url, error = %e, "Failed to read response body");
                Err(ProviderError::Transport(format!(
                    "Failed to read response: {}",
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Mock client replaying a scripted sequence of responses, then repeating
    /// `fallback`. Counts every request.
    #[derive(Clone)]
    pub struct MockAsyncHttpClient {
        script: Arc<parking_lot::Mutex<VecDeque<Result<Vec<u8>, ProviderError>>>>,
        fallback: Result<Vec<u8>, ProviderError>,
        requests: Arc<AtomicUsize>,
        urls: Arc<parking_lot::Mutex<Vec<String>>>,
    }

    impl MockAsyncHttpClient {
        pub fn always(response: Result<Vec<u8>, ProviderError>) -> Self {
            Self::scripted(Vec::new(), response)
        }

        pub fn scripted(
            script: Vec<Result<Vec<u8>, ProviderError>>,
            fallback: Result<Vec<u8>, ProviderError>,
        ) -> Self {
            Self {
                script: Arc::new(parking_lot::Mutex::new(script.into())),
                fallback,
                requests: Arc::new(AtomicUsize::new(0)),
                urls: Arc::new(parking_lot::Mutex::new(Vec::new())),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }

        pub fn urls(&self) -> Vec<String> {
            self.urls.lock().clone()
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().push(url.to_string());
            let next = self.script.lock().pop_front();
            next.unwrap_or_else(|| self.fallback.clone())
        }
    }

    #[tokio::test]
    async fn test_mock_async_client_script_then_fallback() {
        let mock = MockAsyncHttpClient::scripted(
            vec![Err(ProviderError::Timeout("u".into()))],
            Ok(vec![1, 2, 3]),
        );
        assert!(mock.get("http://a").await.is_err());
        assert_eq!(mock.get("http://b").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(mock.request_count(), 2);
        assert_eq!(mock.urls(), vec!["http://a", "http://b"]);
    }

    #[test]
    fn test_client_options_builder() {
        let options = ClientOptions::default()
            .with_timeout(Duration::from_secs(5))
            .with_referer("https://example.org")
            .with_proxy(Some("http://proxy:3128".into()));
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.referer.as_deref(), Some("https://example.org"));
        assert!(AsyncReqwestClient::new(&options).is_ok());
    }
}
