//! A client for the [Tavily](https://tavily.com) web search API.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use tracing::Instrument;

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_MAX_RESULTS, SearchDepth, TavilyConfig,
    TavilyConfigBuilder,
};
pub use proto::{Image, SearchResponse, SearchResult};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The API key was rejected.
    Unauthorized,
    /// The plan's request quota is used up.
    RateLimitExceeded,
    /// The request could not be sent or the service failed.
    Request,
    /// The service answered with something other than search results.
    InvalidResponse,
}

/// Error type for [`TavilyClient`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "web search failed: {}", self.message)
    }
}

impl StdError for Error {}

/// A Tavily search client.
///
/// Cloning is cheap, clones share the connection pool.
#[derive(Clone, Debug)]
pub struct TavilyClient {
    client: Client,
    config: Arc<TavilyConfig>,
}

impl TavilyClient {
    /// Creates a new client with the given configuration.
    #[inline]
    pub fn new(config: TavilyConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this client.
    #[inline]
    pub fn config(&self) -> &TavilyConfig {
        &self.config
    }

    /// Searches the web.
    ///
    /// At most `max_results` results are returned, in ranking order.
    pub fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<SearchResponse, Error>> + Send + 'static + use<>
    {
        let body = proto::create_request(query, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}/search", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send();
        let max_results = self.config.max_results;

        async move {
            let resp = resp_fut
                .await
                .map_err(|err| Error::new(err.to_string(), ErrorKind::Request))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let message = serde_json::from_str::<proto::ErrorBody>(&body)
                    .map(|body| body.detail.into_message())
                    .unwrap_or(body);
                error!("search failed with {status}: {message}");
                return Err(Error::new(
                    format!("HTTP {status}: {message}"),
                    error_kind(status),
                ));
            }

            let mut response = resp.json::<SearchResponse>().await.map_err(|err| {
                Error::new(err.to_string(), ErrorKind::InvalidResponse)
            })?;
            response.results.truncate(max_results);
            debug!("got {} results", response.results.len());
            Ok(response)
        }
        .instrument(debug_span!("tavily search", query = %query))
    }
}

fn error_kind(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ErrorKind::Unauthorized
        }
        // Tavily signals an exhausted plan with 432 and 433.
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
        status if matches!(status.as_u16(), 432 | 433) => {
            ErrorKind::RateLimitExceeded
        }
        _ => ErrorKind::Request,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Serves a single HTTP response and yields the JSON body it received.
    async fn serve_once(
        status: &'static str,
        body: String,
    ) -> (String, JoinHandle<Value>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            let (head_len, content_len) = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before the request ended");
                buf.extend_from_slice(&chunk[..n]);
                let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n")
                else {
                    continue;
                };
                let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                let content_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .map(|len| len.trim().parse::<usize>().unwrap())
                    .unwrap_or(0);
                break (pos + 4, content_len);
            };
            while buf.len() < head_len + content_len {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before the body ended");
                buf.extend_from_slice(&chunk[..n]);
            }

            let resp = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(resp.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            serde_json::from_slice(&buf[head_len..head_len + content_len])
                .unwrap()
        });
        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn test_search() {
        let results: Vec<_> = (0..7)
            .map(|i| {
                json!({
                    "title": format!("t{i}"),
                    "url": format!("https://news.example/{i}"),
                    "content": format!("snippet {i}"),
                    "score": 0.9,
                })
            })
            .collect();
        let body = json!({
            "query": "weather Paris today",
            "results": results,
            "images": [],
        });
        let (base_url, server) = serve_once("200 OK", body.to_string()).await;

        let client = TavilyClient::new(
            TavilyConfigBuilder::with_api_key("tvly-test")
                .with_base_url(base_url)
                .with_max_results(2)
                .build(),
        );
        let response = client.search("weather Paris today").await.unwrap();

        let titles: Vec<_> =
            response.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["t0", "t1"]);
        assert_eq!(response.results[1].url, "https://news.example/1");
        assert_eq!(
            server.await.unwrap(),
            json!({
                "query": "weather Paris today",
                "max_results": 2,
                "search_depth": "basic",
                "include_raw_content": false,
                "include_images": false,
                "include_answer": false,
            })
        );
    }

    #[tokio::test]
    async fn test_search_rejected_key() {
        let body = json!({
            "detail": { "error": "Unauthorized: missing or invalid API key." }
        });
        let (base_url, server) =
            serve_once("401 Unauthorized", body.to_string()).await;

        let client = TavilyClient::new(
            TavilyConfigBuilder::with_api_key("tvly-bad")
                .with_base_url(base_url)
                .build(),
        );
        let err = client.search("weather Paris today").await.unwrap_err();
        server.await.unwrap();

        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(err.message().starts_with("HTTP 401"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(error_kind(StatusCode::UNAUTHORIZED), ErrorKind::Unauthorized);
        assert_eq!(
            error_kind(StatusCode::TOO_MANY_REQUESTS),
            ErrorKind::RateLimitExceeded
        );
        assert_eq!(
            error_kind(StatusCode::from_u16(432).unwrap()),
            ErrorKind::RateLimitExceeded
        );
        assert_eq!(
            error_kind(StatusCode::INTERNAL_SERVER_ERROR),
            ErrorKind::Request
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::new("HTTP 401: bad key", ErrorKind::Unauthorized);
        assert_eq!(err.to_string(), "web search failed: HTTP 401: bad key");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
