//! HTTP client for the file host's pages and APIs

use crate::error::CtError;
use crate::utils::{decode_text, host_header};
use reqwest::header::CONTENT_ENCODING;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default metadata API server
pub const DEFAULT_API_SERVER: &str = "https://webapi.400gb.com";

/// Default `Origin` sent with API requests
pub const DEFAULT_ORIGIN: &str = "https://www.400gb.com";

/// Compression the API is told we accept
pub const ACCEPT_ENCODING: &str = "gzip, deflate, br";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Proxy URL
    pub proxy_url: Option<String>,
    /// `Origin` header for API requests
    pub origin: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            proxy_url: None,
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

/// Per-request headers that vary between calls
#[derive(Debug, Clone, Default)]
pub struct RequestHeaders<'a> {
    pub user_agent: Option<&'a str>,
    pub referer: Option<&'a str>,
}

/// Client for share pages, `getfile.php` and `get_file_url.php`
#[derive(Debug, Clone)]
pub struct ShareClient {
    client: Client,
    config: HttpClientConfig,
}

impl ShareClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self, CtError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, CtError> {
        // No reqwest decompression features: bodies are decoded by `utils::encoding`
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout)
            .cookie_store(true);

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| CtError::Config(format!("Invalid proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| CtError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create a request for the JSON APIs
    pub fn create_api_request(
        &self,
        url: &Url,
        headers: &RequestHeaders<'_>,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .header("Accept-Encoding", ACCEPT_ENCODING)
            .header("Origin", &self.config.origin);

        if let Some(host) = host_header(url) {
            request = request.header("Host", host);
        }
        if let Some(user_agent) = headers.user_agent {
            request = request.header("User-Agent", user_agent);
        }
        if let Some(referer) = headers.referer {
            request = request.header("Referer", referer);
        }

        request
    }

    /// Create a request for an HTML page
    pub fn create_page_request(
        &self,
        url: &Url,
        headers: &RequestHeaders<'_>,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url.clone())
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8")
            .header("Accept-Encoding", ACCEPT_ENCODING);

        if let Some(user_agent) = headers.user_agent {
            request = request.header("User-Agent", user_agent);
        }
        if let Some(referer) = headers.referer {
            request = request.header("Referer", referer);
        }

        request
    }

    /// Fetch a share page as text
    pub async fn get_page(
        &self,
        url: &Url,
        headers: &RequestHeaders<'_>,
    ) -> Result<String, CtError> {
        debug!("GET page {}", url);
        self.execute_text(self.create_page_request(url, headers)).await
    }

    /// Fetch an API endpoint and parse the body as JSON
    pub async fn get_json(
        &self,
        url: &Url,
        headers: &RequestHeaders<'_>,
    ) -> Result<serde_json::Value, CtError> {
        debug!("GET api {}", url);
        let text = self.execute_text(self.create_api_request(url, headers)).await?;
        Ok(serde_json::from_str(text.trim_start_matches('\u{feff}'))?)
    }

    /// Send a request, check the status and decode the body
    async fn execute_text(&self, request: reqwest::RequestBuilder) -> Result<String, CtError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CtError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = response.bytes().await?;
        debug!("Received {} bytes (encoding: {:?})", body.len(), encoding);

        decode_text(encoding.as_deref(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.origin, DEFAULT_ORIGIN);
        assert!(config.proxy_url.is_none());
    }

    #[test]
    fn test_invalid_proxy_is_config_error() {
        let config = HttpClientConfig {
            proxy_url: Some("::not a proxy::".to_string()),
            ..Default::default()
        };
        let err = ShareClient::with_config(config).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_api_request_headers() {
        let client = ShareClient::new().unwrap();
        let url = Url::parse("https://webapi.400gb.com/getfile.php?f=XYZ").unwrap();
        let headers = RequestHeaders {
            user_agent: Some("agent/1.0"),
            referer: Some("https://abc.400gb.com/f/XYZ"),
        };
        let request = client.create_api_request(&url, &headers).build().unwrap();
        let h = request.headers();
        assert_eq!(h["Accept"], "application/json");
        assert_eq!(h["Accept-Encoding"], ACCEPT_ENCODING);
        assert_eq!(h["Origin"], DEFAULT_ORIGIN);
        assert_eq!(h["Host"], "webapi.400gb.com");
        assert_eq!(h["User-Agent"], "agent/1.0");
        assert_eq!(h["Referer"], "https://abc.400gb.com/f/XYZ");
    }

    #[tokio::test]
    async fn test_get_json_decodes_gzip() {
        let mut server = mockito::Server::new_async().await;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"userid":1}"#).unwrap();
        let body = encoder.finish().unwrap();

        let mock = server
            .mock("GET", "/getfile.php")
            .with_header("content-encoding", "gzip")
            .with_body(body)
            .create_async()
            .await;

        let client = ShareClient::new().unwrap();
        let url = Url::parse(&format!("{}/getfile.php", server.url())).unwrap();
        let value = client.get_json(&url, &RequestHeaders::default()).await.unwrap();
        assert_eq!(value["userid"], 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_json_sniffs_unlabelled_gzip() {
        let mut server = mockito::Server::new_async().await;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"downurl":"https://dl/x"}"#).unwrap();
        let body = encoder.finish().unwrap();

        let _mock = server
            .mock("GET", "/get_file_url.php")
            .with_body(body)
            .create_async()
            .await;

        let client = ShareClient::new().unwrap();
        let url = Url::parse(&format!("{}/get_file_url.php", server.url())).unwrap();
        let value = client.get_json(&url, &RequestHeaders::default()).await.unwrap();
        assert_eq!(value["downurl"], "https://dl/x");
    }

    #[tokio::test]
    async fn test_corrupt_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"downurl":"https://dl/x"}"#).unwrap();
        let mut body = encoder.finish().unwrap();
        body.truncate(12);

        let _mock = server
            .mock("GET", "/get_file_url.php")
            .with_header("content-encoding", "gzip")
            .with_body(body)
            .create_async()
            .await;

        let client = ShareClient::new().unwrap();
        let url = Url::parse(&format!("{}/get_file_url.php", server.url())).unwrap();
        let err = client.get_json(&url, &RequestHeaders::default()).await.unwrap_err();
        assert!(matches!(err, CtError::Decode(_)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/page")
            .with_status(503)
            .create_async()
            .await;

        let client = ShareClient::new().unwrap();
        let url = Url::parse(&format!("{}/page", server.url())).unwrap();
        let err = client.get_page(&url, &RequestHeaders::default()).await.unwrap_err();
        assert!(matches!(err, CtError::Status { status: 503, .. }));
        assert!(err.is_transport());
    }
}
