//! Parameter resolution strategies
//!
//! Two site generations exist. Older share pages embed the parameters in
//! script variables ([`PageScrapeResolver`]); newer ones load them from the
//! `getfile.php` metadata API ([`MetadataApiResolver`]). Both produce a
//! validated [`FileParameters`]; the direct-link API is always queried on the
//! share URL's origin.

use crate::core::params::{FileParameters, FreeDownArgs};
use crate::error::CtError;
use crate::platform::client::{RequestHeaders, ShareClient};
use crate::utils::ShareReference;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

/// Turns a share URL into direct-link API parameters
#[async_trait]
pub trait ParameterResolver: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Resolve the parameters for `share`
    async fn resolve(&self, share: &ShareReference) -> Result<FileParameters, CtError>;

    /// Base URL `get_file_url.php` is joined onto
    fn link_api_base(&self, share: &ShareReference) -> Url {
        share.origin()
    }
}

/// Scrapes `var userid` and `free_down(...)` from the share page
pub struct PageScrapeResolver {
    client: ShareClient,
    user_agent: Option<String>,
}

impl PageScrapeResolver {
    pub fn new(client: ShareClient) -> Self {
        Self {
            client,
            user_agent: None,
        }
    }

    /// User agent for the page request
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Extract parameters from share page HTML
pub fn parse_page(html: &str) -> Result<FileParameters, CtError> {
    let userid_regex = Regex::new(r#"var\s+userid\s*=\s*['"]?([0-9]+)['"]?"#)?;
    let free_down_regex = Regex::new(r"free_down\(([^)]+)\)")?;
    let token_regex = Regex::new(r"[A-Za-z0-9]+")?;

    let user_id = userid_regex
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| CtError::missing("userid variable"))?;

    let arguments = free_down_regex
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| CtError::missing("free_down(...) call"))?;

    let tokens: Vec<&str> = token_regex.find_iter(arguments).map(|m| m.as_str()).collect();
    debug!("free_down tokens: {:?}", tokens);

    FreeDownArgs::from_tokens(&tokens)?
        .into_parameters(user_id)
        .validated()
}

#[async_trait]
impl ParameterResolver for PageScrapeResolver {
    fn name(&self) -> &'static str {
        "page"
    }

    async fn resolve(&self, share: &ShareReference) -> Result<FileParameters, CtError> {
        info!("Scraping share page {}", share);
        let headers = RequestHeaders {
            user_agent: self.user_agent.as_deref(),
            referer: None,
        };
        let html = self.client.get_page(share.url(), &headers).await?;
        parse_page(&html)
    }
}

/// Queries `getfile.php` on the API server
pub struct MetadataApiResolver {
    client: ShareClient,
    api_server: Url,
    user_agent: Option<String>,
}

impl MetadataApiResolver {
    pub fn new(client: ShareClient, api_server: Url) -> Self {
        Self {
            client,
            api_server,
            user_agent: None,
        }
    }

    /// User agent for the metadata request
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// `{api_server}/getfile.php?f={key}&passcode=&ref=`
    pub fn metadata_url(&self, query_key: &str) -> Result<Url, CtError> {
        let mut url = self.api_server.join("getfile.php")?;
        url.query_pairs_mut()
            .append_pair("f", query_key)
            .append_pair("passcode", "")
            .append_pair("ref", "");
        Ok(url)
    }
}

/// `getfile.php` response body
#[derive(Debug, Default, Deserialize)]
pub struct FileMetadata {
    pub userid: Option<Scalar>,
    pub file_id: Option<Scalar>,
    pub file_chk: Option<Scalar>,
    pub folder_id: Option<Scalar>,
}

/// A field the API sends either quoted or as a bare number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    /// Non-empty string form
    fn text(&self) -> Option<String> {
        let value = match self {
            Scalar::Text(s) => s.trim().to_string(),
            Scalar::Number(n) => n.to_string(),
        };
        Some(value).filter(|s| !s.is_empty())
    }
}

fn required(field: &Option<Scalar>, name: &str) -> Result<String, CtError> {
    field
        .as_ref()
        .and_then(Scalar::text)
        .ok_or_else(|| CtError::missing(name))
}

/// Extract parameters from a `getfile.php` response
pub fn parse_metadata(data: &Value) -> Result<FileParameters, CtError> {
    let metadata = FileMetadata::deserialize(data)
        .map_err(|e| CtError::Resolution(format!("Unusable metadata: {}", e)))?;

    FileParameters {
        user_id: required(&metadata.userid, "userid")?,
        file_id: required(&metadata.file_id, "file_id")?,
        file_checksum: required(&metadata.file_chk, "file_chk")?,
        folder_id: metadata
            .folder_id
            .as_ref()
            .and_then(Scalar::text)
            .unwrap_or_default(),
        // Not supported by this API generation
        mobile_flag: "0".to_string(),
        app_flag: "0".to_string(),
        verify_code: String::new(),
    }
    .validated()
}

#[async_trait]
impl ParameterResolver for MetadataApiResolver {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn resolve(&self, share: &ShareReference) -> Result<FileParameters, CtError> {
        let key = share.query_key()?;
        let url = self.metadata_url(&key)?;
        info!("Querying metadata for file key {}", key);

        let headers = RequestHeaders {
            user_agent: self.user_agent.as_deref(),
            referer: Some(share.as_str()),
        };
        let data = self.client.get_json(&url, &headers).await?;
        parse_metadata(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE_SEVEN: &str = r#"
        <script type="text/javascript">
        var userid = '12345';
        var page = 1;
        </script>
        <a href="javascript:void(0)" onclick="free_down(111, 222, 'abc', 0, 0, '', 'verify123')">Download</a>
    "#;

    #[test]
    fn test_parse_page_six_arguments() {
        let html = "var userid = '12345'; free_down(111,222,abc,0,0,verify123)";
        let params = parse_page(html).unwrap();
        assert_eq!(params.user_id, "12345");
        assert_eq!(params.file_id, "111");
        assert_eq!(params.folder_id, "222");
        assert_eq!(params.file_checksum, "abc");
        assert_eq!(params.mobile_flag, "0");
        assert_eq!(params.app_flag, "0");
        assert_eq!(params.verify_code, "");
    }

    #[test]
    fn test_parse_page_five_arguments() {
        let html = "var userid = '12345'; free_down(111,222,abc,0,0)";
        let params = parse_page(html).unwrap();
        assert_eq!(params.file_checksum, "abc");
        assert_eq!(params.verify_code, "");
    }

    #[test]
    fn test_parse_page_seven_arguments() {
        let params = parse_page(PAGE_SEVEN).unwrap();
        assert_eq!(params.user_id, "12345");
        assert_eq!(params.file_id, "111");
        // the empty quoted argument yields no token, so the code sits at index 5
        assert_eq!(params.verify_code, "");

        let html = "var userid = 9; free_down(111,222,abc,1,0,x,verify123)";
        let params = parse_page(html).unwrap();
        assert_eq!(params.user_id, "9");
        assert_eq!(params.mobile_flag, "1");
        assert_eq!(params.verify_code, "verify123");
    }

    #[test]
    fn test_parse_page_mixed_case_tokens() {
        let html = "var userid = '5'; free_down(111,222,'AbC9xZ',0,0,'',Verify7)";
        let params = parse_page(html).unwrap();
        assert_eq!(params.file_checksum, "AbC9xZ");
        assert_eq!(params.mobile_flag, "0");
        assert_eq!(params.app_flag, "0");
        // '' yields no token, leaving Verify7 at the ignored index
        assert_eq!(params.verify_code, "");

        let html = "var userid = '5'; free_down(111,222,AbC,0,0,x,Verify7)";
        assert_eq!(parse_page(html).unwrap().verify_code, "Verify7");
    }

    #[test]
    fn test_parse_page_missing_userid() {
        let err = parse_page("free_down(111,222,abc,0,0)").unwrap_err();
        assert!(matches!(err, CtError::Resolution(_)));
        assert!(err.to_string().contains("userid"));
    }

    #[test]
    fn test_parse_page_missing_free_down() {
        let err = parse_page("var userid = '1';").unwrap_err();
        assert!(err.to_string().contains("free_down"));
    }

    #[test]
    fn test_parse_metadata() {
        let params = parse_metadata(&json!({
            "userid": 12345,
            "file_id": "111",
            "file_chk": "abc",
            "folder_id": 222
        }))
        .unwrap();
        assert_eq!(params.user_id, "12345");
        assert_eq!(params.file_id, "111");
        assert_eq!(params.folder_id, "222");
        assert_eq!(params.file_checksum, "abc");
        assert_eq!(params.mobile_flag, "0");
        assert_eq!(params.app_flag, "0");
        assert_eq!(params.verify_code, "");
    }

    #[test]
    fn test_parse_metadata_optional_folder() {
        let params =
            parse_metadata(&json!({"userid": "1", "file_id": "2", "file_chk": "c"})).unwrap();
        assert_eq!(params.folder_id, "");
    }

    #[test]
    fn test_parse_metadata_missing_file_chk() {
        let err = parse_metadata(&json!({"userid": "1", "file_id": "2"})).unwrap_err();
        assert!(matches!(err, CtError::Resolution(_)));
        assert!(err.to_string().contains("file_chk"));

        let err = parse_metadata(&json!({"userid": "1", "file_id": "2", "file_chk": ""}))
            .unwrap_err();
        assert!(matches!(err, CtError::Resolution(_)));
    }

    #[test]
    fn test_parse_metadata_unusable_values() {
        let err = parse_metadata(&json!({"userid": "1", "file_id": "2", "file_chk": true}))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Resolution);

        let err = parse_metadata(&json!({"userid": {"id": 1}, "file_id": "2", "file_chk": "c"}))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Resolution);

        let err = parse_metadata(&json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Resolution);
    }

    #[test]
    fn test_metadata_url() {
        let resolver = MetadataApiResolver::new(
            ShareClient::new().unwrap(),
            Url::parse("https://webapi.400gb.com").unwrap(),
        );
        assert_eq!(
            resolver.metadata_url("XYZ").unwrap().as_str(),
            "https://webapi.400gb.com/getfile.php?f=XYZ&passcode=&ref="
        );
    }

    #[tokio::test]
    async fn test_metadata_resolver_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/getfile.php")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("f".into(), "XYZ".into()),
                mockito::Matcher::UrlEncoded("passcode".into(), "".into()),
            ]))
            .match_header("accept", "application/json")
            .with_body(r#"{"userid":"7","file_id":"8","file_chk":"chk","folder_id":"9"}"#)
            .create_async()
            .await;

        let resolver = MetadataApiResolver::new(
            ShareClient::new().unwrap(),
            Url::parse(&server.url()).unwrap(),
        );
        let share = ShareReference::parse("https://abc.400gb.com/i/123/f/XYZ?foo=bar").unwrap();
        let params = resolver.resolve(&share).await.unwrap();
        assert_eq!(params.user_id, "7");
        assert_eq!(params.folder_id, "9");
        assert_eq!(
            resolver.link_api_base(&share).as_str(),
            "https://abc.400gb.com/"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_page_resolver_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/f/abc")
            .with_header("content-type", "text/html")
            .with_body("var userid = '42';\nfree_down(1,2,chk,0,0)")
            .create_async()
            .await;

        let resolver = PageScrapeResolver::new(ShareClient::new().unwrap()).with_user_agent("ua");
        let share = ShareReference::parse(&format!("{}/f/abc", server.url())).unwrap();
        let params = resolver.resolve(&share).await.unwrap();
        assert_eq!(params.user_id, "42");
        assert_eq!(params.file_checksum, "chk");
        assert_eq!(resolver.link_api_base(&share), share.origin());
    }
}
