//! Share URL parsing

use crate::error::CtError;
use std::fmt;
use url::Url;

/// A parsed share link, e.g. `https://abc.400gb.com/i/123/f/XYZ`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareReference {
    raw: String,
    url: Url,
}

impl ShareReference {
    /// Parse a share URL given on the command line
    pub fn parse(raw: &str) -> Result<Self, CtError> {
        let raw = raw.trim();
        let url = Url::parse(raw)?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CtError::InvalidUrl(format!(
                    "Unsupported scheme '{}' in {}",
                    other, raw
                )))
            }
        }
        if url.host_str().is_none() {
            return Err(CtError::InvalidUrl(format!("Missing host in {}", raw)));
        }

        Ok(Self {
            raw: raw.to_string(),
            url,
        })
    }

    /// The URL exactly as given (used as `Referer`)
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed form
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    /// Scheme, host and port with an empty path
    pub fn origin(&self) -> Url {
        let mut origin = self.url.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);
        origin
    }

    /// File query key: the last path segment once the query string is dropped
    pub fn query_key(&self) -> Result<String, CtError> {
        query_key(&self.raw)
    }
}

impl fmt::Display for ShareReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Extract the file query key from a share URL
pub fn query_key(url: &str) -> Result<String, CtError> {
    let parsed = Url::parse(url.trim())?;
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
        .map(|segment| segment.to_string())
        .ok_or_else(|| CtError::InvalidUrl(format!("No file key in {}", url)))
}

/// `Host` header value for a URL, including a non-default port
pub fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
