//! Direct-link API client with user agent rotation

use crate::core::params::FileParameters;
use crate::core::result::{AttemptOutcome, AttemptStatus, DownloadResult};
use crate::error::CtError;
use crate::platform::agents::{render_agent, UserAgentPool};
use crate::platform::client::{RequestHeaders, ShareClient};
use crate::utils::ShareReference;
use rand::Rng;
use std::io::Write;
use tracing::{debug, info, warn};
use url::Url;

/// Direct-link endpoint, relative to the API base
pub const LINK_ENDPOINT: &str = "get_file_url.php";

/// Build the `get_file_url.php` request URL.
///
/// `fid` is sent twice, matching what the site's own client does.
pub fn build_link_url(base: &Url, params: &FileParameters, nonce: f64) -> Result<Url, CtError> {
    let mut url = base.join(LINK_ENDPOINT)?;
    url.query_pairs_mut()
        .append_pair("uid", &params.user_id)
        .append_pair("fid", &params.file_id)
        .append_pair("folder_id", &params.folder_id)
        .append_pair("fid", &params.file_id)
        .append_pair("file_chk", &params.file_checksum)
        .append_pair("mb", &params.mobile_flag)
        .append_pair("app", &params.app_flag)
        .append_pair("verifycode", &params.verify_code)
        .append_pair("rd", &format!("{:.6}", nonce));
    Ok(url)
}

/// Read `downurl` from a direct-link API response
pub fn extract_download_url(data: &serde_json::Value) -> Option<String> {
    data.get("downurl")
        .and_then(|value| value.as_str())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// Queries the direct-link API once per user agent
pub struct LinkFetcher {
    client: ShareClient,
    pool: UserAgentPool,
    agent_count: usize,
}

impl LinkFetcher {
    /// Create a fetcher using the first `agent_count` agents of `pool`
    pub fn new(client: ShareClient, pool: UserAgentPool, agent_count: usize) -> Self {
        if agent_count > pool.len() {
            warn!(
                "Requested {} user agents but the pool holds {}, using {}",
                agent_count,
                pool.len(),
                pool.len()
            );
        }
        let agent_count = agent_count.min(pool.len());

        Self {
            client,
            pool,
            agent_count,
        }
    }

    /// Number of requests a run issues
    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    /// Agents a run uses, in request order
    pub fn agents(&self) -> &[String] {
        self.pool.take(self.agent_count)
    }

    /// Query every agent with a fresh nonce, streaming links into `sink`
    pub async fn fetch_links(
        &self,
        params: &FileParameters,
        share: &ShareReference,
        base: &Url,
        sink: &mut dyn LinkSink,
    ) -> Result<DownloadResult, CtError> {
        let nonce: f64 = rand::thread_rng().gen();
        self.fetch_links_with_nonce(params, share, base, nonce, sink).await
    }

    /// Query every agent using `nonce` as the `rd` parameter
    pub async fn fetch_links_with_nonce(
        &self,
        params: &FileParameters,
        share: &ShareReference,
        base: &Url,
        nonce: f64,
        sink: &mut dyn LinkSink,
    ) -> Result<DownloadResult, CtError> {
        params.validate()?;
        let url = build_link_url(base, params, nonce)?;
        debug!("Direct-link request: {}", url);

        let mut result = DownloadResult::default();
        for (index, template) in self.agents().iter().enumerate() {
            let user_agent = render_agent(template, &mut rand::thread_rng());
            sink.attempt_started(index, &user_agent);

            let status = match self.query(&url, &user_agent, share).await {
                Ok(Some(link)) => {
                    info!("Agent #{} returned a link", index + 1);
                    sink.emit(&link)?;
                    AttemptStatus::Found(link)
                }
                Ok(None) => {
                    debug!("Agent #{} returned no downurl", index + 1);
                    AttemptStatus::NoLink
                }
                Err(e) => {
                    warn!("Agent #{} failed: {}", index + 1, e);
                    AttemptStatus::Failed(e)
                }
            };

            let outcome = AttemptOutcome {
                index,
                user_agent,
                status,
            };
            sink.attempt_finished(&outcome);
            result.record(outcome);
        }

        Ok(result)
    }

    /// One request in its own failure boundary
    async fn query(
        &self,
        url: &Url,
        user_agent: &str,
        share: &ShareReference,
    ) -> Result<Option<String>, CtError> {
        let headers = RequestHeaders {
            user_agent: Some(user_agent),
            referer: Some(share.as_str()),
        };
        let data = self.client.get_json(url, &headers).await?;
        Ok(extract_download_url(&data))
    }
}

/// Receives links as soon as they are found
pub trait LinkSink {
    /// Write one discovered link
    fn emit(&mut self, link: &str) -> Result<(), CtError>;

    /// Called before each request
    fn attempt_started(&mut self, _index: usize, _user_agent: &str) {}

    /// Called after each request
    fn attempt_finished(&mut self, _outcome: &AttemptOutcome) {}
}

/// Tab-separated link stream over any writer
pub struct TabSeparated<W: Write> {
    writer: W,
}

impl<W: Write> TabSeparated<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LinkSink for TabSeparated<W> {
    fn emit(&mut self, link: &str) -> Result<(), CtError> {
        write!(self.writer, "{}\t", link)?;
        self.writer.flush()?;
        Ok(())
    }
}
