//! Resolve-then-fetch pipeline

use crate::core::result::DownloadResult;
use crate::error::CtError;
use crate::platform::agents::{render_agent, ShuffleMode, UserAgentPool, DEFAULT_AGENT_COUNT};
use crate::platform::client::{HttpClientConfig, ShareClient, DEFAULT_API_SERVER};
use crate::platform::links::{LinkFetcher, LinkSink};
use crate::platform::resolver::{MetadataApiResolver, PageScrapeResolver, ParameterResolver};
use crate::utils::ShareReference;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Which site generation to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Scrape the share page
    PageScrape,
    /// Query `getfile.php`
    #[default]
    MetadataApi,
}

/// Options for building a [`LinkExtractor`]
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Resolution strategy
    pub strategy: Strategy,
    /// Number of user agents to rotate through
    pub agent_count: usize,
    /// Shuffle the agent pool
    pub shuffle: ShuffleMode,
    /// Metadata API server
    pub api_server: String,
    /// `Origin` header value
    pub origin: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Proxy URL
    pub proxy_url: Option<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        let http = HttpClientConfig::default();
        Self {
            strategy: Strategy::default(),
            agent_count: DEFAULT_AGENT_COUNT,
            shuffle: ShuffleMode::default(),
            api_server: DEFAULT_API_SERVER.to_string(),
            origin: http.origin,
            timeout: http.timeout,
            proxy_url: None,
        }
    }
}

/// Rendered first agent of the pool, used for the resolver's request
fn first_agent(pool: &UserAgentPool) -> Option<String> {
    pool.agents()
        .first()
        .map(|template| render_agent(template, &mut rand::thread_rng()))
}

/// Runs a resolver and then a link fetcher
pub struct LinkExtractor {
    resolver: Box<dyn ParameterResolver>,
    fetcher: LinkFetcher,
}

impl LinkExtractor {
    /// Combine an existing resolver and fetcher
    pub fn new(resolver: Box<dyn ParameterResolver>, fetcher: LinkFetcher) -> Self {
        Self { resolver, fetcher }
    }

    /// Build resolver, fetcher and HTTP client from options
    pub fn from_options(options: &ExtractOptions) -> Result<Self, CtError> {
        if options.agent_count == 0 {
            return Err(CtError::Config(
                "at least one user agent is required".to_string(),
            ));
        }

        let client = ShareClient::with_config(HttpClientConfig {
            timeout: options.timeout,
            proxy_url: options.proxy_url.clone(),
            origin: options.origin.clone(),
        })?;
        let pool = UserAgentPool::builtin(options.shuffle);
        let resolver_agent = first_agent(&pool);

        let resolver: Box<dyn ParameterResolver> = match options.strategy {
            Strategy::PageScrape => {
                let mut resolver = PageScrapeResolver::new(client.clone());
                if let Some(agent) = &resolver_agent {
                    resolver = resolver.with_user_agent(agent.as_str());
                }
                Box::new(resolver)
            }
            Strategy::MetadataApi => {
                let api_server = Url::parse(&options.api_server).map_err(|e| {
                    CtError::InvalidUrl(format!("API server {}: {}", options.api_server, e))
                })?;
                let mut resolver = MetadataApiResolver::new(client.clone(), api_server);
                if let Some(agent) = &resolver_agent {
                    resolver = resolver.with_user_agent(agent.as_str());
                }
                Box::new(resolver)
            }
        };

        let fetcher = LinkFetcher::new(client, pool, options.agent_count);
        Ok(Self::new(resolver, fetcher))
    }

    /// Number of direct-link requests a run will issue
    pub fn agent_count(&self) -> usize {
        self.fetcher.agent_count()
    }

    /// Resolve parameters, then query the direct-link API.
    ///
    /// A resolution failure returns before any direct-link request is made.
    pub async fn run(
        &self,
        share: &ShareReference,
        sink: &mut dyn LinkSink,
    ) -> Result<DownloadResult, CtError> {
        let params = self.resolver.resolve(share).await?;
        info!("Resolved via {}: {}", self.resolver.name(), params);

        let base = self.resolver.link_api_base(share);
        self.fetcher.fetch_links(&params, share, &base, sink).await
    }
}
