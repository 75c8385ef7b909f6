use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    config::{AppConfig, ProviderConfig},
    server::utils::locator_utils::ResourceLocator,
};

use super::relay_services::{DynUpstreamFetcher, ReqwestFetcher, StreamRelay};

/// everything a handler needs, cloned into each request through an Extension
#[derive(Clone)]
pub struct AppServices {
    pub locator: Arc<ResourceLocator>,
    pub relay: Arc<StreamRelay>,
    pub provider_host: String,
    pub config: Arc<AppConfig>,
}

impl AppServices {
    pub fn new(config: Arc<AppConfig>, shutdown: CancellationToken) -> anyhow::Result<Self> {
        info!("starting relay services...");

        let provider = config.provider()?;
        let fetcher = Arc::new(ReqwestFetcher::new(config.upstream_timeout())?) as DynUpstreamFetcher;

        info!(
            "provider config ok ({:?}), upstream timeout {}s",
            provider, config.upstream_timeout_secs
        );

        Ok(Self::with_fetcher(config, provider, fetcher, shutdown))
    }

    /// same wiring with a caller supplied fetcher, the tests use this for fake providers
    pub fn with_fetcher(
        config: Arc<AppConfig>,
        provider: ProviderConfig,
        fetcher: DynUpstreamFetcher,
        shutdown: CancellationToken,
    ) -> Self {
        let provider_host = provider.base_url.host_str().unwrap_or_default().to_string();

        Self {
            locator: Arc::new(ResourceLocator::new(provider)),
            relay: Arc::new(StreamRelay::new(fetcher, shutdown)),
            provider_host,
            config,
        }
    }
}
