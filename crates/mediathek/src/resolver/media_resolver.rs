use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::config::ResolverConfig;
use crate::media::{StreamDescriptor, VideoInfo};
use crate::resolver::adapters::{BackendAdapter, BackendKind, PageContent};
use crate::resolver::capabilities::CapabilitySnapshot;
use crate::resolver::error::ResolveError;
use crate::resolver::fetcher::{ContentFetcher, FetchContext, browser_headers};
use crate::resolver::ranking::QualityRanking;

const RTMP_SCHEME: &str = "rtmp";

/// The single stream picked for a page.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub stream: StreamDescriptor,
    /// Play path for rtmp servers, starting at the stream name marker.
    pub stream_name: Option<String>,
    pub video: VideoInfo,
}

/// Runs one deployment's adapter and picks the best playable stream.
pub struct MediaResolver {
    adapter: Box<dyn BackendAdapter>,
    fetcher: Arc<dyn ContentFetcher>,
    config: ResolverConfig,
}

impl MediaResolver {
    pub fn new(kind: BackendKind, config: ResolverConfig, fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self::with_adapter(kind.adapter(config.clone()), config, fetcher)
    }

    pub fn with_adapter(
        adapter: Box<dyn BackendAdapter>,
        config: ResolverConfig,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> Self {
        Self {
            adapter,
            fetcher,
            config,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.adapter.kind()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub async fn resolve(
        &self,
        page: &PageContent,
        capabilities: &CapabilitySnapshot,
    ) -> Result<Resolution, ResolveError> {
        self.resolve_with_cancel(page, capabilities, CancellationToken::new())
            .await
    }

    #[instrument(skip(self, page, capabilities, cancel), fields(uri = %page.uri, backend = %self.kind()), level = "debug")]
    pub async fn resolve_with_cancel(
        &self,
        page: &PageContent,
        capabilities: &CapabilitySnapshot,
        cancel: CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        let ctx = FetchContext::new(self.fetcher.clone(), cancel);
        let extraction = self.adapter.extract(page, &ctx).await?;

        let stream = Self::select(extraction.descriptors, capabilities)?;
        let stream_name = self.stream_name(&stream);
        debug!(%stream, ?stream_name, "Selected stream");

        Ok(Resolution {
            stream,
            stream_name,
            video: extraction.video,
        })
    }

    /// Fetches the page itself before resolving it.
    pub async fn resolve_uri(
        &self,
        uri: &str,
        capabilities: &CapabilitySnapshot,
    ) -> Result<Resolution, ResolveError> {
        self.resolve_uri_with_cancel(uri, capabilities, CancellationToken::new())
            .await
    }

    pub async fn resolve_uri_with_cancel(
        &self,
        uri: &str,
        capabilities: &CapabilitySnapshot,
        cancel: CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        let ctx = FetchContext::new(self.fetcher.clone(), cancel.clone());
        let body = ctx.fetch(uri, &browser_headers(&self.config)).await?;
        self.resolve_with_cancel(&PageContent::new(uri, body), capabilities, cancel)
            .await
    }

    fn select(
        descriptors: Vec<StreamDescriptor>,
        capabilities: &CapabilitySnapshot,
    ) -> Result<StreamDescriptor, ResolveError> {
        let total = descriptors.len();
        let playable: Vec<_> = descriptors
            .into_iter()
            .filter(|d| capabilities.supports(&d.scheme()))
            .collect();
        debug!(
            total,
            playable = playable.len(),
            version = capabilities.version(),
            "Filtered candidates"
        );

        QualityRanking::best(playable).ok_or(ResolveError::NoPlayableStream)
    }

    fn stream_name(&self, stream: &StreamDescriptor) -> Option<String> {
        if stream.scheme() != RTMP_SCHEME {
            return None;
        }
        stream
            .uri
            .find(&self.config.stream_name_marker)
            .map(|start| stream.uri[start..].to_string())
    }
}
