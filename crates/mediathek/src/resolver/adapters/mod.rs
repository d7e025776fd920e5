use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::media::{StreamDescriptor, VideoInfo};
use crate::resolver::error::ResolveError;
use crate::resolver::fetcher::FetchContext;

pub mod legacy;
pub mod modern;

pub use legacy::LegacyXmlAdapter;
pub use modern::ModernJsonAdapter;

/// A fetched video page.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub uri: String,
    pub body: String,
}

impl PageContent {
    pub fn new(uri: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            body: body.into(),
        }
    }
}

/// Unordered candidates plus whatever page metadata the backend exposed.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub descriptors: Vec<StreamDescriptor>,
    pub video: VideoInfo,
}

/// API generation a deployment talks to. Known statically, never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Legacy,
    #[default]
    Modern,
}

impl BackendKind {
    pub fn adapter(self, config: ResolverConfig) -> Box<dyn BackendAdapter> {
        match self {
            BackendKind::Legacy => Box::new(LegacyXmlAdapter::new(config)),
            BackendKind::Modern => Box::new(ModernJsonAdapter::new(config)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Legacy => f.write_str("legacy"),
            BackendKind::Modern => f.write_str("modern"),
        }
    }
}

/// Turns one video page, plus the secondary fetches it triggers, into stream
/// candidates.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn extract(
        &self,
        page: &PageContent,
        ctx: &FetchContext,
    ) -> Result<Extraction, ResolveError>;
}

/// Future broadcasts are only playable when the page flags them as an early
/// web release.
pub(crate) fn check_airtime(
    config: &ResolverConfig,
    published: Option<DateTime<FixedOffset>>,
    body: &str,
    now: DateTime<Utc>,
) -> Result<(), ResolveError> {
    match published {
        Some(airtime) if airtime > now => {
            if body.contains(&config.preview_marker) {
                debug!(%airtime, "Early web release ahead of broadcast");
                Ok(())
            } else {
                Err(ResolveError::NotYetAired { airtime })
            }
        }
        _ => Ok(()),
    }
}
