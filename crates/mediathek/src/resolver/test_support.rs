use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::resolver::error::ResolveError;
use crate::resolver::fetcher::{ContentFetcher, FetchContext};

/// Serves canned bodies by URI and records every request.
#[derive(Default)]
pub(crate) struct StaticFetcher {
    responses: FxHashMap<String, String>,
    requests: Mutex<Vec<(String, HeaderMap)>>,
}

impl StaticFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, uri: &str, body: &str) -> Self {
        self.responses.insert(uri.to_string(), body.to_string());
        self
    }

    pub(crate) fn requests(&self) -> Vec<(String, HeaderMap)> {
        self.requests.lock().clone()
    }

    pub(crate) fn requested_uris(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(uri, _)| uri.clone()).collect()
    }

    pub(crate) fn into_context(self) -> (Arc<Self>, FetchContext) {
        let fetcher = Arc::new(self);
        let ctx = FetchContext::new(fetcher.clone(), CancellationToken::new());
        (fetcher, ctx)
    }
}

#[async_trait]
impl ContentFetcher for StaticFetcher {
    async fn get(&self, uri: &str, headers: &HeaderMap) -> Result<String, ResolveError> {
        self.requests.lock().push((uri.to_string(), headers.clone()));
        self.responses
            .get(uri)
            .cloned()
            .ok_or_else(|| ResolveError::Fetch {
                uri: uri.to_string(),
                reason: "http status 404 Not Found".to_string(),
            })
    }
}
