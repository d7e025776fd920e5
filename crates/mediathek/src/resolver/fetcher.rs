use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rustls::ClientConfig;
use rustls::crypto::aws_lc_rs;
use rustls_platform_verifier::BuilderVerifierExt;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::resolver::error::ResolveError;

/// Retrieves raw page content. Timeouts and retries belong to implementors.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn get(&self, uri: &str, headers: &HeaderMap) -> Result<String, ResolveError>;
}

/// `ContentFetcher` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ResolverConfig) -> Result<Self, ResolveError> {
        Ok(Self {
            client: default_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn get(&self, uri: &str, headers: &HeaderMap) -> Result<String, ResolveError> {
        let response = self.client.get(uri).headers(headers.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Fetch {
                uri: uri.to_string(),
                reason: format!("http status {status}"),
            });
        }
        Ok(response.text().await?)
    }
}

pub fn default_client(config: &ResolverConfig) -> Result<Client, ResolveError> {
    let provider = Arc::new(aws_lc_rs::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ResolveError::TlsError(e.to_string()))?
        .with_platform_verifier()
        .map_err(|e| ResolveError::TlsError(e.to_string()))?
        .with_no_client_auth();

    Ok(Client::builder()
        .use_preconfigured_tls(tls_config)
        .timeout(config.request_timeout())
        .build()?)
}

/// Headers a desktop browser would send for a page request.
pub fn browser_headers(config: &ResolverConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert_header(&mut headers, reqwest::header::USER_AGENT.as_str(), &config.user_agent);
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("de-DE,de;q=0.8,en-US;q=0.5,en;q=0.3"),
    );
    headers
}

/// Inserts a header, skipping names or values that are not valid HTTP.
pub fn insert_header(headers: &mut HeaderMap, key: &str, value: &str) {
    match HeaderName::from_str(key) {
        Ok(name) => match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(e) => {
                debug!(error = %e, header = key, "Invalid header value; skipping");
            }
        },
        Err(e) => {
            debug!(error = %e, "Invalid header name; skipping");
        }
    }
}

/// Fetcher plus cancellation for a single resolution.
///
/// A cancelled context refuses to start further fetches, so a pipeline never
/// proceeds to its next network stage once the caller gave up.
#[derive(Clone)]
pub struct FetchContext {
    fetcher: Arc<dyn ContentFetcher>,
    cancel: CancellationToken,
}

impl FetchContext {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, cancel: CancellationToken) -> Self {
        Self { fetcher, cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn ensure_active(&self) -> Result<(), ResolveError> {
        if self.cancel.is_cancelled() {
            Err(ResolveError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub async fn fetch(&self, uri: &str, headers: &HeaderMap) -> Result<String, ResolveError> {
        self.ensure_active()?;
        debug!(uri, "Fetching");
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ResolveError::Cancelled),
            body = self.fetcher.get(uri, headers) => body,
        }
    }
}
