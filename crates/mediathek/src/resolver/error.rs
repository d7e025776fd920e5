use chrono::{DateTime, FixedOffset};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("player configuration not found in page")]
    ConfigNotFound,
    #[error("video unavailable: {0}")]
    VideoUnavailable(String),
    #[error("video not yet available, broadcast is on {airtime}")]
    NotYetAired { airtime: DateTime<FixedOffset> },
    #[error("no video available")]
    NoVideoAvailable,
    #[error("backend returned status {status}: {debug}")]
    BackendError { status: String, debug: String },
    #[error("manifest error for {uri}: {reason}")]
    ManifestParseError { uri: String, reason: String },
    #[error("no playable stream found")]
    NoPlayableStream,
    #[error("unknown quality label: {0}")]
    UnknownQualityLabel(String),
    #[error("fetch of {uri} failed: {reason}")]
    Fetch { uri: String, reason: String },
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("xml error: {0}")]
    XmlError(String),
    #[error("unexpected document structure: {0}")]
    Structure(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("tls error: {0}")]
    TlsError(String),
    #[error("resolution cancelled")]
    Cancelled,
}

impl ResolveError {
    /// Content that is intentionally absent (pulled, not yet aired, no video
    /// attached), as opposed to a parsing or transport failure.
    pub fn is_content_unavailable(&self) -> bool {
        matches!(
            self,
            ResolveError::VideoUnavailable(_)
                | ResolveError::NotYetAired { .. }
                | ResolveError::NoVideoAvailable
        )
    }

    pub(crate) fn manifest(uri: impl Into<String>, reason: impl ToString) -> Self {
        ResolveError::ManifestParseError {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<quick_xml::Error> for ResolveError {
    fn from(e: quick_xml::Error) -> Self {
        ResolveError::XmlError(e.to_string())
    }
}

impl From<url::ParseError> for ResolveError {
    fn from(e: url::ParseError) -> Self {
        ResolveError::InvalidUrl(e.to_string())
    }
}
