use serde::{Deserialize, Serialize};
use std::time::Duration;

pub(crate) const DEFAULT_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Knobs of the resolution pipeline. Every field has a working default, so a
/// config file only needs to name what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Site root, used to absolutize catalog links.
    pub base_uri: String,
    /// Prefix for path-only stream manifest templates.
    pub api_base_uri: String,
    /// Substituted for `{playerId}` in the manifest template.
    pub player_id: String,
    /// Versioned media type pinned on modern API requests.
    pub api_accept: String,
    /// Header carrying the bearer token.
    pub auth_header: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub unavailable_marker: String,
    pub preview_marker: String,
    /// URIs containing any of these are skipped by the legacy adapter.
    pub broken_host_markers: Vec<String>,
    /// Start of the stream name inside an rtmp URI.
    pub stream_name_marker: String,
    /// Sibling videos resolved at once during catalog traversal.
    pub catalog_concurrency: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_uri: "https://www.zdf.de".to_string(),
            api_base_uri: "https://api.zdf.de".to_string(),
            player_id: "ngplayer_2_3".to_string(),
            api_accept: "application/vnd.de.zdf.v1.0+json".to_string(),
            auth_header: "Api-Auth".to_string(),
            user_agent: DEFAULT_UA.to_string(),
            request_timeout_secs: 30,
            unavailable_marker: "Video leider nicht mehr verfügbar".to_string(),
            preview_marker: "<strong>Vorab</strong>".to_string(),
            broken_host_markers: vec!["wstreaming.zdf.de".to_string()],
            stream_name_marker: "mp4:".to_string(),
            catalog_concurrency: 4,
        }
    }
}

impl ResolverConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Makes a site-relative link absolute against `base_uri`.
    pub fn absolutize(&self, link: &str) -> String {
        let link = link.trim();
        if link.starts_with('/') {
            format!("{}{}", self.base_uri.trim_end_matches('/'), link)
        } else {
            link.to_string()
        }
    }
}
