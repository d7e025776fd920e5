use serde::Deserialize;

/// JSON embedded in the player box of a video page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerParams {
    pub api_token: String,
    /// Player configuration resource for this video.
    pub content: String,
}

pub(super) const REL_BRAND: &str = "http://zdf.de/rels/brand";
pub(super) const REL_TARGET: &str = "http://zdf.de/rels/target";
pub(super) const REL_PTMD_TEMPLATE: &str = "http://zdf.de/rels/streams/ptmd-template";
pub(super) const MAIN_VIDEO_CONTENT: &str = "mainVideoContent";
pub(super) const PLAYER_ID_PLACEHOLDER: &str = "{playerId}";

/// Manifest formats worth considering; everything else is skipped.
pub(super) const PLAYABLE_MIME_TYPES: &[&str] = &["video/mp4", "application/x-mpegURL"];
