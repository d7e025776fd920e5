use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Descriptive metadata of a video page. Every field is best-effort.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published: Option<DateTime<FixedOffset>>,
    /// Duration in seconds
    pub duration: Option<u64>,
    pub thumbnail: Option<String>,
}
