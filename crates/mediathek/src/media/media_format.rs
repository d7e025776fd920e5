use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoding container of a stream.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Mp4,
    #[serde(rename = "3gp")]
    ThreeGp,
    Flv,
    Webm,
    Hls,
}

impl ContainerFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::ThreeGp => "3gp",
            ContainerFormat::Flv => "flv",
            ContainerFormat::Webm => "webm",
            ContainerFormat::Hls => "hls",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "mp4" | "m4v" => Some(ContainerFormat::Mp4),
            "3gp" => Some(ContainerFormat::ThreeGp),
            "flv" => Some(ContainerFormat::Flv),
            "webm" => Some(ContainerFormat::Webm),
            "hls" | "m3u8" => Some(ContainerFormat::Hls),
            _ => None,
        }
    }

    /// Infers the container from the file suffix of a URI, ignoring any
    /// query string or fragment.
    pub fn from_uri_suffix(uri: &str) -> Option<Self> {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        let file = path.rsplit('/').next().unwrap_or(path);
        let (_, suffix) = file.rsplit_once('.')?;
        Self::from_token(suffix)
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "video/mp4" => Some(ContainerFormat::Mp4),
            "video/3gpp" => Some(ContainerFormat::ThreeGp),
            "video/webm" => Some(ContainerFormat::Webm),
            "video/x-flv" => Some(ContainerFormat::Flv),
            "application/x-mpegURL" | "application/vnd.apple.mpegurl" => {
                Some(ContainerFormat::Hls)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
