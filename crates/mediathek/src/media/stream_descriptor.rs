use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::media::{ContainerFormat, QualityTier};
use crate::resolver::error::ResolveError;

/// One candidate media stream, normalized from whichever backend produced it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    // Absolute locator, never empty
    pub uri: String,
    // None when the backend only exposes it through an unrecognized suffix
    pub container_format: Option<ContainerFormat>,
    // 0 when unknown
    pub pixel_height: u32,
    pub quality_tier: QualityTier,
}

impl StreamDescriptor {
    pub fn builder(uri: impl Into<String>, quality_tier: QualityTier) -> StreamDescriptorBuilder {
        StreamDescriptorBuilder::new(uri, quality_tier)
    }

    /// Scheme of the URI, lowercased (`http`, `https`, `rtmp`, ...).
    pub fn scheme(&self) -> String {
        self.uri
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.container_format {
            Some(format) => write!(
                f,
                "{} {} {}p {}",
                self.quality_tier, format, self.pixel_height, self.uri
            ),
            None => write!(f, "{} {}p {}", self.quality_tier, self.pixel_height, self.uri),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamDescriptorBuilder {
    uri: String,
    container_format: Option<ContainerFormat>,
    pixel_height: u32,
    quality_tier: QualityTier,
}

impl StreamDescriptorBuilder {
    pub fn new(uri: impl Into<String>, quality_tier: QualityTier) -> Self {
        Self {
            uri: uri.into(),
            container_format: None,
            pixel_height: 0,
            quality_tier,
        }
    }

    pub fn container_format(mut self, format: ContainerFormat) -> Self {
        self.container_format = Some(format);
        self
    }

    pub fn container_format_opt(mut self, format: Option<ContainerFormat>) -> Self {
        self.container_format = format;
        self
    }

    pub fn pixel_height(mut self, height: u32) -> Self {
        self.pixel_height = height;
        self
    }

    /// Fails when the URI is empty or not absolute.
    pub fn build(self) -> Result<StreamDescriptor, ResolveError> {
        let uri = self.uri.trim();
        if uri.is_empty() {
            return Err(ResolveError::InvalidUrl("empty stream uri".to_string()));
        }
        Url::parse(uri)?;

        Ok(StreamDescriptor {
            uri: uri.to_string(),
            container_format: self.container_format,
            pixel_height: self.pixel_height,
            quality_tier: self.quality_tier,
        })
    }
}
