use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::resolver::error::ResolveError;

/// Backend quality vocabulary, ordered from worst to best.
///
/// Both backend generations map into this enum. The legacy API never reports
/// `Hd`, the modern one may.
#[derive(
    Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    High,
    VeryHigh,
    Hd,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
            QualityTier::VeryHigh => "veryhigh",
            QualityTier::Hd => "hd",
        }
    }
}

impl FromStr for QualityTier {
    type Err = ResolveError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim() {
            "low" => Ok(QualityTier::Low),
            "medium" => Ok(QualityTier::Medium),
            "high" => Ok(QualityTier::High),
            "veryhigh" => Ok(QualityTier::VeryHigh),
            "hd" => Ok(QualityTier::Hd),
            other => Err(ResolveError::UnknownQualityLabel(other.to_string())),
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
