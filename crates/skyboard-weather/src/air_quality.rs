//! Air-quality index classification.

use serde::{Deserialize, Serialize};

use crate::types::{PollutionReading, RawPollution};

/// AQI bands reported by the provider (1 = best, 5 = worst)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiLevel {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    Unknown,
}

/// Colour tier used by the dashboard to tint the AQI badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorTier {
    Positive,
    LightGreen,
    Warning,
    Orange,
    Negative,
    Grey,
}

impl AqiLevel {
    /// Any index outside 1..=5 is `Unknown`
    pub fn from_index(aqi: i64) -> Self {
        match aqi {
            1 => Self::Good,
            2 => Self::Fair,
            3 => Self::Moderate,
            4 => Self::Poor,
            5 => Self::VeryPoor,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
            Self::Unknown => "Unknown",
        }
    }

    pub fn color_tier(&self) -> ColorTier {
        match self {
            Self::Good => ColorTier::Positive,
            Self::Fair => ColorTier::LightGreen,
            Self::Moderate => ColorTier::Warning,
            Self::Poor => ColorTier::Orange,
            Self::VeryPoor => ColorTier::Negative,
            Self::Unknown => ColorTier::Grey,
        }
    }
}

/// Label and colour for an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiClass {
    pub label: &'static str,
    pub color_tier: ColorTier,
}

/// Classify a raw index. Defined for every integer.
pub fn classify(aqi: i64) -> AqiClass {
    let level = AqiLevel::from_index(aqi);
    AqiClass {
        label: level.label(),
        color_tier: level.color_tier(),
    }
}

/// Attach the classification to a provider record.
pub fn annotate(raw: &RawPollution) -> PollutionReading {
    let class = classify(raw.aqi);
    if class.color_tier == ColorTier::Grey {
        tracing::warn!("Provider sent out-of-range AQI {}", raw.aqi);
    }
    PollutionReading {
        timestamp: raw.timestamp,
        aqi: raw.aqi,
        label: class.label.to_string(),
        color_tier: class.color_tier,
        components: raw.components,
    }
}
