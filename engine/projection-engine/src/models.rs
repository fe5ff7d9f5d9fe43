use curve_stats::{Curve, TailResolution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One player's row as supplied by a record source, before any derivation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProjectionRecord {
    /// Stable player id (e.g., "patrick-mahomes")
    pub id: String,
    /// Player name as it appears in the table
    pub name: String,
    pub team: Option<String>,
    pub position: Option<String>,
    /// Mean simulated points
    pub mean: Option<f64>,
    /// Median simulated points
    pub median: Option<f64>,
    /// Ceiling supplied by the source; skips curve derivation when present
    pub ceiling: Option<f64>,
    /// Raw curve: a JSON array of points or a string holding one
    pub curve: Option<serde_json::Value>,
    /// Extra numeric columns passed through untouched
    #[serde(default)]
    pub extras: BTreeMap<String, Option<f64>>,
}

/// Identity fields for the player list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl From<&RawProjectionRecord> for PlayerSummary {
    fn from(record: &RawProjectionRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            team: record.team.clone(),
            position: record.position.clone(),
        }
    }
}

/// Derived summary for one player.
///
/// Built whole from the latest raw record; a recomputation replaces it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub id: String,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub ceiling: Option<f64>,
    /// How the ceiling was derived; absent when supplied or unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ceiling_resolution: Option<TailResolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<f64>,
    /// Normalized survival curve, serialized as `{x, cdf}` chart points
    pub curve: Curve,
    #[serde(flatten)]
    pub extras: BTreeMap<String, Option<f64>>,
}
