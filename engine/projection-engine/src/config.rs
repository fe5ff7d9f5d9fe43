//! # Configuration Management
//!
//! Configuration for loading simulation tables and deriving projection stats.

use crate::error::{ProjectionError, Result};
use curve_stats::{DuplicatePolicy, DEFAULT_TAIL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the projection engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Where the simulation table lives
    pub source: SourceConfig,
    /// Tail statistics and curve handling
    pub stats: StatsConfig,
    /// Column names to look for in the table
    pub columns: ColumnConfig,
}

/// Source table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Path to the simulation table CSV
    pub csv_path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { csv_path: PathBuf::from("table_setup.csv") }
    }
}

/// How the curve column should be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Each point is already `P(score >= x)`
    #[default]
    Survival,
    /// Each point is the probability mass of its score bucket
    Mass,
}

/// Statistic derivation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Survival probability that defines the ceiling (0.05 = ~95th percentile)
    pub ceiling_tail: f64,
    /// Survival probability for an optional floor (e.g. 0.95 = ~5th percentile)
    pub floor_tail: Option<f64>,
    /// Treatment of points sharing a score
    pub duplicate_policy: DuplicatePolicy,
    /// Interpretation of the curve column
    pub curve_kind: CurveKind,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            ceiling_tail: DEFAULT_TAIL,
            floor_tail: None,
            duplicate_policy: DuplicatePolicy::KeepAll,
            curve_kind: CurveKind::Survival,
        }
    }
}

/// Candidate header names per field; the first one present in the table wins
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub name: Vec<String>,
    pub id: Vec<String>,
    pub team: Vec<String>,
    pub position: Vec<String>,
    pub mean: Vec<String>,
    pub median: Vec<String>,
    pub ceiling: Vec<String>,
    pub curve: Vec<String>,
    /// Numeric columns passed through to the projection as-is
    pub extra_stats: Vec<String>,
}

/// Keys a projection already serializes; pass-through stats may not reuse them
pub const RESERVED_STAT_NAMES: &[&str] =
    &["id", "mean", "median", "ceiling", "ceiling_resolution", "floor", "curve"];

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            name: names(&["player"]),
            id: names(&["id", "player_id"]),
            team: names(&["team", "Team"]),
            position: names(&["position", "Pos", "Position"]),
            mean: names(&["total_score_full_ppr", "ppr", "mean"]),
            median: names(&["total_score_full_ppr_median", "median", "p50"]),
            ceiling: names(&[
                "ceiling",
                "p95",
                "p90",
                "total_score_full_ppr_p95",
                "total_score_full_ppr_p90",
                "total_score_full_ppr_max",
            ]),
            curve: names(&["chart_source_full_ppr", "chart_source_half_ppr"]),
            extra_stats: names(&[
                "pass_tds",
                "player_pass_tds",
                "player_pass_interceptions",
                "player_rush_or_rec_tds",
                "player_reception_yds",
                "player_rush_yds",
                "player_receptions",
                "player_pass_yds",
            ]),
        }
    }
}

impl ProjectionConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProjectionConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(path) = std::env::var("PROJECTION_CSV") {
            self.source.csv_path = PathBuf::from(path);
        }

        if let Ok(tail) = std::env::var("PROJECTION_CEILING_TAIL") {
            self.stats.ceiling_tail = tail
                .parse()
                .map_err(|_| ProjectionError::config(format!("invalid PROJECTION_CEILING_TAIL: {tail}")))?;
        }

        if let Ok(tail) = std::env::var("PROJECTION_FLOOR_TAIL") {
            let tail = tail
                .parse()
                .map_err(|_| ProjectionError::config(format!("invalid PROJECTION_FLOOR_TAIL: {tail}")))?;
            self.stats.floor_tail = Some(tail);
        }

        self.validate()?;
        Ok(self)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let in_unit = |tail: f64| (0.0..=1.0).contains(&tail);

        if !in_unit(self.stats.ceiling_tail) {
            return Err(ProjectionError::config(format!(
                "ceiling_tail must be within [0, 1], got {}",
                self.stats.ceiling_tail
            )));
        }

        if let Some(floor) = self.stats.floor_tail {
            if !in_unit(floor) {
                return Err(ProjectionError::config(format!(
                    "floor_tail must be within [0, 1], got {floor}"
                )));
            }
        }

        if self.columns.name.is_empty() {
            return Err(ProjectionError::config("at least one name column is required"));
        }

        if let Some(clash) =
            self.columns.extra_stats.iter().find(|name| RESERVED_STAT_NAMES.contains(&name.as_str()))
        {
            return Err(ProjectionError::config(format!(
                "extra_stats column '{clash}' collides with a projection field"
            )));
        }

        Ok(())
    }
}
