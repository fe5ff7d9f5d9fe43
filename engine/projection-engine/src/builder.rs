use crate::config::{CurveKind, StatsConfig};
use crate::models::{Projection, RawProjectionRecord};
use curve_stats::{Curve, CurveNormalizer, PercentileExtractor};
use tracing::debug;

/// Turns raw records into projections.
///
/// The curve is normalized, the ceiling is read off it unless the record
/// already carries one, and mean/median/extras pass straight through.
#[derive(Debug, Clone)]
pub struct ProjectionBuilder {
    normalizer: CurveNormalizer,
    ceiling: PercentileExtractor,
    floor: Option<PercentileExtractor>,
    curve_kind: CurveKind,
}

impl Default for ProjectionBuilder {
    fn default() -> Self {
        Self::new(&StatsConfig::default())
    }
}

impl ProjectionBuilder {
    pub fn new(stats: &StatsConfig) -> Self {
        Self {
            normalizer: CurveNormalizer::with_duplicate_policy(stats.duplicate_policy),
            ceiling: PercentileExtractor::new(stats.ceiling_tail),
            floor: stats.floor_tail.map(PercentileExtractor::new),
            curve_kind: stats.curve_kind,
        }
    }

    /// Normalize a raw curve field into a survival curve
    pub fn survival_curve(&self, raw: Option<&serde_json::Value>) -> Curve {
        let Some(value) = raw else {
            return Curve::default();
        };
        match self.curve_kind {
            CurveKind::Survival => self.normalizer.normalize_value(value),
            CurveKind::Mass => self.normalizer.normalize_mass_value(value),
        }
    }

    pub fn build(&self, record: &RawProjectionRecord) -> Projection {
        let curve = self.survival_curve(record.curve.as_ref());

        let (ceiling, ceiling_resolution) = match record.ceiling {
            Some(supplied) => (Some(supplied), None),
            None => match self.ceiling.estimate(&curve) {
                Some(estimate) => (Some(estimate.score), Some(estimate.resolution)),
                None => (None, None),
            },
        };
        let floor = self.floor.and_then(|extractor| extractor.extract(&curve));

        debug!(
            "Built projection for {} ({} curve points, ceiling {:?} via {:?})",
            record.id,
            curve.len(),
            ceiling,
            ceiling_resolution
        );

        Projection {
            id: record.id.clone(),
            mean: record.mean,
            median: record.median,
            ceiling,
            ceiling_resolution,
            floor,
            curve,
            extras: record.extras.clone(),
        }
    }

    pub fn build_all(&self, records: &[RawProjectionRecord]) -> Vec<Projection> {
        records.iter().map(|record| self.build(record)).collect()
    }
}
