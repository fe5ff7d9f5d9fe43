use crate::curve::Curve;
use serde::Serialize;
use tracing::trace;

/// Default tail probability: the score beaten 5% of the time (~95th percentile)
pub const DEFAULT_TAIL: f64 = 0.05;

/// Stand-in denominator for a flat segment sitting exactly on the target
pub const FLAT_SEGMENT_EPSILON: f64 = 1e-9;

/// Which rule produced a tail estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TailResolution {
    /// Target bracketed by two consecutive points
    Interpolated,
    /// Curve never crosses the target; highest score still at or above it
    LastAboveTarget,
    /// Whole curve sits below the target; highest modeled score
    HighestScore,
}

/// A tail statistic along with how it was resolved
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TailEstimate {
    pub score: f64,
    pub resolution: TailResolution,
}

/// Reads a tail statistic off a survival curve `S(x) = P(score >= x)`.
///
/// The extractor finds the score where `S` crosses `target`, interpolating
/// linearly between the first bracketing pair of points. Curves that never
/// reach the target (truncated histograms are common) fall back to the highest
/// score still at or above it, and failing that to the highest modeled score.
/// Only an empty curve produces no value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileExtractor {
    target: f64,
}

impl Default for PercentileExtractor {
    fn default() -> Self {
        Self { target: DEFAULT_TAIL }
    }
}

impl PercentileExtractor {
    /// Create an extractor for a survival probability in `[0, 1]`.
    ///
    /// Callers validate the target first; a NaN or out-of-range target never
    /// crosses the curve and would silently resolve to the highest score.
    pub fn new(target: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&target), "tail target must be within [0, 1], got {target}");
        Self { target }
    }

    /// The default ceiling extractor (5% tail)
    pub fn ceiling() -> Self {
        Self::default()
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Score at the target tail, or `None` for an empty curve
    pub fn extract(&self, curve: &Curve) -> Option<f64> {
        self.estimate(curve).map(|estimate| estimate.score)
    }

    /// Like [`extract`](Self::extract), also reporting which rule applied
    pub fn estimate(&self, curve: &Curve) -> Option<TailEstimate> {
        let last = curve.last()?;
        let target = self.target;

        let crossing = curve.points().windows(2).find_map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            if (a.p - target) * (b.p - target) > 0.0 {
                return None;
            }
            let mut denom = b.p - a.p;
            if denom == 0.0 {
                denom = FLAT_SEGMENT_EPSILON;
            }
            let t = (target - a.p) / denom;
            Some(a.x + t * (b.x - a.x))
        });
        if let Some(score) = crossing {
            return Some(TailEstimate { score, resolution: TailResolution::Interpolated });
        }

        if let Some(point) = curve.iter().rev().find(|point| point.p >= target) {
            trace!("No crossing at tail {}, using score {} at p={}", target, point.x, point.p);
            return Some(TailEstimate { score: point.x, resolution: TailResolution::LastAboveTarget });
        }

        trace!("Curve never reaches tail {}, using highest score {}", target, last.x);
        Some(TailEstimate { score: last.x, resolution: TailResolution::HighestScore })
    }
}
