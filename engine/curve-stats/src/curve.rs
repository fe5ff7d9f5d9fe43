use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Keys accepted for the score half of a point object
const SCORE_KEYS: &[&str] = &["pts", "x"];

/// Keys accepted for the probability half of a point object
const PROBABILITY_KEYS: &[&str] = &["pct", "cdf", "y", "p"];

/// How many layers of JSON-in-a-JSON-string we are willing to peel
const MAX_ENCODING_DEPTH: usize = 3;

/// Histograms whose bins sum past this are percentage-scaled. Fraction
/// histograms may overshoot 1 slightly from rounding.
const PERCENT_MASS_THRESHOLD: f64 = 1.5;

/// A single point on a simulated score distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Fantasy points
    pub x: f64,

    /// Probability in `[0, 1]`, serialized as `cdf` for chart consumers
    #[serde(rename = "cdf", alias = "p")]
    pub p: f64,
}

impl CurvePoint {
    pub fn new(x: f64, p: f64) -> Self {
        Self { x, p }
    }
}

/// A normalized distribution curve.
///
/// Points are sorted ascending by `x` and every `p` lies in `[0, 1]`. The only
/// way to build one is through [`CurveNormalizer`], so both hold for any
/// `Curve` in hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Curve {
    points: Vec<CurvePoint>,
}

impl Curve {
    /// Normalize `(x, p)` pairs with the default normalizer
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        CurveNormalizer::new().normalize_pairs(pairs)
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CurvePoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Highest modeled score
    pub fn last(&self) -> Option<&CurvePoint> {
        self.points.last()
    }

    pub fn into_points(self) -> Vec<CurvePoint> {
        self.points
    }

    /// Reinterpret a histogram of probability masses as a survival curve.
    ///
    /// `S(x_i)` is the total mass at or above `x_i`, capped at 1. Points keep
    /// their order and scores.
    pub fn survival_from_mass(&self) -> Curve {
        let mut remaining = 0.0;
        let mut points: Vec<CurvePoint> = self
            .points
            .iter()
            .rev()
            .map(|point| {
                remaining += point.p;
                CurvePoint::new(point.x, remaining.min(1.0))
            })
            .collect();
        points.reverse();
        Curve { points }
    }
}

impl<'a> IntoIterator for &'a Curve {
    type Item = &'a CurvePoint;
    type IntoIter = std::slice::Iter<'a, CurvePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// What to do with points that share the same `x` after sorting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep every point; ties stay in input order
    #[default]
    KeepAll,
    /// Keep the first point seen for each score
    KeepFirst,
    /// Keep the last point seen for each score
    KeepLast,
    /// Replace each run of ties with one point at the mean probability
    Average,
}

/// Turns raw simulation output into a [`Curve`].
///
/// Accepted input shapes:
/// - JSON arrays of `{pts, pct}`, `{x, cdf}`, `{x, y}`, `{x, p}` objects or `[x, p]` pairs
/// - the same array as a JSON string, including spreadsheet exports with
///   doubled (`""`) or wrapping quotes
///
/// Probabilities above 1 are read as percentages and divided by 100. The rule
/// is applied per point. Points whose final probability falls outside `[0, 1]`
/// are dropped, as are points with missing or non-numeric fields. Input that
/// cannot be parsed at all yields an empty curve.
///
/// Histograms of probability mass go through the `normalize_mass_*` methods,
/// which pick one scale for the whole curve and return its survival form.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveNormalizer {
    duplicates: DuplicatePolicy,
}

impl CurveNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_policy(duplicates: DuplicatePolicy) -> Self {
        Self { duplicates }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }

    /// Normalize a curve serialized as text
    pub fn normalize_str(&self, raw: &str) -> Curve {
        self.normalize_pairs(extract_text(raw, 0))
    }

    /// Normalize a curve that is already JSON: an array of points or a string
    /// holding one. Anything else is an empty curve.
    pub fn normalize_value(&self, raw: &Value) -> Curve {
        self.normalize_pairs(extract_json(raw, 0))
    }

    /// Normalize already-extracted `(x, p)` pairs
    pub fn normalize_pairs<I>(&self, pairs: I) -> Curve
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut percent_scaled = 0usize;
        let mut fraction_scaled = 0usize;
        let mut dropped = 0usize;

        let points: Vec<CurvePoint> = pairs
            .into_iter()
            .filter_map(|(x, p)| {
                if !x.is_finite() || !p.is_finite() {
                    dropped += 1;
                    return None;
                }
                let p = if p > 1.0 {
                    percent_scaled += 1;
                    p / 100.0
                } else {
                    fraction_scaled += 1;
                    p
                };
                if (0.0..=1.0).contains(&p) {
                    Some(CurvePoint::new(x, p))
                } else {
                    dropped += 1;
                    None
                }
            })
            .collect();

        if percent_scaled > 0 && fraction_scaled > 0 {
            debug!(
                "Curve mixes percentage and fraction probabilities ({} scaled, {} unscaled)",
                percent_scaled, fraction_scaled
            );
        }
        if dropped > 0 {
            trace!("Dropped {} out-of-range curve points", dropped);
        }

        self.finish(points)
    }

    /// Survival curve from a histogram serialized as text.
    /// See [`normalize_mass_pairs`](Self::normalize_mass_pairs).
    pub fn normalize_mass_str(&self, raw: &str) -> Curve {
        self.normalize_mass_pairs(extract_text(raw, 0))
    }

    /// Survival curve from a histogram already in JSON form
    pub fn normalize_mass_value(&self, raw: &Value) -> Curve {
        self.normalize_mass_pairs(extract_json(raw, 0))
    }

    /// Survival curve from `(x, mass)` histogram bins.
    ///
    /// Unlike survival points, a histogram's scale is decided once for the
    /// whole curve: bins summing past 1.5 are all percentages. Small
    /// tail bins in a percentage histogram (say 0.5%) stay percentages. Bins
    /// outside `[0, 1]` after scaling are dropped before accumulating.
    pub fn normalize_mass_pairs<I>(&self, pairs: I) -> Curve
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let bins: Vec<(f64, f64)> =
            pairs.into_iter().filter(|(x, p)| x.is_finite() && p.is_finite()).collect();

        let total: f64 = bins.iter().map(|&(_, p)| p.max(0.0)).sum();
        let scale = if total > PERCENT_MASS_THRESHOLD { 100.0 } else { 1.0 };

        let points: Vec<CurvePoint> = bins
            .into_iter()
            .map(|(x, p)| CurvePoint::new(x, p / scale))
            .filter(|point| (0.0..=1.0).contains(&point.p))
            .collect();

        self.finish(points).survival_from_mass()
    }

    /// Sort (stable: ties keep input order) and apply the duplicate policy
    fn finish(&self, mut points: Vec<CurvePoint>) -> Curve {
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        Curve { points: self.collapse_duplicates(points) }
    }

    fn collapse_duplicates(&self, points: Vec<CurvePoint>) -> Vec<CurvePoint> {
        match self.duplicates {
            DuplicatePolicy::KeepAll => points,
            DuplicatePolicy::KeepFirst => {
                let mut points = points;
                points.dedup_by(|later, earlier| later.x == earlier.x);
                points
            }
            DuplicatePolicy::KeepLast => {
                let mut kept: Vec<CurvePoint> = Vec::with_capacity(points.len());
                for point in points {
                    match kept.last_mut() {
                        Some(last) if last.x == point.x => *last = point,
                        _ => kept.push(point),
                    }
                }
                kept
            }
            DuplicatePolicy::Average => {
                let mut kept: Vec<(CurvePoint, usize)> = Vec::with_capacity(points.len());
                for point in points {
                    match kept.last_mut() {
                        Some((sum, count)) if sum.x == point.x => {
                            sum.p += point.p;
                            *count += 1;
                        }
                        _ => kept.push((point, 1)),
                    }
                }
                kept.into_iter()
                    .map(|(sum, count)| CurvePoint::new(sum.x, sum.p / count as f64))
                    .collect()
            }
        }
    }
}

/// Pull `(x, p)` pairs out of curve text; unparseable text yields none
fn extract_text(raw: &str, depth: usize) -> Vec<(f64, f64)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || depth >= MAX_ENCODING_DEPTH {
        return Vec::new();
    }

    // Well-formed JSON first, so doubled quotes inside it stay untouched
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if matches!(value, Value::Array(_) | Value::String(_)) {
            return extract_json(&value, depth + 1);
        }
    }

    match serde_json::from_str::<Value>(&unescape(trimmed)) {
        Ok(value) => extract_json(&value, depth + 1),
        Err(e) => {
            debug!("Unparseable curve text ({} bytes): {}", trimmed.len(), e);
            Vec::new()
        }
    }
}

fn extract_json(raw: &Value, depth: usize) -> Vec<(f64, f64)> {
    match raw {
        Value::Array(items) => items.iter().filter_map(parse_point).collect(),
        Value::String(text) => extract_text(text, depth),
        _ => Vec::new(),
    }
}

/// Undo spreadsheet quoting: `""` becomes `"`, then wrapping quotes go
fn unescape(raw: &str) -> String {
    raw.replace("\"\"", "\"").trim().trim_matches('"').trim_matches('\'').to_string()
}

fn parse_point(item: &Value) -> Option<(f64, f64)> {
    match item {
        Value::Object(map) => Some((field(map, SCORE_KEYS)?, field(map, PROBABILITY_KEYS)?)),
        Value::Array(pair) if pair.len() == 2 => Some((number(&pair[0])?, number(&pair[1])?)),
        _ => None,
    }
}

fn field(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| map.get(*key)).and_then(number)
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
