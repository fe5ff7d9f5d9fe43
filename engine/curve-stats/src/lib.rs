//! # Curve Stats
//!
//! Normalization and tail-statistic extraction for simulated fantasy scoring
//! distributions.
//!
//! Simulation output arrives as a loosely typed list of `(score, probability)`
//! pairs. The probability is either a fraction or a percentage, and the list
//! is often serialized as a spreadsheet-escaped JSON string. This crate turns
//! that into a clean [`Curve`] and reads tail statistics (the "ceiling") off it.
//!
//! ## Components
//!
//! - **CurveNormalizer**: raw pairs or JSON text into a sorted, unit-scaled curve
//! - **PercentileExtractor**: survival-curve crossing with interpolation and
//!   boundary fallbacks
//!
//! Everything here is pure and synchronous. Nothing returns an error: bad input
//! degrades to an empty curve, and an empty curve degrades to `None`.
//!
//! ## Usage
//!
//! ```rust
//! use curve_stats::{CurveNormalizer, PercentileExtractor};
//!
//! let curve = CurveNormalizer::new().normalize_str(r#"[{"pts": 10, "pct": 90}, {"pts": 20, "pct": 10}]"#);
//! let median = PercentileExtractor::new(0.5).extract(&curve);
//! assert_eq!(median, Some(15.0));
//! ```

pub mod curve;
pub mod percentile;

pub use curve::{Curve, CurveNormalizer, CurvePoint, DuplicatePolicy};
pub use percentile::{
    PercentileExtractor, TailEstimate, TailResolution, DEFAULT_TAIL, FLAT_SEGMENT_EPSILON,
};
