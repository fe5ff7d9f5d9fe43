//! Property tests for curve normalization and tail extraction

use curve_stats::{Curve, CurveNormalizer, DuplicatePolicy, PercentileExtractor};
use proptest::prelude::*;

fn raw_points() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-20.0f64..80.0, 0.0f64..=100.0), 0..40)
}

fn policies() -> impl Strategy<Value = DuplicatePolicy> {
    prop_oneof![
        Just(DuplicatePolicy::KeepAll),
        Just(DuplicatePolicy::KeepFirst),
        Just(DuplicatePolicy::KeepLast),
        Just(DuplicatePolicy::Average),
    ]
}

proptest! {
    #[test]
    fn normalized_probabilities_in_unit_interval(points in raw_points()) {
        let curve = Curve::from_pairs(points.clone());
        for point in &curve {
            prop_assert!((0.0..=1.0).contains(&point.p));
        }
        // Each surviving point is either untouched or divided by exactly 100
        let expected = points
            .iter()
            .map(|&(x, p)| (x, if p > 1.0 { p / 100.0 } else { p }))
            .filter(|(_, p)| (0.0..=1.0).contains(p))
            .count();
        prop_assert_eq!(curve.len(), expected);
    }

    #[test]
    fn fractions_pass_through_unchanged(xs in prop::collection::vec(0.0f64..50.0, 1..20), p in 0.0f64..=1.0) {
        let curve = Curve::from_pairs(xs.iter().map(|&x| (x, p)));
        prop_assert!(curve.iter().all(|point| point.p == p));
    }

    #[test]
    fn output_sorted_for_any_input_order(points in raw_points(), policy in policies()) {
        let curve = CurveNormalizer::with_duplicate_policy(policy).normalize_pairs(points);
        prop_assert!(curve.points().windows(2).all(|w| w[0].x <= w[1].x));
    }

    #[test]
    fn collapsing_policies_leave_unique_scores(points in raw_points(), policy in policies()) {
        prop_assume!(policy != DuplicatePolicy::KeepAll);
        let curve = CurveNormalizer::with_duplicate_policy(policy).normalize_pairs(points);
        prop_assert!(curve.points().windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn renormalizing_is_idempotent(points in raw_points(), policy in policies()) {
        let normalizer = CurveNormalizer::with_duplicate_policy(policy);
        let once = normalizer.normalize_pairs(points);
        let twice = normalizer.normalize_pairs(once.iter().map(|p| (p.x, p.p)));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn every_nonempty_curve_resolves(points in raw_points(), target in 0.0f64..=1.0) {
        let curve = Curve::from_pairs(points);
        let value = PercentileExtractor::new(target).extract(&curve);
        prop_assert_eq!(value.is_some(), !curve.is_empty());
    }

    #[test]
    fn interpolated_value_stays_between_brackets(
        x0 in 0.0f64..50.0,
        width in 0.1f64..50.0,
        s0 in 0.5f64..=1.0,
        s1 in 0.0f64..0.5,
        target in 0.0f64..=0.5,
    ) {
        prop_assume!(target >= s1);
        let curve = Curve::from_pairs([(x0, s0), (x0 + width, s1)]);
        let score = PercentileExtractor::new(target).extract(&curve).unwrap();
        prop_assert!(score >= x0 - 1e-9 && score <= x0 + width + 1e-9);
    }
}

#[test]
fn truncated_json_is_empty_not_a_panic() {
    let curve = CurveNormalizer::new().normalize_str(r#"[{"pts": 10, "pct": 50}, {"pts": 2"#);
    assert!(curve.is_empty());
    assert_eq!(PercentileExtractor::ceiling().extract(&curve), None);
}

#[test]
fn ceiling_from_spreadsheet_cell() {
    let cell = r#""[{""pts"": 0, ""pct"": 100}, {""pts"": 10, ""pct"": 60}, {""pts"": 20, ""pct"": 20}, {""pts"": 30, ""pct"": 2}]""#;
    let curve = CurveNormalizer::new().normalize_str(cell);
    assert_eq!(curve.len(), 4);

    // Crossing 0.05 between (20, 0.20) and (30, 0.02)
    let ceiling = PercentileExtractor::ceiling().extract(&curve).unwrap();
    let expected = 20.0 + (0.05 - 0.2) / (0.02 - 0.2) * 10.0;
    assert!((ceiling - expected).abs() < 1e-9);
}
