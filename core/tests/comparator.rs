//! Statistical comparator tests.
//!
//! Tests cover: the reference eight-day dataset, significance at the
//! threshold, and the degenerate inputs that must yield undefined results
//! instead of failing.

use chrono::NaiveDate;
use impact_core::{
    comparator::{compare, is_significant, MIN_GROUP_SIZE},
    config::AnalysisConfig,
    daily_aggregator::DailySummary,
    types::{IncidentRecord, SalesRecord},
};

const COUNTS: [u32; 8] = [0, 1, 0, 2, 0, 1, 0, 0];
const REVENUE: [f64; 8] = [1200.0, 900.0, 1100.0, 700.0, 1300.0, 950.0, 1250.0, 1150.0];

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn build(counts: &[u32], revenue: &[f64]) -> DailySummary {
    let sales: Vec<SalesRecord> = revenue
        .iter()
        .enumerate()
        .map(|(i, r)| SalesRecord {
            date: d(i as u32 + 1),
            ticket_id: format!("T{i}"),
            revenue: *r,
        })
        .collect();
    let mut incidents = Vec::new();
    for (i, n) in counts.iter().enumerate() {
        for k in 0..*n {
            incidents.push(IncidentRecord {
                date: d(i as u32 + 1),
                incident_id: format!("I{i}-{k}"),
                duration_min: 30.0,
                incident_type: "Retraso".into(),
                severity: "Media".into(),
            });
        }
    }
    DailySummary::build(&sales, &incidents)
}

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

#[test]
fn reference_dataset() {
    let daily = build(&COUNTS, &REVENUE);
    let c = compare(&daily, &AnalysisConfig::default());

    let pb = c.point_biserial.expect("point-biserial defined");
    assert!(close(pb.coefficient, -0.952_201_786_198_544, 1e-12));
    assert!(close(pb.p_value, 0.000_263_314_369, 1e-9));

    let sp = c.spearman.expect("spearman defined");
    assert!(close(sp.coefficient, -0.866_025_403_784_438_6, 1e-12));

    let t = c.t_test.expect("t-test defined");
    assert!(close(t.statistic, -4.792_572_378_170_203, 1e-10));
    assert!(close(t.p_value, 0.003_023_637_9, 1e-8));

    // Every day with incidents earns less than every day without.
    let u = c.mann_whitney.expect("Mann-Whitney defined");
    assert_eq!(u.statistic, 0.0);
    assert!(close(u.p_value, 2.0 / 56.0, 1e-12));

    assert_eq!(c.with_stats.n, 3);
    assert_eq!(c.without_stats.n, 5);
    assert!(close(c.mean_difference, -350.0, 1e-9));
    assert!(close(c.mean_difference_pct, -350.0 / 1200.0 * 100.0, 1e-9));
    assert_eq!(c.correlation_significant(), Some(true));
    assert_eq!(c.difference_significant(), Some(true));
}

#[test]
fn significance_is_strict() {
    assert_eq!(is_significant(0.05, 0.05), Some(false));
    assert_eq!(is_significant(0.0499, 0.05), Some(true));
    assert_eq!(is_significant(f64::NAN, 0.05), None);
}

#[test]
fn single_day_with_incident_leaves_tests_undefined() {
    let daily = build(&[1, 0, 0, 0], &[100.0, 200.0, 300.0, 400.0]);
    let c = compare(&daily, &AnalysisConfig::default());

    assert!(c.with_incidents.len() < MIN_GROUP_SIZE);
    assert!(c.t_test.is_none());
    assert!(c.mann_whitney.is_none());
    assert_eq!(c.difference_significant(), None);
    // The correlation still has four points and two distinct x values.
    assert!(c.point_biserial.is_some());
}

#[test]
fn no_incidents_at_all() {
    let daily = build(&[0, 0, 0], &[100.0, 200.0, 300.0]);
    let c = compare(&daily, &AnalysisConfig::default());

    assert!(c.point_biserial.is_none());
    assert!(c.spearman.is_none());
    assert!(c.t_test.is_none());
    assert!(c.with_stats.mean.is_nan());
    assert!(c.mean_difference.is_nan());
}

#[test]
fn empty_and_single_day_tables() {
    for daily in [build(&[], &[]), build(&[1], &[500.0])] {
        let c = compare(&daily, &AnalysisConfig::default());
        assert!(c.point_biserial.is_none());
        assert!(c.t_test.is_none());
        assert!(c.mann_whitney.is_none());
        assert_eq!(c.correlation_significant(), None);
    }
}

#[test]
fn constant_revenue_is_undefined_correlation() {
    let daily = build(&[0, 1, 0, 1], &[100.0; 4]);
    let c = compare(&daily, &AnalysisConfig::default());
    assert!(c.point_biserial.is_none());
    // Zero variance in both groups: no t statistic either.
    assert!(c.t_test.is_none());
}
