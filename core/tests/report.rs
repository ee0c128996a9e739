//! Report builder tests.
//!
//! Tests cover: currency formatting, "N/A" placeholders for degenerate
//! inputs, the excerpt size, and byte-identical output for identical
//! inputs.

use chrono::NaiveDate;
use impact_core::{
    comparator::compare,
    config::AnalysisConfig,
    daily_aggregator::DailySummary,
    pipeline::analyze,
    report::{build_report, format_currency},
    segment_aggregator::{SegmentKey, SegmentTable},
    types::{IncidentRecord, SalesRecord},
};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn sales(revenues: &[f64]) -> Vec<SalesRecord> {
    revenues
        .iter()
        .enumerate()
        .map(|(i, r)| SalesRecord {
            date: d(i as u32 + 1),
            ticket_id: format!("T{i}"),
            revenue: *r,
        })
        .collect()
}

fn incident(day: u32, kind: &str, severity: &str) -> IncidentRecord {
    IncidentRecord {
        date: d(day),
        incident_id: format!("I{day}{kind}"),
        duration_min: 45.0,
        incident_type: kind.into(),
        severity: severity.into(),
    }
}

fn render(sales: &[SalesRecord], incidents: &[IncidentRecord], config: &AnalysisConfig) -> String {
    let daily = DailySummary::build(sales, incidents);
    let comparison = compare(&daily, config);
    let by_type = SegmentTable::build(incidents, &daily, SegmentKey::IncidentType);
    let by_severity = SegmentTable::build(incidents, &daily, SegmentKey::Severity);
    build_report(&daily, &comparison, &by_type, &by_severity, config)
}

#[test]
fn currency_format() {
    assert_eq!(format_currency(1234.56, "€"), "€1,234.56");
    assert_eq!(format_currency(1_234_567.891, "€"), "€1,234,567.89");
    assert_eq!(format_currency(999.999, "€"), "€1,000.00");
    assert_eq!(format_currency(0.0, "€"), "€0.00");
    assert_eq!(format_currency(-5.0, "€"), "€-5.00");
    assert_eq!(format_currency(-350.0, "$"), "$-350.00");
    assert_eq!(format_currency(f64::NAN, "€"), "N/A");
}

#[test]
fn empty_inputs_render_placeholders() {
    let report = render(&[], &[], &AnalysisConfig::default());
    assert!(report.starts_with("# Impact of Incidents on Revenue"));
    assert!(report.contains("| Period analysed | N/A |"));
    assert!(report.contains("| Total days | 0 |"));
    assert!(report.contains("| Days with incidents | 0 (0.0%) |"));
    assert!(report.contains("| Point-biserial correlation (r) | N/A |"));
    assert!(report.contains("_No incidents recorded"));
    assert!(report.contains("- N/A — Mean revenue: **N/A**"));
}

#[test]
fn single_day_renders_without_tests() {
    let report = render(&sales(&[500.0]), &[incident(1, "Retraso", "Alta")], &AnalysisConfig::default());
    assert!(report.contains("| Student t-test, pooled variance (parametric) | N/A | N/A |"));
    assert!(report.contains("| Mann-Whitney U (non-parametric) | N/A | N/A |"));
    assert!(report.contains("Test undefined (N/A)"));
    assert!(report.contains("- Retraso — Mean revenue: **€500.00**"));
}

#[test]
fn excerpt_is_limited_to_configured_rows() {
    let config = AnalysisConfig {
        excerpt_rows: 2,
        ..AnalysisConfig::default()
    };
    let report = render(&sales(&[1.0, 2.0, 3.0, 4.0]), &[], &config);
    assert!(report.contains("| 2024-01-01 | 1.00 | 1 | 0 | 0.0 | 0 |"));
    assert!(report.contains("| 2024-01-02 | 2.00 | 1 | 0 | 0.0 | 0 |"));
    assert!(!report.contains("| 2024-01-03 |"));
}

#[test]
fn significant_result_is_reported() {
    let revenue = [1200.0, 900.0, 1100.0, 700.0, 1300.0, 950.0, 1250.0, 1150.0];
    let incidents = vec![
        incident(2, "Retraso", "Media"),
        incident(4, "Retraso", "Alta"),
        incident(4, "Avería", "Alta"),
        incident(6, "Avería", "Baja"),
    ];
    let report = render(&sales(&revenue), &incidents, &AnalysisConfig::default());
    assert!(report.contains("**Significant**"));
    assert!(report.contains("| Point-biserial correlation (r) | -0.9522 |"));
    assert!(report.contains("| p-value (point-biserial) | 2.6331e-04 |"));
    assert!(report.contains("€-350.00 (-29.17%)"));
    assert!(report.contains("Days WITH incidents generate LESS revenue"));
    assert!(report.contains("![Correlation matrix](../images/matriz_correlaciones.jpg)"));
}

#[test]
fn identical_inputs_give_identical_reports() {
    let revenue = [300.0, 250.0, 400.0, 100.0, 380.0];
    let incidents = vec![incident(2, "Retraso", "Media"), incident(4, "Avería", "Alta")];
    let config = AnalysisConfig::default();
    let a = analyze(&sales(&revenue), &incidents, &config);
    let b = analyze(&sales(&revenue), &incidents, &config);
    assert_eq!(a.report, b.report);
    assert_eq!(a.report.as_bytes(), render(&sales(&revenue), &incidents, &config).as_bytes());
}

#[test]
fn worst_category_without_revenue_is_still_named() {
    let report = render(
        &sales(&[500.0, 700.0]),
        &[incident(9, "Nocturna", "Alta")],
        &AnalysisConfig::default(),
    );
    assert!(report.contains("- Nocturna — Mean revenue: **N/A**"));
    assert!(report.contains("- Alta — Mean revenue: **N/A**"));
}
