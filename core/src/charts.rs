//! Chart series: the numeric inputs a chart renderer needs.
//!
//! Nothing here draws. Each struct mirrors one image the report references
//! and is written to JSON alongside it. Undefined values serialize as
//! `null`.

use crate::{
    comparator::Comparison,
    config::AnalysisConfig,
    daily_aggregator::DailySummary,
    segment_aggregator::SegmentTable,
    stats::{self, Regression},
};
use chrono::Datelike;
use serde::Serialize;

pub const WITH_INCIDENTS: &str = "With incidents";
pub const WITHOUT_INCIDENTS: &str = "Without incidents";

pub const MATRIX_COLUMNS: [&str; 5] = ["Revenue", "Tickets", "Incidents", "DurationMin", "Date"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub image: String,
    /// (incident count, revenue) per day.
    pub points: Vec<(f64, f64)>,
    pub regression: Option<Regression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: Option<f64>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub image: String,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGroup {
    pub label: String,
    pub values: Vec<f64>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSeries {
    pub image: String,
    pub groups: Vec<BoxGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub image: String,
    pub columns: Vec<String>,
    /// Row-major Pearson coefficients; `None` where a column is constant.
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub correlation_matrix: CorrelationMatrix,
    pub scatter: ScatterSeries,
    pub comparison_bar: BarSeries,
    pub comparison_box: BoxSeries,
    pub by_type: BarSeries,
    pub by_severity: BarSeries,
}

fn defined(x: f64) -> Option<f64> {
    if x.is_nan() {
        None
    } else {
        Some(x)
    }
}

/// Palette entry `i`, cycling when there are more bars than colours.
fn color(palette: &[String], i: usize) -> String {
    if palette.is_empty() {
        String::new()
    } else {
        palette[i % palette.len()].clone()
    }
}

fn matrix_columns(daily: &DailySummary) -> Vec<Vec<f64>> {
    let rows = daily.rows();
    vec![
        rows.iter().map(|r| r.revenue).collect(),
        rows.iter().map(|r| r.tickets as f64).collect(),
        rows.iter().map(|r| r.incidents as f64).collect(),
        rows.iter().map(|r| r.duration_min).collect(),
        rows.iter().map(|r| r.date.num_days_from_ce() as f64).collect(),
    ]
}

pub fn correlation_matrix(daily: &DailySummary, image: &str) -> CorrelationMatrix {
    let columns = matrix_columns(daily);
    let values = columns
        .iter()
        .map(|a| {
            columns
                .iter()
                .map(|b| stats::pearson(a, b).map(|c| c.coefficient))
                .collect()
        })
        .collect();
    CorrelationMatrix {
        image: image.to_string(),
        columns: MATRIX_COLUMNS.iter().map(|c| c.to_string()).collect(),
        values,
    }
}

fn segment_bars(table: &SegmentTable, palette: &[String], image: &str) -> BarSeries {
    BarSeries {
        image: image.to_string(),
        bars: table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| Bar {
                label: row.category.clone(),
                value: defined(row.mean_revenue),
                color: color(palette, i),
            })
            .collect(),
    }
}

pub fn build_charts(
    daily: &DailySummary,
    comparison: &Comparison,
    by_type: &SegmentTable,
    by_severity: &SegmentTable,
    config: &AnalysisConfig,
) -> ChartSeries {
    let images = &config.images;
    let palettes = &config.palettes;

    let counts = daily.incident_counts();
    let revenues = daily.revenues();
    let scatter = ScatterSeries {
        image: images.scatter.clone(),
        points: counts.iter().copied().zip(revenues.iter().copied()).collect(),
        regression: stats::linear_regression(&counts, &revenues),
    };

    let comparison_bar = BarSeries {
        image: images.comparison_bar.clone(),
        bars: vec![
            Bar {
                label: WITH_INCIDENTS.into(),
                value: defined(comparison.with_stats.mean),
                color: color(&palettes.comparison, 0),
            },
            Bar {
                label: WITHOUT_INCIDENTS.into(),
                value: defined(comparison.without_stats.mean),
                color: color(&palettes.comparison, 1),
            },
        ],
    };

    let comparison_box = BoxSeries {
        image: images.comparison_box.clone(),
        groups: vec![
            BoxGroup {
                label: WITHOUT_INCIDENTS.into(),
                values: comparison.without_incidents.clone(),
                color: color(&palettes.comparison, 0),
            },
            BoxGroup {
                label: WITH_INCIDENTS.into(),
                values: comparison.with_incidents.clone(),
                color: color(&palettes.comparison, 1),
            },
        ],
    };

    log::debug!("Chart series built for {} days", daily.len());

    ChartSeries {
        correlation_matrix: correlation_matrix(daily, &images.correlation_matrix),
        scatter,
        comparison_bar,
        comparison_box,
        by_type: segment_bars(by_type, &palettes.incident_type, &images.by_type),
        by_severity: segment_bars(by_severity, &palettes.severity, &images.by_severity),
    }
}
