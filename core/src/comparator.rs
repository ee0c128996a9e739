//! Statistical comparator: incident signal vs. daily revenue.
//!
//! Runs on the daily table:
//!   1. point-biserial correlation (incident count vs. revenue)
//!   2. Spearman rank correlation (same pair, robustness check)
//!   3. pooled two-sample t-test, days with vs. without incidents
//!   4. two-sided Mann-Whitney U, same split
//!
//! Degenerate inputs (fewer than two days on either side of the split,
//! constant series) yield `None` for the affected test; the run carries on.
//! No multiple-comparison correction is applied.

use crate::{
    config::AnalysisConfig,
    daily_aggregator::DailySummary,
    stats::{self, Correlation, TestOutcome},
};
use serde::{Deserialize, Serialize};

/// Size, mean and sample standard deviation of one revenue series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub n: usize,
    pub mean: f64,
    pub std: f64,
}

impl SeriesStats {
    pub fn of(values: &[f64]) -> Self {
        Self {
            n: values.len(),
            mean: stats::mean(values),
            std: stats::sample_std(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub point_biserial: Option<Correlation>,
    pub spearman: Option<Correlation>,
    pub with_incidents: Vec<f64>,
    pub without_incidents: Vec<f64>,
    pub with_stats: SeriesStats,
    pub without_stats: SeriesStats,
    pub t_test: Option<TestOutcome>,
    pub mann_whitney: Option<TestOutcome>,
    /// Mean revenue with incidents minus mean revenue without.
    pub mean_difference: f64,
    pub mean_difference_pct: f64,
    pub significance_level: f64,
}

/// Fewest observations per side for the two-sample tests.
pub const MIN_GROUP_SIZE: usize = 2;

/// `Some(true)` when `p` is strictly below `level`; `None` for NaN.
pub fn is_significant(p: f64, level: f64) -> Option<bool> {
    if p.is_nan() {
        None
    } else {
        Some(p < level)
    }
}

impl Comparison {
    pub fn correlation_significant(&self) -> Option<bool> {
        self.point_biserial
            .and_then(|c| is_significant(c.p_value, self.significance_level))
    }

    pub fn difference_significant(&self) -> Option<bool> {
        self.t_test
            .and_then(|t| is_significant(t.p_value, self.significance_level))
    }
}

pub fn compare(daily: &DailySummary, config: &AnalysisConfig) -> Comparison {
    let counts = daily.incident_counts();
    let revenues = daily.revenues();

    let point_biserial = stats::point_biserial(&counts, &revenues);
    let spearman = stats::spearman(&counts, &revenues);

    let (with_incidents, without_incidents) = daily.split_by_incident();
    let enough = with_incidents.len() >= MIN_GROUP_SIZE && without_incidents.len() >= MIN_GROUP_SIZE;
    let (t_test, mann_whitney) = if enough {
        (
            stats::t_test_pooled(&with_incidents, &without_incidents),
            stats::mann_whitney_u(&with_incidents, &without_incidents),
        )
    } else {
        log::warn!(
            "Two-sample tests undefined: {} day(s) with incidents, {} without",
            with_incidents.len(),
            without_incidents.len()
        );
        (None, None)
    };

    let with_stats = SeriesStats::of(&with_incidents);
    let without_stats = SeriesStats::of(&without_incidents);
    let mean_difference = with_stats.mean - without_stats.mean;
    let mean_difference_pct = stats::safe_pct(mean_difference, without_stats.mean);

    log::info!(
        "Comparison done: point-biserial {}, t-test {}, Mann-Whitney {}",
        if point_biserial.is_some() { "defined" } else { "undefined" },
        if t_test.is_some() { "defined" } else { "undefined" },
        if mann_whitney.is_some() { "defined" } else { "undefined" },
    );

    Comparison {
        point_biserial,
        spearman,
        with_incidents,
        without_incidents,
        with_stats,
        without_stats,
        t_test,
        mann_whitney,
        mean_difference,
        mean_difference_pct,
        significance_level: config.significance_level,
    }
}
