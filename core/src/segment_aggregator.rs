//! Segment aggregator: revenue associated with each incident category.
//!
//! Every incident inherits the aggregate revenue of its date (not of any
//! single sale). Groups are keyed in ascending category order, rounded to
//! two decimals, then stable-sorted ascending by mean revenue. Position 0
//! is the worst category; `worst()` is the only supported way to read it.
//!
//! RULE: incidents with a blank category belong to no group. They still
//! count in the daily table.

use crate::{
    daily_aggregator::DailySummary,
    stats,
    types::{IncidentRecord, SegmentRow},
};
use std::{cmp::Ordering, collections::BTreeMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKey {
    IncidentType,
    Severity,
}

impl SegmentKey {
    pub fn label(&self) -> &'static str {
        match self {
            Self::IncidentType => "incident type",
            Self::Severity => "severity",
        }
    }

    fn of<'a>(&self, incident: &'a IncidentRecord) -> &'a str {
        match self {
            Self::IncidentType => &incident.incident_type,
            Self::Severity => &incident.severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentTable {
    key: SegmentKey,
    rows: Vec<SegmentRow>,
}

#[derive(Default)]
struct Group {
    revenues: Vec<f64>,
    durations: Vec<f64>,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// Ascending by mean revenue; undefined means sort after every defined one.
fn by_mean_revenue(a: &SegmentRow, b: &SegmentRow) -> Ordering {
    match (a.mean_revenue.is_nan(), b.mean_revenue.is_nan()) {
        (false, false) => a.mean_revenue.total_cmp(&b.mean_revenue),
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
    }
}

impl SegmentTable {
    pub fn build(incidents: &[IncidentRecord], daily: &DailySummary, key: SegmentKey) -> Self {
        let mut groups: BTreeMap<&str, Group> = BTreeMap::new();
        let mut blank = 0usize;
        for incident in incidents {
            let category = key.of(incident);
            if category.trim().is_empty() {
                blank += 1;
                continue;
            }
            let group = groups.entry(category).or_default();
            // Incidents on dates without sales have no revenue to inherit.
            if let Some(revenue) = daily.revenue_on(incident.date) {
                group.revenues.push(revenue);
            }
            group.durations.push(incident.duration_min);
        }
        if blank > 0 {
            log::debug!("{blank} incidents without a {} left out of the segments", key.label());
        }

        let mut rows: Vec<SegmentRow> = groups
            .into_iter()
            .map(|(category, g)| SegmentRow {
                category: category.to_string(),
                mean_revenue: round2(stats::mean(&g.revenues)),
                std_revenue: round2(stats::sample_std(&g.revenues)),
                count: g.revenues.len() as u64,
                mean_duration: round2(stats::mean(&g.durations)),
            })
            .collect();
        rows.sort_by(by_mean_revenue);

        log::debug!("Segment table by {}: {} groups", key.label(), rows.len());
        Self { key, rows }
    }

    pub fn key(&self) -> SegmentKey {
        self.key
    }

    /// Rows sorted ascending by mean revenue.
    pub fn rows(&self) -> &[SegmentRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Category with the lowest mean revenue. On equal means the smallest
    /// category name wins. When no category has revenue this is the first
    /// category by name, with an undefined mean. `None` only when empty.
    pub fn worst(&self) -> Option<&SegmentRow> {
        self.rows.first()
    }
}
