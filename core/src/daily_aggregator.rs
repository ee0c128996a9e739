//! Daily aggregator: one row per date present in the sales input.
//!
//! The join is revenue-day-anchored: sales are the left side, so a date
//! that only has incidents is not represented. Dropped dates are counted
//! and logged, never silently re-added.

use crate::types::{DailySummaryRow, IncidentRecord, SalesRecord};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    rows: Vec<DailySummaryRow>,
    incident_only_dates: Vec<NaiveDate>,
}

impl DailySummary {
    pub fn build(sales: &[SalesRecord], incidents: &[IncidentRecord]) -> Self {
        let mut sales_by_day: BTreeMap<NaiveDate, (f64, HashSet<&str>)> = BTreeMap::new();
        for s in sales {
            let entry = sales_by_day.entry(s.date).or_default();
            entry.0 += s.revenue;
            entry.1.insert(s.ticket_id.as_str());
        }

        let mut incidents_by_day: BTreeMap<NaiveDate, (u64, f64)> = BTreeMap::new();
        for i in incidents {
            let entry = incidents_by_day.entry(i.date).or_default();
            entry.0 += 1;
            entry.1 += i.duration_min;
        }

        let rows: Vec<DailySummaryRow> = sales_by_day
            .iter()
            .map(|(date, (revenue, tickets))| {
                let (count, duration) = incidents_by_day.get(date).copied().unwrap_or((0, 0.0));
                DailySummaryRow {
                    date: *date,
                    revenue: *revenue,
                    tickets: tickets.len() as u64,
                    incidents: count,
                    duration_min: duration,
                }
            })
            .collect();

        let incident_only_dates: Vec<NaiveDate> = incidents_by_day
            .keys()
            .filter(|d| !sales_by_day.contains_key(*d))
            .copied()
            .collect();
        if !incident_only_dates.is_empty() {
            log::warn!(
                "{} incident date(s) have no sales and are not represented in the daily table",
                incident_only_dates.len()
            );
        }
        log::info!("Daily table built: {} days", rows.len());

        Self {
            rows,
            incident_only_dates,
        }
    }

    /// Rows in ascending date order.
    pub fn rows(&self) -> &[DailySummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Dates that had incidents but no sales.
    pub fn incident_only_dates(&self) -> &[NaiveDate] {
        &self.incident_only_dates
    }

    /// Aggregate revenue of `date`, if it is a sales date.
    pub fn revenue_on(&self, date: NaiveDate) -> Option<f64> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| self.rows[i].revenue)
    }

    /// Revenue series split by the has-incident flag: (with, without).
    pub fn split_by_incident(&self) -> (Vec<f64>, Vec<f64>) {
        let mut with = Vec::new();
        let mut without = Vec::new();
        for r in &self.rows {
            if r.has_incident() == 1 {
                with.push(r.revenue);
            } else {
                without.push(r.revenue);
            }
        }
        (with, without)
    }

    pub fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.rows.first()?.date, self.rows.last()?.date))
    }

    pub fn days_with_incidents(&self) -> usize {
        self.rows.iter().filter(|r| r.has_incident() == 1).count()
    }

    pub fn total_incidents(&self) -> u64 {
        self.rows.iter().map(|r| r.incidents).sum()
    }

    pub fn total_revenue(&self) -> f64 {
        self.rows.iter().map(|r| r.revenue).sum()
    }

    pub fn incident_counts(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.incidents as f64).collect()
    }

    pub fn revenues(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.revenue).collect()
    }

    /// Distinct dates in the table, for callers that need set semantics.
    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }
}
