//! Shared record types used across the analysis pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One sales line item. Several lines share a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date:      NaiveDate,
    pub ticket_id: String,
    pub revenue:   f64,
}

/// One operational incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub date:          NaiveDate,
    pub incident_id:   String,
    pub duration_min:  f64,
    pub incident_type: String,
    pub severity:      String,
}

/// Per-date aggregate of sales and incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummaryRow {
    pub date:         NaiveDate,
    pub revenue:      f64,
    pub tickets:      u64,
    pub incidents:    u64,
    pub duration_min: f64,
}

impl DailySummaryRow {
    /// 1 when at least one incident happened that day, else 0.
    pub fn has_incident(&self) -> u8 {
        u8::from(self.incidents > 0)
    }
}

/// Revenue statistics for one incident category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRow {
    pub category:      String,
    pub mean_revenue:  f64,
    pub std_revenue:   f64,
    pub count:         u64,
    pub mean_duration: f64,
}
