//! Data loader: CSV inputs to typed sales and incident records.
//!
//! Header handling:
//!   - names are trimmed of surrounding whitespace
//!   - exact lowercase aliases (as exported from the database) are renamed
//!     to their canonical name; every other column passes through unchanged
//!
//! Any unreadable file, missing required column, malformed date or
//! malformed number aborts the load. There is no partial recovery.

use crate::{
    config::{AnalysisConfig, ColumnAlias, IncidentColumns, SalesColumns},
    error::{AnalysisError, AnalysisResult},
    types::{IncidentRecord, SalesRecord},
};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use std::{fs::File, io::Read, path::Path};

/// Trim every header and apply the alias mapping.
pub fn normalize_headers(headers: &StringRecord, aliases: &[ColumnAlias]) -> Vec<String> {
    headers
        .iter()
        .map(|h| {
            let trimmed = h.trim();
            aliases
                .iter()
                .find(|a| a.alias == trimmed)
                .map(|a| a.canonical.clone())
                .unwrap_or_else(|| trimmed.to_string())
        })
        .collect()
}

/// Parse `YYYY-MM-DD`, optionally followed by a time of day which is dropped.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

struct Columns<'a> {
    table: &'static str,
    headers: &'a [String],
}

impl Columns<'_> {
    fn index(&self, name: &str) -> AnalysisResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AnalysisError::MissingColumn {
                table: self.table,
                column: name.to_string(),
            })
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn date_field(record: &StringRecord, idx: usize, column: &str) -> AnalysisResult<NaiveDate> {
    let value = record.get(idx).unwrap_or_default();
    parse_date(value).ok_or_else(|| AnalysisError::InvalidDate {
        column: column.to_string(),
        value: value.to_string(),
        line: line_of(record),
    })
}

fn number_field(record: &StringRecord, idx: usize, column: &str) -> AnalysisResult<f64> {
    let value = record.get(idx).unwrap_or_default();
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AnalysisError::InvalidNumber {
            column: column.to_string(),
            value: value.to_string(),
            line: line_of(record),
        })
}

fn text_field(record: &StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or_default().trim().to_string()
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source)
}

/// Read sales line items from any CSV source.
pub fn read_sales<R: Read>(source: R, columns: &SalesColumns) -> AnalysisResult<Vec<SalesRecord>> {
    let mut rdr = reader(source);
    let headers = normalize_headers(rdr.headers()?, &columns.aliases);
    let cols = Columns { table: "sales", headers: &headers };
    let date = cols.index(&columns.date)?;
    let ticket = cols.index(&columns.ticket_id)?;
    let revenue = cols.index(&columns.revenue)?;

    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record?;
        out.push(SalesRecord {
            date: date_field(&record, date, &columns.date)?,
            ticket_id: text_field(&record, ticket),
            revenue: number_field(&record, revenue, &columns.revenue)?,
        });
    }
    log::debug!("Read {} sales rows", out.len());
    Ok(out)
}

/// Read incident records from any CSV source.
pub fn read_incidents<R: Read>(
    source: R,
    columns: &IncidentColumns,
) -> AnalysisResult<Vec<IncidentRecord>> {
    let mut rdr = reader(source);
    let headers = normalize_headers(rdr.headers()?, &columns.aliases);
    let cols = Columns { table: "incidents", headers: &headers };
    let date = cols.index(&columns.date)?;
    let id = cols.index(&columns.incident_id)?;
    let duration = cols.index(&columns.duration)?;
    let kind = cols.index(&columns.incident_type)?;
    let severity = cols.index(&columns.severity)?;

    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record?;
        out.push(IncidentRecord {
            date: date_field(&record, date, &columns.date)?,
            incident_id: text_field(&record, id),
            duration_min: number_field(&record, duration, &columns.duration)?,
            incident_type: text_field(&record, kind),
            severity: text_field(&record, severity),
        });
    }
    log::debug!("Read {} incident rows", out.len());
    Ok(out)
}

pub fn load_sales(path: &Path, columns: &SalesColumns) -> AnalysisResult<Vec<SalesRecord>> {
    read_sales(File::open(path)?, columns)
}

pub fn load_incidents(path: &Path, columns: &IncidentColumns) -> AnalysisResult<Vec<IncidentRecord>> {
    read_incidents(File::open(path)?, columns)
}

/// Load both inputs named by the configuration.
pub fn load_data(config: &AnalysisConfig) -> AnalysisResult<(Vec<SalesRecord>, Vec<IncidentRecord>)> {
    let sales = load_sales(&config.sales_path, &config.sales_columns)?;
    let incidents = load_incidents(&config.incidents_path, &config.incident_columns)?;
    log::info!(
        "Loaded {} sales rows from {} and {} incidents from {}",
        sales.len(),
        config.sales_path.display(),
        incidents.len(),
        config.incidents_path.display()
    );
    Ok((sales, incidents))
}
