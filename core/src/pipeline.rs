//! Analysis pipeline: one linear batch run.
//!
//! EXECUTION ORDER:
//!   1. load sales and incidents (fatal on I/O or parse errors)
//!   2. build the daily table
//!   3. run the comparator
//!   4. build the type and severity segment tables
//!   5. build the report and chart series in memory
//!   6. write both outputs to temporary siblings, then rename both
//!
//! RULE: nothing is written until every in-memory stage has succeeded, and
//! nothing is renamed until every temporary file is written.

use crate::{
    charts::{self, ChartSeries},
    comparator::{self, Comparison},
    config::AnalysisConfig,
    daily_aggregator::DailySummary,
    error::AnalysisResult,
    loader,
    report,
    segment_aggregator::{SegmentKey, SegmentTable},
    types::{IncidentRecord, SalesRecord},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub daily: DailySummary,
    pub comparison: Comparison,
    pub by_type: SegmentTable,
    pub by_severity: SegmentTable,
    pub report: String,
    pub charts: ChartSeries,
}

/// Stages 2–5 over records already in memory. Touches no files.
pub fn analyze(
    sales: &[SalesRecord],
    incidents: &[IncidentRecord],
    config: &AnalysisConfig,
) -> AnalysisOutcome {
    let daily = DailySummary::build(sales, incidents);
    let comparison = comparator::compare(&daily, config);
    let by_type = SegmentTable::build(incidents, &daily, SegmentKey::IncidentType);
    let by_severity = SegmentTable::build(incidents, &daily, SegmentKey::Severity);
    let report = report::build_report(&daily, &comparison, &by_type, &by_severity, config);
    let charts = charts::build_charts(&daily, &comparison, &by_type, &by_severity, config);

    AnalysisOutcome {
        daily,
        comparison,
        by_type,
        by_severity,
        report,
        charts,
    }
}

/// Full run: load inputs from `config`, analyze, write report and charts.
pub fn run(config: &AnalysisConfig) -> AnalysisResult<AnalysisOutcome> {
    let (sales, incidents) = loader::load_data(config)?;
    let outcome = analyze(&sales, &incidents, config);

    let charts_json = serde_json::to_string_pretty(&outcome.charts)?;
    write_all_atomic(&[
        (config.charts_path.as_path(), charts_json.as_str()),
        (config.report_path.as_path(), outcome.report.as_str()),
    ])?;

    log::info!(
        "Report written to {} ({} bytes), chart series to {}",
        config.report_path.display(),
        outcome.report.len(),
        config.charts_path.display()
    );
    Ok(outcome)
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn stage(path: &Path, contents: &str) -> AnalysisResult<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_sibling(path);
    fs::write(&tmp, contents)?;
    Ok(tmp)
}

/// Stage every file as `<path>.tmp` first; rename only once all are staged.
/// A failed staging removes the temporaries and leaves every target as it was.
pub fn write_all_atomic(files: &[(&Path, &str)]) -> AnalysisResult<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());
    for &(path, contents) in files {
        match stage(path, contents) {
            Ok(tmp) => staged.push((tmp, path)),
            Err(e) => {
                for (tmp, _) in &staged {
                    let _ = fs::remove_file(tmp);
                }
                return Err(e);
            }
        }
    }
    for (i, (tmp, path)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, path) {
            for (rest, _) in &staged[i..] {
                let _ = fs::remove_file(rest);
            }
            return Err(e.into());
        }
    }
    Ok(())
}
