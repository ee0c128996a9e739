//! impact-runner: batch jobs for the incident impact analysis.
//!
//! Usage:
//!   impact-runner analyze [--config analysis.json] [--json]
//!   impact-runner export --db warehouse.db --out-dir data/processed
//!   impact-runner etl --db warehouse.db
//!   impact-runner import-calendar --db warehouse.db --csv Calendario.csv
//!   impact-runner generate --seed 42 --out Ventas_Realistas.csv
//!                          [--from 2024-01-01 --to 2024-03-31] [--db warehouse.db]

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use impact_core::{
    classifier::KeywordClassifier,
    config::{AnalysisConfig, ExportConfig, GeneratorConfig},
    etl, export, generator, pipeline,
    report::format_currency,
    store::WarehouseStore,
};
use std::{env, fs::File, path::Path, time::Instant};

const USAGE: &str = "usage: impact-runner <analyze|export|etl|import-calendar|generate> [--flag value ...]";

#[derive(serde::Serialize)]
struct AnalyzeSummary {
    days: usize,
    days_with_incidents: usize,
    incident_only_dates: usize,
    point_biserial: Option<f64>,
    point_biserial_p: Option<f64>,
    t_test_p: Option<f64>,
    mann_whitney_p: Option<f64>,
    mean_difference: f64,
    worst_type: Option<String>,
    worst_severity: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1) else {
        bail!("{USAGE}");
    };
    let started = Instant::now();
    log::info!("impact-runner {command}");

    match command.as_str() {
        "analyze" => analyze(&args)?,
        "export" => export_csv(&args)?,
        "etl" => run_etl(&args)?,
        "import-calendar" => import_calendar(&args)?,
        "generate" => generate(&args)?,
        other => bail!("unknown subcommand '{other}'\n{USAGE}"),
    }

    println!("  elapsed:        {:.2}s", started.elapsed().as_secs_f64());
    Ok(())
}

fn analyze(args: &[String]) -> Result<()> {
    let config = match string_arg(args, "--config") {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    let outcome = pipeline::run(&config)?;
    let c = &outcome.comparison;

    if args.iter().any(|a| a == "--json") {
        let summary = AnalyzeSummary {
            days: outcome.daily.len(),
            days_with_incidents: outcome.daily.days_with_incidents(),
            incident_only_dates: outcome.daily.incident_only_dates().len(),
            point_biserial: c.point_biserial.map(|r| r.coefficient),
            point_biserial_p: c.point_biserial.map(|r| r.p_value),
            t_test_p: c.t_test.map(|t| t.p_value),
            mann_whitney_p: c.mann_whitney.map(|t| t.p_value),
            mean_difference: c.mean_difference,
            worst_type: outcome.by_type.worst().map(|r| r.category.clone()),
            worst_severity: outcome.by_severity.worst().map(|r| r.category.clone()),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let symbol = &config.currency_symbol;
    println!("=== ANALYSIS SUMMARY ===");
    println!("  days:           {}", outcome.daily.len());
    println!("  with incidents: {}", outcome.daily.days_with_incidents());
    println!("  total revenue:  {}", format_currency(outcome.daily.total_revenue(), symbol));
    println!("  mean diff:      {}", format_currency(c.mean_difference, symbol));
    match c.point_biserial {
        Some(r) => println!("  point-biserial: r={:.4} p={:.4e}", r.coefficient, r.p_value),
        None => println!("  point-biserial: N/A"),
    }
    match c.t_test {
        Some(t) => println!("  t-test:         t={:.4} p={:.4e}", t.statistic, t.p_value),
        None => println!("  t-test:         N/A"),
    }
    println!("  report:         {}", config.report_path.display());
    println!("  chart series:   {}", config.charts_path.display());
    Ok(())
}

fn export_csv(args: &[String]) -> Result<()> {
    let db = required_arg(args, "--db")?;
    let out_dir = string_arg(args, "--out-dir").unwrap_or("data/processed");
    let store = WarehouseStore::open(db)?;
    store.migrate()?;

    let summary = export::export_to_csv(&store, &ExportConfig::default(), Path::new(out_dir))?;
    println!("=== EXPORT SUMMARY ===");
    println!("  sales rows:     {}", summary.sales_rows);
    println!("  incident rows:  {}", summary.incident_rows);
    println!("  total:          {}", summary.total());
    println!("  out dir:        {out_dir}");
    Ok(())
}

fn run_etl(args: &[String]) -> Result<()> {
    let db = required_arg(args, "--db")?;
    let mut store = WarehouseStore::open(db)?;
    store.migrate()?;

    let summary = etl::run_etl(&mut store, &KeywordClassifier::default())?;
    println!("=== ETL SUMMARY ===");
    println!("  calendar:       {}", summary.calendar);
    println!("  products:       {}", summary.products);
    println!("  routes:         {}", summary.routes);
    println!("  incident types: {}", summary.incident_types);
    println!("  sales:          {}", summary.sales);
    println!("  incidents:      {}", summary.incidents);
    Ok(())
}

fn import_calendar(args: &[String]) -> Result<()> {
    let db = required_arg(args, "--db")?;
    let csv_path = required_arg(args, "--csv")?;
    let mut store = WarehouseStore::open(db)?;
    store.migrate()?;

    let file = File::open(csv_path).with_context(|| format!("Cannot read {csv_path}"))?;
    let imported = etl::import_calendar(&mut store, file)?;
    println!("=== CALENDAR IMPORT ===");
    println!("  rows imported:  {imported}");
    Ok(())
}

fn generate(args: &[String]) -> Result<()> {
    let seed = parse_arg(args, "--seed", 42u64);
    let out = string_arg(args, "--out").unwrap_or("data/raw/Ventas_Realistas.csv");
    let mut config = GeneratorConfig::default();
    if let Some(from) = date_arg(args, "--from")? {
        config.start = from;
    }
    if let Some(to) = date_arg(args, "--to")? {
        config.end = to;
    }
    if config.start > config.end {
        bail!("--from {} is after --to {}", config.start, config.end);
    }

    let lines = generator::generate(&config, seed);
    let written = generator::write_csv(&lines, Path::new(out))?;

    if let Some(db) = string_arg(args, "--db") {
        let raw = generator::to_raw_tables(&lines);
        let mut store = WarehouseStore::open(db)?;
        store.migrate()?;
        let loaded = store.replace_sales_raw(&raw)?;
        println!("  loaded into:    {db} ({loaded} sales)");
    }

    let tickets = lines.last().map(|l| l.ticket_id).unwrap_or(0);
    println!("=== GENERATOR SUMMARY ===");
    println!("  seed:           {seed}");
    println!("  period:         {} to {}", config.start, config.end);
    println!("  lines:          {written}");
    println!("  tickets:        {tickets}");
    println!("  out:            {out}");
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn required_arg<'a>(args: &'a [String], flag: &str) -> Result<&'a str> {
    string_arg(args, flag).with_context(|| format!("missing required flag {flag}\n{USAGE}"))
}

fn date_arg(args: &[String], flag: &str) -> Result<Option<NaiveDate>> {
    string_arg(args, flag)
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("{flag} expects YYYY-MM-DD, got '{raw}'"))
        })
        .transpose()
}
