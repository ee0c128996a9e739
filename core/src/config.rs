use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A lowercase source column name and the canonical name it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAlias {
    pub alias: String,
    pub canonical: String,
}

impl ColumnAlias {
    fn new(alias: &str, canonical: &str) -> Self {
        Self {
            alias: alias.into(),
            canonical: canonical.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesColumns {
    pub date: String,
    pub ticket_id: String,
    pub revenue: String,
    pub aliases: Vec<ColumnAlias>,
}

impl Default for SalesColumns {
    fn default() -> Self {
        Self {
            date: "Fecha".into(),
            ticket_id: "TicketID".into(),
            revenue: "Suma de IngresosFila".into(),
            aliases: vec![
                ColumnAlias::new("fecha", "Fecha"),
                ColumnAlias::new("ticketid", "TicketID"),
                ColumnAlias::new("ingresos_total", "Suma de IngresosFila"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentColumns {
    pub date: String,
    pub incident_id: String,
    pub duration: String,
    pub incident_type: String,
    pub severity: String,
    pub aliases: Vec<ColumnAlias>,
}

impl Default for IncidentColumns {
    fn default() -> Self {
        Self {
            date: "Fecha".into(),
            incident_id: "IncidenciaID".into(),
            duration: "Suma de DuracionMin".into(),
            incident_type: "TipoIncidencia".into(),
            severity: "Severidad".into(),
            aliases: vec![
                ColumnAlias::new("fecha", "Fecha"),
                ColumnAlias::new("incidenciaid", "IncidenciaID"),
                ColumnAlias::new("duracionmin", "Suma de DuracionMin"),
                ColumnAlias::new("tipoincidencia", "TipoIncidencia"),
                ColumnAlias::new("severidad", "Severidad"),
            ],
        }
    }
}

/// Hex colours handed to the chart renderer alongside each series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palettes {
    pub comparison: Vec<String>,
    pub incident_type: Vec<String>,
    pub severity: Vec<String>,
}

impl Default for Palettes {
    fn default() -> Self {
        let base = ["#4c72b0", "#dd8452", "#55a868", "#c44e52", "#8172b2"];
        Self {
            comparison: base[..2].iter().map(|c| c.to_string()).collect(),
            incident_type: base.iter().map(|c| c.to_string()).collect(),
            severity: base[..3].iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// File names of the rendered charts, as referenced from the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartImages {
    pub base_url: String,
    pub correlation_matrix: String,
    pub scatter: String,
    pub comparison_bar: String,
    pub comparison_box: String,
    pub by_type: String,
    pub by_severity: String,
}

impl Default for ChartImages {
    fn default() -> Self {
        Self {
            base_url: "../images".into(),
            correlation_matrix: "matriz_correlaciones.jpg".into(),
            scatter: "correlacion_incidencias_ingresos.jpg".into(),
            comparison_bar: "BARPLOT_distribucion_ingresos_con_vs_sin_incidencias.jpg".into(),
            comparison_box: "distribucion_ingresos_con_vs_sin_incidencias.jpg".into(),
            by_type: "ingreso_medio_por_tipo_incidencia.jpg".into(),
            by_severity: "ingreso_medio_por_severidad_incidencia.jpg".into(),
        }
    }
}

/// Everything one analysis run needs. Passed explicitly to each stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sales_path: PathBuf,
    pub incidents_path: PathBuf,
    pub report_path: PathBuf,
    pub charts_path: PathBuf,
    /// p-values strictly below this are significant.
    pub significance_level: f64,
    pub currency_symbol: String,
    /// Number of daily rows shown in the report's table excerpt.
    pub excerpt_rows: usize,
    pub sales_columns: SalesColumns,
    pub incident_columns: IncidentColumns,
    pub palettes: Palettes,
    pub images: ChartImages,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sales_path: PathBuf::from("data/processed/ventas400_proc2.csv"),
            incidents_path: PathBuf::from("data/processed/incidencias_proc2.csv"),
            report_path: PathBuf::from("analysis/insights.md"),
            charts_path: PathBuf::from("analysis/chart_series.json"),
            significance_level: 0.05,
            currency_symbol: "€".into(),
            excerpt_rows: 5,
            sales_columns: SalesColumns::default(),
            incident_columns: IncidentColumns::default(),
            palettes: Palettes::default(),
            images: ChartImages::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file. Missing keys fall back to the defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AnalysisConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if !(config.significance_level > 0.0 && config.significance_level < 1.0) {
            anyhow::bail!(
                "significance_level must be in (0, 1), got {}",
                config.significance_level
            );
        }
        Ok(config)
    }
}

/// Output locations for the database-to-CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub sales_file: String,
    pub incidents_file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sales_file: "ventas400_proc2.csv".into(),
            incidents_file: "incidencias_proc2.csv".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub name: String,
    pub base_price: f64,
}

/// Parameters of the synthetic sales generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub routes: Vec<String>,
    pub products: Vec<ProductSpec>,
    pub tickets_per_route: (u64, u64),
    pub products_per_ticket: (u64, u64),
    pub quantity: (u64, u64),
    /// Unit price varies uniformly within +/- this amount.
    pub price_jitter: f64,
    pub passengers: (u64, u64),
    pub sales_target: (u64, u64),
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let product = |name: &str, base_price: f64| ProductSpec {
            name: name.into(),
            base_price,
        };
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap_or_default(),
            routes: [
                "MAD-BCN", "BCN-MAD", "MAD-PMI", "PMI-MAD", "MAD-AGP", "AGP-MAD", "BCN-PMI",
                "PMI-BCN",
            ]
            .iter()
            .map(|r| r.to_string())
            .collect(),
            products: vec![
                product("Agua", 2.5),
                product("Cerveza", 8.0),
                product("Refresco", 3.5),
                product("Café", 4.0),
                product("Bocadillo", 10.0),
                product("Snack", 6.0),
            ],
            tickets_per_route: (2, 8),
            products_per_ticket: (1, 3),
            quantity: (1, 3),
            price_jitter: 0.5,
            passengers: (50, 250),
            sales_target: (600, 2000),
        }
    }
}
