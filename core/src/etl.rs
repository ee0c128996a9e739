//! Warehouse ETL: raw tables to the analytics dimensions and facts.
//!
//! EXECUTION ORDER:
//!   1. extract every raw table
//!   2. transform dimensions (calendar, products, routes)
//!   3. transform incident facts, then sales facts (sales read the
//!      incident keys to set their flag)
//!   4. derive the incident type catalog from the incident facts
//!   5. replace all analytics tables in one transaction
//!
//! Transforms are pure functions over row slices; only `run_etl` and
//! `import_calendar` touch the store.

use crate::{
    classifier::{ProductCategory, ProductClassifier},
    error::{AnalysisError, AnalysisResult},
    loader,
    stats,
    store::WarehouseStore,
};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use std::{collections::HashSet, io::Read};

pub const TRANSPORT_TYPE: &str = "Avión";
pub const CRITICAL_SEVERITY: &str = "Alta";
pub const INCIDENT_TYPE_CATEGORY: &str = "Operacional";
pub const INCIDENT_TYPE_CRITICALITY: &str = "Media";

// ── Raw rows ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarRaw {
    pub fecha: NaiveDate,
    pub anio: i32,
    pub mesnum: u32,
    pub mes: String,
    pub dia: u32,
    pub diasemana: String,
    pub semanaiso: u32,
    pub eslaborable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRaw {
    pub productoid: String,
    pub nombre_producto: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRaw {
    pub rutaid: String,
    pub nombre_ruta: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleRaw {
    pub ticketid: String,
    pub fecha: NaiveDate,
    pub rutaid: String,
    pub productoid: String,
    pub fecha_ruta: String,
    pub cantidad: i64,
    pub preciounit: f64,
    pub pasajeros: i64,
    pub objetivoventas: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRaw {
    pub incidenciaid: String,
    pub fecha: NaiveDate,
    pub rutaid: String,
    pub tipoincidencia: String,
    pub severidad: String,
    pub duracionmin: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTables {
    pub calendar: Vec<CalendarRaw>,
    pub products: Vec<ProductRaw>,
    pub routes: Vec<RouteRaw>,
    pub sales: Vec<SaleRaw>,
    pub incidents: Vec<IncidentRaw>,
}

// ── Analytics rows ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDim {
    pub base: CalendarRaw,
    pub trimestre: u32,
    pub nombre_mes_anio: String,
    pub es_fin_semana: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDim {
    pub productoid: String,
    pub nombre_producto: String,
    pub categoria: ProductCategory,
    pub es_activo: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteDim {
    pub rutaid: String,
    pub nombre_ruta: String,
    pub origen: Option<String>,
    pub destino: Option<String>,
    pub tipo_transporte: String,
    pub distancia_km: Option<f64>,
    pub es_activa: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentTypeDim {
    pub tipo_incidencia: String,
    pub categoria: String,
    pub nivel_criticidad: String,
    pub descripcion: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleFact {
    pub ticketid: String,
    pub fecha: NaiveDate,
    pub rutaid: String,
    pub productoid: String,
    pub fecha_ruta: String,
    pub cantidad: i64,
    pub preciounit: f64,
    pub ingresos_total: f64,
    pub pasajeros: i64,
    pub objetivoventas: f64,
    pub porcentaje_objetivo: f64,
    pub tiene_incidencia: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentFact {
    pub incidenciaid: String,
    pub fecha: NaiveDate,
    pub rutaid: String,
    pub tipo_incidencia: String,
    pub severidad: String,
    pub duracion_minutos: f64,
    pub es_critica: bool,
    pub duracion_horas: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsTables {
    pub calendar: Vec<CalendarDim>,
    pub products: Vec<ProductDim>,
    pub routes: Vec<RouteDim>,
    pub incident_types: Vec<IncidentTypeDim>,
    pub sales: Vec<SaleFact>,
    pub incidents: Vec<IncidentFact>,
}

/// Row counts loaded by one ETL run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EtlSummary {
    pub calendar: usize,
    pub products: usize,
    pub routes: usize,
    pub incident_types: usize,
    pub sales: usize,
    pub incidents: usize,
}

// ── Transforms ───────────────────────────────────────────────────────────────

pub fn quarter(date: NaiveDate) -> u32 {
    date.month0() / 3 + 1
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn transform_calendar(rows: &[CalendarRaw]) -> Vec<CalendarDim> {
    rows.iter()
        .map(|r| CalendarDim {
            base: r.clone(),
            trimestre: quarter(r.fecha),
            nombre_mes_anio: r.fecha.format("%B %Y").to_string(),
            es_fin_semana: is_weekend(r.fecha),
        })
        .collect()
}

pub fn transform_products(rows: &[ProductRaw], classifier: &dyn ProductClassifier) -> Vec<ProductDim> {
    rows.iter()
        .map(|r| ProductDim {
            productoid: r.productoid.clone(),
            nombre_producto: r.nombre_producto.clone(),
            categoria: classifier.classify(&r.nombre_producto),
            es_activo: true,
        })
        .collect()
}

/// "MAD-BCN" to ("MAD", "BCN"). A name without a dash is all origin.
pub fn split_route(name: &str) -> (Option<String>, Option<String>) {
    let mut parts = name.split('-');
    let origin = parts.next().map(str::to_string);
    let destination = parts.next().map(str::to_string);
    (origin, destination)
}

pub fn transform_routes(rows: &[RouteRaw]) -> Vec<RouteDim> {
    rows.iter()
        .map(|r| {
            let (origen, destino) = split_route(&r.nombre_ruta);
            RouteDim {
                rutaid: r.rutaid.clone(),
                nombre_ruta: r.nombre_ruta.clone(),
                origen,
                destino,
                tipo_transporte: TRANSPORT_TYPE.to_string(),
                distancia_km: None,
                es_activa: true,
            }
        })
        .collect()
}

pub fn transform_incidents(rows: &[IncidentRaw]) -> Vec<IncidentFact> {
    rows.iter()
        .map(|r| IncidentFact {
            incidenciaid: r.incidenciaid.clone(),
            fecha: r.fecha,
            rutaid: r.rutaid.clone(),
            tipo_incidencia: r.tipoincidencia.clone(),
            severidad: r.severidad.clone(),
            duracion_minutos: r.duracionmin,
            es_critica: r.severidad == CRITICAL_SEVERITY,
            duracion_horas: r.duracionmin / 60.0,
        })
        .collect()
}

/// Sales facts; a line is flagged when any incident shares its date and route.
pub fn transform_sales(rows: &[SaleRaw], incidents: &[IncidentRaw]) -> Vec<SaleFact> {
    let keys: HashSet<(NaiveDate, &str)> = incidents
        .iter()
        .map(|i| (i.fecha, i.rutaid.as_str()))
        .collect();
    rows.iter()
        .map(|r| {
            let ingresos_total = r.cantidad as f64 * r.preciounit;
            SaleFact {
                ticketid: r.ticketid.clone(),
                fecha: r.fecha,
                rutaid: r.rutaid.clone(),
                productoid: r.productoid.clone(),
                fecha_ruta: r.fecha_ruta.clone(),
                cantidad: r.cantidad,
                preciounit: r.preciounit,
                ingresos_total,
                pasajeros: r.pasajeros,
                objetivoventas: r.objetivoventas,
                porcentaje_objetivo: stats::safe_pct(ingresos_total, r.objetivoventas),
                tiene_incidencia: keys.contains(&(r.fecha, r.rutaid.as_str())),
            }
        })
        .collect()
}

/// Distinct incident types in first-seen order.
pub fn incident_type_catalog(incidents: &[IncidentFact]) -> Vec<IncidentTypeDim> {
    let mut seen = HashSet::new();
    incidents
        .iter()
        .filter(|i| seen.insert(i.tipo_incidencia.as_str()))
        .map(|i| IncidentTypeDim {
            tipo_incidencia: i.tipo_incidencia.clone(),
            categoria: INCIDENT_TYPE_CATEGORY.to_string(),
            nivel_criticidad: INCIDENT_TYPE_CRITICALITY.to_string(),
            descripcion: format!("Incidencia de tipo {}", i.tipo_incidencia),
        })
        .collect()
}

pub fn transform(raw: &RawTables, classifier: &dyn ProductClassifier) -> AnalyticsTables {
    let incidents = transform_incidents(&raw.incidents);
    let incident_types = incident_type_catalog(&incidents);
    AnalyticsTables {
        calendar: transform_calendar(&raw.calendar),
        products: transform_products(&raw.products, classifier),
        routes: transform_routes(&raw.routes),
        incident_types,
        sales: transform_sales(&raw.sales, &raw.incidents),
        incidents,
    }
}

// ── Jobs ─────────────────────────────────────────────────────────────────────

pub fn run_etl(
    store: &mut WarehouseStore,
    classifier: &dyn ProductClassifier,
) -> AnalysisResult<EtlSummary> {
    log::info!("ETL: extracting raw tables");
    let raw = store.extract_raw()?;
    log::info!(
        "ETL: extracted calendar={} products={} routes={} sales={} incidents={}",
        raw.calendar.len(),
        raw.products.len(),
        raw.routes.len(),
        raw.sales.len(),
        raw.incidents.len()
    );

    let tables = transform(&raw, classifier);
    log::debug!("ETL: {} sales lines flagged with an incident", tables.sales.iter().filter(|s| s.tiene_incidencia).count());

    store.replace_analytics(&tables)?;
    let summary = EtlSummary {
        calendar: tables.calendar.len(),
        products: tables.products.len(),
        routes: tables.routes.len(),
        incident_types: tables.incident_types.len(),
        sales: tables.sales.len(),
        incidents: tables.incidents.len(),
    };
    log::info!("ETL: analytics tables loaded: {summary:?}");
    Ok(summary)
}

#[derive(Debug, Deserialize)]
struct CalendarCsvRow {
    #[serde(rename = "Fecha")]
    fecha: String,
    #[serde(rename = "Anio")]
    anio: i32,
    #[serde(rename = "MesNum")]
    mesnum: u32,
    #[serde(rename = "Mes")]
    mes: String,
    #[serde(rename = "Dia")]
    dia: u32,
    #[serde(rename = "DiaSemana")]
    diasemana: String,
    #[serde(rename = "SemanaISO")]
    semanaiso: u32,
    #[serde(rename = "EsLaborable")]
    eslaborable: String,
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "sí" | "si" | "s" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Parse a calendar CSV (`Fecha, Anio, MesNum, Mes, Dia, DiaSemana,
/// SemanaISO, EsLaborable`) into raw calendar rows.
pub fn read_calendar<R: Read>(source: R) -> AnalysisResult<Vec<CalendarRaw>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut rows = Vec::new();
    for (i, record) in reader.deserialize::<CalendarCsvRow>().enumerate() {
        let record = record?;
        let line = i as u64 + 2;
        let fecha = loader::parse_date(&record.fecha).ok_or_else(|| AnalysisError::InvalidDate {
            column: "Fecha".into(),
            value: record.fecha.clone(),
            line,
        })?;
        let eslaborable =
            parse_flag(&record.eslaborable).ok_or_else(|| AnalysisError::InvalidNumber {
                column: "EsLaborable".into(),
                value: record.eslaborable.clone(),
                line,
            })?;
        rows.push(CalendarRaw {
            fecha,
            anio: record.anio,
            mesnum: record.mesnum,
            mes: record.mes,
            dia: record.dia,
            diasemana: record.diasemana,
            semanaiso: record.semanaiso,
            eslaborable,
        });
    }
    Ok(rows)
}

/// Read a calendar CSV and insert it into `calendario_raw` atomically:
/// a bad row leaves the table untouched.
pub fn import_calendar<R: Read>(store: &mut WarehouseStore, source: R) -> AnalysisResult<usize> {
    let rows = read_calendar(source)?;
    if rows.is_empty() {
        return Err(AnalysisError::EmptyInput { what: "calendar" });
    }
    log::info!("Importing {} calendar rows", rows.len());
    store.insert_calendar(&rows)
}
