//! Warehouse tests: migrations, ETL, calendar import and CSV export.
//!
//! Tests cover: pure ETL transforms, a full raw → analytics load on an
//! in-memory store, atomic calendar import, reloading generated sales, and
//! the export → loader round trip that feeds the analysis.

use chrono::NaiveDate;
use impact_core::{
    classifier::{KeywordClassifier, ProductCategory},
    config::{ExportConfig, GeneratorConfig, IncidentColumns, SalesColumns},
    daily_aggregator::DailySummary,
    error::AnalysisError,
    etl::{self, IncidentRaw, ProductRaw, RawTables, RouteRaw, SaleRaw},
    export::export_to_csv,
    generator,
    loader,
    store::{Table, WarehouseStore},
};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn store() -> WarehouseStore {
    let store = WarehouseStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn sale(ticket: &str, day: u32, route: &str, product: &str, qty: i64, price: f64, target: f64) -> SaleRaw {
    SaleRaw {
        ticketid: ticket.into(),
        fecha: d(day),
        rutaid: route.into(),
        productoid: product.into(),
        fecha_ruta: format!("{}_{route}", d(day)),
        cantidad: qty,
        preciounit: price,
        pasajeros: 120,
        objetivoventas: target,
    }
}

fn incident(id: &str, day: u32, route: &str, kind: &str, severity: &str, minutes: f64) -> IncidentRaw {
    IncidentRaw {
        incidenciaid: id.into(),
        fecha: d(day),
        rutaid: route.into(),
        tipoincidencia: kind.into(),
        severidad: severity.into(),
        duracionmin: minutes,
    }
}

fn raw() -> RawTables {
    RawTables {
        calendar: Vec::new(),
        products: vec![
            ProductRaw { productoid: "P01".into(), nombre_producto: "Agua".into() },
            ProductRaw { productoid: "P02".into(), nombre_producto: "Bocadillo".into() },
            ProductRaw { productoid: "P03".into(), nombre_producto: "Cerveza".into() },
        ],
        routes: vec![
            RouteRaw { rutaid: "R01".into(), nombre_ruta: "MAD-BCN".into() },
            RouteRaw { rutaid: "R02".into(), nombre_ruta: "PMI".into() },
        ],
        sales: vec![
            sale("1", 1, "R01", "P01", 2, 2.5, 1000.0),
            sale("1", 1, "R01", "P02", 1, 10.0, 1000.0),
            sale("2", 1, "R02", "P03", 3, 8.0, 0.0),
            sale("3", 2, "R01", "P01", 4, 2.5, 500.0),
        ],
        incidents: vec![
            incident("I1", 1, "R01", "Retraso", "Alta", 90.0),
            incident("I2", 2, "R02", "Avería", "Baja", 30.0),
            incident("I3", 3, "R01", "Retraso", "Media", 15.0),
        ],
    }
}

fn load_raw(store: &mut WarehouseStore, raw: &RawTables) {
    store.insert_products(&raw.products).unwrap();
    store.insert_routes(&raw.routes).unwrap();
    store.insert_sales(&raw.sales).unwrap();
    store.insert_incidents(&raw.incidents).unwrap();
}

#[test]
fn migrations_are_idempotent() {
    let store = store();
    store.migrate().expect("second migration");
    assert_eq!(store.count_rows(Table::VwVentas).unwrap(), 0);
}

#[test]
fn transforms_derive_analytics_columns() {
    let tables = etl::transform(&raw(), &KeywordClassifier::default());

    let categories: Vec<ProductCategory> = tables.products.iter().map(|p| p.categoria).collect();
    assert_eq!(
        categories,
        vec![ProductCategory::Bebidas, ProductCategory::Comida, ProductCategory::Otros]
    );

    assert_eq!(tables.routes[0].origen.as_deref(), Some("MAD"));
    assert_eq!(tables.routes[0].destino.as_deref(), Some("BCN"));
    assert_eq!(tables.routes[1].origen.as_deref(), Some("PMI"));
    assert_eq!(tables.routes[1].destino, None);
    assert!(tables.routes.iter().all(|r| r.tipo_transporte == "Avión" && r.distancia_km.is_none()));

    let s = &tables.sales;
    assert_eq!(s[0].ingresos_total, 5.0);
    assert!((s[0].porcentaje_objetivo - 0.5).abs() < 1e-12);
    assert_eq!(s[2].porcentaje_objetivo, 0.0, "zero target falls back to 0");
    // Flag joins on date AND route.
    assert!(s[0].tiene_incidencia);
    assert!(s[1].tiene_incidencia);
    assert!(!s[2].tiene_incidencia);
    assert!(!s[3].tiene_incidencia);

    let i = &tables.incidents;
    assert!(i[0].es_critica);
    assert!(!i[1].es_critica);
    assert_eq!(i[0].duracion_horas, 1.5);

    let types: Vec<&str> = tables.incident_types.iter().map(|t| t.tipo_incidencia.as_str()).collect();
    assert_eq!(types, vec!["Retraso", "Avería"]);
    assert_eq!(tables.incident_types[1].descripcion, "Incidencia de tipo Avería");
}

#[test]
fn calendar_transform() {
    let csv = "Fecha,Anio,MesNum,Mes,Dia,DiaSemana,SemanaISO,EsLaborable\n\
               2024-01-06,2024,1,Enero,6,Sábado,1,0\n\
               2024-04-08,2024,4,Abril,8,Lunes,15,1\n";
    let rows = etl::read_calendar(csv.as_bytes()).unwrap();
    let dims = etl::transform_calendar(&rows);
    assert_eq!(dims[0].trimestre, 1);
    assert!(dims[0].es_fin_semana);
    assert_eq!(dims[0].nombre_mes_anio, "January 2024");
    assert_eq!(dims[1].trimestre, 2);
    assert!(!dims[1].es_fin_semana);
    assert!(dims[1].base.eslaborable);
}

#[test]
fn etl_loads_every_analytics_table() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut store = store();
    load_raw(&mut store, &raw());
    let csv = "Fecha,Anio,MesNum,Mes,Dia,DiaSemana,SemanaISO,EsLaborable\n\
               2024-01-01,2024,1,Enero,1,Lunes,1,1\n\
               2024-01-02,2024,1,Enero,2,Martes,1,1\n";
    etl::import_calendar(&mut store, csv.as_bytes()).unwrap();

    let summary = etl::run_etl(&mut store, &KeywordClassifier::default()).unwrap();
    assert_eq!(summary.calendar, 2);
    assert_eq!(summary.products, 3);
    assert_eq!(summary.routes, 2);
    assert_eq!(summary.incident_types, 2);
    assert_eq!(summary.sales, 4);
    assert_eq!(summary.incidents, 3);

    assert_eq!(store.count_rows(Table::DimCalendario).unwrap(), 2);
    assert_eq!(store.count_rows(Table::FactVentas).unwrap(), 4);
    assert_eq!(store.count_rows(Table::FactIncidencias).unwrap(), 3);

    // A second run replaces rather than appends.
    etl::run_etl(&mut store, &KeywordClassifier::default()).unwrap();
    assert_eq!(store.count_rows(Table::FactVentas).unwrap(), 4);
    assert_eq!(store.count_rows(Table::DimTipoIncidencia).unwrap(), 2);
}

#[test]
fn calendar_import_is_all_or_nothing() {
    let mut store = store();
    let csv = "Fecha,Anio,MesNum,Mes,Dia,DiaSemana,SemanaISO,EsLaborable\n\
               2024-01-01,2024,1,Enero,1,Lunes,1,1\n\
               2024-01-01,2024,1,Enero,1,Lunes,1,1\n";
    let err = etl::import_calendar(&mut store, csv.as_bytes()).unwrap_err();
    assert!(matches!(err, AnalysisError::Database(_)), "got {err:?}");
    assert_eq!(store.count_rows(Table::CalendarioRaw).unwrap(), 0);

    let bad_date = "Fecha,Anio,MesNum,Mes,Dia,DiaSemana,SemanaISO,EsLaborable\n\
                    01/01/2024,2024,1,Enero,1,Lunes,1,1\n";
    let err = etl::import_calendar(&mut store, bad_date.as_bytes()).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidDate { line: 2, .. }), "got {err:?}");

    let empty = "Fecha,Anio,MesNum,Mes,Dia,DiaSemana,SemanaISO,EsLaborable\n";
    let err = etl::import_calendar(&mut store, empty.as_bytes()).unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyInput { what: "calendar" }), "got {err:?}");
}

#[test]
fn export_feeds_the_loader() {
    let mut store = store();
    load_raw(&mut store, &raw());
    etl::run_etl(&mut store, &KeywordClassifier::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("processed");
    let config = ExportConfig::default();
    let summary = export_to_csv(&store, &config, &out).unwrap();
    assert_eq!(summary.sales_rows, 4);
    assert_eq!(summary.incident_rows, 3);
    assert_eq!(summary.total(), 7);

    let sales = loader::load_sales(&out.join(&config.sales_file), &SalesColumns::default()).unwrap();
    let incidents =
        loader::load_incidents(&out.join(&config.incidents_file), &IncidentColumns::default()).unwrap();
    assert_eq!(sales.len(), 4);
    assert_eq!(incidents.len(), 3);
    assert_eq!(incidents[0].incident_id, "I1");

    let daily = DailySummary::build(&sales, &incidents);
    assert_eq!(daily.len(), 2);
    assert_eq!(daily.rows()[0].revenue, 5.0 + 10.0 + 24.0);
    assert_eq!(daily.rows()[0].tickets, 2);
    assert_eq!(daily.rows()[0].incidents, 1);
    assert_eq!(daily.rows()[1].revenue, 10.0);
    assert_eq!(daily.incident_only_dates(), &[d(3)]);
}

#[test]
fn reloading_generated_sales_replaces_previous_rows() {
    let mut store = store();
    store.insert_incidents(&raw().incidents).unwrap();
    let config = GeneratorConfig {
        start: d(1),
        end: d(3),
        ..GeneratorConfig::default()
    };

    let first = generator::to_raw_tables(&generator::generate(&config, 1));
    store.replace_sales_raw(&first).unwrap();
    let second = generator::to_raw_tables(&generator::generate(&config, 2));
    let loaded = store.replace_sales_raw(&second).unwrap();

    assert_eq!(loaded, second.sales.len());
    assert_eq!(store.count_rows(Table::VentasRaw).unwrap(), second.sales.len());
    assert_eq!(store.count_rows(Table::ProductosRaw).unwrap(), second.products.len());
    assert_eq!(store.count_rows(Table::RutasRaw).unwrap(), second.routes.len());
    assert_eq!(store.count_rows(Table::IncidenciasRaw).unwrap(), raw().incidents.len());
}
