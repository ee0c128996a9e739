//! Data loader tests.
//!
//! Tests cover: canonical and database-exported headers, extra columns,
//! and the fatal parse errors (missing column, bad date, bad number).

use chrono::NaiveDate;
use impact_core::{
    config::{IncidentColumns, SalesColumns},
    error::AnalysisError,
    loader::{read_incidents, read_sales},
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn sales_with_canonical_headers() {
    let csv = "Fecha,TicketID,Ruta,Suma de IngresosFila\n\
               2024-01-01,T1,MAD-BCN,100.5\n\
               2024-01-01 00:00:00,T1,MAD-BCN,49.5\n";
    let sales = read_sales(csv.as_bytes(), &SalesColumns::default()).unwrap();

    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0].date, d(2024, 1, 1));
    assert_eq!(sales[1].date, d(2024, 1, 1));
    assert_eq!(sales[0].ticket_id, "T1");
    assert_eq!(sales[0].revenue + sales[1].revenue, 150.0);
}

#[test]
fn sales_exported_from_the_warehouse_view() {
    let csv = "fecha,ticketid,ingresos_total\n2024-01-02,7,200\n";
    let sales = read_sales(csv.as_bytes(), &SalesColumns::default()).unwrap();

    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].date, d(2024, 1, 2));
    assert_eq!(sales[0].ticket_id, "7");
    assert_eq!(sales[0].revenue, 200.0);
}

#[test]
fn incidents_with_raw_table_headers() {
    let csv = "incidenciaid,fecha,rutaid,tipoincidencia,severidad,duracionmin\n\
               I1,2024-01-01,R01,Retraso,Alta,30\n";
    let incidents = read_incidents(csv.as_bytes(), &IncidentColumns::default()).unwrap();

    assert_eq!(incidents.len(), 1);
    let i = &incidents[0];
    assert_eq!(i.incident_id, "I1");
    assert_eq!(i.incident_type, "Retraso");
    assert_eq!(i.severity, "Alta");
    assert_eq!(i.duration_min, 30.0);
}

#[test]
fn empty_input_is_not_an_error() {
    let csv = "Fecha,TicketID,Suma de IngresosFila\n";
    let sales = read_sales(csv.as_bytes(), &SalesColumns::default()).unwrap();
    assert!(sales.is_empty());
}

#[test]
fn missing_column_is_fatal() {
    let csv = "Fecha,TicketID\n2024-01-01,T1\n";
    let err = read_sales(csv.as_bytes(), &SalesColumns::default()).unwrap_err();
    match err {
        AnalysisError::MissingColumn { table, column } => {
            assert_eq!(table, "sales");
            assert_eq!(column, "Suma de IngresosFila");
        }
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn malformed_date_is_fatal() {
    let csv = "Fecha,TicketID,Suma de IngresosFila\n2024-01-01,T1,10\n01/02/2024,T2,20\n";
    let err = read_sales(csv.as_bytes(), &SalesColumns::default()).unwrap_err();
    match err {
        AnalysisError::InvalidDate { value, line, .. } => {
            assert_eq!(value, "01/02/2024");
            assert_eq!(line, 3);
        }
        other => panic!("expected InvalidDate, got {other:?}"),
    }
}

#[test]
fn malformed_number_is_fatal() {
    let csv = "Fecha,IncidenciaID,Suma de DuracionMin,TipoIncidencia,Severidad\n\
               2024-01-01,I1,abc,Retraso,Baja\n";
    let err = read_incidents(csv.as_bytes(), &IncidentColumns::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidNumber { .. }), "got {err:?}");
}
