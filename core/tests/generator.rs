//! Synthetic generator tests.

use chrono::NaiveDate;
use impact_core::{
    config::GeneratorConfig,
    generator::{generate, to_raw_tables, write_csv, SalesLine},
};
use std::collections::HashSet;

fn short_config() -> GeneratorConfig {
    GeneratorConfig {
        start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        ..GeneratorConfig::default()
    }
}

#[test]
fn same_seed_same_lines() {
    let config = short_config();
    assert_eq!(generate(&config, 42), generate(&config, 42));
    assert_ne!(generate(&config, 42), generate(&config, 43));
}

#[test]
fn lines_respect_configured_ranges() {
    let config = short_config();
    let lines = generate(&config, 7);
    assert!(!lines.is_empty());

    let base: std::collections::HashMap<&str, f64> =
        config.products.iter().map(|p| (p.name.as_str(), p.base_price)).collect();
    for l in &lines {
        assert!(l.date >= config.start && l.date <= config.end);
        assert!((1..=3).contains(&l.quantity));
        assert!((50..=250).contains(&l.passengers));
        assert!((600..=2000).contains(&l.sales_target));
        assert!((l.unit_price - base[l.product.as_str()]).abs() <= 0.5 + 1e-9);
        assert_eq!(l.date_route, format!("{}_{}", l.date, l.route));
    }

    // Every day and route gets between 2 and 8 tickets.
    let days = 7;
    let tickets: HashSet<u64> = lines.iter().map(|l| l.ticket_id).collect();
    let per_route_day = tickets.len() as f64 / (days * config.routes.len()) as f64;
    assert!((2.0..=8.0).contains(&per_route_day));
    assert_eq!(*tickets.iter().max().unwrap() as usize, tickets.len());
}

#[test]
fn products_are_distinct_within_a_ticket() {
    let lines = generate(&short_config(), 11);
    let mut seen: HashSet<(u64, &str)> = HashSet::new();
    for l in &lines {
        assert!(seen.insert((l.ticket_id, l.product.as_str())), "duplicate {l:?}");
    }
}

#[test]
fn csv_uses_source_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw/ventas.csv");
    let lines = generate(&short_config(), 3);
    assert_eq!(write_csv(&lines, &path).unwrap(), lines.len());

    let text = std::fs::read_to_string(&path).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(
        header,
        "TicketID,Fecha,Ruta,Fecha-Ruta,Producto,Cantidad,PrecioUnit,Pasajeros,ObjetivoVentas,DiaSemana"
    );
    let first = text.lines().nth(1).unwrap();
    assert!(first.starts_with("1,2024-01-01,MAD-BCN,2024-01-01_MAD-BCN,"));
    assert!(first.ends_with(",Monday"));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let back: Vec<SalesLine> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(back.len(), lines.len());
    assert_eq!(back[0].ticket_id, lines[0].ticket_id);
}

#[test]
fn raw_tables_share_ids() {
    let lines = generate(&short_config(), 5);
    let raw = to_raw_tables(&lines);
    assert_eq!(raw.sales.len(), lines.len());
    assert!(raw.products.len() <= 6);
    assert_eq!(raw.routes.len(), 8);
    assert_eq!(raw.routes[0].nombre_ruta, "MAD-BCN");
    assert_eq!(raw.routes[0].rutaid, "R01");
    let revenue: f64 = raw.sales.iter().map(|s| s.cantidad as f64 * s.preciounit).sum();
    let expected: f64 = lines.iter().map(SalesLine::revenue).sum();
    assert!((revenue - expected).abs() < 1e-6);
}
