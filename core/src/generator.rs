//! Synthetic sales generator.
//!
//! For every day and route: a random number of tickets sharing one
//! passenger count; each ticket carries 1..n distinct products with a
//! quantity, a jittered unit price and a sales target. Ticket ids are
//! sequential from 1. Same config and seed, same lines.

use crate::{
    config::GeneratorConfig,
    error::AnalysisResult,
    etl::{ProductRaw, RawTables, RouteRaw, SaleRaw},
    rng::{RngBank, StreamSlot},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesLine {
    #[serde(rename = "TicketID")]
    pub ticket_id: u64,
    #[serde(rename = "Fecha")]
    pub date: NaiveDate,
    #[serde(rename = "Ruta")]
    pub route: String,
    #[serde(rename = "Fecha-Ruta")]
    pub date_route: String,
    #[serde(rename = "Producto")]
    pub product: String,
    #[serde(rename = "Cantidad")]
    pub quantity: u64,
    #[serde(rename = "PrecioUnit")]
    pub unit_price: f64,
    #[serde(rename = "Pasajeros")]
    pub passengers: u64,
    #[serde(rename = "ObjetivoVentas")]
    pub sales_target: u64,
    #[serde(rename = "DiaSemana")]
    pub weekday: String,
}

impl SalesLine {
    pub fn revenue(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn generate(config: &GeneratorConfig, seed: u64) -> Vec<SalesLine> {
    let bank = RngBank::new(seed);
    let mut tickets = bank.stream(StreamSlot::Tickets);
    let mut products = bank.stream(StreamSlot::Products);
    let mut pricing = bank.stream(StreamSlot::Pricing);
    let mut targets = bank.stream(StreamSlot::Targets);

    let mut lines = Vec::new();
    let mut ticket_id = 1u64;
    for date in config.start.iter_days().take_while(|d| *d <= config.end) {
        let weekday = date.format("%A").to_string();
        for route in &config.routes {
            let date_route = format!("{date}_{route}");
            let n_tickets =
                tickets.range_inclusive(config.tickets_per_route.0, config.tickets_per_route.1);
            let passengers = tickets.range_inclusive(config.passengers.0, config.passengers.1);

            for _ in 0..n_tickets {
                let n_products = products
                    .range_inclusive(config.products_per_ticket.0, config.products_per_ticket.1)
                    as usize;
                for idx in products.sample_indices(config.products.len(), n_products) {
                    let product = &config.products[idx];
                    let quantity = pricing.range_inclusive(config.quantity.0, config.quantity.1);
                    let jitter = pricing.uniform(-config.price_jitter, config.price_jitter);
                    lines.push(SalesLine {
                        ticket_id,
                        date,
                        route: route.clone(),
                        date_route: date_route.clone(),
                        product: product.name.clone(),
                        quantity,
                        unit_price: round2(product.base_price + jitter),
                        passengers,
                        sales_target: targets
                            .range_inclusive(config.sales_target.0, config.sales_target.1),
                        weekday: weekday.clone(),
                    });
                }
                ticket_id += 1;
            }
        }
    }
    log::info!(
        "Generated {} sales lines over {} tickets (seed {seed})",
        lines.len(),
        ticket_id - 1
    );
    lines
}

pub fn write_csv(lines: &[SalesLine], path: &Path) -> AnalysisResult<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for line in lines {
        writer.serialize(line)?;
    }
    writer.flush()?;
    Ok(lines.len())
}

/// Raw warehouse rows for generated lines: products `P01..`, routes
/// `R01..` in first-seen order, one sales row per line.
pub fn to_raw_tables(lines: &[SalesLine]) -> RawTables {
    let mut product_ids: HashMap<&str, String> = HashMap::new();
    let mut route_ids: HashMap<&str, String> = HashMap::new();
    let mut raw = RawTables::default();

    for line in lines {
        let product_id = product_ids
            .entry(line.product.as_str())
            .or_insert_with(|| {
                let id = format!("P{:02}", raw.products.len() + 1);
                raw.products.push(ProductRaw {
                    productoid: id.clone(),
                    nombre_producto: line.product.clone(),
                });
                id
            })
            .clone();
        let route_id = route_ids
            .entry(line.route.as_str())
            .or_insert_with(|| {
                let id = format!("R{:02}", raw.routes.len() + 1);
                raw.routes.push(RouteRaw {
                    rutaid: id.clone(),
                    nombre_ruta: line.route.clone(),
                });
                id
            })
            .clone();
        raw.sales.push(SaleRaw {
            ticketid: line.ticket_id.to_string(),
            fecha: line.date,
            rutaid: route_id,
            productoid: product_id,
            fecha_ruta: line.date_route.clone(),
            cantidad: line.quantity as i64,
            preciounit: line.unit_price,
            pasajeros: line.passengers as i64,
            objetivoventas: line.sales_target as f64,
        });
    }
    raw
}
