//! Raw landing tables: bulk inserts and the ETL extract.

use super::WarehouseStore;
use crate::{
    error::AnalysisResult,
    etl::{CalendarRaw, IncidentRaw, ProductRaw, RawTables, RouteRaw, SaleRaw},
};
use rusqlite::{params, Transaction};

impl WarehouseStore {
    /// Insert calendar rows in one transaction.
    pub fn insert_calendar(&mut self, rows: &[CalendarRaw]) -> AnalysisResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO calendario_raw
                    (fecha, anio, mesnum, mes, dia, diasemana, semanaiso, eslaborable)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.fecha,
                    r.anio,
                    r.mesnum,
                    r.mes,
                    r.dia,
                    r.diasemana,
                    r.semanaiso,
                    r.eslaborable,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn insert_products(&mut self, rows: &[ProductRaw]) -> AnalysisResult<usize> {
        let tx = self.conn.transaction()?;
        put_products(&tx, rows)?;
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn insert_routes(&mut self, rows: &[RouteRaw]) -> AnalysisResult<usize> {
        let tx = self.conn.transaction()?;
        put_routes(&tx, rows)?;
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn insert_sales(&mut self, rows: &[SaleRaw]) -> AnalysisResult<usize> {
        let tx = self.conn.transaction()?;
        put_sales(&tx, rows)?;
        tx.commit()?;
        Ok(rows.len())
    }

    /// Replace products, routes and sales in one transaction. Calendar and
    /// incident rows are kept.
    pub fn replace_sales_raw(&mut self, raw: &RawTables) -> AnalysisResult<usize> {
        let tx = self.conn.transaction()?;
        for table in ["ventas_raw", "productos_raw", "rutas_raw"] {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        put_products(&tx, &raw.products)?;
        put_routes(&tx, &raw.routes)?;
        put_sales(&tx, &raw.sales)?;
        tx.commit()?;
        Ok(raw.sales.len())
    }

    pub fn insert_incidents(&mut self, rows: &[IncidentRaw]) -> AnalysisResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO incidencias_raw
                    (incidenciaid, fecha, rutaid, tipoincidencia, severidad, duracionmin)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.incidenciaid,
                    r.fecha,
                    r.rutaid,
                    r.tipoincidencia,
                    r.severidad,
                    r.duracionmin,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Read every raw table, each in a stable key order.
    pub fn extract_raw(&self) -> AnalysisResult<RawTables> {
        let mut stmt = self.conn.prepare(
            "SELECT fecha, anio, mesnum, mes, dia, diasemana, semanaiso, eslaborable
             FROM calendario_raw ORDER BY fecha",
        )?;
        let calendar = stmt
            .query_map([], |r| {
                Ok(CalendarRaw {
                    fecha: r.get(0)?,
                    anio: r.get(1)?,
                    mesnum: r.get(2)?,
                    mes: r.get(3)?,
                    dia: r.get(4)?,
                    diasemana: r.get(5)?,
                    semanaiso: r.get(6)?,
                    eslaborable: r.get::<_, i32>(7)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT productoid, nombre_producto FROM productos_raw ORDER BY productoid")?;
        let products = stmt
            .query_map([], |r| {
                Ok(ProductRaw {
                    productoid: r.get(0)?,
                    nombre_producto: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT rutaid, nombre_ruta FROM rutas_raw ORDER BY rutaid")?;
        let routes = stmt
            .query_map([], |r| {
                Ok(RouteRaw {
                    rutaid: r.get(0)?,
                    nombre_ruta: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT ticketid, fecha, rutaid, productoid, fecha_ruta,
                    cantidad, preciounit, pasajeros, objetivoventas
             FROM ventas_raw ORDER BY venta_id",
        )?;
        let sales = stmt
            .query_map([], |r| {
                Ok(SaleRaw {
                    ticketid: r.get(0)?,
                    fecha: r.get(1)?,
                    rutaid: r.get(2)?,
                    productoid: r.get(3)?,
                    fecha_ruta: r.get(4)?,
                    cantidad: r.get(5)?,
                    preciounit: r.get(6)?,
                    pasajeros: r.get(7)?,
                    objetivoventas: r.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT incidenciaid, fecha, rutaid, tipoincidencia, severidad, duracionmin
             FROM incidencias_raw ORDER BY fecha, incidenciaid",
        )?;
        let incidents = stmt
            .query_map([], |r| {
                Ok(IncidentRaw {
                    incidenciaid: r.get(0)?,
                    fecha: r.get(1)?,
                    rutaid: r.get(2)?,
                    tipoincidencia: r.get(3)?,
                    severidad: r.get(4)?,
                    duracionmin: r.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawTables {
            calendar,
            products,
            routes,
            sales,
            incidents,
        })
    }
}

fn put_products(tx: &Transaction<'_>, rows: &[ProductRaw]) -> AnalysisResult<()> {
    let mut stmt =
        tx.prepare("INSERT INTO productos_raw (productoid, nombre_producto) VALUES (?1, ?2)")?;
    for r in rows {
        stmt.execute(params![r.productoid, r.nombre_producto])?;
    }
    Ok(())
}

fn put_routes(tx: &Transaction<'_>, rows: &[RouteRaw]) -> AnalysisResult<()> {
    let mut stmt = tx.prepare("INSERT INTO rutas_raw (rutaid, nombre_ruta) VALUES (?1, ?2)")?;
    for r in rows {
        stmt.execute(params![r.rutaid, r.nombre_ruta])?;
    }
    Ok(())
}

fn put_sales(tx: &Transaction<'_>, rows: &[SaleRaw]) -> AnalysisResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO ventas_raw
            (ticketid, fecha, rutaid, productoid, fecha_ruta,
             cantidad, preciounit, pasajeros, objetivoventas)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for r in rows {
        stmt.execute(params![
            r.ticketid,
            r.fecha,
            r.rutaid,
            r.productoid,
            r.fecha_ruta,
            r.cantidad,
            r.preciounit,
            r.pasajeros,
            r.objetivoventas,
        ])?;
    }
    Ok(())
}
