//! Analytics tables: full reload from the ETL and the export queries.

use super::{QueryTable, Table, WarehouseStore};
use crate::{error::AnalysisResult, etl::AnalyticsTables};
use rusqlite::{params, types::ValueRef};

/// Load order: dimensions first, then facts.
const ANALYTICS_TABLES: [Table; 6] = [
    Table::DimCalendario,
    Table::DimProductos,
    Table::DimRutas,
    Table::DimTipoIncidencia,
    Table::FactIncidencias,
    Table::FactVentas,
];

fn render(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

impl WarehouseStore {
    /// Delete and re-insert every analytics table in a single transaction.
    pub fn replace_analytics(&mut self, tables: &AnalyticsTables) -> AnalysisResult<()> {
        let tx = self.conn.transaction()?;
        for table in ANALYTICS_TABLES {
            tx.execute(&format!("DELETE FROM {}", table.name()), [])?;
        }
        {
            let mut stmt = tx.prepare(
                "INSERT INTO dim_calendario
                    (fecha, anio, mesnum, mes, dia, diasemana, semanaiso, eslaborable,
                     trimestre, nombre_mes_anio, es_fin_semana)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for d in &tables.calendar {
                let r = &d.base;
                stmt.execute(params![
                    r.fecha,
                    r.anio,
                    r.mesnum,
                    r.mes,
                    r.dia,
                    r.diasemana,
                    r.semanaiso,
                    r.eslaborable,
                    d.trimestre,
                    d.nombre_mes_anio,
                    d.es_fin_semana,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO dim_productos (productoid, nombre_producto, categoria, es_activo)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for p in &tables.products {
                stmt.execute(params![
                    p.productoid,
                    p.nombre_producto,
                    p.categoria.label(),
                    p.es_activo,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO dim_rutas
                    (rutaid, nombre_ruta, origen, destino, tipo_transporte, distancia_km, es_activa)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for r in &tables.routes {
                stmt.execute(params![
                    r.rutaid,
                    r.nombre_ruta,
                    r.origen,
                    r.destino,
                    r.tipo_transporte,
                    r.distancia_km,
                    r.es_activa,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO dim_tipo_incidencia
                    (tipo_incidencia, categoria, nivel_criticidad, descripcion)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for t in &tables.incident_types {
                stmt.execute(params![
                    t.tipo_incidencia,
                    t.categoria,
                    t.nivel_criticidad,
                    t.descripcion,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO fact_incidencias
                    (incidenciaid, fecha, rutaid, tipo_incidencia, severidad,
                     duracion_minutos, es_critica, duracion_horas)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for i in &tables.incidents {
                stmt.execute(params![
                    i.incidenciaid,
                    i.fecha,
                    i.rutaid,
                    i.tipo_incidencia,
                    i.severidad,
                    i.duracion_minutos,
                    i.es_critica,
                    i.duracion_horas,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO fact_ventas
                    (ticketid, fecha, rutaid, productoid, fecha_ruta, cantidad, preciounit,
                     ingresos_total, pasajeros, objetivoventas, porcentaje_objetivo,
                     tiene_incidencia)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for s in &tables.sales {
                stmt.execute(params![
                    s.ticketid,
                    s.fecha,
                    s.rutaid,
                    s.productoid,
                    s.fecha_ruta,
                    s.cantidad,
                    s.preciounit,
                    s.ingresos_total,
                    s.pasajeros,
                    s.objetivoventas,
                    s.porcentaje_objetivo,
                    s.tiene_incidencia,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Run a read-only query and render every value as text.
    fn query_table(&self, sql: &str) -> AnalysisResult<QueryTable> {
        let mut stmt = self.conn.prepare(sql)?;
        let headers: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = headers.len();
        let rows = stmt
            .query_map([], |r| {
                (0..width)
                    .map(|i| r.get_ref(i).map(render))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QueryTable { headers, rows })
    }

    /// Sales view export, one line per sale.
    pub fn export_sales_view(&self) -> AnalysisResult<QueryTable> {
        self.query_table("SELECT * FROM vw_ventas ORDER BY fecha")
    }

    /// Raw incidents export.
    pub fn export_raw_incidents(&self) -> AnalysisResult<QueryTable> {
        self.query_table("SELECT * FROM incidencias_raw ORDER BY fecha, incidenciaid")
    }
}
