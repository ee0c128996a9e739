//! SQLite warehouse store.
//!
//! RULE: only the store talks to the database. ETL, export and calendar
//! import call store methods; they never execute SQL directly.

mod analytics;
mod raw;

use crate::error::AnalysisResult;
use rusqlite::Connection;

pub struct WarehouseStore {
    conn: Connection,
}

impl WarehouseStore {
    pub fn open(path: &str) -> AnalysisResult<Self> {
        let conn = Connection::open(path)?;
        // WAL only applies to real files; in-memory databases ignore it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> AnalysisResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Idempotent.
    pub fn migrate(&self) -> AnalysisResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_raw.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_analytics.sql"))?;
        Ok(())
    }

    /// Row count of a known warehouse table or view.
    pub fn count_rows(&self, table: Table) -> AnalysisResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let n: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n as usize)
    }
}

/// Every table and view the migrations create. Table names never come
/// from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    CalendarioRaw,
    ProductosRaw,
    RutasRaw,
    VentasRaw,
    IncidenciasRaw,
    DimCalendario,
    DimProductos,
    DimRutas,
    DimTipoIncidencia,
    FactVentas,
    FactIncidencias,
    VwVentas,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CalendarioRaw => "calendario_raw",
            Self::ProductosRaw => "productos_raw",
            Self::RutasRaw => "rutas_raw",
            Self::VentasRaw => "ventas_raw",
            Self::IncidenciasRaw => "incidencias_raw",
            Self::DimCalendario => "dim_calendario",
            Self::DimProductos => "dim_productos",
            Self::DimRutas => "dim_rutas",
            Self::DimTipoIncidencia => "dim_tipo_incidencia",
            Self::FactVentas => "fact_ventas",
            Self::FactIncidencias => "fact_incidencias",
            Self::VwVentas => "vw_ventas",
        }
    }
}

/// Column headers plus every row rendered as text, ready for CSV.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
