use std::fmt;

use log::{error, info, warn};
use thiserror::Error;

use crate::{model::CanonicalRow, schema::TableSchema};

pub mod duckdb_store;

/// Dataset-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(dataset: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.table)
    }
}

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Schema-on-write append target.
pub trait Warehouse {
    fn table_exists(&self, table: &TableRef) -> Result<bool, WarehouseError>;

    fn create_table(&self, table: &TableRef, schema: &TableSchema) -> Result<(), WarehouseError>;

    /// Append every row in one all-or-nothing write. Returns the number of rows written.
    fn append_rows(&mut self, table: &TableRef, rows: &[CanonicalRow])
    -> Result<usize, WarehouseError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing to write.
    Skipped,
    Loaded(usize),
    Failed(String),
}

/// Append the run's batch. Failures are logged and reported, never propagated.
pub fn load<W: Warehouse + ?Sized>(
    warehouse: &mut W,
    table: &TableRef,
    rows: &[CanonicalRow],
) -> LoadOutcome {
    if rows.is_empty() {
        warn!("No data to load into {table}");
        return LoadOutcome::Skipped;
    }

    match warehouse.append_rows(table, rows) {
        Ok(n) => {
            info!("Loaded {n} rows to {table}");
            LoadOutcome::Loaded(n)
        }
        Err(e) => {
            error!("Error loading {} rows to {table}: {e}", rows.len());
            LoadOutcome::Failed(e.to_string())
        }
    }
}
