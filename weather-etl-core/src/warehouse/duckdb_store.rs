use std::path::Path;

use chrono::{DateTime, Utc};
use duckdb::{
    Connection, params,
    types::{TimeUnit, Value},
};
use log::debug;

use crate::{
    model::CanonicalRow,
    schema::{ColumnMode, ColumnType, TableSchema},
};

use super::{TableRef, Warehouse, WarehouseError};

/// DuckDB-backed warehouse. One connection per run, reused for schema
/// checks and the final load.
pub struct DuckDbWarehouse {
    conn: Connection,
}

impl DuckDbWarehouse {
    /// Open (or create) the database file. `:memory:` opens a throwaway
    /// in-memory database.
    pub fn open(path: &str) -> Result<Self, WarehouseError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(Path::new(path))?
        };
        Ok(Self { conn })
    }

    pub fn row_count(&self, table: &TableRef) -> Result<u64, WarehouseError> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT count(*) FROM {}", qualified(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }
}

impl Warehouse for DuckDbWarehouse {
    fn table_exists(&self, table: &TableRef) -> Result<bool, WarehouseError> {
        let n: i64 = self.conn.query_row(
            "SELECT count(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            params![table.dataset, table.table],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    fn create_table(&self, table: &TableRef, schema: &TableSchema) -> Result<(), WarehouseError> {
        let sql = create_table_sql(table, schema);
        debug!("{sql}");
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    fn append_rows(
        &mut self,
        table: &TableRef,
        rows: &[CanonicalRow],
    ) -> Result<usize, WarehouseError> {
        let sql = insert_sql(table, &TableSchema::forecast());
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                stmt.execute(params![
                    row.city_name,
                    row.country,
                    row.latitude,
                    row.longitude,
                    timestamp_value(&row.timestamp),
                    row.weather_main,
                    row.weather_description,
                    row.temperature,
                    row.feels_like,
                    row.temp_min,
                    row.temp_max,
                    row.pressure,
                    row.humidity,
                    row.visibility,
                    row.wind_speed,
                    row.wind_direction,
                    row.cloudiness,
                    row.sunrise.as_ref().map(timestamp_value),
                    row.sunset.as_ref().map(timestamp_value),
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }
}

/// Native TIMESTAMP binding, microseconds since the epoch (UTC).
fn timestamp_value(ts: &DateTime<Utc>) -> Value {
    Value::Timestamp(TimeUnit::Microsecond, ts.timestamp_micros())
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn qualified(table: &TableRef) -> String {
    format!("{}.{}", quote_ident(&table.dataset), quote_ident(&table.table))
}

fn sql_type(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::String => "VARCHAR",
        ColumnType::Float => "DOUBLE",
        ColumnType::Timestamp => "TIMESTAMP",
    }
}

fn create_table_sql(table: &TableRef, schema: &TableSchema) -> String {
    let columns = schema
        .columns
        .iter()
        .map(|c| {
            let not_null = match c.mode {
                ColumnMode::Required => " NOT NULL",
                ColumnMode::Nullable => "",
            };
            format!("    {} {}{}", quote_ident(c.name), sql_type(c.ty), not_null)
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "CREATE SCHEMA IF NOT EXISTS {};\nCREATE TABLE {} (\n{}\n);",
        quote_ident(&table.dataset),
        qualified(table),
        columns
    )
}

fn insert_sql(table: &TableRef, schema: &TableSchema) -> String {
    let names = schema.column_names().map(quote_ident).collect::<Vec<_>>();
    let placeholders = vec!["?"; names.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified(table),
        names.join(", "),
        placeholders
    )
}
