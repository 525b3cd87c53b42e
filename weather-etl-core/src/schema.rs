//! Destination table layout and its provisioning.

use anyhow::{Context, Result};
use log::info;

use crate::warehouse::{TableRef, Warehouse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Float,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnMode {
    Nullable,
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub mode: ColumnMode,
}

const fn nullable(name: &'static str, ty: ColumnType) -> Column {
    Column {
        name,
        ty,
        mode: ColumnMode::Nullable,
    }
}

/// Column list of the forecast table, in insertion order.
pub const FORECAST_COLUMNS: &[Column] = &[
    Column {
        name: "city_name",
        ty: ColumnType::String,
        mode: ColumnMode::Required,
    },
    nullable("country", ColumnType::String),
    nullable("latitude", ColumnType::Float),
    nullable("longitude", ColumnType::Float),
    nullable("timestamp", ColumnType::Timestamp),
    nullable("weather_main", ColumnType::String),
    nullable("weather_description", ColumnType::String),
    nullable("temperature", ColumnType::Float),
    nullable("feels_like", ColumnType::Float),
    nullable("temp_min", ColumnType::Float),
    nullable("temp_max", ColumnType::Float),
    nullable("pressure", ColumnType::Float),
    nullable("humidity", ColumnType::Float),
    nullable("visibility", ColumnType::Float),
    nullable("wind_speed", ColumnType::Float),
    nullable("wind_direction", ColumnType::Float),
    nullable("cloudiness", ColumnType::Float),
    nullable("sunrise", ColumnType::Timestamp),
    nullable("sunset", ColumnType::Timestamp),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: &'static [Column],
}

impl TableSchema {
    pub const fn forecast() -> Self {
        Self {
            columns: FORECAST_COLUMNS,
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    AlreadyExists,
    Created,
}

/// Make sure `table` exists with the forecast layout, creating it if absent.
///
/// Any failure here is fatal for the run.
pub fn ensure_table<W: Warehouse + ?Sized>(warehouse: &W, table: &TableRef) -> Result<SchemaStatus> {
    let exists = warehouse
        .table_exists(table)
        .with_context(|| format!("Failed to check whether table {table} exists"))?;

    if exists {
        info!("Table {table} already exists");
        return Ok(SchemaStatus::AlreadyExists);
    }

    warehouse
        .create_table(table, &TableSchema::forecast())
        .with_context(|| format!("Failed to create table {table}"))?;
    info!("Created table {table}");

    Ok(SchemaStatus::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::tests::RecordingWarehouse;

    #[test]
    fn only_city_name_is_required() {
        let required: Vec<_> = FORECAST_COLUMNS
            .iter()
            .filter(|c| c.mode == ColumnMode::Required)
            .map(|c| c.name)
            .collect();
        assert_eq!(required, vec!["city_name"]);
    }

    #[test]
    fn forecast_schema_has_all_columns_in_row_order() {
        let names: Vec<_> = TableSchema::forecast().column_names().collect();
        assert_eq!(names.len(), 19);
        assert_eq!(names.first(), Some(&"city_name"));
        assert_eq!(names[4], "timestamp");
        assert_eq!(names.last(), Some(&"sunset"));
    }

    #[test]
    fn ensure_table_twice_creates_once() {
        let warehouse = RecordingWarehouse::default();
        let table = TableRef::new("weather", "forecast_intervals");

        let first = ensure_table(&warehouse, &table).expect("first ensure should succeed");
        let second = ensure_table(&warehouse, &table).expect("second ensure should succeed");

        assert_eq!(first, SchemaStatus::Created);
        assert_eq!(second, SchemaStatus::AlreadyExists);
        assert_eq!(warehouse.creates(), 1);
    }

    #[test]
    fn create_failure_is_fatal() {
        let warehouse = RecordingWarehouse {
            fail_create: true,
            ..Default::default()
        };
        let table = TableRef::new("weather", "forecast_intervals");

        let err = ensure_table(&warehouse, &table).unwrap_err();
        assert!(err.to_string().contains("Failed to create table weather.forecast_intervals"));
    }
}
