//! Core library for the `weather-etl` job.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The forecast provider seam and its OpenWeather client
//! - Record shaping into the canonical forecast row
//! - The destination table schema and the DuckDB warehouse
//! - The run orchestrator and its report
//!
//! It is used by `weather-etl-cli`, but can also be driven by other binaries or schedulers.

pub mod config;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod schema;
pub mod transform;
pub mod warehouse;

pub use config::{Config, EtlConfig, ProviderConfig, WarehouseConfig};
pub use model::{CanonicalRow, ForecastPayload, LocationMetadata, RawForecastInterval, TrackedLocation};
pub use pipeline::{LocationSummary, RunReport, run};
pub use provider::{FetchError, ForecastSource, OpenWeatherClient};
pub use schema::{SchemaStatus, TableSchema, ensure_table};
pub use transform::{TransformError, transform};
pub use warehouse::{LoadOutcome, TableRef, Warehouse, WarehouseError, duckdb_store::DuckDbWarehouse, load};
