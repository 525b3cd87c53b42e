//! Run orchestration: schema, per-location extract/transform, one batched load.

use anyhow::Result;
use log::{error, info, warn};

use crate::{
    config::EtlConfig,
    model::CanonicalRow,
    provider::ForecastSource,
    schema::{SchemaStatus, ensure_table},
    transform::transform,
    warehouse::{LoadOutcome, Warehouse, load},
};

/// What happened to one tracked location during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSummary {
    pub name: String,
    pub rows_accepted: usize,
    pub fetch_error: Option<String>,
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub schema: SchemaStatus,
    pub locations: Vec<LocationSummary>,
    pub load: LoadOutcome,
}

impl RunReport {
    pub fn rows_extracted(&self) -> usize {
        self.locations.iter().map(|l| l.rows_accepted).sum()
    }

    /// One line per isolated failure.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for loc in &self.locations {
            if let Some(e) = &loc.fetch_error {
                out.push(format!("{}: fetch failed: {e}", loc.name));
            }
            for reason in &loc.rejected {
                out.push(format!("{}: record rejected: {reason}", loc.name));
            }
        }
        if let LoadOutcome::Failed(e) = &self.load {
            out.push(format!("load failed: {e}"));
        }
        out
    }

    pub fn is_clean(&self) -> bool {
        self.warnings().is_empty()
    }
}

/// Execute one complete run.
///
/// Only schema provisioning errors are returned; fetch, transform and load
/// failures are logged and recorded in the [`RunReport`].
pub async fn run<S, W>(config: &EtlConfig, source: &S, warehouse: &mut W) -> Result<RunReport>
where
    S: ForecastSource + ?Sized,
    W: Warehouse + ?Sized,
{
    info!("Starting weather ETL pipeline");
    let table = &config.warehouse.table;
    let schema = ensure_table(&*warehouse, table)?;

    let mut rows: Vec<CanonicalRow> = Vec::new();
    let mut locations = Vec::with_capacity(config.locations.len());

    for location in &config.locations {
        info!("Processing weather data for {}", location.name);
        let mut summary = LocationSummary {
            name: location.name.clone(),
            rows_accepted: 0,
            fetch_error: None,
            rejected: Vec::new(),
        };

        let payload = match source.fetch(location).await {
            Ok(payload) => payload,
            Err(e) => {
                error!("Error fetching data for {}: {e}", location.name);
                summary.fetch_error = Some(e.to_string());
                locations.push(summary);
                continue;
            }
        };

        for interval in &payload.intervals {
            match transform(interval, location, &payload.metadata) {
                Ok(row) => {
                    rows.push(row);
                    summary.rows_accepted += 1;
                }
                Err(e) => {
                    warn!("Error transforming data for {}: {e}", location.name);
                    summary.rejected.push(e.to_string());
                }
            }
        }

        if summary.rows_accepted == 0 {
            warn!("No usable forecast rows for {}", location.name);
        }
        locations.push(summary);
    }

    let load_outcome = load(warehouse, table, &rows);
    info!("ETL pipeline completed");

    Ok(RunReport {
        schema,
        locations,
        load: load_outcome,
    })
}
