use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use weather_etl_core::{Config, DuckDbWarehouse, LoadOutcome, OpenWeatherClient, RunReport, run};

/// Pull forecasts for every tracked location and append them to the warehouse.
///
/// Settings come from the config file (or `WEATHER_ETL_CONFIG`), a local
/// `.env` (loaded at startup), and `OPENWEATHER_API_KEY` / `WEATHER_ETL_DATABASE` /
/// `WEATHER_ETL_DATASET` / `WEATHER_ETL_TABLE`.
#[derive(Debug, Parser)]
#[command(name = "weather-etl", version, about)]
pub struct Cli {}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        config.apply_env(|key| std::env::var(key).ok());
        let etl = config.resolve()?;

        let client = OpenWeatherClient::new(&etl.provider);
        let mut warehouse = DuckDbWarehouse::open(&etl.warehouse.database).with_context(|| {
            format!("Failed to open warehouse database {}", etl.warehouse.database)
        })?;

        let report = run(&etl, &client, &mut warehouse).await?;
        summarize(&report);

        match warehouse.row_count(&etl.warehouse.table) {
            Ok(n) => info!("{} now holds {n} rows", etl.warehouse.table),
            Err(e) => warn!("Could not count rows in {}: {e}", etl.warehouse.table),
        }

        Ok(())
    }
}

fn summarize(report: &RunReport) {
    let loaded = match &report.load {
        LoadOutcome::Loaded(n) => *n,
        LoadOutcome::Skipped | LoadOutcome::Failed(_) => 0,
    };
    info!(
        "{} locations processed, {} rows extracted, {} rows loaded",
        report.locations.len(),
        report.rows_extracted(),
        loaded
    );

    let warnings = report.warnings();
    if !warnings.is_empty() {
        warn!("Run finished with {} warning(s):", warnings.len());
        for w in &warnings {
            warn!("  {w}");
        }
    }
}
