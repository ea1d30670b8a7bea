//! Forecast every user in a data directory and write a summary CSV
//!
//! Usage: run_batch [DATA_DIR] [MONTHS] [OUTPUT]

use anyhow::{Context, Result};
use finance_engine::{EngineConfig, FinanceEngine, ForecastReport, IncomeEstimator, InMemoryRepository, UserId};
use log::{info, warn};
use serde::Serialize;
use std::env;
use std::sync::Arc;
use std::time::Instant;

/// One summary line per user
#[derive(Debug, Serialize)]
struct SummaryRow {
    #[serde(rename = "UserID")]
    user_id: UserId,
    #[serde(rename = "CurrentBalance")]
    current_balance: f64,
    #[serde(rename = "LowestBalance")]
    lowest_balance: f64,
    #[serde(rename = "HighestBalance")]
    highest_balance: f64,
    #[serde(rename = "FinalBalance")]
    final_balance: f64,
    #[serde(rename = "FirstNegativeDate")]
    first_negative_date: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

impl SummaryRow {
    fn from_report(report: &ForecastReport) -> Self {
        Self {
            user_id: report.user_id,
            current_balance: report.current_balance,
            lowest_balance: report.lowest_balance,
            highest_balance: report.highest_balance,
            final_balance: report.final_balance,
            first_negative_date: report.first_negative_date.map(|d| d.to_string()),
            error: None,
        }
    }

    fn failed(user_id: UserId, message: String) -> Self {
        Self {
            user_id,
            current_balance: 0.0,
            lowest_balance: 0.0,
            highest_balance: 0.0,
            final_balance: 0.0,
            first_negative_date: None,
            error: Some(message),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = args.get(1).map(String::as_str).unwrap_or("data");
    let months: i32 = match args.get(2) {
        Some(value) => value.parse().with_context(|| format!("Invalid month count '{}'", value))?,
        None => 3,
    };
    let output_path = args.get(3).map(String::as_str).unwrap_or("forecast_summary.csv");

    let config = EngineConfig::from_env();

    let start = Instant::now();
    println!("Loading data from {}...", data_dir);
    let repo = Arc::new(
        InMemoryRepository::from_data_dir(data_dir)
            .with_context(|| format!("Failed to load data from {}", data_dir))?,
    );
    let user_ids = repo.user_ids()?;
    println!("Loaded {} users in {:?}", user_ids.len(), start.elapsed());

    let income = {
        let repo = repo.clone();
        move |user_id| repo.monthly_income_estimate(user_id)
    };
    let engine = FinanceEngine::new(repo, income, config);

    println!("Running {}-month forecasts...", months);
    let run_start = Instant::now();
    let results = engine.forecast_many(&user_ids, months);
    println!("Forecasts complete in {:?}", run_start.elapsed());

    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("Failed to create {}", output_path))?;
    let mut overdrawn = 0;
    let mut failures = 0;

    for (user_id, result) in &results {
        let row = match result {
            Ok(report) => {
                if report.first_negative_date.is_some() {
                    overdrawn += 1;
                }
                SummaryRow::from_report(report)
            }
            Err(err) => {
                warn!("Forecast for user {} failed: {}", user_id, err);
                failures += 1;
                SummaryRow::failed(*user_id, err.to_string())
            }
        };
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", results.len(), output_path);
    println!("\nSummary:");
    println!("  Users:     {}", results.len());
    println!("  Overdrawn: {}", overdrawn);
    println!("  Failed:    {}", failures);
    println!("  Output:    {}", output_path);
    println!("  Total time: {:?}", start.elapsed());

    Ok(())
}
