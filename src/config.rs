//! Engine configuration: policy constants and iteration bounds

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::Result;

/// Default safe withdrawal rate (the 4% rule)
pub const DEFAULT_SAFE_WITHDRAWAL_RATE: f64 = 0.04;

/// Default income replacement ratio considered "on track"
pub const DEFAULT_REPLACEMENT_RATIO: f64 = 0.70;

/// Default cap on calendar-advance iterations when normalizing a due date
pub const DEFAULT_MAX_RECURRENCE_ITERATIONS: u32 = 1200;

/// Default cap on simulated debt months (50 years)
pub const DEFAULT_MAX_PAYOFF_MONTHS: u32 = 600;

/// Configuration for a [`FinanceEngine`](crate::FinanceEngine) and its components
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Annual fraction of the portfolio withdrawn in retirement
    pub safe_withdrawal_rate: f64,

    /// Fraction of current income that counts as an on-track retirement income
    pub replacement_ratio: f64,

    /// Upper bound for the contribution search, as a multiple of the current contribution
    pub search_multiplier: f64,

    /// Iteration cap for recurrence normalization
    pub max_recurrence_iterations: u32,

    /// Iteration cap for the debt amortization simulation
    pub max_payoff_months: u32,

    /// Spend ratio below which next month's allocation shrinks
    pub underspend_threshold: f64,

    /// Factor applied to the allocation after an underspent month
    pub shrink_factor: f64,

    /// Factor applied to the spend after an overspent month
    pub growth_factor: f64,

    /// Rollover cap as a fraction of the allocation
    pub rollover_cap: f64,

    /// Day of month income lands on; `None` anchors on the reference date's day
    pub income_day: Option<u32>,

    /// Date treated as "today"; `None` uses the local calendar date
    pub reference_date: Option<NaiveDate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            safe_withdrawal_rate: DEFAULT_SAFE_WITHDRAWAL_RATE,
            replacement_ratio: DEFAULT_REPLACEMENT_RATIO,
            search_multiplier: 3.0,
            max_recurrence_iterations: DEFAULT_MAX_RECURRENCE_ITERATIONS,
            max_payoff_months: DEFAULT_MAX_PAYOFF_MONTHS,
            underspend_threshold: 0.8,
            shrink_factor: 0.95,
            growth_factor: 1.1,
            rollover_cap: 0.5,
            income_day: None,
            reference_date: None,
        }
    }
}

impl EngineConfig {
    /// Build a config from defaults overridden by `FINANCE_*` environment variables.
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("FINANCE_SAFE_WITHDRAWAL_RATE") {
            config.safe_withdrawal_rate = v;
        }
        if let Some(v) = env_parse("FINANCE_REPLACEMENT_RATIO") {
            config.replacement_ratio = v;
        }
        if let Some(v) = env_parse("FINANCE_SEARCH_MULTIPLIER") {
            config.search_multiplier = v;
        }
        if let Some(v) = env_parse("FINANCE_MAX_RECURRENCE_ITERATIONS") {
            config.max_recurrence_iterations = v;
        }
        if let Some(v) = env_parse("FINANCE_MAX_PAYOFF_MONTHS") {
            config.max_payoff_months = v;
        }
        if let Some(v) = env_parse("FINANCE_INCOME_DAY") {
            config.income_day = Some(v);
        }
        if let Some(v) = env_parse("FINANCE_REFERENCE_DATE") {
            config.reference_date = Some(v);
        }

        config
    }

    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// The date the engine treats as today
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
