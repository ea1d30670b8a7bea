//! Forecast output structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a forecast event drains or feeds the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    // Declaration order is the same-day tie-break: bills settle before income
    Bill,
    Income,
}

/// A single dated cash movement in the forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEvent {
    pub date: NaiveDate,

    /// Signed amount: negative for bills, positive for income
    pub amount: f64,

    pub label: String,

    pub kind: EventKind,
}

impl ForecastEvent {
    pub fn bill(date: NaiveDate, amount: f64, label: impl Into<String>) -> Self {
        Self {
            date,
            amount: -amount.abs(),
            label: label.into(),
            kind: EventKind::Bill,
        }
    }

    pub fn income(date: NaiveDate, amount: f64, label: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            label: label.into(),
            kind: EventKind::Income,
        }
    }
}

/// Balance at the end of one forecast day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBalancePoint {
    pub date: NaiveDate,

    /// Running balance after this day's events
    pub balance: f64,

    /// Events applied on this day, in settlement order
    pub events: Vec<ForecastEvent>,
}

/// Complete day-by-day forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowForecast {
    pub start_balance: f64,

    /// One point per calendar day from today through the horizon end
    pub points: Vec<DailyBalancePoint>,

    pub lowest_balance: f64,

    pub highest_balance: f64,
}

impl CashFlowForecast {
    /// Forecast with no days, used for non-positive horizons
    pub fn empty(start_balance: f64) -> Self {
        Self {
            start_balance,
            points: Vec::new(),
            lowest_balance: start_balance,
            highest_balance: start_balance,
        }
    }

    /// Build a forecast from its daily points, deriving the extremes
    pub fn from_points(start_balance: f64, points: Vec<DailyBalancePoint>) -> Self {
        if points.is_empty() {
            return Self::empty(start_balance);
        }

        let lowest_balance = points.iter().map(|p| p.balance).fold(f64::INFINITY, f64::min);
        let highest_balance = points.iter().map(|p| p.balance).fold(f64::NEG_INFINITY, f64::max);

        Self {
            start_balance,
            points,
            lowest_balance,
            highest_balance,
        }
    }

    pub fn final_balance(&self) -> f64 {
        self.points.last().map(|p| p.balance).unwrap_or(self.start_balance)
    }

    /// All applied events in settlement order
    pub fn events(&self) -> impl Iterator<Item = &ForecastEvent> {
        self.points.iter().flat_map(|p| p.events.iter())
    }

    /// Total outflow from bills, as a positive number
    pub fn total_bills(&self) -> f64 {
        self.events()
            .filter(|e| e.kind == EventKind::Bill)
            .map(|e| -e.amount)
            .sum()
    }

    pub fn total_income(&self) -> f64 {
        self.events()
            .filter(|e| e.kind == EventKind::Income)
            .map(|e| e.amount)
            .sum()
    }

    /// First day the running balance goes below zero
    pub fn first_negative_date(&self) -> Option<NaiveDate> {
        self.points.iter().find(|p| p.balance < 0.0).map(|p| p.date)
    }
}
