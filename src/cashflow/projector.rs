//! Day-by-day balance projection from recurring obligations and estimated income

use chrono::{Datelike, NaiveDate};
use log::debug;

use super::forecast::{CashFlowForecast, DailyBalancePoint, ForecastEvent};
use super::obligation::RecurringObligation;
use crate::calendar::{shift_months, CalendarMonth, RecurrenceScheduler};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

const INCOME_LABEL: &str = "Estimated income";

/// Merges bill and income recurrences into a daily balance forecast
#[derive(Debug, Clone)]
pub struct CashFlowProjector {
    scheduler: RecurrenceScheduler,

    /// Day of month income lands on; `None` uses today's day
    income_day: Option<u32>,
}

impl CashFlowProjector {
    pub fn new(scheduler: RecurrenceScheduler, income_day: Option<u32>) -> Self {
        Self { scheduler, income_day }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            RecurrenceScheduler::new(config.max_recurrence_iterations),
            config.income_day,
        )
    }

    /// Project the balance for every day from `today` through `today + horizon_months`.
    ///
    /// A non-positive horizon yields an empty forecast whose extremes equal
    /// `start_balance`.
    pub fn project(
        &self,
        start_balance: f64,
        obligations: &[RecurringObligation],
        income_estimate: f64,
        horizon_months: i32,
        today: NaiveDate,
    ) -> Result<CashFlowForecast> {
        if horizon_months <= 0 {
            return Ok(CashFlowForecast::empty(start_balance));
        }

        let horizon_end = shift_months(today, horizon_months).ok_or_else(|| {
            EngineError::InvalidInput(format!("horizon of {} months is out of range", horizon_months))
        })?;

        let events = self.collect_events(obligations, income_estimate, today, horizon_end)?;
        let points = fold_daily(start_balance, events, today, horizon_end);
        let forecast = CashFlowForecast::from_points(start_balance, points);

        debug!(
            "Projected {} days through {}: low {:.2}, high {:.2}, final {:.2}",
            forecast.points.len(),
            horizon_end,
            forecast.lowest_balance,
            forecast.highest_balance,
            forecast.final_balance()
        );

        Ok(forecast)
    }

    /// Every bill and income event inside `[today, horizon_end]`, in settlement order
    fn collect_events(
        &self,
        obligations: &[RecurringObligation],
        income_estimate: f64,
        today: NaiveDate,
        horizon_end: NaiveDate,
    ) -> Result<Vec<ForecastEvent>> {
        let mut events = Vec::new();

        for obligation in obligations.iter().filter(|o| o.active) {
            let first = self.scheduler.normalize_from(
                obligation.due_date,
                obligation.next_due,
                obligation.frequency,
                today,
            )?;

            // Stale one-time obligations stay in the past and fall outside the window
            if first < today {
                continue;
            }

            let dates = self
                .scheduler
                .occurrences(obligation.due_date, first, obligation.frequency, horizon_end)?;
            for date in dates {
                events.push(ForecastEvent::bill(date, obligation.amount, obligation.name.as_str()));
            }
        }

        if income_estimate > 0.0 {
            for date in self.income_dates(today, horizon_end) {
                events.push(ForecastEvent::income(date, income_estimate, INCOME_LABEL));
            }
        }

        // Stable: equal (date, kind) keys keep insertion order
        events.sort_by_key(|e| (e.date, e.kind));
        Ok(events)
    }

    /// Monthly income dates on the anchor day, first one on/after today
    fn income_dates(&self, today: NaiveDate, horizon_end: NaiveDate) -> Vec<NaiveDate> {
        let day = self.income_day.unwrap_or_else(|| today.day());
        let mut dates = Vec::new();
        let mut month = Some(CalendarMonth::containing(today));

        while let Some(current) = month {
            let date = current.day_clamped(day);
            if date > horizon_end {
                break;
            }
            if date >= today {
                dates.push(date);
            }
            month = current.next();
        }

        dates
    }
}

impl Default for CashFlowProjector {
    fn default() -> Self {
        Self::new(RecurrenceScheduler::default(), None)
    }
}

/// Walk each day from `start` through `end`, applying that day's events
fn fold_daily(
    start_balance: f64,
    events: Vec<ForecastEvent>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DailyBalancePoint> {
    let mut points = Vec::new();
    let mut balance = start_balance;
    let mut pending = events.into_iter().peekable();

    for date in start.iter_days().take_while(|d| *d <= end) {
        let mut fired = Vec::new();
        while let Some(event) = pending.next_if(|e| e.date == date) {
            balance += event.amount;
            fired.push(event);
        }
        points.push(DailyBalancePoint {
            date,
            balance,
            events: fired,
        });
    }

    points
}
