//! Recurrence arithmetic for recurring obligations

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::month::CalendarMonth;
use crate::config::DEFAULT_MAX_RECURRENCE_ITERATIONS;
use crate::error::{EngineError, Result};

/// How often an obligation repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    Weekly,
    Monthly,
    Yearly,
    /// Never repeats
    OneTime,
}

impl Frequency {
    /// The date `steps` periods after `anchor`.
    ///
    /// Month and year steps are measured from the anchor itself, so the
    /// day-of-month is `min(anchor day, days in result month)` for every step.
    /// `OneTime` always returns the anchor.
    pub fn advance(self, anchor: NaiveDate, steps: u32) -> Option<NaiveDate> {
        self.advance_on_day(anchor, steps, anchor.day())
    }

    /// The date `steps` periods after `date`, landing month and year steps on
    /// `day` (clamped to the target month) instead of on `date`'s own day.
    ///
    /// Stepping from an already-clamped occurrence with the anchor's day keeps
    /// the schedule on the anchor: Feb 28 advanced on day 31 is Mar 31.
    pub fn advance_on_day(self, date: NaiveDate, steps: u32, day: u32) -> Option<NaiveDate> {
        let months = match self {
            Frequency::Weekly => return date.checked_add_days(Days::new(7 * u64::from(steps))),
            Frequency::OneTime => return Some(date),
            Frequency::Monthly => i32::try_from(steps).ok()?,
            Frequency::Yearly => i32::try_from(steps).ok()?.checked_mul(12)?,
        };
        CalendarMonth::containing(date)
            .add_months(months)
            .map(|month| month.day_clamped(day))
    }

    pub fn is_recurring(self) -> bool {
        !matches!(self, Frequency::OneTime)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
            Frequency::OneTime => "one-time",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" | "annual" | "annually" => Ok(Frequency::Yearly),
            "one-time" | "one_time" | "onetime" | "once" => Ok(Frequency::OneTime),
            _ => Err(EngineError::UnknownFrequency(s.to_string())),
        }
    }
}

/// Computes next valid occurrences of recurring dates with a bounded advance loop
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceScheduler {
    max_iterations: u32,
}

impl RecurrenceScheduler {
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Roll a due date forward until it is not before `reference`.
    ///
    /// Dates after `reference` and one-time dates are returned unchanged, even
    /// when a one-time date is stale. Fails with `ComputationBound` when the
    /// date cannot be brought current within the iteration cap.
    pub fn normalize(
        &self,
        due: NaiveDate,
        frequency: Frequency,
        reference: NaiveDate,
    ) -> Result<NaiveDate> {
        self.normalize_from(due, due, frequency, reference)
    }

    /// Like [`normalize`](Self::normalize), but resumes from `current`, an
    /// occurrence of the schedule anchored at `anchor` (typically a stored
    /// next-due date). Month and year steps keep the anchor's day-of-month.
    pub fn normalize_from(
        &self,
        anchor: NaiveDate,
        current: NaiveDate,
        frequency: Frequency,
        reference: NaiveDate,
    ) -> Result<NaiveDate> {
        if current >= reference || !frequency.is_recurring() {
            return Ok(current);
        }

        for step in 1..=self.max_iterations {
            let candidate = frequency
                .advance_on_day(current, step, anchor.day())
                .ok_or_else(|| bound_error(self.max_iterations))?;
            if candidate >= reference {
                return Ok(candidate);
            }
        }

        Err(bound_error(self.max_iterations))
    }

    /// Every occurrence of the schedule anchored at `anchor`, from `first`
    /// (inclusive, itself an occurrence) through `through` (inclusive).
    ///
    /// A one-time schedule yields at most `first`. The walk is bounded by the
    /// number of weeks in the window, not by the normalization cap, so long
    /// horizons are never rejected.
    pub fn occurrences(
        &self,
        anchor: NaiveDate,
        first: NaiveDate,
        frequency: Frequency,
        through: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        if first > through {
            return Ok(dates);
        }
        dates.push(first);
        if !frequency.is_recurring() {
            return Ok(dates);
        }

        // Weekly is the densest frequency
        let weeks = (through - first).num_days() / 7 + 1;
        let limit = u32::try_from(weeks).unwrap_or(u32::MAX);

        for step in 1..=limit {
            match frequency.advance_on_day(first, step, anchor.day()) {
                Some(date) if date <= through => dates.push(date),
                _ => return Ok(dates),
            }
        }

        Err(bound_error(limit))
    }
}

fn bound_error(limit: u32) -> EngineError {
    EngineError::ComputationBound {
        computation: "recurrence advance",
        limit,
    }
}

impl Default for RecurrenceScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECURRENCE_ITERATIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::month::days_in_month;
    use crate::error::ErrorKind;
    use chrono::Datelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_future_date_unchanged() {
        let scheduler = RecurrenceScheduler::default();
        let due = date(2026, 11, 15);
        let result = scheduler.normalize(due, Frequency::Monthly, date(2026, 10, 16)).unwrap();
        assert_eq!(result, due);
    }

    #[test]
    fn test_monthly_advance_clamps_day() {
        let scheduler = RecurrenceScheduler::default();
        let due = date(2026, 1, 31);
        let result = scheduler.normalize(due, Frequency::Monthly, date(2026, 2, 10)).unwrap();
        assert_eq!(result, date(2026, 2, 28));

        // Clamping does not drift: the anchor's day comes back in longer months
        let result = scheduler.normalize(due, Frequency::Monthly, date(2026, 3, 1)).unwrap();
        assert_eq!(result, date(2026, 3, 31));
    }

    #[test]
    fn test_weekly_and_yearly() {
        let scheduler = RecurrenceScheduler::default();
        let weekly = scheduler
            .normalize(date(2026, 10, 1), Frequency::Weekly, date(2026, 10, 16))
            .unwrap();
        assert_eq!(weekly, date(2026, 10, 22));

        let yearly = scheduler
            .normalize(date(2024, 2, 29), Frequency::Yearly, date(2025, 1, 1))
            .unwrap();
        assert_eq!(yearly, date(2025, 2, 28));
    }

    #[test]
    fn test_one_time_never_advances() {
        let scheduler = RecurrenceScheduler::default();
        let stale = date(2025, 5, 1);
        let result = scheduler.normalize(stale, Frequency::OneTime, date(2026, 10, 16)).unwrap();
        assert_eq!(result, stale);
    }

    #[test]
    fn test_normalize_property_over_grid() {
        let scheduler = RecurrenceScheduler::default();
        let reference = date(2026, 10, 16);
        for frequency in [Frequency::Weekly, Frequency::Monthly, Frequency::Yearly] {
            for day in [1, 15, 28, 29, 30, 31] {
                let due = date(2024, 1, day);
                let result = scheduler.normalize(due, frequency, reference).unwrap();
                assert!(result >= reference, "{} {} -> {}", frequency, due, result);
                if frequency == Frequency::Monthly {
                    let expected = day.min(days_in_month(result.year(), result.month()));
                    assert_eq!(result.day(), expected);
                }
            }
        }
    }

    #[test]
    fn test_iteration_bound_is_an_error() {
        let scheduler = RecurrenceScheduler::new(10);
        let err = scheduler
            .normalize(date(2000, 1, 1), Frequency::Weekly, date(2026, 10, 16))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ComputationBound);
    }

    #[test]
    fn test_occurrences() {
        let scheduler = RecurrenceScheduler::default();
        let anchor = date(2026, 10, 31);
        let dates = scheduler
            .occurrences(anchor, anchor, Frequency::Monthly, date(2027, 1, 31))
            .unwrap();
        assert_eq!(
            dates,
            vec![date(2026, 10, 31), date(2026, 11, 30), date(2026, 12, 31), date(2027, 1, 31)]
        );

        let once = scheduler
            .occurrences(date(2026, 11, 1), date(2026, 11, 1), Frequency::OneTime, date(2027, 1, 31))
            .unwrap();
        assert_eq!(once.len(), 1);

        let none = scheduler
            .occurrences(date(2027, 2, 1), date(2027, 2, 1), Frequency::Weekly, date(2027, 1, 31))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_occurrences_from_clamped_date_return_to_anchor_day() {
        let scheduler = RecurrenceScheduler::default();
        let anchor = date(2027, 1, 31);
        let dates = scheduler
            .occurrences(anchor, date(2027, 2, 28), Frequency::Monthly, date(2027, 5, 10))
            .unwrap();
        assert_eq!(dates, vec![date(2027, 2, 28), date(2027, 3, 31), date(2027, 4, 30)]);

        let leap = date(2024, 2, 29);
        let yearly = scheduler
            .occurrences(leap, date(2025, 2, 28), Frequency::Yearly, date(2028, 12, 31))
            .unwrap();
        assert_eq!(yearly, vec![date(2025, 2, 28), date(2026, 2, 28), date(2027, 2, 28), date(2028, 2, 29)]);
    }

    #[test]
    fn test_normalize_from_clamped_date_keeps_anchor_day() {
        let scheduler = RecurrenceScheduler::default();
        let anchor = date(2027, 1, 31);
        let feb = scheduler.normalize(anchor, Frequency::Monthly, date(2027, 2, 10)).unwrap();
        assert_eq!(feb, date(2027, 2, 28));

        let mar = scheduler
            .normalize_from(anchor, feb, Frequency::Monthly, date(2027, 3, 1))
            .unwrap();
        assert_eq!(mar, date(2027, 3, 31));
    }

    #[test]
    fn test_long_weekly_window_is_not_capped_by_normalization_bound() {
        let scheduler = RecurrenceScheduler::new(10);
        let first = date(2026, 10, 16);
        let through = date(2051, 10, 16);
        let dates = scheduler
            .occurrences(first, first, Frequency::Weekly, through)
            .unwrap();

        assert_eq!(dates.len() as i64, (through - first).num_days() / 7 + 1);
        assert!(dates.windows(2).all(|w| (w[1] - w[0]).num_days() == 7));
        assert!(*dates.last().unwrap() <= through);
    }

    #[test]
    fn test_parse_frequency() {
        assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert_eq!("one-time".parse::<Frequency>().unwrap(), Frequency::OneTime);
        assert_eq!("annual".parse::<Frequency>().unwrap(), Frequency::Yearly);
        let err = "fortnightly".parse::<Frequency>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
