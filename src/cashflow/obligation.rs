//! Recurring bills and subscriptions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{Frequency, RecurrenceScheduler};
use crate::error::{EngineError, Result};
use crate::UserId;

/// A bill, subscription or other repeating outflow owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringObligation {
    /// Owning user
    pub user_id: UserId,

    pub name: String,

    /// Amount per occurrence (positive; forecast events carry it negated)
    pub amount: f64,

    pub category: String,

    pub frequency: Frequency,

    /// Original due date the schedule is anchored on
    pub due_date: NaiveDate,

    /// Next due date; never in the past once normalized
    pub next_due: NaiveDate,

    pub autopay: bool,

    /// Inactive obligations are ignored by the forecast
    pub active: bool,
}

impl RecurringObligation {
    /// Create an active obligation whose next due date is its anchor
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        frequency: Frequency,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            amount,
            category: category.into(),
            frequency,
            due_date,
            next_due: due_date,
            autopay: false,
            active: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.amount > 0.0) || !self.amount.is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "obligation '{}' must have a positive amount, got {}",
                self.name, self.amount
            )));
        }
        Ok(())
    }

    /// Copy of this obligation with `next_due` rolled forward to `reference`,
    /// staying on the schedule anchored at `due_date`
    pub fn normalized(&self, scheduler: &RecurrenceScheduler, reference: NaiveDate) -> Result<Self> {
        let next_due = scheduler.normalize_from(self.due_date, self.next_due, self.frequency, reference)?;
        Ok(Self {
            next_due,
            ..self.clone()
        })
    }
}
