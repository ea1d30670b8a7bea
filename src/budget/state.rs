//! Per-category monthly budget records

use serde::{Deserialize, Serialize};

use crate::calendar::CalendarMonth;
use crate::error::{EngineError, Result};
use crate::UserId;

/// Lifecycle of a category budget within its month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Spending accrues through the month
    #[default]
    Active,
    /// The next month's record has been derived from this one
    Rolled,
}

/// Allocation and spend for one category in one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategoryState {
    pub user_id: UserId,

    pub category: String,

    pub month: CalendarMonth,

    pub allocated: f64,

    /// Updated externally as transactions are categorized
    pub spent: f64,

    /// Unused budget carried in from the previous month
    pub rollover_amount: f64,

    /// Whether the allocation is resized at month end
    pub auto_adjust: bool,

    #[serde(default)]
    pub status: BudgetStatus,
}

impl BudgetCategoryState {
    /// A fresh, unspent budget for the month
    pub fn new(user_id: UserId, category: impl Into<String>, month: CalendarMonth, allocated: f64) -> Self {
        Self {
            user_id,
            category: category.into(),
            month,
            allocated,
            spent: 0.0,
            rollover_amount: 0.0,
            auto_adjust: true,
            status: BudgetStatus::Active,
        }
    }

    /// Spend as a percentage of the allocation; 0 when nothing is allocated
    pub fn percent_used(&self) -> f64 {
        if self.allocated > 0.0 {
            self.spent / self.allocated * 100.0
        } else {
            0.0
        }
    }

    /// Allocation plus carried-in rollover, less spend
    pub fn available(&self) -> f64 {
        self.allocated + self.rollover_amount - self.spent
    }

    pub fn is_over_budget(&self) -> bool {
        self.spent > self.allocated
    }

    pub fn validate(&self) -> Result<()> {
        if !self.allocated.is_finite() || self.allocated < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "budget '{}' for {} has invalid allocation {}",
                self.category, self.month, self.allocated
            )));
        }
        if !self.spent.is_finite() || !self.rollover_amount.is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "budget '{}' for {} has non-finite amounts",
                self.category, self.month
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_used_guards_zero_allocation() {
        let month = CalendarMonth::new(2026, 10).unwrap();
        let mut state = BudgetCategoryState::new(1, "Dining", month, 0.0);
        state.spent = 45.0;
        assert_eq!(state.percent_used(), 0.0);

        state.allocated = 300.0;
        assert!((state.percent_used() - 15.0).abs() < 1e-12);
        assert!(!state.is_over_budget());
        assert_eq!(state.available(), 255.0);
    }
}
