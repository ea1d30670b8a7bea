//! Month-end budget rollover and allocation adjustment

use log::{debug, warn};

use super::state::{BudgetCategoryState, BudgetStatus};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// Result of rolling a month's budgets forward
#[derive(Debug, Clone, PartialEq)]
pub struct RolloverOutcome {
    /// The source records, marked rolled
    pub rolled: Vec<BudgetCategoryState>,

    /// Next month's records, updated in place or newly created
    pub next: Vec<BudgetCategoryState>,
}

/// Adaptive month-to-month budget rollover.
///
/// Performs no locking: callers must invoke it once per user per month boundary.
#[derive(Debug, Clone, Copy)]
pub struct BudgetAdjustmentLoop {
    underspend_threshold: f64,
    shrink_factor: f64,
    growth_factor: f64,
    rollover_cap: f64,
}

impl BudgetAdjustmentLoop {
    pub fn new(underspend_threshold: f64, shrink_factor: f64, growth_factor: f64, rollover_cap: f64) -> Self {
        Self {
            underspend_threshold,
            shrink_factor,
            growth_factor,
            rollover_cap,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.underspend_threshold,
            config.shrink_factor,
            config.growth_factor,
            config.rollover_cap,
        )
    }

    /// Allocation for the following month given this month's spend
    pub fn next_allocation(&self, state: &BudgetCategoryState) -> f64 {
        if !state.auto_adjust {
            return state.allocated;
        }
        if state.spent < self.underspend_threshold * state.allocated {
            self.shrink_factor * state.allocated
        } else if state.spent > state.allocated {
            self.growth_factor * state.spent
        } else {
            state.allocated
        }
    }

    /// Unused budget carried forward, in `[0, cap * allocated]`
    pub fn rollover(&self, state: &BudgetCategoryState) -> f64 {
        let carried = (state.allocated - state.spent + state.rollover_amount).max(0.0);
        carried.min(self.rollover_cap * state.allocated)
    }

    /// Derive next month's records from `states`.
    ///
    /// `existing_next` holds records already present for the following month;
    /// a matching (user, category) record is updated in place with its spend
    /// kept, otherwise a new zero-spend record is created.
    pub fn rollover_to_next_month(
        &self,
        states: &[BudgetCategoryState],
        existing_next: &[BudgetCategoryState],
    ) -> Result<RolloverOutcome> {
        let mut rolled = Vec::with_capacity(states.len());
        let mut next: Vec<BudgetCategoryState> = Vec::with_capacity(states.len());

        for state in states {
            state.validate()?;
            if state.status == BudgetStatus::Rolled {
                warn!(
                    "Budget '{}' for {} was already rolled over; rolling again",
                    state.category, state.month
                );
            }

            let next_month = state.month.next().ok_or_else(|| {
                EngineError::InvalidInput(format!("no month follows {}", state.month))
            })?;
            let allocated = self.next_allocation(state);
            let rollover_amount = self.rollover(state);

            let is_match = |candidate: &BudgetCategoryState| {
                candidate.user_id == state.user_id
                    && candidate.category == state.category
                    && candidate.month == next_month
            };

            // Duplicate categories in one month land on the same next-month record
            let index = match next.iter().position(|c| is_match(c)) {
                Some(index) => index,
                None => {
                    let seed = existing_next
                        .iter()
                        .find(|c| is_match(*c))
                        .cloned()
                        .unwrap_or_else(|| BudgetCategoryState {
                            user_id: state.user_id,
                            category: state.category.clone(),
                            month: next_month,
                            allocated: 0.0,
                            spent: 0.0,
                            rollover_amount: 0.0,
                            auto_adjust: state.auto_adjust,
                            status: BudgetStatus::Active,
                        });
                    next.push(seed);
                    next.len() - 1
                }
            };
            next[index].allocated = allocated;
            next[index].rollover_amount = rollover_amount;

            debug!(
                "Rolled '{}' {} -> {}: allocation {:.2} -> {:.2}, rollover {:.2}",
                state.category, state.month, next_month, state.allocated, allocated, rollover_amount
            );

            rolled.push(BudgetCategoryState {
                status: BudgetStatus::Rolled,
                ..state.clone()
            });
        }

        Ok(RolloverOutcome { rolled, next })
    }
}

impl Default for BudgetAdjustmentLoop {
    fn default() -> Self {
        Self::new(0.8, 0.95, 1.1, 0.5)
    }
}
