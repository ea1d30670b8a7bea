//! Adaptive month-to-month category budgets

mod state;
mod adjustment;

pub use state::{BudgetCategoryState, BudgetStatus};
pub use adjustment::{BudgetAdjustmentLoop, RolloverOutcome};
