//! Seams to the persistence collaborator
//!
//! The engine reads each user's state once through these traits and computes
//! over the snapshot. Implementations wrap their own failures in
//! [`EngineError::Repository`](crate::EngineError::Repository); the engine
//! propagates them unchanged and never retries.

mod memory;
pub mod loader;

pub use memory::InMemoryRepository;
pub use loader::{load_accounts, load_budgets, load_debts, load_obligations, load_plans, AccountSnapshot};

use crate::budget::BudgetCategoryState;
use crate::calendar::CalendarMonth;
use crate::cashflow::RecurringObligation;
use crate::debt::DebtAccount;
use crate::error::Result;
use crate::retirement::RetirementPlanState;
use crate::UserId;

/// Recurring bills and subscriptions
pub trait ObligationRepository: Send + Sync {
    /// Active obligations for the user
    fn active_obligations(&self, user_id: UserId) -> Result<Vec<RecurringObligation>>;
}

pub trait DebtRepository: Send + Sync {
    fn debts(&self, user_id: UserId) -> Result<Vec<DebtAccount>>;
}

/// Per-category monthly budgets
pub trait BudgetRepository: Send + Sync {
    fn budgets_for_month(&self, user_id: UserId, month: CalendarMonth) -> Result<Vec<BudgetCategoryState>>;

    /// Insert or replace records keyed by (user, category, month), as one write
    fn upsert_budgets(&self, states: &[BudgetCategoryState]) -> Result<()>;
}

pub trait RetirementPlanRepository: Send + Sync {
    fn retirement_plan(&self, user_id: UserId) -> Result<Option<RetirementPlanState>>;
}

/// Current cash position across the user's accounts
pub trait AccountRepository: Send + Sync {
    fn current_balance(&self, user_id: UserId) -> Result<f64>;
}

/// Trailing-average signed monthly income derived from transaction history
pub trait IncomeEstimator: Send + Sync {
    fn monthly_income_estimate(&self, user_id: UserId) -> Result<f64>;
}

impl<F> IncomeEstimator for F
where
    F: Fn(UserId) -> Result<f64> + Send + Sync,
{
    fn monthly_income_estimate(&self, user_id: UserId) -> Result<f64> {
        self(user_id)
    }
}

/// Everything the engine reads and writes
pub trait FinanceRepository:
    ObligationRepository + DebtRepository + BudgetRepository + RetirementPlanRepository + AccountRepository
{
}

impl<T> FinanceRepository for T where
    T: ObligationRepository + DebtRepository + BudgetRepository + RetirementPlanRepository + AccountRepository
{
}
