//! Stateless service exposing the engine's operations over injected repositories
//!
//! Each operation reads the user's state once, computes over the snapshot and
//! (for budgets only) writes the result back.
//!
//! # Example
//! ```ignore
//! let repo = Arc::new(InMemoryRepository::from_data_dir("data")?);
//! let income = { let r = repo.clone(); move |user| r.monthly_income_estimate(user) };
//! let engine = FinanceEngine::new(repo, income, EngineConfig::default());
//!
//! let report = engine.forecast(1, 3)?;
//! let plan = engine.payoff_plan(1, 900.0, DebtStrategy::Avalanche)?;
//! ```

use chrono::NaiveDate;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::budget::{BudgetAdjustmentLoop, BudgetCategoryState};
use crate::calendar::{shift_months, CalendarMonth};
use crate::cashflow::{CashFlowProjector, DailyBalancePoint};
use crate::config::EngineConfig;
use crate::debt::{DebtAmortizationSimulator, DebtStrategy, PayoffEntry};
use crate::error::{EngineError, Result};
use crate::repository::{FinanceRepository, IncomeEstimator};
use crate::retirement::{ContributionOptimizer, OptimizationResult, Projection, RetirementPlanState, RetirementProjector};
use crate::UserId;

/// Day-by-day balance forecast for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub user_id: UserId,
    pub current_balance: f64,
    pub forecast: Vec<DailyBalancePoint>,
    pub lowest_balance: f64,
    pub highest_balance: f64,
    pub final_balance: f64,
    pub first_negative_date: Option<NaiveDate>,
}

/// Debt payoff plan for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffPlan {
    pub strategy: DebtStrategy,
    pub total_debt: f64,
    pub monthly_payment: f64,
    pub payoff_months: u32,
    /// Absent when the simulation hit its month cap
    pub payoff_date: Option<NaiveDate>,
    pub total_interest: f64,
    pub payoff_order: Vec<PayoffEntry>,
    pub converged: bool,
}

/// Projection engine bound to a user-data repository and an income estimator
pub struct FinanceEngine<R, I> {
    repository: Arc<R>,
    income: I,
    config: EngineConfig,
}

impl<R, I> FinanceEngine<R, I>
where
    R: FinanceRepository,
    I: IncomeEstimator,
{
    pub fn new(repository: Arc<R>, income: I, config: EngineConfig) -> Self {
        Self {
            repository,
            income,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn today(&self) -> NaiveDate {
        self.config.today()
    }

    /// Forecast the user's balance day by day for `horizon_months`
    pub fn forecast(&self, user_id: UserId, horizon_months: i32) -> Result<ForecastReport> {
        if horizon_months <= 0 {
            return Err(EngineError::InvalidHorizon(horizon_months));
        }

        let current_balance = self.repository.current_balance(user_id)?;
        let obligations = self.repository.active_obligations(user_id)?;
        let income_estimate = self.income.monthly_income_estimate(user_id)?;

        let forecast = CashFlowProjector::from_config(&self.config).project(
            current_balance,
            &obligations,
            income_estimate,
            horizon_months,
            self.today(),
        )?;

        Ok(ForecastReport {
            user_id,
            current_balance,
            lowest_balance: forecast.lowest_balance,
            highest_balance: forecast.highest_balance,
            final_balance: forecast.final_balance(),
            first_negative_date: forecast.first_negative_date(),
            forecast: forecast.points,
        })
    }

    /// Forecast several users in parallel; each user's outcome is independent
    pub fn forecast_many(&self, user_ids: &[UserId], horizon_months: i32) -> Vec<(UserId, Result<ForecastReport>)> {
        user_ids
            .par_iter()
            .map(|&user_id| (user_id, self.forecast(user_id, horizon_months)))
            .collect()
    }

    /// Simulate paying the user's debts with `monthly_payment` under `strategy`
    pub fn payoff_plan(&self, user_id: UserId, monthly_payment: f64, strategy: DebtStrategy) -> Result<PayoffPlan> {
        let debts = self.repository.debts(user_id)?;
        let result = DebtAmortizationSimulator::from_config(&self.config).simulate(&debts, monthly_payment, strategy)?;

        let payoff_date = if result.converged {
            let months = i32::try_from(result.total_months)
                .map_err(|_| EngineError::InvalidInput("payoff horizon out of range".to_string()))?;
            shift_months(self.today(), months)
        } else {
            None
        };

        Ok(PayoffPlan {
            strategy,
            total_debt: debts.iter().map(|d| d.balance).sum(),
            monthly_payment,
            payoff_months: result.total_months,
            payoff_date,
            total_interest: result.total_interest,
            payoff_order: result.payoff_order,
            converged: result.converged,
        })
    }

    /// Project a retirement plan without touching the repository
    pub fn retirement_projection(&self, plan: &RetirementPlanState) -> Result<Projection> {
        plan.validate()?;
        Ok(RetirementProjector::from_config(&self.config).project(plan))
    }

    /// Recommend the smallest on-track monthly contribution for the user's stored plan
    pub fn optimize_contribution(&self, user_id: UserId) -> Result<OptimizationResult> {
        let plan = self
            .repository
            .retirement_plan(user_id)?
            .ok_or(EngineError::NotFound {
                resource: "retirement plan",
                user_id,
            })?;
        plan.validate()?;

        Ok(ContributionOptimizer::from_config(&self.config).optimize(&plan))
    }

    /// Roll the current month's budgets into next month
    pub fn adjust_budgets(&self, user_id: UserId) -> Result<bool> {
        self.adjust_budgets_for(user_id, CalendarMonth::containing(self.today()))
    }

    /// Roll `month`'s budgets into the following month.
    ///
    /// Not idempotent: the caller must run it once per user per month boundary.
    pub fn adjust_budgets_for(&self, user_id: UserId, month: CalendarMonth) -> Result<bool> {
        let states = self.repository.budgets_for_month(user_id, month)?;
        if states.is_empty() {
            return Err(EngineError::NotFound {
                resource: "budget",
                user_id,
            });
        }

        let next_month = month
            .next()
            .ok_or_else(|| EngineError::InvalidInput(format!("no month follows {}", month)))?;
        let existing_next = self.repository.budgets_for_month(user_id, next_month)?;

        let outcome = BudgetAdjustmentLoop::from_config(&self.config).rollover_to_next_month(&states, &existing_next)?;
        // Sources and next-month records go out in one write
        let writes: Vec<BudgetCategoryState> = outcome.rolled.iter().chain(&outcome.next).cloned().collect();
        self.repository.upsert_budgets(&writes)?;

        info!(
            "Rolled {} budget categories for user {} from {} into {}",
            outcome.rolled.len(),
            user_id,
            month,
            next_month
        );
        debug!("Next month records: {:?}", outcome.next);

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::BudgetStatus;
    use crate::calendar::Frequency;
    use crate::cashflow::RecurringObligation;
    use crate::debt::DebtAccount;
    use crate::error::ErrorKind;
    use crate::repository::{
        AccountRepository, AccountSnapshot, BudgetRepository, DebtRepository, InMemoryRepository,
        ObligationRepository, RetirementPlanRepository,
    };
    use crate::retirement::RetirementPlanState;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use approx::assert_relative_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn config() -> EngineConfig {
        EngineConfig {
            reference_date: Some(today()),
            ..EngineConfig::default()
        }
    }

    fn plan(user_id: UserId, contribution: f64) -> RetirementPlanState {
        RetirementPlanState {
            user_id,
            current_age: 40,
            retirement_age: 67,
            current_savings: 20_000.0,
            monthly_contribution: contribution,
            expected_return: 6.0,
            inflation_rate: 2.0,
            current_income: 5_000.0,
        }
    }

    fn repository() -> Arc<InMemoryRepository> {
        let october = CalendarMonth::containing(today());
        let mut dining = BudgetCategoryState::new(1, "Dining", october, 400.0);
        dining.spent = 200.0;
        let mut groceries = BudgetCategoryState::new(1, "Groceries", october, 500.0);
        groceries.spent = 600.0;

        Arc::new(
            InMemoryRepository::new()
                .with_accounts(vec![AccountSnapshot { user_id: 1, balance: 500.0, income_estimate: 0.0 }])
                .with_obligations(vec![RecurringObligation::new(
                    1,
                    "Internet",
                    100.0,
                    "utilities",
                    Frequency::Monthly,
                    NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
                )])
                .with_debts(vec![
                    DebtAccount::new(1, "Low", 1000.0, 5.0, 25.0),
                    DebtAccount::new(1, "High", 1000.0, 20.0, 25.0),
                ])
                .with_budgets(vec![dining, groceries])
                .with_plans(vec![plan(1, 1_000.0), plan(2, 5_000.0)]),
        )
    }

    fn engine(repo: Arc<InMemoryRepository>) -> FinanceEngine<InMemoryRepository, impl IncomeEstimator> {
        let income = {
            let repo = repo.clone();
            move |user_id| repo.monthly_income_estimate(user_id)
        };
        FinanceEngine::new(repo, income, config())
    }

    #[test]
    fn test_forecast_report() {
        let report = engine(repository()).forecast(1, 2).unwrap();
        assert_eq!(report.current_balance, 500.0);
        assert_relative_eq!(report.lowest_balance, 300.0);
        assert_relative_eq!(report.highest_balance, 500.0);
        assert_relative_eq!(report.final_balance, 300.0);
        assert_eq!(report.forecast.first().unwrap().date, today());
        assert_eq!(report.first_negative_date, None);
    }

    #[test]
    fn test_forecast_rejects_non_positive_horizon() {
        let err = engine(repository()).forecast(1, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_forecast_many_runs_each_user() {
        let results = engine(repository()).forecast_many(&[1, 2, 3], 1);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        let (_, empty) = &results[1];
        assert_eq!(empty.as_ref().unwrap().current_balance, 0.0);
    }

    #[test]
    fn test_payoff_plan() {
        let plan = engine(repository()).payoff_plan(1, 150.0, DebtStrategy::Avalanche).unwrap();
        assert!(plan.converged);
        assert_eq!(plan.total_debt, 2000.0);
        assert_eq!(plan.payoff_order.len(), 2);
        assert_eq!(plan.payoff_date, shift_months(today(), plan.payoff_months as i32));
    }

    #[test]
    fn test_payoff_plan_insufficient_payment() {
        let err = engine(repository()).payoff_plan(1, 40.0, DebtStrategy::Snowball).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientPayment { .. }));
    }

    #[test]
    fn test_optimize_contribution() {
        let engine = engine(repository());

        let behind = engine.optimize_contribution(1).unwrap();
        assert!(behind.recommended_contribution > behind.current_contribution);

        let on_track = engine.optimize_contribution(2).unwrap();
        assert_eq!(on_track.recommended_contribution, on_track.current_contribution);

        let err = engine.optimize_contribution(3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_retirement_projection_validates() {
        let engine = engine(repository());
        assert!(engine.retirement_projection(&plan(1, 500.0)).is_ok());

        let mut bad = plan(1, 500.0);
        bad.retirement_age = 30;
        assert_eq!(engine.retirement_projection(&bad).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_adjust_budgets_writes_next_month() {
        let repo = repository();
        let engine = engine(repo.clone());
        assert!(engine.adjust_budgets(1).unwrap());

        let october = CalendarMonth::containing(today());
        let november = october.next().unwrap();

        let rolled = repo.budgets_for_month(1, october).unwrap();
        assert!(rolled.iter().all(|s| s.status == BudgetStatus::Rolled));

        let next = repo.budgets_for_month(1, november).unwrap();
        assert_eq!(next.len(), 2);
        let dining = next.iter().find(|s| s.category == "Dining").unwrap();
        assert_relative_eq!(dining.allocated, 380.0);
        assert_relative_eq!(dining.rollover_amount, 200.0);
        let groceries = next.iter().find(|s| s.category == "Groceries").unwrap();
        assert_relative_eq!(groceries.allocated, 660.0);
        assert_eq!(groceries.rollover_amount, 0.0);
    }

    /// Accepts a single budget write, then fails every later one
    struct SingleWriteRepository {
        inner: InMemoryRepository,
        writes: AtomicUsize,
    }

    impl ObligationRepository for SingleWriteRepository {
        fn active_obligations(&self, user_id: UserId) -> Result<Vec<RecurringObligation>> {
            self.inner.active_obligations(user_id)
        }
    }

    impl DebtRepository for SingleWriteRepository {
        fn debts(&self, user_id: UserId) -> Result<Vec<DebtAccount>> {
            self.inner.debts(user_id)
        }
    }

    impl BudgetRepository for SingleWriteRepository {
        fn budgets_for_month(&self, user_id: UserId, month: CalendarMonth) -> Result<Vec<BudgetCategoryState>> {
            self.inner.budgets_for_month(user_id, month)
        }

        fn upsert_budgets(&self, states: &[BudgetCategoryState]) -> Result<()> {
            if self.writes.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(EngineError::repository("write rejected"));
            }
            self.inner.upsert_budgets(states)
        }
    }

    impl RetirementPlanRepository for SingleWriteRepository {
        fn retirement_plan(&self, user_id: UserId) -> Result<Option<RetirementPlanState>> {
            self.inner.retirement_plan(user_id)
        }
    }

    impl AccountRepository for SingleWriteRepository {
        fn current_balance(&self, user_id: UserId) -> Result<f64> {
            self.inner.current_balance(user_id)
        }
    }

    #[test]
    fn test_adjust_budgets_writes_sources_and_next_month_together() {
        let october = CalendarMonth::containing(today());
        let repo = Arc::new(SingleWriteRepository {
            inner: InMemoryRepository::new().with_budgets(vec![BudgetCategoryState::new(1, "Fuel", october, 200.0)]),
            writes: AtomicUsize::new(0),
        });
        let engine = FinanceEngine::new(repo.clone(), |_: UserId| -> Result<f64> { Ok(0.0) }, config());

        assert!(engine.adjust_budgets(1).unwrap());
        assert_eq!(repo.writes.load(Ordering::SeqCst), 1);

        let rolled = repo.inner.budgets_for_month(1, october).unwrap();
        assert_eq!(rolled[0].status, BudgetStatus::Rolled);
        let next = repo.inner.budgets_for_month(1, october.next().unwrap()).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].category, "Fuel");
    }

    #[test]
    fn test_adjust_budgets_without_budgets_is_not_found() {
        let err = engine(repository()).adjust_budgets(2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
