//! Finance Engine - Deterministic projections for personal-finance planning
//!
//! This library provides:
//! - Recurrence scheduling with month-end clamping
//! - Day-by-day cash flow forecasting from bills and estimated income
//! - Debt payoff simulation (avalanche and snowball)
//! - Retirement projection and contribution optimization
//! - Monthly budget adjustment with capped rollover
//!
//! Persistence sits behind the traits in [`repository`]; the
//! [`FinanceEngine`] reads each user's state once and computes over it.

pub mod budget;
pub mod calendar;
pub mod cashflow;
pub mod config;
pub mod debt;
pub mod engine;
pub mod error;
pub mod repository;
pub mod retirement;

/// Opaque user identifier
pub type UserId = u32;

// Re-export commonly used types
pub use budget::{BudgetAdjustmentLoop, BudgetCategoryState};
pub use calendar::{CalendarMonth, Frequency, RecurrenceScheduler};
pub use cashflow::{CashFlowForecast, CashFlowProjector, RecurringObligation};
pub use config::EngineConfig;
pub use debt::{DebtAccount, DebtAmortizationSimulator, DebtStrategy, PayoffSimulationResult};
pub use engine::{FinanceEngine, ForecastReport, PayoffPlan};
pub use error::{EngineError, ErrorKind, Result};
pub use repository::{FinanceRepository, IncomeEstimator, InMemoryRepository};
pub use retirement::{ContributionOptimizer, OptimizationResult, Projection, RetirementPlanState, RetirementProjector};
