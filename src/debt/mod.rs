//! Multi-debt amortization under competing payoff strategies

mod account;
mod simulator;

pub use account::{DebtAccount, DebtStrategy, total_minimum_payment, total_current_payment};
pub use simulator::{DebtAmortizationSimulator, PayoffEntry, PayoffSimulationResult, StrategyComparison};
