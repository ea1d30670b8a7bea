//! Month-by-month multi-debt payoff simulation

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::account::{total_minimum_payment, DebtAccount, DebtStrategy};
use crate::config::{EngineConfig, DEFAULT_MAX_PAYOFF_MONTHS};
use crate::error::{EngineError, Result};

/// Tolerance used when comparing the payment against the required minimum
const PAYMENT_EPSILON: f64 = 1e-9;

/// A debt reaching zero balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffEntry {
    pub creditor: String,

    /// Simulated month (1-indexed) in which the balance reached zero
    pub month: u32,
}

/// Outcome of a payoff simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffSimulationResult {
    pub strategy: DebtStrategy,

    /// Months simulated
    pub total_months: u32,

    pub total_interest: f64,

    /// Total paid towards all debts, interest included
    pub total_paid: f64,

    /// Debts in the order their balances were extinguished
    pub payoff_order: Vec<PayoffEntry>,

    /// False when the month cap was hit with balances outstanding
    pub converged: bool,

    /// Balance left across all debts when the simulation stopped
    pub remaining_balance: f64,
}

/// Both strategies run over the same debts and payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub avalanche: PayoffSimulationResult,
    pub snowball: PayoffSimulationResult,

    /// Interest avoided by choosing avalanche over snowball (may be negative)
    pub interest_saved: f64,
}

impl StrategyComparison {
    /// Strategy with the lower total interest; avalanche wins ties
    pub fn cheaper(&self) -> DebtStrategy {
        if self.avalanche.total_interest <= self.snowball.total_interest {
            DebtStrategy::Avalanche
        } else {
            DebtStrategy::Snowball
        }
    }
}

/// Mutable per-debt state during a simulation, kept in strategy order
#[derive(Debug, Clone)]
struct DebtState {
    creditor: String,
    balance: f64,
    monthly_rate: f64,
    minimum_payment: f64,
    paid_off: bool,
}

impl DebtState {
    fn from_account(debt: &DebtAccount) -> Self {
        Self {
            creditor: debt.creditor.clone(),
            balance: debt.balance,
            monthly_rate: debt.interest_rate / 100.0 / 12.0,
            minimum_payment: debt.minimum_payment,
            // Debts that start at zero never "reach" zero and stay out of the payoff order
            paid_off: debt.balance <= 0.0,
        }
    }

    fn is_open(&self) -> bool {
        self.balance > 0.0
    }

    /// Pay up to `amount`, never taking the balance below zero. Returns the amount applied.
    fn pay(&mut self, amount: f64) -> f64 {
        let applied = amount.min(self.balance).max(0.0);
        self.balance -= applied;
        applied
    }
}

/// Simulates paying down several debts with a fixed monthly budget
#[derive(Debug, Clone, Copy)]
pub struct DebtAmortizationSimulator {
    max_months: u32,
}

impl DebtAmortizationSimulator {
    pub fn new(max_months: u32) -> Self {
        Self { max_months }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_payoff_months)
    }

    /// Run the payoff simulation.
    ///
    /// Each month accrues interest on open debts, pays every minimum, then
    /// puts whatever is left of `monthly_payment` on the first open debt in
    /// strategy order. Hitting the month cap returns the partial result with
    /// `converged == false`.
    pub fn simulate(
        &self,
        debts: &[DebtAccount],
        monthly_payment: f64,
        strategy: DebtStrategy,
    ) -> Result<PayoffSimulationResult> {
        for debt in debts {
            debt.validate()?;
        }

        let required = total_minimum_payment(debts);
        if !monthly_payment.is_finite() || monthly_payment + PAYMENT_EPSILON < required {
            return Err(EngineError::InsufficientPayment {
                required,
                provided: monthly_payment,
            });
        }

        let mut states: Vec<DebtState> = strategy
            .priority_order(debts)
            .into_iter()
            .map(|i| DebtState::from_account(&debts[i]))
            .collect();

        let mut total_interest = 0.0;
        let mut total_paid = 0.0;
        let mut payoff_order = Vec::new();
        let mut month = 0;

        while states.iter().any(DebtState::is_open) {
            if month >= self.max_months {
                break;
            }
            month += 1;

            // Interest accrual
            for state in states.iter_mut().filter(|s| s.is_open()) {
                let interest = state.balance * state.monthly_rate;
                state.balance += interest;
                total_interest += interest;
            }

            // Minimum payments
            let mut pool = monthly_payment;
            for state in states.iter_mut().filter(|s| s.is_open()) {
                let minimum = state.minimum_payment;
                pool -= state.pay(minimum);
            }

            // Surplus goes to the highest-priority open debt only
            if pool > 0.0 {
                if let Some(target) = states.iter_mut().find(|s| s.is_open()) {
                    pool -= target.pay(pool);
                }
            }
            total_paid += monthly_payment - pool;

            for state in states.iter_mut().filter(|s| !s.paid_off && !s.is_open()) {
                state.paid_off = true;
                payoff_order.push(PayoffEntry {
                    creditor: state.creditor.clone(),
                    month,
                });
            }
        }

        let remaining_balance: f64 = states.iter().map(|s| s.balance.max(0.0)).sum();
        let converged = remaining_balance <= 0.0;

        if converged {
            debug!(
                "{} payoff of {} debts: {} months, interest {:.2}",
                strategy,
                debts.len(),
                month,
                total_interest
            );
        } else {
            warn!(
                "{} payoff stopped at the {}-month cap with {:.2} outstanding",
                strategy, self.max_months, remaining_balance
            );
        }

        Ok(PayoffSimulationResult {
            strategy,
            total_months: month,
            total_interest,
            total_paid,
            payoff_order,
            converged,
            remaining_balance,
        })
    }

    /// Simulate both strategies with the same inputs
    pub fn compare_strategies(
        &self,
        debts: &[DebtAccount],
        monthly_payment: f64,
    ) -> Result<StrategyComparison> {
        let avalanche = self.simulate(debts, monthly_payment, DebtStrategy::Avalanche)?;
        let snowball = self.simulate(debts, monthly_payment, DebtStrategy::Snowball)?;
        let interest_saved = snowball.total_interest - avalanche.total_interest;

        Ok(StrategyComparison {
            avalanche,
            snowball,
            interest_saved,
        })
    }
}

impl Default for DebtAmortizationSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYOFF_MONTHS)
    }
}
