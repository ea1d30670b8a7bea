//! Retirement plan inputs and projection output

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::UserId;

/// Oldest age a plan may name
pub const MAX_PLAN_AGE: u32 = 150;

/// A user's retirement plan as stored by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementPlanState {
    pub user_id: UserId,

    pub current_age: u32,

    pub retirement_age: u32,

    pub current_savings: f64,

    pub monthly_contribution: f64,

    /// Expected annual return in percent
    pub expected_return: f64,

    /// Expected annual inflation in percent
    pub inflation_rate: f64,

    /// Current gross monthly income, the base of the replacement ratio
    pub current_income: f64,
}

impl RetirementPlanState {
    /// Months of accumulation left before retirement
    pub fn months_to_retirement(&self) -> u32 {
        self.retirement_age.saturating_sub(self.current_age).saturating_mul(12)
    }

    /// Copy of the plan with a different monthly contribution
    pub fn with_contribution(&self, monthly_contribution: f64) -> Self {
        Self {
            monthly_contribution,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.current_age > MAX_PLAN_AGE || self.retirement_age > MAX_PLAN_AGE {
            return Err(EngineError::InvalidInput(format!(
                "ages must not exceed {}, got {} and {}",
                MAX_PLAN_AGE, self.current_age, self.retirement_age
            )));
        }
        if self.retirement_age < self.current_age {
            return Err(EngineError::InvalidInput(format!(
                "retirement age {} is before current age {}",
                self.retirement_age, self.current_age
            )));
        }
        let amounts = [
            ("current savings", self.current_savings),
            ("monthly contribution", self.monthly_contribution),
            ("current income", self.current_income),
        ];
        for (name, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidInput(format!("{} must be non-negative, got {}", name, value)));
            }
        }
        if !self.expected_return.is_finite() || self.expected_return <= -100.0 {
            return Err(EngineError::InvalidInput(format!(
                "expected return must be above -100%, got {}",
                self.expected_return
            )));
        }
        if !self.inflation_rate.is_finite() || self.inflation_rate <= -100.0 {
            return Err(EngineError::InvalidInput(format!(
                "inflation rate must be above -100%, got {}",
                self.inflation_rate
            )));
        }
        Ok(())
    }
}

/// Projected retirement position derived from a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Nominal portfolio value at retirement
    pub projected_value: f64,

    /// Portfolio value in today's money
    pub real_value: f64,

    /// Nominal monthly income under the withdrawal rule
    pub monthly_income: f64,

    /// Monthly income in today's money
    pub real_monthly_income: f64,

    /// Monthly income needed to be on track
    pub target_income: f64,

    /// Real monthly income over current income (0 when there is no income)
    pub replacement_ratio: f64,

    pub is_on_track: bool,

    /// Shortfall against the target, never negative
    pub gap: f64,
}
