//! Compound-growth retirement projection

use super::plan::{Projection, RetirementPlanState};
use crate::config::{EngineConfig, DEFAULT_REPLACEMENT_RATIO, DEFAULT_SAFE_WITHDRAWAL_RATE};

fn periods(months: u32) -> i32 {
    i32::try_from(months).unwrap_or(i32::MAX)
}

/// Future value of a lump sum after `months` periods
pub fn future_value(present: f64, monthly_rate: f64, months: u32) -> f64 {
    present * (1.0 + monthly_rate).powi(periods(months))
}

/// Future value of an ordinary annuity (payments at period end).
/// A zero rate degrades to the plain sum of payments.
pub fn future_value_annuity(payment: f64, monthly_rate: f64, months: u32) -> f64 {
    if monthly_rate == 0.0 {
        payment * months as f64
    } else {
        payment * ((1.0 + monthly_rate).powi(periods(months)) - 1.0) / monthly_rate
    }
}

/// Projects a retirement plan forward to the retirement date
#[derive(Debug, Clone, Copy)]
pub struct RetirementProjector {
    safe_withdrawal_rate: f64,
    replacement_ratio: f64,
}

impl RetirementProjector {
    pub fn new(safe_withdrawal_rate: f64, replacement_ratio: f64) -> Self {
        Self {
            safe_withdrawal_rate,
            replacement_ratio,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.safe_withdrawal_rate, config.replacement_ratio)
    }

    pub fn project(&self, plan: &RetirementPlanState) -> Projection {
        let months = plan.months_to_retirement();
        let monthly_return = plan.expected_return / 100.0 / 12.0;

        let projected_value = future_value(plan.current_savings, monthly_return, months)
            + future_value_annuity(plan.monthly_contribution, monthly_return, months);
        let monthly_income = projected_value * self.safe_withdrawal_rate / 12.0;

        let years = months as f64 / 12.0;
        let deflator = (1.0 + plan.inflation_rate / 100.0).powf(years);
        let real_value = projected_value / deflator;
        let real_monthly_income = monthly_income / deflator;

        let target_income = plan.current_income * self.replacement_ratio;
        let replacement_ratio = if plan.current_income > 0.0 {
            real_monthly_income / plan.current_income
        } else {
            0.0
        };

        Projection {
            projected_value,
            real_value,
            monthly_income,
            real_monthly_income,
            target_income,
            replacement_ratio,
            is_on_track: real_monthly_income >= target_income,
            gap: (target_income - real_monthly_income).max(0.0),
        }
    }
}

impl Default for RetirementProjector {
    fn default() -> Self {
        Self::new(DEFAULT_SAFE_WITHDRAWAL_RATE, DEFAULT_REPLACEMENT_RATIO)
    }
}
