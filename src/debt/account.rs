//! Debt accounts and payoff strategies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, Result};
use crate::UserId;

/// A single debt (card, loan) owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtAccount {
    pub user_id: UserId,

    pub creditor: String,

    /// Outstanding balance
    pub balance: f64,

    /// Annual interest rate in percent (e.g. 19.99)
    pub interest_rate: f64,

    /// Required minimum monthly payment
    pub minimum_payment: f64,

    /// What the user currently pays each month
    pub current_payment: f64,
}

impl DebtAccount {
    pub fn new(
        user_id: UserId,
        creditor: impl Into<String>,
        balance: f64,
        interest_rate: f64,
        minimum_payment: f64,
    ) -> Self {
        Self {
            user_id,
            creditor: creditor.into(),
            balance,
            interest_rate,
            minimum_payment,
            current_payment: minimum_payment,
        }
    }

    /// Interest accrued over one month on the current balance
    pub fn monthly_interest(&self) -> f64 {
        self.balance * (self.interest_rate / 100.0) / 12.0
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("balance", self.balance),
            ("interest rate", self.interest_rate),
            ("minimum payment", self.minimum_payment),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidInput(format!(
                    "debt '{}' has invalid {}: {}",
                    self.creditor, name, value
                )));
            }
        }
        Ok(())
    }
}

/// Sum of minimum payments across debts
pub fn total_minimum_payment(debts: &[DebtAccount]) -> f64 {
    debts.iter().map(|d| d.minimum_payment).sum()
}

/// Sum of what the user currently pays across debts
pub fn total_current_payment(debts: &[DebtAccount]) -> f64 {
    debts.iter().map(|d| d.current_payment).sum()
}

/// Order in which surplus payment is directed at debts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtStrategy {
    /// Highest interest rate first
    Avalanche,
    /// Smallest balance first
    Snowball,
}

impl DebtStrategy {
    /// Indices of `debts` in priority order. Ties keep their original order.
    pub fn priority_order(self, debts: &[DebtAccount]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..debts.len()).collect();
        match self {
            DebtStrategy::Avalanche => {
                order.sort_by(|&a, &b| debts[b].interest_rate.total_cmp(&debts[a].interest_rate))
            }
            DebtStrategy::Snowball => {
                order.sort_by(|&a, &b| debts[a].balance.total_cmp(&debts[b].balance))
            }
        }
        order
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DebtStrategy::Avalanche => "avalanche",
            DebtStrategy::Snowball => "snowball",
        }
    }
}

impl fmt::Display for DebtStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebtStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avalanche" => Ok(DebtStrategy::Avalanche),
            "snowball" => Ok(DebtStrategy::Snowball),
            _ => Err(EngineError::UnknownStrategy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debts() -> Vec<DebtAccount> {
        vec![
            DebtAccount::new(1, "Store card", 800.0, 24.0, 25.0),
            DebtAccount::new(1, "Car loan", 9000.0, 6.5, 250.0),
            DebtAccount::new(1, "Visa", 800.0, 24.0, 30.0),
            DebtAccount::new(1, "Medical", 300.0, 0.0, 20.0),
        ]
    }

    #[test]
    fn test_avalanche_order_is_stable() {
        assert_eq!(DebtStrategy::Avalanche.priority_order(&debts()), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_snowball_order_is_stable() {
        assert_eq!(DebtStrategy::Snowball.priority_order(&debts()), vec![3, 0, 2, 1]);
    }

    #[test]
    fn test_validate_and_totals() {
        let mut list = debts();
        assert!(list.iter().all(|d| d.validate().is_ok()));
        assert_eq!(total_minimum_payment(&list), 325.0);
        list[1].balance = -1.0;
        assert!(list[1].validate().is_err());
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("Avalanche".parse::<DebtStrategy>().unwrap(), DebtStrategy::Avalanche);
        assert!("highest-first".parse::<DebtStrategy>().is_err());
    }
}
