//! Load engine inputs from CSV files
//!
//! Each file has a header row; text enums are parsed with the engine's own
//! `FromStr` implementations so malformed values surface as validation errors.

use chrono::NaiveDate;
use csv::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

use crate::budget::{BudgetCategoryState, BudgetStatus};
use crate::calendar::{CalendarMonth, Frequency};
use crate::cashflow::RecurringObligation;
use crate::debt::DebtAccount;
use crate::error::{EngineError, Result};
use crate::retirement::RetirementPlanState;
use crate::UserId;

pub const OBLIGATIONS_FILE: &str = "obligations.csv";
pub const DEBTS_FILE: &str = "debts.csv";
pub const BUDGETS_FILE: &str = "budgets.csv";
pub const PLANS_FILE: &str = "plans.csv";
pub const ACCOUNTS_FILE: &str = "accounts.csv";

/// Cash position and income estimate for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    #[serde(rename = "UserID")]
    pub user_id: UserId,
    #[serde(rename = "Balance")]
    pub balance: f64,
    #[serde(rename = "IncomeEstimate", default)]
    pub income_estimate: f64,
}

#[derive(Debug, Deserialize)]
struct ObligationRow {
    #[serde(rename = "UserID")]
    user_id: UserId,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Frequency")]
    frequency: String,
    #[serde(rename = "DueDate")]
    due_date: NaiveDate,
    #[serde(rename = "NextDue", default)]
    next_due: Option<NaiveDate>,
    #[serde(rename = "Autopay", default)]
    autopay: bool,
    #[serde(rename = "Active", default = "default_true")]
    active: bool,
}

impl ObligationRow {
    fn into_obligation(self) -> Result<RecurringObligation> {
        let frequency: Frequency = self.frequency.parse()?;
        let obligation = RecurringObligation {
            user_id: self.user_id,
            name: self.name,
            amount: self.amount,
            category: self.category,
            frequency,
            due_date: self.due_date,
            next_due: self.next_due.unwrap_or(self.due_date),
            autopay: self.autopay,
            active: self.active,
        };
        obligation.validate()?;
        Ok(obligation)
    }
}

#[derive(Debug, Deserialize)]
struct DebtRow {
    #[serde(rename = "UserID")]
    user_id: UserId,
    #[serde(rename = "Creditor")]
    creditor: String,
    #[serde(rename = "Balance")]
    balance: f64,
    #[serde(rename = "InterestRate")]
    interest_rate: f64,
    #[serde(rename = "MinimumPayment")]
    minimum_payment: f64,
    #[serde(rename = "CurrentPayment", default)]
    current_payment: Option<f64>,
}

impl DebtRow {
    fn into_debt(self) -> Result<DebtAccount> {
        let debt = DebtAccount {
            user_id: self.user_id,
            creditor: self.creditor,
            balance: self.balance,
            interest_rate: self.interest_rate,
            minimum_payment: self.minimum_payment,
            current_payment: self.current_payment.unwrap_or(self.minimum_payment),
        };
        debt.validate()?;
        Ok(debt)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BudgetRow {
    #[serde(rename = "UserID")]
    user_id: UserId,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Month")]
    month: String,
    #[serde(rename = "Allocated")]
    allocated: f64,
    #[serde(rename = "Spent", default)]
    spent: f64,
    #[serde(rename = "Rollover", default)]
    rollover: f64,
    #[serde(rename = "AutoAdjust", default = "default_true")]
    auto_adjust: bool,
    #[serde(rename = "Status", default)]
    status: BudgetStatus,
}

impl BudgetRow {
    fn into_state(self) -> Result<BudgetCategoryState> {
        let month: CalendarMonth = self.month.parse()?;
        let state = BudgetCategoryState {
            user_id: self.user_id,
            category: self.category,
            month,
            allocated: self.allocated,
            spent: self.spent,
            rollover_amount: self.rollover,
            auto_adjust: self.auto_adjust,
            status: self.status,
        };
        state.validate()?;
        Ok(state)
    }

    fn from_state(state: &BudgetCategoryState) -> Self {
        Self {
            user_id: state.user_id,
            category: state.category.clone(),
            month: state.month.to_string(),
            allocated: state.allocated,
            spent: state.spent,
            rollover: state.rollover_amount,
            auto_adjust: state.auto_adjust,
            status: state.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlanRow {
    #[serde(rename = "UserID")]
    user_id: UserId,
    #[serde(rename = "CurrentAge")]
    current_age: u32,
    #[serde(rename = "RetirementAge")]
    retirement_age: u32,
    #[serde(rename = "CurrentSavings")]
    current_savings: f64,
    #[serde(rename = "MonthlyContribution")]
    monthly_contribution: f64,
    #[serde(rename = "ExpectedReturn")]
    expected_return: f64,
    #[serde(rename = "InflationRate")]
    inflation_rate: f64,
    #[serde(rename = "CurrentIncome")]
    current_income: f64,
}

impl PlanRow {
    fn into_plan(self) -> Result<RetirementPlanState> {
        let plan = RetirementPlanState {
            user_id: self.user_id,
            current_age: self.current_age,
            retirement_age: self.retirement_age,
            current_savings: self.current_savings,
            monthly_contribution: self.monthly_contribution,
            expected_return: self.expected_return,
            inflation_rate: self.inflation_rate,
            current_income: self.current_income,
        };
        plan.validate()?;
        Ok(plan)
    }
}

fn default_true() -> bool {
    true
}

fn csv_error(err: csv::Error) -> EngineError {
    EngineError::repository(err)
}

/// Deserialize every row of a CSV stream and convert it
fn read_rows<R, Row, T>(reader: R, convert: impl Fn(Row) -> Result<T>) -> Result<Vec<T>>
where
    R: Read,
    Row: for<'de> Deserialize<'de>,
{
    let mut csv_reader = Reader::from_reader(reader);
    let mut items = Vec::new();

    for result in csv_reader.deserialize() {
        let row: Row = result.map_err(csv_error)?;
        items.push(convert(row)?);
    }

    Ok(items)
}

fn open<P: AsRef<Path>>(path: P) -> Result<std::fs::File> {
    Ok(std::fs::File::open(path)?)
}

pub fn load_obligations<P: AsRef<Path>>(path: P) -> Result<Vec<RecurringObligation>> {
    load_obligations_from_reader(open(path)?)
}

pub fn load_obligations_from_reader<R: Read>(reader: R) -> Result<Vec<RecurringObligation>> {
    read_rows(reader, ObligationRow::into_obligation)
}

pub fn load_debts<P: AsRef<Path>>(path: P) -> Result<Vec<DebtAccount>> {
    load_debts_from_reader(open(path)?)
}

pub fn load_debts_from_reader<R: Read>(reader: R) -> Result<Vec<DebtAccount>> {
    read_rows(reader, DebtRow::into_debt)
}

pub fn load_budgets<P: AsRef<Path>>(path: P) -> Result<Vec<BudgetCategoryState>> {
    load_budgets_from_reader(open(path)?)
}

pub fn load_budgets_from_reader<R: Read>(reader: R) -> Result<Vec<BudgetCategoryState>> {
    read_rows(reader, BudgetRow::into_state)
}

pub fn load_plans<P: AsRef<Path>>(path: P) -> Result<Vec<RetirementPlanState>> {
    load_plans_from_reader(open(path)?)
}

pub fn load_plans_from_reader<R: Read>(reader: R) -> Result<Vec<RetirementPlanState>> {
    read_rows(reader, PlanRow::into_plan)
}

pub fn load_accounts<P: AsRef<Path>>(path: P) -> Result<Vec<AccountSnapshot>> {
    load_accounts_from_reader(open(path)?)
}

pub fn load_accounts_from_reader<R: Read>(reader: R) -> Result<Vec<AccountSnapshot>> {
    read_rows(reader, |row: AccountSnapshot| Ok(row))
}

/// Write budget records in the same layout [`load_budgets`] reads
pub fn write_budgets<W: Write>(writer: W, states: &[BudgetCategoryState]) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    for state in states {
        csv_writer.serialize(BudgetRow::from_state(state)).map_err(csv_error)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debt::DebtStrategy;
    use crate::error::ErrorKind;

    #[test]
    fn test_load_obligations() {
        let data = "\
UserID,Name,Amount,Category,Frequency,DueDate,NextDue,Autopay,Active
1,Rent,1450.00,housing,monthly,2026-01-01,,true,true
1,Streaming,15.99,entertainment,Monthly,2026-03-12,2026-10-12,false,false
2,Car insurance,620.00,insurance,yearly,2026-04-30,,false,true
";
        let obligations = load_obligations_from_reader(data.as_bytes()).unwrap();
        assert_eq!(obligations.len(), 3);
        assert_eq!(obligations[0].next_due, obligations[0].due_date);
        assert!(obligations[0].autopay);
        assert_eq!(obligations[1].next_due, NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());
        assert!(!obligations[1].active);
        assert_eq!(obligations[2].frequency, Frequency::Yearly);
    }

    #[test]
    fn test_malformed_frequency_is_validation_error() {
        let data = "\
UserID,Name,Amount,Category,Frequency,DueDate,NextDue,Autopay,Active
1,Gym,40,health,fortnightly,2026-01-01,,false,true
";
        let err = load_obligations_from_reader(data.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_load_debts_defaults_current_payment() {
        let data = "\
UserID,Creditor,Balance,InterestRate,MinimumPayment,CurrentPayment
3,Visa,2400,21.9,60,
3,Student loan,18000,4.2,190,250
";
        let debts = load_debts_from_reader(data.as_bytes()).unwrap();
        assert_eq!(debts[0].current_payment, 60.0);
        assert_eq!(debts[1].current_payment, 250.0);
        assert_eq!(DebtStrategy::Avalanche.priority_order(&debts), vec![0, 1]);
    }

    #[test]
    fn test_budgets_round_trip_through_writer() {
        let data = "\
UserID,Category,Month,Allocated,Spent,Rollover,AutoAdjust,Status
5,Dining,2026-10,300,120.5,15,true,active
5,Rent,2026-10,1500,1500,0,false,rolled
";
        let budgets = load_budgets_from_reader(data.as_bytes()).unwrap();
        assert_eq!(budgets[0].month, CalendarMonth::new(2026, 10).unwrap());
        assert_eq!(budgets[1].status, BudgetStatus::Rolled);

        let mut out = Vec::new();
        write_budgets(&mut out, &budgets).unwrap();
        let reloaded = load_budgets_from_reader(out.as_slice()).unwrap();
        assert_eq!(reloaded, budgets);
    }

    #[test]
    fn test_load_plans_validates() {
        let data = "\
UserID,CurrentAge,RetirementAge,CurrentSavings,MonthlyContribution,ExpectedReturn,InflationRate,CurrentIncome
1,45,40,1000,100,6,2,4000
";
        let err = load_plans_from_reader(data.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
