//! In-memory repository, used by the CLI after loading CSV data and by tests

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::loader::{self, AccountSnapshot};
use super::{
    AccountRepository, BudgetRepository, DebtRepository, IncomeEstimator, ObligationRepository,
    RetirementPlanRepository,
};
use crate::budget::BudgetCategoryState;
use crate::calendar::CalendarMonth;
use crate::cashflow::RecurringObligation;
use crate::debt::DebtAccount;
use crate::error::{EngineError, Result};
use crate::retirement::RetirementPlanState;
use crate::UserId;

#[derive(Debug, Default)]
struct Store {
    obligations: Vec<RecurringObligation>,
    debts: Vec<DebtAccount>,
    budgets: Vec<BudgetCategoryState>,
    plans: HashMap<UserId, RetirementPlanState>,
    accounts: HashMap<UserId, AccountSnapshot>,
}

/// Thread-safe in-memory store for every engine collection
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every CSV file present in `dir`; missing files leave their collection empty
    pub fn from_data_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let optional = |name: &str| {
            let path = dir.join(name);
            path.exists().then_some(path)
        };

        let mut repo = Self::new();
        if let Some(path) = optional(loader::OBLIGATIONS_FILE) {
            repo = repo.with_obligations(loader::load_obligations(path)?);
        }
        if let Some(path) = optional(loader::DEBTS_FILE) {
            repo = repo.with_debts(loader::load_debts(path)?);
        }
        if let Some(path) = optional(loader::BUDGETS_FILE) {
            repo = repo.with_budgets(loader::load_budgets(path)?);
        }
        if let Some(path) = optional(loader::PLANS_FILE) {
            repo = repo.with_plans(loader::load_plans(path)?);
        }
        if let Some(path) = optional(loader::ACCOUNTS_FILE) {
            repo = repo.with_accounts(loader::load_accounts(path)?);
        }
        Ok(repo)
    }

    pub fn with_obligations(self, obligations: Vec<RecurringObligation>) -> Self {
        self.update(|store| store.obligations.extend(obligations))
    }

    pub fn with_debts(self, debts: Vec<DebtAccount>) -> Self {
        self.update(|store| store.debts.extend(debts))
    }

    pub fn with_budgets(self, budgets: Vec<BudgetCategoryState>) -> Self {
        self.update(|store| store.budgets.extend(budgets))
    }

    pub fn with_plans(self, plans: Vec<RetirementPlanState>) -> Self {
        self.update(|store| {
            store.plans.extend(plans.into_iter().map(|p| (p.user_id, p)))
        })
    }

    pub fn with_accounts(self, accounts: Vec<AccountSnapshot>) -> Self {
        self.update(|store| {
            store.accounts.extend(accounts.into_iter().map(|a| (a.user_id, a)))
        })
    }

    /// Every user referenced by any collection, ascending
    pub fn user_ids(&self) -> Result<Vec<UserId>> {
        let store = self.read()?;
        let ids: BTreeSet<UserId> = store
            .obligations
            .iter()
            .map(|o| o.user_id)
            .chain(store.debts.iter().map(|d| d.user_id))
            .chain(store.budgets.iter().map(|b| b.user_id))
            .chain(store.plans.keys().copied())
            .chain(store.accounts.keys().copied())
            .collect();
        Ok(ids.into_iter().collect())
    }

    /// Snapshot of every budget record
    pub fn all_budgets(&self) -> Result<Vec<BudgetCategoryState>> {
        Ok(self.read()?.budgets.clone())
    }

    fn update(self, f: impl FnOnce(&mut Store)) -> Self {
        // Builder methods own `self`, so the lock cannot be held elsewhere
        let mut store = self.store.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut store);
        Self {
            store: RwLock::new(store),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Store>> {
        self.store
            .read()
            .map_err(|_| EngineError::repository("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Store>> {
        self.store
            .write()
            .map_err(|_| EngineError::repository("in-memory store lock poisoned"))
    }
}

impl ObligationRepository for InMemoryRepository {
    fn active_obligations(&self, user_id: UserId) -> Result<Vec<RecurringObligation>> {
        Ok(self
            .read()?
            .obligations
            .iter()
            .filter(|o| o.user_id == user_id && o.active)
            .cloned()
            .collect())
    }
}

impl DebtRepository for InMemoryRepository {
    fn debts(&self, user_id: UserId) -> Result<Vec<DebtAccount>> {
        Ok(self
            .read()?
            .debts
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }
}

impl BudgetRepository for InMemoryRepository {
    fn budgets_for_month(&self, user_id: UserId, month: CalendarMonth) -> Result<Vec<BudgetCategoryState>> {
        Ok(self
            .read()?
            .budgets
            .iter()
            .filter(|b| b.user_id == user_id && b.month == month)
            .cloned()
            .collect())
    }

    fn upsert_budgets(&self, states: &[BudgetCategoryState]) -> Result<()> {
        let mut store = self.write()?;
        for state in states {
            let existing = store.budgets.iter().position(|b| {
                b.user_id == state.user_id && b.category == state.category && b.month == state.month
            });
            match existing {
                Some(index) => store.budgets[index] = state.clone(),
                None => store.budgets.push(state.clone()),
            }
        }
        Ok(())
    }
}

impl RetirementPlanRepository for InMemoryRepository {
    fn retirement_plan(&self, user_id: UserId) -> Result<Option<RetirementPlanState>> {
        Ok(self.read()?.plans.get(&user_id).cloned())
    }
}

impl AccountRepository for InMemoryRepository {
    fn current_balance(&self, user_id: UserId) -> Result<f64> {
        Ok(self
            .read()?
            .accounts
            .get(&user_id)
            .map(|a| a.balance)
            .unwrap_or(0.0))
    }
}

impl IncomeEstimator for InMemoryRepository {
    fn monthly_income_estimate(&self, user_id: UserId) -> Result<f64> {
        Ok(self
            .read()?
            .accounts
            .get(&user_id)
            .map(|a| a.income_estimate)
            .unwrap_or(0.0))
    }
}
