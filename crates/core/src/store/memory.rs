//! In-memory reference store.
//!
//! Backs the integration tests and serves as the reference semantics for
//! real storage adapters. Guarded writes run inside the dashmap entry
//! lock, so the guard check and the replacement are atomic per expense.

use async_trait::async_trait;
use dashmap::DashMap;
use claimflow_shared::error::{AppError, AppResult};
use claimflow_shared::types::{ApprovalRuleId, CompanyId, ExpenseId, UserId};

use crate::directory::{Company, User};
use crate::expense::types::Expense;
use crate::rules::ApprovalRule;
use crate::store::{CompanyStore, ExpenseStore, RuleStore, UserStore, WriteGuard};

/// In-memory implementation of every persistence port.
#[derive(Debug, Default)]
pub struct MemoryStore {
    expenses: DashMap<ExpenseId, Expense>,
    users: DashMap<UserId, User>,
    companies: DashMap<CompanyId, Company>,
    rules: DashMap<ApprovalRuleId, ApprovalRule>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn insert(&self, expense: Expense) -> AppResult<()> {
        self.expenses.insert(expense.id, expense);
        Ok(())
    }

    async fn find(&self, id: ExpenseId, company_id: CompanyId) -> AppResult<Option<Expense>> {
        Ok(self
            .expenses
            .get(&id)
            .filter(|stored| stored.company_id == company_id)
            .map(|stored| stored.clone()))
    }

    async fn list(&self, company_id: CompanyId) -> AppResult<Vec<Expense>> {
        Ok(self
            .expenses
            .iter()
            .filter(|entry| entry.company_id == company_id)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn update_with_guard(&self, expense: &Expense, guard: WriteGuard) -> AppResult<()> {
        // The entry reference holds the shard lock for the whole
        // check-and-replace, which is the atomicity real adapters must
        // reproduce with a conditional UPDATE.
        let mut stored = self
            .expenses
            .get_mut(&expense.id)
            .ok_or_else(|| AppError::NotFound(format!("expense {}", expense.id)))?;

        if !guard.holds(&stored) {
            return Err(AppError::Conflict(
                "expense changed since it was read".to_string(),
            ));
        }

        *stored = expense.clone();
        Ok(())
    }

    async fn delete(&self, id: ExpenseId, company_id: CompanyId) -> AppResult<()> {
        let removed = self
            .expenses
            .remove_if(&id, |_, stored| stored.company_id == company_id);
        match removed {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("expense {id}"))),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: User) -> AppResult<()> {
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn find(&self, id: UserId, company_id: CompanyId) -> AppResult<Option<User>> {
        Ok(self
            .users
            .get(&id)
            .filter(|stored| stored.company_id == company_id)
            .map(|stored| stored.clone()))
    }

    async fn list_reports(
        &self,
        manager_id: UserId,
        company_id: CompanyId,
    ) -> AppResult<Vec<User>> {
        Ok(self
            .users
            .iter()
            .filter(|entry| {
                entry.company_id == company_id && entry.manager_id == Some(manager_id)
            })
            .map(|entry| entry.clone())
            .collect())
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn insert(&self, company: Company) -> AppResult<()> {
        self.companies.insert(company.id, company);
        Ok(())
    }

    async fn find(&self, id: CompanyId) -> AppResult<Option<Company>> {
        Ok(self.companies.get(&id).map(|stored| stored.clone()))
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn insert(&self, rule: ApprovalRule) -> AppResult<()> {
        self.rules.insert(rule.id, rule);
        Ok(())
    }

    async fn find(
        &self,
        id: ApprovalRuleId,
        company_id: CompanyId,
    ) -> AppResult<Option<ApprovalRule>> {
        Ok(self
            .rules
            .get(&id)
            .filter(|stored| stored.company_id == company_id)
            .map(|stored| stored.clone()))
    }

    async fn list(&self, company_id: CompanyId) -> AppResult<Vec<ApprovalRule>> {
        let mut rules: Vec<ApprovalRule> = self
            .rules
            .iter()
            .filter(|entry| entry.company_id == company_id)
            .map(|entry| entry.clone())
            .collect();
        rules.sort_by_key(|rule| rule.created_at);
        Ok(rules)
    }

    async fn update(&self, rule: &ApprovalRule) -> AppResult<()> {
        let mut stored = self
            .rules
            .get_mut(&rule.id)
            .ok_or_else(|| AppError::NotFound(format!("rule {}", rule.id)))?;
        *stored = rule.clone();
        Ok(())
    }

    async fn delete(&self, id: ApprovalRuleId, company_id: CompanyId) -> AppResult<()> {
        let removed = self
            .rules
            .remove_if(&id, |_, stored| stored.company_id == company_id);
        match removed {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("rule {id}"))),
        }
    }
}
