//! Persistence ports.
//!
//! Storage technology is an external collaborator; the engine talks to it
//! through these traits. The only non-trivial contract is
//! [`ExpenseStore::update_with_guard`]: the write must atomically re-check
//! the supplied [`WriteGuard`] against the stored aggregate and refuse the
//! replacement with [`AppError::Conflict`] when it no longer holds. That
//! check is what makes two actors racing on the same approval step resolve
//! to exactly one winner.

pub mod memory;

use async_trait::async_trait;
use claimflow_shared::error::AppResult;
use claimflow_shared::types::{ApprovalRuleId, CompanyId, ExpenseId, UserId};

use crate::directory::{Company, User};
use crate::expense::types::Expense;
use crate::rules::ApprovalRule;
use crate::workflow::types::ExpenseStatus;

pub use memory::MemoryStore;

/// Condition a guarded write re-checks against the stored aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteGuard {
    /// The stored chain pointer must still rest on this index and the
    /// step there must still be pending. Used by `advance`.
    ActiveStep {
        /// The index observed at read time.
        index: usize,
    },
    /// The stored aggregate must look exactly as observed at read time:
    /// same chain length, same pointer, same status. Used by overrides,
    /// which must not interleave with any other mutation.
    Observed {
        /// Chain length observed at read time.
        len: usize,
        /// Chain pointer observed at read time.
        index: usize,
        /// Status observed at read time.
        status: ExpenseStatus,
    },
    /// The stored aggregate must still be in this status. Used by draft
    /// mutation and submission.
    Status(ExpenseStatus),
}

impl WriteGuard {
    /// Whether the guard holds against the stored aggregate.
    #[must_use]
    pub fn holds(&self, stored: &Expense) -> bool {
        match *self {
            Self::ActiveStep { index } => {
                stored.current_approver_index == index
                    && stored
                        .approval_workflow
                        .get(index)
                        .is_some_and(|step| step.is_pending())
            }
            Self::Observed { len, index, status } => {
                stored.approval_workflow.len() == len
                    && stored.current_approver_index == index
                    && stored.status == status
            }
            Self::Status(status) => stored.status == status,
        }
    }
}

/// Expense persistence port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Stores a new expense.
    async fn insert(&self, expense: Expense) -> AppResult<()>;

    /// Finds an expense within the company scope.
    async fn find(&self, id: ExpenseId, company_id: CompanyId) -> AppResult<Option<Expense>>;

    /// Lists all expenses within the company scope.
    async fn list(&self, company_id: CompanyId) -> AppResult<Vec<Expense>>;

    /// Replaces the stored aggregate if `guard` still holds against it.
    ///
    /// Returns `AppError::Conflict` when the guard fails and
    /// `AppError::NotFound` when the aggregate is gone.
    async fn update_with_guard(&self, expense: &Expense, guard: WriteGuard) -> AppResult<()>;

    /// Deletes an expense within the company scope.
    async fn delete(&self, id: ExpenseId, company_id: CompanyId) -> AppResult<()>;
}

/// User directory port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Stores a user record.
    async fn insert(&self, user: User) -> AppResult<()>;

    /// Finds a user within the company scope.
    async fn find(&self, id: UserId, company_id: CompanyId) -> AppResult<Option<User>>;

    /// Lists the users reporting to a manager.
    async fn list_reports(&self, manager_id: UserId, company_id: CompanyId)
        -> AppResult<Vec<User>>;
}

/// Company directory port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Stores a company record.
    async fn insert(&self, company: Company) -> AppResult<()>;

    /// Finds a company.
    async fn find(&self, id: CompanyId) -> AppResult<Option<Company>>;
}

/// Approval rule persistence port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Stores a new rule.
    async fn insert(&self, rule: ApprovalRule) -> AppResult<()>;

    /// Finds a rule within the company scope.
    async fn find(
        &self,
        id: ApprovalRuleId,
        company_id: CompanyId,
    ) -> AppResult<Option<ApprovalRule>>;

    /// Lists a company's rules in creation order.
    async fn list(&self, company_id: CompanyId) -> AppResult<Vec<ApprovalRule>>;

    /// Replaces a stored rule.
    async fn update(&self, rule: &ApprovalRule) -> AppResult<()>;

    /// Deletes a rule within the company scope. Unconditional: expenses
    /// referencing the rule keep a dangling audit reference.
    async fn delete(&self, id: ApprovalRuleId, company_id: CompanyId) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::types::ExpenseAmount;
    use crate::workflow::types::ApprovalStep;
    use chrono::NaiveDate;
    use claimflow_shared::types::CurrencyCode;
    use rust_decimal_macros::dec;

    fn expense_with_chain() -> Expense {
        let mut expense = Expense::draft(
            UserId::new(),
            CompanyId::new(),
            None,
            None,
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            ExpenseAmount::new(dec!(10), CurrencyCode::parse("USD").unwrap(), None),
            None,
        );
        expense
            .approval_workflow
            .push(ApprovalStep::pending(UserId::new(), 1));
        expense.status = ExpenseStatus::Pending;
        expense
    }

    #[test]
    fn test_active_step_guard() {
        let expense = expense_with_chain();
        assert!(WriteGuard::ActiveStep { index: 0 }.holds(&expense));
        assert!(!WriteGuard::ActiveStep { index: 1 }.holds(&expense));

        let mut acted = expense.clone();
        acted.approval_workflow[0].status = crate::workflow::types::StepStatus::Approved;
        assert!(!WriteGuard::ActiveStep { index: 0 }.holds(&acted));
    }

    #[test]
    fn test_observed_guard_detects_any_mutation() {
        let expense = expense_with_chain();
        let guard = WriteGuard::Observed {
            len: 1,
            index: 0,
            status: ExpenseStatus::Pending,
        };
        assert!(guard.holds(&expense));

        let mut appended = expense.clone();
        appended
            .approval_workflow
            .push(ApprovalStep::pending(UserId::new(), 2));
        assert!(!guard.holds(&appended));

        let mut advanced = expense.clone();
        advanced.current_approver_index = 1;
        assert!(!guard.holds(&advanced));

        let mut rejected = expense;
        rejected.status = ExpenseStatus::Rejected;
        assert!(!guard.holds(&rejected));
    }

    #[test]
    fn test_status_guard() {
        let expense = expense_with_chain();
        assert!(WriteGuard::Status(ExpenseStatus::Pending).holds(&expense));
        assert!(!WriteGuard::Status(ExpenseStatus::Draft).holds(&expense));
    }
}
