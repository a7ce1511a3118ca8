//! Expense orchestration.
//!
//! Every mutating operation follows the same shape: load the aggregate,
//! run the pure state machine on it, then persist through a guarded write
//! that re-checks what was observed at read time. A guard that no longer
//! holds surfaces as `InvalidState` to the losing caller, so two actors
//! racing on one step resolve to exactly one success.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use claimflow_shared::types::{ExpenseId, Money, PageRequest, PageResponse, UserId};
use tracing::{info, warn};

use crate::currency::{normalize, CurrencyConverter};
use crate::directory::Actor;
use crate::expense::types::{Expense, ExpenseAmount, Receipt};
use crate::store::{CompanyStore, ExpenseStore, RuleStore, UserStore, WriteGuard};
use crate::workflow::chain::ChainBuilder;
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{Decision, ExpenseStatus, OverrideStatus};

/// Input for creating an expense claim.
#[derive(Debug, Clone)]
pub struct NewExpense {
    /// What the claim is for.
    pub description: Option<String>,
    /// Claim category.
    pub category: Option<String>,
    /// When the expense was incurred.
    pub expense_date: NaiveDate,
    /// Amount in the currency the employee paid in.
    pub amount: Money,
    /// Attached receipt.
    pub receipt: Option<Receipt>,
    /// Keep the claim as a draft instead of submitting immediately.
    pub draft: bool,
}

/// Fields an owner may change while a claim is still a draft.
#[derive(Debug, Clone, Default)]
pub struct DraftUpdate {
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New expense date.
    pub expense_date: Option<NaiveDate>,
    /// Replacement amount; triggers fresh normalization.
    pub amount: Option<Money>,
    /// Replacement receipt.
    pub receipt: Option<Receipt>,
}

/// Filter for the administrative expense listing.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Restrict to a status.
    pub status: Option<ExpenseStatus>,
    /// Restrict to one employee's claims.
    pub employee_id: Option<UserId>,
    /// Earliest expense date (inclusive).
    pub from_date: Option<NaiveDate>,
    /// Latest expense date (inclusive).
    pub to_date: Option<NaiveDate>,
    /// Page selection.
    pub page: Option<PageRequest>,
}

/// The expense approval service.
///
/// Owns all writes to the expense aggregate; reads (the listing views)
/// run unguarded against a snapshot and tolerate in-flight writes.
pub struct ExpenseService {
    expenses: Arc<dyn ExpenseStore>,
    users: Arc<dyn UserStore>,
    companies: Arc<dyn CompanyStore>,
    rules: Arc<dyn RuleStore>,
    converter: Arc<dyn CurrencyConverter>,
    conversion_budget: Duration,
}

impl ExpenseService {
    /// Creates the service over its collaborator ports.
    #[must_use]
    pub fn new(
        expenses: Arc<dyn ExpenseStore>,
        users: Arc<dyn UserStore>,
        companies: Arc<dyn CompanyStore>,
        rules: Arc<dyn RuleStore>,
        converter: Arc<dyn CurrencyConverter>,
        conversion_budget: Duration,
    ) -> Self {
        Self {
            expenses,
            users,
            companies,
            rules,
            converter,
            conversion_budget,
        }
    }

    /// Creates an expense claim, normalizing its amount best-effort and
    /// submitting it into the approval chain unless `draft` is set.
    pub async fn create_expense(
        &self,
        actor: Actor,
        input: NewExpense,
    ) -> Result<Expense, WorkflowError> {
        if !input.amount.is_positive() {
            return Err(WorkflowError::Validation(
                "amount must be positive".to_string(),
            ));
        }

        let employee = self
            .users
            .find(actor.user_id, actor.company_id)
            .await?
            .ok_or(WorkflowError::EmployeeNotFound(actor.user_id))?;

        // The company record should always exist; claims filed in the
        // company currency still normalize when it does not.
        let company_currency = match self.companies.find(actor.company_id).await? {
            Some(company) => company.default_currency,
            None => input.amount.currency.clone(),
        };

        let normalized = normalize(
            self.converter.as_ref(),
            input.amount.amount,
            &input.amount.currency,
            &company_currency,
            self.conversion_budget,
        )
        .await;
        if normalized.is_none() {
            warn!(
                currency = %input.amount.currency,
                company_currency = %company_currency,
                "claim stored without a normalized amount"
            );
        }

        let mut expense = Expense::draft(
            employee.id,
            actor.company_id,
            input.description,
            input.category,
            input.expense_date,
            ExpenseAmount::new(input.amount.amount, input.amount.currency, normalized),
            input.receipt,
        );

        if !input.draft {
            let rules = self.rules.list(actor.company_id).await?;
            let chain = ChainBuilder::build(&employee, &rules, &expense.snapshot());
            WorkflowService::submit(&mut expense, chain.steps, chain.rule_id)?;
        }

        self.expenses.insert(expense.clone()).await?;
        info!(
            expense_id = %expense.id,
            status = %expense.status,
            steps = expense.approval_workflow.len(),
            "expense created"
        );
        Ok(expense)
    }

    /// Submits a draft into its approval chain.
    ///
    /// The chain is built from the rule set and employee record as they
    /// stand now; an empty chain auto-resolves the claim to `Approved`.
    pub async fn submit_expense(
        &self,
        actor: Actor,
        expense_id: ExpenseId,
    ) -> Result<Expense, WorkflowError> {
        let mut expense = self.find_owned(actor, expense_id).await?;

        let employee = self
            .users
            .find(actor.user_id, actor.company_id)
            .await?
            .ok_or(WorkflowError::EmployeeNotFound(actor.user_id))?;
        let rules = self.rules.list(actor.company_id).await?;
        let chain = ChainBuilder::build(&employee, &rules, &expense.snapshot());

        WorkflowService::submit(&mut expense, chain.steps, chain.rule_id)?;

        self.expenses
            .update_with_guard(&expense, WriteGuard::Status(ExpenseStatus::Draft))
            .await?;
        info!(expense_id = %expense.id, status = %expense.status, "expense submitted");
        Ok(expense)
    }

    /// Applies an approver's decision to an expense's active step.
    pub async fn submit_decision(
        &self,
        actor: Actor,
        expense_id: ExpenseId,
        decision: Decision,
        comments: Option<String>,
    ) -> Result<Expense, WorkflowError> {
        let mut expense = self
            .expenses
            .find(expense_id, actor.company_id)
            .await?
            .ok_or(WorkflowError::ExpenseNotFound(expense_id))?;

        let observed_index = expense.current_approver_index;
        WorkflowService::advance(&mut expense, actor.user_id, decision, comments)?;

        // The guard re-checks the step observed above; a racing decision
        // on the same step leaves exactly one winner.
        self.expenses
            .update_with_guard(
                &expense,
                WriteGuard::ActiveStep {
                    index: observed_index,
                },
            )
            .await?;
        info!(
            expense_id = %expense.id,
            actor = %actor.user_id,
            decision = ?decision,
            status = %expense.status,
            "decision recorded"
        );
        Ok(expense)
    }

    /// Applies an administrative override, bypassing chain validation.
    pub async fn override_decision(
        &self,
        actor: Actor,
        expense_id: ExpenseId,
        status: OverrideStatus,
        comments: Option<String>,
    ) -> Result<Expense, WorkflowError> {
        if !actor.is_admin() {
            return Err(WorkflowError::InsufficientRole { role: actor.role });
        }

        let mut expense = self
            .expenses
            .find(expense_id, actor.company_id)
            .await?
            .ok_or(WorkflowError::ExpenseNotFound(expense_id))?;

        let observed = WriteGuard::Observed {
            len: expense.approval_workflow.len(),
            index: expense.current_approver_index,
            status: expense.status,
        };
        WorkflowService::override_status(&mut expense, actor.user_id, status, comments)?;

        self.expenses.update_with_guard(&expense, observed).await?;
        info!(
            expense_id = %expense.id,
            admin = %actor.user_id,
            status = %expense.status,
            "expense overridden"
        );
        Ok(expense)
    }

    /// Claims whose active step awaits the actor's decision.
    pub async fn list_pending_for(&self, actor: Actor) -> Result<Vec<Expense>, WorkflowError> {
        let mut pending: Vec<Expense> = self
            .expenses
            .list(actor.company_id)
            .await?
            .into_iter()
            .filter(|expense| expense.awaits_decision_from(actor.user_id))
            .collect();
        sort_newest_first(&mut pending);
        Ok(pending)
    }

    /// Claims filed by the actor's direct reports, regardless of chain
    /// position.
    pub async fn list_team_expenses(&self, actor: Actor) -> Result<Vec<Expense>, WorkflowError> {
        let reports = self
            .users
            .list_reports(actor.user_id, actor.company_id)
            .await?;
        let team: std::collections::HashSet<UserId> =
            reports.into_iter().map(|user| user.id).collect();

        let mut expenses: Vec<Expense> = self
            .expenses
            .list(actor.company_id)
            .await?
            .into_iter()
            .filter(|expense| team.contains(&expense.employee_id))
            .collect();
        sort_newest_first(&mut expenses);
        Ok(expenses)
    }

    /// The actor's own claims, newest first.
    pub async fn list_own_expenses(&self, actor: Actor) -> Result<Vec<Expense>, WorkflowError> {
        let mut own: Vec<Expense> = self
            .expenses
            .list(actor.company_id)
            .await?
            .into_iter()
            .filter(|expense| expense.employee_id == actor.user_id)
            .collect();
        sort_newest_first(&mut own);
        Ok(own)
    }

    /// Administrative company-wide listing with filters and pagination.
    pub async fn list_expenses(
        &self,
        actor: Actor,
        filter: ExpenseFilter,
    ) -> Result<PageResponse<Expense>, WorkflowError> {
        if !actor.is_admin() {
            return Err(WorkflowError::InsufficientRole { role: actor.role });
        }

        let mut matching: Vec<Expense> = self
            .expenses
            .list(actor.company_id)
            .await?
            .into_iter()
            .filter(|expense| {
                filter.status.is_none_or(|status| expense.status == status)
                    && filter
                        .employee_id
                        .is_none_or(|employee| expense.employee_id == employee)
                    && filter.from_date.is_none_or(|from| expense.expense_date >= from)
                    && filter.to_date.is_none_or(|to| expense.expense_date <= to)
            })
            .collect();
        sort_newest_first(&mut matching);

        let page = filter.page.unwrap_or_default();
        let total = matching.len() as u64;
        let data: Vec<Expense> = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Fetches one of the actor's own claims.
    pub async fn get_expense(
        &self,
        actor: Actor,
        expense_id: ExpenseId,
    ) -> Result<Expense, WorkflowError> {
        self.find_owned(actor, expense_id).await
    }

    /// Updates a draft's fields. A replacement amount is normalized
    /// afresh; submitted claims can no longer change.
    pub async fn update_draft(
        &self,
        actor: Actor,
        expense_id: ExpenseId,
        update: DraftUpdate,
    ) -> Result<Expense, WorkflowError> {
        let mut expense = self.find_owned(actor, expense_id).await?;
        expense.ensure_draft()?;

        if let Some(description) = update.description {
            expense.description = Some(description);
        }
        if let Some(category) = update.category {
            expense.category = Some(category);
        }
        if let Some(expense_date) = update.expense_date {
            expense.expense_date = expense_date;
        }
        if let Some(receipt) = update.receipt {
            expense.receipt = Some(receipt);
        }
        if let Some(amount) = update.amount {
            if !amount.is_positive() {
                return Err(WorkflowError::Validation(
                    "amount must be positive".to_string(),
                ));
            }
            let company_currency = match self.companies.find(actor.company_id).await? {
                Some(company) => company.default_currency,
                None => amount.currency.clone(),
            };
            let normalized = normalize(
                self.converter.as_ref(),
                amount.amount,
                &amount.currency,
                &company_currency,
                self.conversion_budget,
            )
            .await;
            expense.amount = ExpenseAmount::new(amount.amount, amount.currency, normalized);
        }

        self.expenses
            .update_with_guard(&expense, WriteGuard::Status(ExpenseStatus::Draft))
            .await?;
        Ok(expense)
    }

    /// Deletes a draft. Submitted claims are part of the audit trail and
    /// cannot be destroyed.
    pub async fn delete_draft(
        &self,
        actor: Actor,
        expense_id: ExpenseId,
    ) -> Result<(), WorkflowError> {
        let expense = self.find_owned(actor, expense_id).await?;
        expense.ensure_draft()?;

        self.expenses
            .delete(expense_id, actor.company_id)
            .await?;
        info!(expense_id = %expense_id, "draft deleted");
        Ok(())
    }

    /// Loads an expense the actor owns; anything else reads as absent.
    async fn find_owned(
        &self,
        actor: Actor,
        expense_id: ExpenseId,
    ) -> Result<Expense, WorkflowError> {
        self.expenses
            .find(expense_id, actor.company_id)
            .await?
            .filter(|expense| expense.employee_id == actor.user_id)
            .ok_or(WorkflowError::ExpenseNotFound(expense_id))
    }
}

fn sort_newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
}
