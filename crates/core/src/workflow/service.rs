//! The expense workflow state machine.
//!
//! All transitions are pure mutations of an in-memory [`Expense`] value:
//! they validate, mutate, and return, leaving persistence (and the
//! concurrency guard around it) to the orchestrating service. A failed
//! transition returns before any field is touched, so callers can discard
//! or retry the aggregate freely.

use chrono::Utc;
use claimflow_shared::types::{ApprovalRuleId, UserId};

use crate::expense::types::{validate_chain, Expense};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{ApprovalStep, Decision, ExpenseStatus, OverrideStatus, StepStatus};

/// Stateless service executing expense workflow transitions.
pub struct WorkflowService;

impl WorkflowService {
    /// Submits a draft, installing its approval chain.
    ///
    /// An empty chain auto-resolves the expense to `Approved` on the
    /// spot; otherwise the first step becomes active and the expense is
    /// `Pending`.
    ///
    /// # Errors
    ///
    /// * `InvalidState` if the expense is not a draft
    /// * `Validation` if the amount is not positive
    /// * `Invariant` if the supplied chain is malformed
    pub fn submit(
        expense: &mut Expense,
        chain: Vec<ApprovalStep>,
        rule_id: Option<ApprovalRuleId>,
    ) -> Result<(), WorkflowError> {
        expense.ensure_draft()?;
        if expense.amount.original <= rust_decimal::Decimal::ZERO {
            return Err(WorkflowError::Validation(
                "amount must be positive".to_string(),
            ));
        }
        validate_chain(&chain)?;

        expense.approval_workflow = chain;
        expense.approval_rule_id = rule_id;
        expense.submitted_at = Some(Utc::now());
        expense.set_current_approver_index(0)?;
        expense.status = if expense.approval_workflow.is_empty() {
            ExpenseStatus::Approved
        } else {
            ExpenseStatus::Pending
        };
        Ok(())
    }

    /// Applies an approver's decision to the active step.
    ///
    /// On approval the pointer advances; past the last step the expense
    /// becomes `Approved`, otherwise `Processing`. Rejection is
    /// chain-terminal: the expense becomes `Rejected` immediately and the
    /// pointer does not move, so later steps are never activated.
    ///
    /// # Errors
    ///
    /// * `NoPendingStep` if the pointer is out of bounds (empty chain,
    ///   exhausted chain, or an unsubmitted draft)
    /// * `NotAuthorized` if the actor does not hold the active step
    /// * `InvalidState` if the active step was already acted on
    pub fn advance(
        expense: &mut Expense,
        actor_id: UserId,
        decision: Decision,
        comments: Option<String>,
    ) -> Result<(), WorkflowError> {
        let index = expense.current_approver_index;
        let step = expense
            .approval_workflow
            .get(index)
            .ok_or(WorkflowError::NoPendingStep)?;

        if step.approver_id != actor_id {
            return Err(WorkflowError::NotAuthorized { user_id: actor_id });
        }
        if !step.is_pending() {
            return Err(WorkflowError::InvalidState(format!(
                "step {} already {}",
                step.sequence, step.status
            )));
        }

        let now = Utc::now();
        {
            let step = &mut expense.approval_workflow[index];
            step.comments = comments;
            step.acted_at = Some(now);
            step.status = match decision {
                Decision::Approve => StepStatus::Approved,
                Decision::Reject => StepStatus::Rejected,
            };
        }

        match decision {
            Decision::Approve => {
                expense.set_current_approver_index(index + 1)?;
                expense.status = if expense.chain_exhausted() {
                    ExpenseStatus::Approved
                } else {
                    ExpenseStatus::Processing
                };
            }
            Decision::Reject => {
                expense.status = ExpenseStatus::Rejected;
            }
        }
        Ok(())
    }

    /// Applies an administrative override.
    ///
    /// Bypasses chain validation entirely: sets the expense status and
    /// appends a synthetic step recording who forced the outcome. The
    /// chain pointer is deliberately left where it was, so an override to
    /// `Pending` does not guarantee a subsequent in-chain `advance`
    /// targets a live step — callers must not assume overridden expenses
    /// resume cleanly.
    pub fn override_status(
        expense: &mut Expense,
        admin_id: UserId,
        new_status: OverrideStatus,
        comments: Option<String>,
    ) -> Result<(), WorkflowError> {
        let sequence = expense
            .approval_workflow
            .last()
            .map_or(0, |step| step.sequence)
            + 1;

        expense.approval_workflow.push(ApprovalStep {
            approver_id: admin_id,
            sequence,
            status: new_status.as_step_status(),
            comments,
            acted_at: Some(Utc::now()),
        });
        expense.status = new_status.as_expense_status();
        Ok(())
    }
}
