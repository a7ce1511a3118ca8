//! The expense aggregate and its value objects.

use chrono::{DateTime, NaiveDate, Utc};
use claimflow_shared::types::{ApprovalRuleId, CompanyId, CurrencyCode, ExpenseId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rules::ExpenseSnapshot;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{ApprovalStep, ExpenseStatus};

/// A claim amount with its company-currency normalization.
///
/// The normalized value is computed when the value object is created and
/// never recomputed afterwards. `None` records that normalization failed
/// or was unavailable; it is a low-confidence marker, not a zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseAmount {
    /// Amount as submitted by the employee.
    pub original: Decimal,
    /// Currency the employee paid in.
    pub currency: CurrencyCode,
    /// Amount in the company's default currency, when normalization succeeded.
    pub company_currency_value: Option<Decimal>,
}

impl ExpenseAmount {
    /// Creates an amount value object with its normalization result.
    #[must_use]
    pub const fn new(
        original: Decimal,
        currency: CurrencyCode,
        company_currency_value: Option<Decimal>,
    ) -> Self {
        Self {
            original,
            currency,
            company_currency_value,
        }
    }

    /// The amount used for rule evaluation: normalized when available,
    /// otherwise the original.
    #[must_use]
    pub fn effective(&self) -> Decimal {
        self.company_currency_value.unwrap_or(self.original)
    }
}

/// Data extracted from a scanned receipt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrData {
    /// Vendor name.
    pub vendor: Option<String>,
    /// Receipt total.
    pub total: Option<Decimal>,
    /// Receipt date as printed.
    pub date: Option<String>,
    /// Full extracted text.
    pub raw_text: Option<String>,
}

/// A receipt attached to a claim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Receipt {
    /// Where the receipt image is stored.
    pub url: Option<String>,
    /// OCR extraction, when available.
    pub ocr: Option<OcrData>,
}

/// The expense aggregate root.
///
/// The serde shape of `approval_workflow` and `current_approver_index` is
/// the durable contract with storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier.
    pub id: ExpenseId,
    /// The employee who filed the claim.
    pub employee_id: UserId,
    /// Tenant scope.
    pub company_id: CompanyId,
    /// What the claim is for.
    pub description: Option<String>,
    /// Claim category.
    pub category: Option<String>,
    /// When the expense was incurred.
    pub expense_date: NaiveDate,
    /// When the claim entered the approval pipeline.
    pub submitted_at: Option<DateTime<Utc>>,
    /// The claim amount with its normalization.
    pub amount: ExpenseAmount,
    /// Lifecycle status.
    pub status: ExpenseStatus,
    /// The approval chain; empty while the claim is a draft.
    pub approval_workflow: Vec<ApprovalStep>,
    /// Index of the active step; `len` once the chain is exhausted.
    pub current_approver_index: usize,
    /// The rule that produced the chain, kept for audit.
    pub approval_rule_id: Option<ApprovalRuleId>,
    /// Attached receipt.
    pub receipt: Option<Receipt>,
}

impl Expense {
    /// Creates a draft expense.
    ///
    /// Drafts carry no approval chain; the chain is built and installed
    /// when the claim is submitted.
    #[must_use]
    pub fn draft(
        employee_id: UserId,
        company_id: CompanyId,
        description: Option<String>,
        category: Option<String>,
        expense_date: NaiveDate,
        amount: ExpenseAmount,
        receipt: Option<Receipt>,
    ) -> Self {
        Self {
            id: ExpenseId::new(),
            employee_id,
            company_id,
            description,
            category,
            expense_date,
            submitted_at: None,
            amount,
            status: ExpenseStatus::Draft,
            approval_workflow: Vec::new(),
            current_approver_index: 0,
            approval_rule_id: None,
            receipt,
        }
    }

    /// The step the chain pointer currently rests on, if in bounds.
    #[must_use]
    pub fn active_step(&self) -> Option<&ApprovalStep> {
        self.approval_workflow.get(self.current_approver_index)
    }

    /// True once the pointer has moved past the last step.
    #[must_use]
    pub fn chain_exhausted(&self) -> bool {
        self.current_approver_index >= self.approval_workflow.len()
    }

    /// True if `user_id` holds the active step and it is still pending.
    #[must_use]
    pub fn awaits_decision_from(&self, user_id: UserId) -> bool {
        self.active_step()
            .is_some_and(|step| step.approver_id == user_id && step.is_pending())
    }

    /// Moves the chain pointer, guarding the `[0, len]` bound.
    ///
    /// An index past `len` has no meaning in any lifecycle state, so a
    /// caller supplying one has hit a bug; the aggregate refuses the
    /// mutation rather than persisting a corrupt pointer.
    pub fn set_current_approver_index(&mut self, index: usize) -> Result<(), WorkflowError> {
        if index > self.approval_workflow.len() {
            return Err(WorkflowError::Invariant(format!(
                "approver index {index} outside chain of length {}",
                self.approval_workflow.len()
            )));
        }
        self.current_approver_index = index;
        Ok(())
    }

    /// Fails with `InvalidState` unless the claim is still a draft.
    pub fn ensure_draft(&self) -> Result<(), WorkflowError> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(WorkflowError::InvalidState(format!(
                "expense is {}, only drafts can be modified",
                self.status
            )))
        }
    }

    /// The slice of this expense a rule is evaluated against.
    #[must_use]
    pub fn snapshot(&self) -> ExpenseSnapshot {
        ExpenseSnapshot {
            amount: self.amount.effective(),
            currency: self.amount.currency.clone(),
            category: self.category.clone(),
            receipt_total: self.receipt.as_ref().and_then(|r| r.ocr.as_ref()).and_then(|o| o.total),
        }
    }
}

/// Validates that a freshly built chain is well-formed: every step
/// pending, sequences non-decreasing from 1. Equal adjacent sequences
/// form an any-of group, which the data model admits even though the
/// builder currently emits strictly increasing ones.
pub fn validate_chain(steps: &[ApprovalStep]) -> Result<(), WorkflowError> {
    let mut last = 1u32;
    for (position, step) in steps.iter().enumerate() {
        if !step.is_pending() {
            return Err(WorkflowError::Invariant(format!(
                "chain step {} is {} before any decision",
                step.sequence, step.status
            )));
        }
        if step.sequence < last || (position == 0 && step.sequence != 1) {
            return Err(WorkflowError::Invariant(format!(
                "chain sequence {} out of order",
                step.sequence
            )));
        }
        last = step.sequence;
    }
    Ok(())
}
