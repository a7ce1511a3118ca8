//! Workflow domain types for the expense approval lifecycle.
//!
//! An expense moves through these states:
//! - Draft → Pending (submit)
//! - Pending|Processing → Processing (mid-chain approval)
//! - Pending|Processing → Approved (final step approved, or empty chain)
//! - Pending|Processing → Rejected (any step rejected; chain-terminal)
//!
//! `Approved` and `Rejected` are terminal for ordinary actions; only an
//! administrative override can change them afterwards.

use chrono::{DateTime, Utc};
use claimflow_shared::types::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expense status in the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseStatus {
    /// Being drafted; the owner may still modify it.
    Draft,
    /// Submitted, waiting on the first approver.
    Pending,
    /// Partway through a multi-step chain.
    Processing,
    /// Every step approved (terminal for ordinary actions).
    Approved,
    /// Some step rejected (terminal for ordinary actions).
    Rejected,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the owner may still modify or delete the expense.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if an active step may still be acted on.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Returns true if the chain has resolved.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Waiting for the step's approver.
    Pending,
    /// Approved by the step's approver.
    Approved,
    /// Rejected by the step's approver.
    Rejected,
}

impl StepStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An approver's decision on the active step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Approve the active step.
    Approve,
    /// Reject the active step, terminating the chain.
    Reject,
}

/// Target status of an administrative override.
///
/// Overrides may not set `Draft` or `Processing`; those statuses only
/// arise from the ordinary lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverrideStatus {
    /// Force the expense to approved.
    Approved,
    /// Force the expense to rejected.
    Rejected,
    /// Reopen the expense for in-chain action.
    Pending,
}

impl OverrideStatus {
    /// The expense status this override installs.
    #[must_use]
    pub const fn as_expense_status(self) -> ExpenseStatus {
        match self {
            Self::Approved => ExpenseStatus::Approved,
            Self::Rejected => ExpenseStatus::Rejected,
            Self::Pending => ExpenseStatus::Pending,
        }
    }

    /// The status recorded on the appended synthetic step.
    #[must_use]
    pub const fn as_step_status(self) -> StepStatus {
        match self {
            Self::Approved => StepStatus::Approved,
            Self::Rejected => StepStatus::Rejected,
            Self::Pending => StepStatus::Pending,
        }
    }
}

/// One element of an expense's approval chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// The only user entitled to act on this step.
    pub approver_id: UserId,
    /// 1-based position in the chain; strictly increasing.
    pub sequence: u32,
    /// Step status; transitions away from Pending exactly once.
    pub status: StepStatus,
    /// Approver's comments, stamped when acted on.
    pub comments: Option<String>,
    /// When the step was acted on.
    pub acted_at: Option<DateTime<Utc>>,
}

impl ApprovalStep {
    /// Creates a pending step.
    #[must_use]
    pub const fn pending(approver_id: UserId, sequence: u32) -> Self {
        Self {
            approver_id,
            sequence,
            status: StepStatus::Pending,
            comments: None,
            acted_at: None,
        }
    }

    /// Returns true if the step is still awaiting its approver.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == StepStatus::Pending
    }
}
