//! Workflow error types for the expense approval lifecycle.

use claimflow_shared::error::AppError;
use claimflow_shared::types::{ExpenseId, UserId};
use thiserror::Error;

use crate::directory::Role;

/// Errors that can occur during workflow operations.
///
/// Every operation either fully commits or has no observable effect; these
/// errors are value-returned, never paired with partial mutation.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Malformed input, e.g. a non-positive amount.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Expense absent or outside the caller's company scope.
    #[error("Expense {0} not found")]
    ExpenseNotFound(ExpenseId),

    /// Employee record absent or outside the caller's company scope.
    #[error("Employee {0} not found")]
    EmployeeNotFound(UserId),

    /// The chain is empty or the index is past its end.
    #[error("No pending approval step")]
    NoPendingStep,

    /// Actor is not the active step's approver.
    #[error("User {user_id} is not authorized to act on this expense")]
    NotAuthorized {
        /// The user who attempted the action.
        user_id: UserId,
    },

    /// The actor's role does not permit the operation.
    #[error("Role {role} does not permit this operation")]
    InsufficientRole {
        /// The actor's role.
        role: Role,
    },

    /// Action attempted against a step or expense not in an actionable
    /// state: double-action, wrong lifecycle phase, or a lost concurrent
    /// update.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Internal bug guard; must not surface in normal operation.
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::NoPendingStep | Self::InvalidState(_) => 400,
            Self::NotAuthorized { .. } | Self::InsufficientRole { .. } => 403,
            Self::ExpenseNotFound(_) | Self::EmployeeNotFound(_) => 404,
            Self::Invariant(_) | Self::Storage(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::EmployeeNotFound(_) => "EMPLOYEE_NOT_FOUND",
            Self::NoPendingStep => "NO_PENDING_STEP",
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::InsufficientRole { .. } => "INSUFFICIENT_ROLE",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Invariant(_) => "INVARIANT_VIOLATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<AppError> for WorkflowError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Conflict(msg) => Self::InvalidState(msg),
            other => Self::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = WorkflowError::Validation("amount must be positive".to_string());
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_not_found_errors() {
        let err = WorkflowError::ExpenseNotFound(ExpenseId::new());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "EXPENSE_NOT_FOUND");

        let err = WorkflowError::EmployeeNotFound(UserId::new());
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_no_pending_step_error() {
        let err = WorkflowError::NoPendingStep;
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "NO_PENDING_STEP");
    }

    #[test]
    fn test_authorization_errors() {
        let err = WorkflowError::NotAuthorized {
            user_id: UserId::new(),
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "NOT_AUTHORIZED");

        let err = WorkflowError::InsufficientRole {
            role: Role::Employee,
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "INSUFFICIENT_ROLE");
    }

    #[test]
    fn test_invalid_state_error() {
        let err = WorkflowError::InvalidState("step not pending".to_string());
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_STATE");
    }

    #[test]
    fn test_internal_errors() {
        assert_eq!(WorkflowError::Invariant(String::new()).status_code(), 500);
        assert_eq!(WorkflowError::Storage(String::new()).status_code(), 500);
    }

    #[test]
    fn test_store_conflict_maps_to_invalid_state() {
        let err: WorkflowError = AppError::Conflict("stale index".to_string()).into();
        assert!(matches!(err, WorkflowError::InvalidState(_)));

        let err: WorkflowError = AppError::Storage("io".to_string()).into();
        assert!(matches!(err, WorkflowError::Storage(_)));
    }
}
