//! Expense approval workflow engine.
//!
//! This module implements the expense lifecycle state machine and the
//! approval chain construction that feeds it.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (statuses, decisions, steps)
//! - `error` - Workflow-specific error types
//! - `chain` - Approval chain construction
//! - `service` - State transition logic

pub mod chain;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod chain_props;
#[cfg(test)]
mod service_props;

pub use chain::{BuiltChain, ChainBuilder};
pub use error::WorkflowError;
pub use service::WorkflowService;
pub use types::{ApprovalStep, Decision, ExpenseStatus, OverrideStatus, StepStatus};
