//! The expense aggregate and orchestrating service.
//!
//! # Modules
//!
//! - `types` - The aggregate root and its value objects
//! - `service` - Load / state machine / guarded-save orchestration and
//!   the listing views

pub mod service;
pub mod types;

pub use service::{DraftUpdate, ExpenseFilter, ExpenseService, NewExpense};
pub use types::{Expense, ExpenseAmount, OcrData, Receipt};
