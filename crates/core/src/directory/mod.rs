//! User and company read models.
//!
//! Identity (signup, credentials, token issuance) is owned by an external
//! collaborator; the engine only consumes the resulting records.

pub mod types;

pub use types::{Actor, Company, Role, User};
