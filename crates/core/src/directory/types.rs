//! User, company, and authenticated-actor types.

use claimflow_shared::types::{CompanyId, CurrencyCode, UserId};
use serde::{Deserialize, Serialize};

/// User role in the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Full administrative access, including outcome overrides.
    Admin,
    /// Approves claims routed to them.
    Manager,
    /// Submits expense claims.
    Employee,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Manager => "Manager",
            Self::Employee => "Employee",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "employee" => Some(Self::Employee),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user record as consumed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role within the company.
    pub role: Role,
    /// Owning company.
    pub company_id: CompanyId,
    /// Default approver when no rule-driven chain applies.
    pub manager_id: Option<UserId>,
    /// Whether this user's manager participates in approvals.
    pub is_manager_approver: bool,
}

/// A company record as consumed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Unique identifier.
    pub id: CompanyId,
    /// Company name.
    pub name: String,
    /// Currency claims are normalized into.
    pub default_currency: CurrencyCode,
    /// Country of incorporation.
    pub country: Option<String>,
}

/// An authenticated actor, as produced by the identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// The acting user.
    pub user_id: UserId,
    /// Tenant scope for every operation the actor performs.
    pub company_id: CompanyId,
    /// The actor's role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(user_id: UserId, company_id: CompanyId, role: Role) -> Self {
        Self {
            user_id,
            company_id,
            role,
        }
    }

    /// Returns true if the actor holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
