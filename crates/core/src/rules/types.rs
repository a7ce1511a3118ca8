//! Approval rule definitions.
//!
//! Conditions keep the open `{kind, value}` shape of the stored form so a
//! malformed or unrecognized condition degrades to non-matching instead of
//! failing the submission pipeline.

use chrono::{DateTime, Utc};
use claimflow_shared::types::{ApprovalRuleId, CompanyId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// How a rule combines its conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOperator {
    /// Every condition must hold.
    #[serde(rename = "AND")]
    And,
    /// At least one condition must hold.
    #[serde(rename = "OR")]
    Or,
}

/// A single rule condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Condition kind, e.g. `amount_at_least` or `category_equals`.
    pub kind: String,
    /// Kind-specific payload.
    pub value: serde_json::Value,
}

impl RuleCondition {
    /// Matches when the claim's company-currency amount is at least `threshold`.
    #[must_use]
    pub fn amount_at_least(threshold: Decimal) -> Self {
        Self {
            kind: "amount_at_least".to_string(),
            value: json!(threshold),
        }
    }

    /// Matches when the claim's company-currency amount is at most `threshold`.
    #[must_use]
    pub fn amount_at_most(threshold: Decimal) -> Self {
        Self {
            kind: "amount_at_most".to_string(),
            value: json!(threshold),
        }
    }

    /// Matches when the claim category equals `category` (case-insensitive).
    #[must_use]
    pub fn category_equals(category: &str) -> Self {
        Self {
            kind: "category_equals".to_string(),
            value: json!(category),
        }
    }

    /// Matches when the claimed amount is at least `percent` of the receipt total.
    #[must_use]
    pub fn percentage_of_total(percent: Decimal) -> Self {
        Self {
            kind: "percentage_of_total".to_string(),
            value: json!(percent),
        }
    }
}

/// A rule's condition set and combination operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleLogic {
    /// AND/OR combination of the conditions.
    pub operator: LogicOperator,
    /// The condition set. Empty means the rule never fires.
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
}

impl RuleLogic {
    /// A logic block that never fires.
    #[must_use]
    pub const fn never() -> Self {
        Self {
            operator: LogicOperator::Or,
            conditions: Vec::new(),
        }
    }
}

/// An approval rule, scoped per company.
///
/// When a rule matches an expense at submission time, its `approvers`
/// sequence supersedes the default manager-only chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Unique identifier.
    pub id: ApprovalRuleId,
    /// Human-readable name.
    pub name: String,
    /// Owning company.
    pub company_id: CompanyId,
    /// Ordered approver sequence installed when the rule matches.
    #[serde(default)]
    pub approvers: Vec<UserId>,
    /// Opaque trigger metadata carried for audit/display.
    #[serde(default)]
    pub triggers: Option<serde_json::Value>,
    /// The condition set deciding whether the rule fires.
    pub logic: RuleLogic,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
