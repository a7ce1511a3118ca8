//! Company-scoped approval rule management.

use std::sync::Arc;

use chrono::Utc;
use claimflow_shared::error::{AppError, AppResult};
use claimflow_shared::types::{ApprovalRuleId, UserId};
use tracing::info;

use crate::directory::Actor;
use crate::rules::types::{ApprovalRule, RuleLogic};
use crate::store::RuleStore;

/// Input for creating a rule.
#[derive(Debug, Clone)]
pub struct NewRule {
    /// Human-readable name.
    pub name: String,
    /// Ordered approver sequence installed when the rule matches.
    pub approvers: Vec<UserId>,
    /// Opaque trigger metadata.
    pub triggers: Option<serde_json::Value>,
    /// The condition set.
    pub logic: RuleLogic,
}

/// Partial update of a rule's mutable fields; identity is immutable.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    /// New name.
    pub name: Option<String>,
    /// New approver sequence.
    pub approvers: Option<Vec<UserId>>,
    /// New trigger metadata.
    pub triggers: Option<serde_json::Value>,
    /// New condition set.
    pub logic: Option<RuleLogic>,
}

/// Administrative service for approval rules.
pub struct RuleService {
    rules: Arc<dyn RuleStore>,
}

impl RuleService {
    /// Creates the service over its persistence port.
    #[must_use]
    pub fn new(rules: Arc<dyn RuleStore>) -> Self {
        Self { rules }
    }

    /// Creates a rule in the actor's company.
    pub async fn create_rule(&self, actor: Actor, input: NewRule) -> AppResult<ApprovalRule> {
        Self::require_admin(actor)?;
        if input.name.trim().is_empty() {
            return Err(AppError::Validation("rule name is required".to_string()));
        }

        let rule = ApprovalRule {
            id: ApprovalRuleId::new(),
            name: input.name,
            company_id: actor.company_id,
            approvers: input.approvers,
            triggers: input.triggers,
            logic: input.logic,
            created_at: Utc::now(),
        };
        self.rules.insert(rule.clone()).await?;
        info!(rule_id = %rule.id, name = %rule.name, "approval rule created");
        Ok(rule)
    }

    /// Lists the company's rules in creation order.
    pub async fn list_rules(&self, actor: Actor) -> AppResult<Vec<ApprovalRule>> {
        Self::require_admin(actor)?;
        self.rules.list(actor.company_id).await
    }

    /// Updates a rule's mutable fields.
    pub async fn update_rule(
        &self,
        actor: Actor,
        rule_id: ApprovalRuleId,
        update: RuleUpdate,
    ) -> AppResult<ApprovalRule> {
        Self::require_admin(actor)?;

        let mut rule = self
            .rules
            .find(rule_id, actor.company_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("rule {rule_id}")))?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("rule name is required".to_string()));
            }
            rule.name = name;
        }
        if let Some(approvers) = update.approvers {
            rule.approvers = approvers;
        }
        if let Some(triggers) = update.triggers {
            rule.triggers = Some(triggers);
        }
        if let Some(logic) = update.logic {
            rule.logic = logic;
        }

        self.rules.update(&rule).await?;
        Ok(rule)
    }

    /// Deletes a rule.
    ///
    /// Deletion is unconditional: expenses referencing the rule keep a
    /// dangling `approval_rule_id` as an audit-only marker, and chains
    /// already installed are unaffected.
    pub async fn delete_rule(&self, actor: Actor, rule_id: ApprovalRuleId) -> AppResult<()> {
        Self::require_admin(actor)?;
        self.rules.delete(rule_id, actor.company_id).await?;
        info!(rule_id = %rule_id, "approval rule deleted");
        Ok(())
    }

    fn require_admin(actor: Actor) -> AppResult<()> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role {} cannot manage approval rules",
                actor.role
            )))
        }
    }
}
