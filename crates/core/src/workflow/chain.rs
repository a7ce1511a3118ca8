//! Approval chain construction.
//!
//! At submission time the builder turns the employee record, the company's
//! rule set, and the expense snapshot into the ordered list of pending
//! steps embedded in the aggregate, plus the id of the rule that produced
//! it (if any) for audit.

use claimflow_shared::types::ApprovalRuleId;

use crate::directory::User;
use crate::rules::{ApprovalRule, ExpenseSnapshot, RuleEvaluator};
use crate::workflow::types::ApprovalStep;

/// The outcome of chain construction.
#[derive(Debug, Clone)]
pub struct BuiltChain {
    /// Ordered pending steps, sequences `1..=N`.
    pub steps: Vec<ApprovalStep>,
    /// The rule whose approver sequence was installed, if any.
    pub rule_id: Option<ApprovalRuleId>,
}

impl BuiltChain {
    /// An empty chain with no originating rule.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            steps: Vec::new(),
            rule_id: None,
        }
    }
}

/// Stateless builder for approval chains.
pub struct ChainBuilder;

impl ChainBuilder {
    /// Builds the approval chain for an expense.
    ///
    /// The first matching rule (rule-set order) with a non-empty approver
    /// list supersedes the default chain; its approvers become the steps.
    /// When the employee's `is_manager_approver` flag is set, the manager
    /// is prepended ahead of the rule's approvers unless already among
    /// them. With no matching rule the chain is the single default
    /// manager step, or empty when the employee has no manager.
    #[must_use]
    pub fn build(employee: &User, rules: &[ApprovalRule], snapshot: &ExpenseSnapshot) -> BuiltChain {
        if let Some(rule) = RuleEvaluator::first_match(rules, snapshot)
            && !rule.approvers.is_empty()
        {
            let mut approvers = Vec::with_capacity(rule.approvers.len() + 1);
            if let Some(manager_id) = employee.manager_id
                && employee.is_manager_approver
                && !rule.approvers.contains(&manager_id)
            {
                approvers.push(manager_id);
            }
            approvers.extend(rule.approvers.iter().copied());

            let steps = approvers
                .into_iter()
                .enumerate()
                .map(|(position, approver_id)| {
                    ApprovalStep::pending(approver_id, position as u32 + 1)
                })
                .collect();

            return BuiltChain {
                steps,
                rule_id: Some(rule.id),
            };
        }

        let steps = employee
            .manager_id
            .map(|manager_id| vec![ApprovalStep::pending(manager_id, 1)])
            .unwrap_or_default();

        BuiltChain {
            steps,
            rule_id: None,
        }
    }
}
