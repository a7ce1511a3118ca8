//! Approval rule evaluation.
//!
//! Evaluation is a pure function over a rule and an expense snapshot: no
//! clock, no I/O, no randomness. Chain construction and audit review both
//! rely on re-evaluation producing the same answer.

use std::str::FromStr;

use claimflow_shared::types::CurrencyCode;
use rust_decimal::Decimal;

use crate::rules::types::{ApprovalRule, LogicOperator, RuleCondition};

/// The slice of an expense a rule is evaluated against.
#[derive(Debug, Clone)]
pub struct ExpenseSnapshot {
    /// Claim amount in company currency when normalization succeeded,
    /// otherwise the original amount.
    pub amount: Decimal,
    /// Currency of the original claim.
    pub currency: CurrencyCode,
    /// Claim category.
    pub category: Option<String>,
    /// Total from the scanned receipt, when OCR produced one.
    pub receipt_total: Option<Decimal>,
}

/// Stateless evaluator for approval rule condition sets.
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// Decides whether a rule's condition set is satisfied by the snapshot.
    ///
    /// An empty condition set never fires. Unknown condition kinds and
    /// malformed condition values evaluate false for that condition.
    #[must_use]
    pub fn evaluate(rule: &ApprovalRule, snapshot: &ExpenseSnapshot) -> bool {
        let conditions = &rule.logic.conditions;
        if conditions.is_empty() {
            return false;
        }

        match rule.logic.operator {
            LogicOperator::And => conditions.iter().all(|c| Self::holds(c, snapshot)),
            LogicOperator::Or => conditions.iter().any(|c| Self::holds(c, snapshot)),
        }
    }

    /// Returns the first rule in `rules` whose condition set matches.
    ///
    /// Rule-set order is the tie-breaker, so matching is stable for a
    /// given company rule list.
    #[must_use]
    pub fn first_match<'a>(
        rules: &'a [ApprovalRule],
        snapshot: &ExpenseSnapshot,
    ) -> Option<&'a ApprovalRule> {
        rules.iter().find(|rule| Self::evaluate(rule, snapshot))
    }

    fn holds(condition: &RuleCondition, snapshot: &ExpenseSnapshot) -> bool {
        match condition.kind.as_str() {
            "amount_at_least" => {
                decimal_value(&condition.value).is_some_and(|v| snapshot.amount >= v)
            }
            "amount_at_most" => {
                decimal_value(&condition.value).is_some_and(|v| snapshot.amount <= v)
            }
            "category_equals" => match (&snapshot.category, condition.value.as_str()) {
                (Some(category), Some(expected)) => category.eq_ignore_ascii_case(expected),
                _ => false,
            },
            "percentage_of_total" => {
                match (decimal_value(&condition.value), snapshot.receipt_total) {
                    (Some(percent), Some(total)) => {
                        snapshot.amount * Decimal::ONE_HUNDRED >= total * percent
                    }
                    _ => false,
                }
            }
            // Unrecognized kinds never match; malformed rules must not
            // block the submission pipeline.
            _ => false,
        }
    }
}

/// Reads a decimal from a JSON condition value (number or string form).
fn decimal_value(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => Decimal::from_str(s).ok(),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::types::RuleLogic;
    use chrono::Utc;
    use claimflow_shared::types::{ApprovalRuleId, CompanyId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn rule_with(operator: LogicOperator, conditions: Vec<RuleCondition>) -> ApprovalRule {
        ApprovalRule {
            id: ApprovalRuleId::new(),
            name: "test".to_string(),
            company_id: CompanyId::new(),
            approvers: Vec::new(),
            triggers: None,
            logic: RuleLogic {
                operator,
                conditions,
            },
            created_at: Utc::now(),
        }
    }

    fn snapshot(amount: Decimal) -> ExpenseSnapshot {
        ExpenseSnapshot {
            amount,
            currency: CurrencyCode::parse("USD").unwrap(),
            category: Some("Travel".to_string()),
            receipt_total: None,
        }
    }

    #[test]
    fn test_empty_condition_set_never_fires() {
        let rule = rule_with(LogicOperator::Or, Vec::new());
        assert!(!RuleEvaluator::evaluate(&rule, &snapshot(dec!(100))));

        let rule = rule_with(LogicOperator::And, Vec::new());
        assert!(!RuleEvaluator::evaluate(&rule, &snapshot(dec!(100))));
    }

    #[rstest]
    #[case(dec!(500), dec!(500), true)]
    #[case(dec!(500), dec!(499.99), false)]
    #[case(dec!(500), dec!(1200), true)]
    fn test_amount_at_least(
        #[case] threshold: Decimal,
        #[case] amount: Decimal,
        #[case] expected: bool,
    ) {
        let rule = rule_with(
            LogicOperator::Or,
            vec![RuleCondition::amount_at_least(threshold)],
        );
        assert_eq!(RuleEvaluator::evaluate(&rule, &snapshot(amount)), expected);
    }

    #[rstest]
    #[case(dec!(100), dec!(100), true)]
    #[case(dec!(100), dec!(100.01), false)]
    fn test_amount_at_most(
        #[case] threshold: Decimal,
        #[case] amount: Decimal,
        #[case] expected: bool,
    ) {
        let rule = rule_with(
            LogicOperator::Or,
            vec![RuleCondition::amount_at_most(threshold)],
        );
        assert_eq!(RuleEvaluator::evaluate(&rule, &snapshot(amount)), expected);
    }

    #[test]
    fn test_category_equals_case_insensitive() {
        let rule = rule_with(
            LogicOperator::Or,
            vec![RuleCondition::category_equals("travel")],
        );
        assert!(RuleEvaluator::evaluate(&rule, &snapshot(dec!(10))));

        let mut snap = snapshot(dec!(10));
        snap.category = Some("Meals".to_string());
        assert!(!RuleEvaluator::evaluate(&rule, &snap));

        snap.category = None;
        assert!(!RuleEvaluator::evaluate(&rule, &snap));
    }

    #[test]
    fn test_percentage_of_total() {
        let rule = rule_with(
            LogicOperator::Or,
            vec![RuleCondition::percentage_of_total(dec!(80))],
        );

        // 90 claimed of a 100 receipt: 90% >= 80%
        let mut snap = snapshot(dec!(90));
        snap.receipt_total = Some(dec!(100));
        assert!(RuleEvaluator::evaluate(&rule, &snap));

        // 50 claimed of a 100 receipt: below the bar
        snap.amount = dec!(50);
        assert!(!RuleEvaluator::evaluate(&rule, &snap));

        // No receipt total in the snapshot: non-matching
        snap.receipt_total = None;
        assert!(!RuleEvaluator::evaluate(&rule, &snap));
    }

    #[test]
    fn test_and_requires_every_condition() {
        let rule = rule_with(
            LogicOperator::And,
            vec![
                RuleCondition::amount_at_least(dec!(100)),
                RuleCondition::category_equals("Travel"),
            ],
        );

        assert!(RuleEvaluator::evaluate(&rule, &snapshot(dec!(150))));
        assert!(!RuleEvaluator::evaluate(&rule, &snapshot(dec!(50))));

        let mut snap = snapshot(dec!(150));
        snap.category = Some("Meals".to_string());
        assert!(!RuleEvaluator::evaluate(&rule, &snap));
    }

    #[test]
    fn test_or_requires_any_condition() {
        let rule = rule_with(
            LogicOperator::Or,
            vec![
                RuleCondition::amount_at_least(dec!(1000)),
                RuleCondition::category_equals("Travel"),
            ],
        );

        // Amount too low but category matches
        assert!(RuleEvaluator::evaluate(&rule, &snapshot(dec!(50))));

        let mut snap = snapshot(dec!(50));
        snap.category = None;
        assert!(!RuleEvaluator::evaluate(&rule, &snap));
    }

    #[test]
    fn test_unknown_condition_kind_is_non_matching() {
        let unknown = RuleCondition {
            kind: "approver_mood".to_string(),
            value: serde_json::json!("excellent"),
        };
        let rule = rule_with(LogicOperator::Or, vec![unknown.clone()]);
        assert!(!RuleEvaluator::evaluate(&rule, &snapshot(dec!(100))));

        // Under AND, one unknown condition poisons the whole set
        let rule = rule_with(
            LogicOperator::And,
            vec![RuleCondition::amount_at_least(dec!(1)), unknown],
        );
        assert!(!RuleEvaluator::evaluate(&rule, &snapshot(dec!(100))));
    }

    #[test]
    fn test_malformed_condition_value_is_non_matching() {
        let malformed = RuleCondition {
            kind: "amount_at_least".to_string(),
            value: serde_json::json!({ "oops": true }),
        };
        let rule = rule_with(LogicOperator::Or, vec![malformed]);
        assert!(!RuleEvaluator::evaluate(&rule, &snapshot(dec!(100))));
    }

    #[test]
    fn test_decimal_value_accepts_string_and_number() {
        assert_eq!(
            decimal_value(&serde_json::json!("12.50")),
            Some(dec!(12.50))
        );
        assert_eq!(decimal_value(&serde_json::json!(42)), Some(dec!(42)));
        assert_eq!(decimal_value(&serde_json::json!(null)), None);
    }

    #[test]
    fn test_first_match_takes_rule_set_order() {
        let first = rule_with(
            LogicOperator::Or,
            vec![RuleCondition::amount_at_least(dec!(100))],
        );
        let second = rule_with(
            LogicOperator::Or,
            vec![RuleCondition::amount_at_least(dec!(50))],
        );
        let rules = vec![first.clone(), second];

        let matched = RuleEvaluator::first_match(&rules, &snapshot(dec!(200))).unwrap();
        assert_eq!(matched.id, first.id);
    }
}
