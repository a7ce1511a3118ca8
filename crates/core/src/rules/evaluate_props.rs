//! Property-based tests for rule evaluation.
//!
//! Validates purity, the empty-condition-set default, and the AND/OR
//! combination laws over randomized rules and snapshots.

use chrono::Utc;
use claimflow_shared::types::{ApprovalRuleId, CompanyId, CurrencyCode};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::rules::evaluate::{ExpenseSnapshot, RuleEvaluator};
use crate::rules::types::{ApprovalRule, LogicOperator, RuleCondition, RuleLogic};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_category() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        prop_oneof![
            Just("Travel".to_string()),
            Just("Meals".to_string()),
            Just("Office".to_string()),
        ]
        .prop_map(Some),
    ]
}

fn arb_condition() -> impl Strategy<Value = RuleCondition> {
    prop_oneof![
        arb_amount().prop_map(RuleCondition::amount_at_least),
        arb_amount().prop_map(RuleCondition::amount_at_most),
        prop_oneof![Just("Travel"), Just("Meals"), Just("Office")]
            .prop_map(RuleCondition::category_equals),
        (1i64..100i64).prop_map(|p| RuleCondition::percentage_of_total(Decimal::new(p, 0))),
        Just(RuleCondition {
            kind: "unknown_kind".to_string(),
            value: serde_json::json!(1),
        }),
    ]
}

fn arb_operator() -> impl Strategy<Value = LogicOperator> {
    prop_oneof![Just(LogicOperator::And), Just(LogicOperator::Or)]
}

fn arb_snapshot() -> impl Strategy<Value = ExpenseSnapshot> {
    (arb_amount(), arb_category(), proptest::option::of(arb_amount())).prop_map(
        |(amount, category, receipt_total)| ExpenseSnapshot {
            amount,
            currency: CurrencyCode::parse("USD").unwrap(),
            category,
            receipt_total,
        },
    )
}

fn rule(operator: LogicOperator, conditions: Vec<RuleCondition>) -> ApprovalRule {
    ApprovalRule {
        id: ApprovalRuleId::new(),
        name: "prop".to_string(),
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

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Identical inputs always produce identical output.
    #[test]
    fn prop_evaluation_is_pure(
        operator in arb_operator(),
        conditions in proptest::collection::vec(arb_condition(), 0..5),
        snapshot in arb_snapshot()
    ) {
        let rule = rule(operator, conditions);
        let first = RuleEvaluator::evaluate(&rule, &snapshot);
        let second = RuleEvaluator::evaluate(&rule, &snapshot);
        prop_assert_eq!(first, second);
    }

    /// A rule with no conditions never fires, whatever the snapshot.
    #[test]
    fn prop_empty_conditions_never_fire(
        operator in arb_operator(),
        snapshot in arb_snapshot()
    ) {
        let rule = rule(operator, Vec::new());
        prop_assert!(!RuleEvaluator::evaluate(&rule, &snapshot));
    }

    /// An AND rule fires only if every condition fires on its own.
    #[test]
    fn prop_and_implies_each_condition(
        conditions in proptest::collection::vec(arb_condition(), 1..5),
        snapshot in arb_snapshot()
    ) {
        let and_rule = rule(LogicOperator::And, conditions.clone());
        if RuleEvaluator::evaluate(&and_rule, &snapshot) {
            for condition in conditions {
                let single = rule(LogicOperator::Or, vec![condition]);
                prop_assert!(RuleEvaluator::evaluate(&single, &snapshot));
            }
        }
    }

    /// An OR rule fires iff some single condition fires on its own.
    #[test]
    fn prop_or_matches_some_condition(
        conditions in proptest::collection::vec(arb_condition(), 1..5),
        snapshot in arb_snapshot()
    ) {
        let or_rule = rule(LogicOperator::Or, conditions.clone());
        let any_single = conditions
            .into_iter()
            .any(|c| RuleEvaluator::evaluate(&rule(LogicOperator::Or, vec![c]), &snapshot));
        prop_assert_eq!(RuleEvaluator::evaluate(&or_rule, &snapshot), any_single);
    }
}
