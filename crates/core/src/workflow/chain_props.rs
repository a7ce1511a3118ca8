//! Property-based tests for approval chain construction.

use chrono::Utc;
use claimflow_shared::types::{ApprovalRuleId, CompanyId, CurrencyCode, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::directory::{Role, User};
use crate::rules::{ApprovalRule, ExpenseSnapshot, LogicOperator, RuleCondition, RuleLogic};
use crate::workflow::chain::ChainBuilder;

fn arb_user_id() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(uuid::Uuid::from_u128(n)))
}

fn arb_employee() -> impl Strategy<Value = User> {
    (proptest::option::of(arb_user_id()), any::<bool>()).prop_map(
        |(manager_id, is_manager_approver)| User {
            id: UserId::new(),
            name: "prop".to_string(),
            email: "prop@example.com".to_string(),
            role: Role::Employee,
            company_id: CompanyId::new(),
            manager_id,
            is_manager_approver,
        },
    )
}

fn arb_rule() -> impl Strategy<Value = ApprovalRule> {
    (
        proptest::collection::vec(arb_user_id(), 0..4),
        0i64..100_000i64,
    )
        .prop_map(|(approvers, threshold_cents)| ApprovalRule {
            id: ApprovalRuleId::new(),
            name: "prop".to_string(),
            company_id: CompanyId::new(),
            approvers,
            triggers: None,
            logic: RuleLogic {
                operator: LogicOperator::Or,
                conditions: vec![RuleCondition::amount_at_least(Decimal::new(
                    threshold_cents,
                    2,
                ))],
            },
            created_at: Utc::now(),
        })
}

fn arb_snapshot() -> impl Strategy<Value = ExpenseSnapshot> {
    (0i64..100_000i64).prop_map(|cents| ExpenseSnapshot {
        amount: Decimal::new(cents, 2),
        currency: CurrencyCode::parse("USD").unwrap(),
        category: None,
        receipt_total: None,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every built chain is well-formed: all steps pending, sequences
    /// exactly 1..=N.
    #[test]
    fn prop_built_chains_are_well_formed(
        employee in arb_employee(),
        rules in proptest::collection::vec(arb_rule(), 0..4),
        snapshot in arb_snapshot()
    ) {
        let chain = ChainBuilder::build(&employee, &rules, &snapshot);

        for (position, step) in chain.steps.iter().enumerate() {
            prop_assert!(step.is_pending());
            prop_assert_eq!(step.sequence as usize, position + 1);
        }
        crate::expense::types::validate_chain(&chain.steps).unwrap();
    }

    /// Chain construction is deterministic for identical inputs.
    #[test]
    fn prop_build_is_deterministic(
        employee in arb_employee(),
        rules in proptest::collection::vec(arb_rule(), 0..4),
        snapshot in arb_snapshot()
    ) {
        let first = ChainBuilder::build(&employee, &rules, &snapshot);
        let second = ChainBuilder::build(&employee, &rules, &snapshot);

        prop_assert_eq!(first.rule_id, second.rule_id);
        prop_assert_eq!(first.steps.len(), second.steps.len());
        for (a, b) in first.steps.iter().zip(second.steps.iter()) {
            prop_assert_eq!(a.approver_id, b.approver_id);
            prop_assert_eq!(a.sequence, b.sequence);
        }
    }

    /// A recorded rule id always refers to a rule in the input set, and
    /// an absent rule id means the chain is the default manager chain.
    #[test]
    fn prop_rule_id_audit_is_consistent(
        employee in arb_employee(),
        rules in proptest::collection::vec(arb_rule(), 0..4),
        snapshot in arb_snapshot()
    ) {
        let chain = ChainBuilder::build(&employee, &rules, &snapshot);

        match chain.rule_id {
            Some(rule_id) => {
                prop_assert!(rules.iter().any(|r| r.id == rule_id));
            }
            None => match employee.manager_id {
                Some(manager_id) => {
                    prop_assert_eq!(chain.steps.len(), 1);
                    prop_assert_eq!(chain.steps[0].approver_id, manager_id);
                }
                None => prop_assert!(chain.steps.is_empty()),
            },
        }
    }
}
