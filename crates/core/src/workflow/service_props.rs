//! Property-based tests for the workflow state machine.
//!
//! These validate the advancement, termination, and authorization
//! properties over randomized chains and decision orders.

use chrono::NaiveDate;
use claimflow_shared::types::{CompanyId, CurrencyCode, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::expense::types::{Expense, ExpenseAmount};
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{ApprovalStep, Decision, ExpenseStatus, StepStatus};

fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(uuid::Uuid::from_u128(n)))
}

fn arb_chain() -> impl Strategy<Value = Vec<UserId>> {
    proptest::collection::vec(arb_user(), 1..6)
}

fn submitted(approvers: &[UserId]) -> Expense {
    let mut expense = Expense::draft(
        UserId::new(),
        CompanyId::new(),
        None,
        None,
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        ExpenseAmount::new(
            Decimal::new(12000, 2),
            CurrencyCode::parse("USD").unwrap(),
            None,
        ),
        None,
    );
    let chain = approvers
        .iter()
        .enumerate()
        .map(|(i, id)| ApprovalStep::pending(*id, u32::try_from(i).unwrap() + 1))
        .collect();
    WorkflowService::submit(&mut expense, chain, None).unwrap();
    expense
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Successive successful approvals strictly increase the pointer.
    #[test]
    fn prop_approvals_monotonically_advance(approvers in arb_chain()) {
        let mut expense = submitted(&approvers);
        let mut last_index = expense.current_approver_index;

        for approver in &approvers {
            WorkflowService::advance(&mut expense, *approver, Decision::Approve, None).unwrap();
            prop_assert!(expense.current_approver_index > last_index);
            last_index = expense.current_approver_index;
        }
    }

    /// A chain of N steps resolves to Approved iff all N were approved in order.
    #[test]
    fn prop_full_approval_completes_chain(approvers in arb_chain()) {
        let mut expense = submitted(&approvers);

        for (acted, approver) in approvers.iter().enumerate() {
            prop_assert!(!matches!(expense.status, ExpenseStatus::Approved));
            WorkflowService::advance(&mut expense, *approver, Decision::Approve, None).unwrap();
            prop_assert_eq!(expense.current_approver_index, acted + 1);
        }

        prop_assert_eq!(expense.status, ExpenseStatus::Approved);
        prop_assert!(expense.approval_workflow.iter().all(|s| s.status == StepStatus::Approved));
    }

    /// Rejection at any position terminates the chain; no later step ever
    /// leaves Pending and the status stays Rejected.
    #[test]
    fn prop_rejection_is_chain_terminal(
        approvers in arb_chain(),
        reject_at in 0usize..6
    ) {
        let reject_at = reject_at % approvers.len();
        let mut expense = submitted(&approvers);

        for approver in approvers.iter().take(reject_at) {
            WorkflowService::advance(&mut expense, *approver, Decision::Approve, None).unwrap();
        }
        WorkflowService::advance(
            &mut expense,
            approvers[reject_at],
            Decision::Reject,
            None,
        )
        .unwrap();

        prop_assert_eq!(expense.status, ExpenseStatus::Rejected);
        let index_after = expense.current_approver_index;

        // Every actor hammering the expense afterwards fails and changes nothing
        for approver in &approvers {
            let result =
                WorkflowService::advance(&mut expense, *approver, Decision::Approve, None);
            prop_assert!(result.is_err());
        }
        prop_assert_eq!(expense.status, ExpenseStatus::Rejected);
        prop_assert_eq!(expense.current_approver_index, index_after);
        for step in expense.approval_workflow.iter().skip(reject_at + 1) {
            prop_assert_eq!(step.status, StepStatus::Pending);
        }
    }

    /// An actor who does not hold the active step always gets
    /// NotAuthorized, even if they approved an earlier or hold a later step.
    #[test]
    fn prop_authorization_isolation(
        approvers in arb_chain(),
        intruder in arb_user()
    ) {
        prop_assume!(!approvers.contains(&intruder));
        let mut expense = submitted(&approvers);

        for approver in &approvers {
            // Everyone but the active holder is refused, including
            // holders of later steps.
            for other in &approvers {
                if other != approver {
                    let before = expense.current_approver_index;
                    let result = WorkflowService::advance(
                        &mut expense,
                        *other,
                        Decision::Approve,
                        None,
                    );
                    prop_assert!(
                        matches!(result, Err(WorkflowError::NotAuthorized { .. })),
                        "expected NotAuthorized error"
                    );
                    prop_assert_eq!(expense.current_approver_index, before);
                }
            }
            let result = WorkflowService::advance(&mut expense, intruder, Decision::Approve, None);
            prop_assert!(result.is_err());

            WorkflowService::advance(&mut expense, *approver, Decision::Approve, None).unwrap();
        }
    }
}
