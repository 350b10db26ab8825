//! Property tests over random operation sequences
//!
//! Whatever order deposits, proposals, votes, clock ticks and finalizations
//! arrive in, the ledger must balance, tallies must only grow while pending,
//! and statuses must only move forward.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;

use custody::{
    ManualClock, NoopEventSink, ProposalId, ProposalStatus, StakeholderId, StaticWeightLedger,
    Treasury, TreasuryConfig,
};

const VOTERS: [&str; 4] = ["v0", "v1", "v2", "v3"];

#[derive(Debug, Clone)]
enum Action {
    Deposit(u64),
    Propose { amount: u64, duration: u64 },
    Vote { proposal: u64, voter: usize, support: bool, weight: u64 },
    Tick(u64),
    Finalize(u64),
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (1u64..50).prop_map(Action::Deposit),
        (1u64..60, 1u64..100).prop_map(|(amount, duration)| Action::Propose { amount, duration }),
        (1u64..6, 0usize..VOTERS.len(), any::<bool>(), 1u64..15).prop_map(
            |(proposal, voter, support, weight)| Action::Vote { proposal, voter, support, weight }
        ),
        (1u64..80).prop_map(Action::Tick),
        (1u64..6).prop_map(Action::Finalize),
    ]
}

fn rank(status: ProposalStatus) -> u8 {
    match status {
        ProposalStatus::Pending => 0,
        ProposalStatus::Approved => 1,
        _ => 2,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn lifecycle_invariants_hold(actions in prop::collection::vec(action(), 1..80)) {
        tokio_test::block_on(async {
            let weights = VOTERS
                .iter()
                .fold(StaticWeightLedger::new(), |l, v| l.with_allocation(*v, 10));
            let clock = Arc::new(ManualClock::new(0));
            let treasury = Treasury::new(
                TreasuryConfig::new("admin"),
                Arc::new(weights),
                clock.clone(),
                Arc::new(NoopEventSink),
            )
            .unwrap();
            let admin = StakeholderId::from("admin");

            let mut deposited = 0u64;
            let mut released = 0u64;
            let mut seen: HashMap<ProposalId, (ProposalStatus, u64, u64)> = HashMap::new();

            for action in actions {
                match action {
                    Action::Deposit(amount) => {
                        treasury.deposit(&"funder".into(), amount).await.unwrap();
                        deposited += amount;
                    }
                    Action::Propose { amount, duration } => {
                        let balance = treasury.balance().await;
                        let result = treasury.initiate_withdrawal(&admin, amount, "grant", duration).await;
                        prop_assert_eq!(result.is_ok(), amount <= balance);
                    }
                    Action::Vote { proposal, voter, support, weight } => {
                        let _ = treasury.vote(&VOTERS[voter].into(), proposal, support, weight).await;
                    }
                    Action::Tick(secs) => clock.advance(secs),
                    Action::Finalize(proposal) => {
                        if let Ok(resolution) = treasury.finalize(proposal).await {
                            if let Some(d) = resolution.disbursement {
                                released += d.amount;
                            }
                        }
                    }
                }

                prop_assert_eq!(treasury.balance().await, deposited - released);

                for p in treasury.proposals().await {
                    prop_assert!(p.voters.len() == p.votes.len());
                    prop_assert!(p.status != ProposalStatus::Approved);
                    if let Some((status, votes_for, votes_against)) = seen.get(&p.id) {
                        prop_assert!(rank(p.status) >= rank(*status));
                        prop_assert!(p.votes_for >= *votes_for);
                        prop_assert!(p.votes_against >= *votes_against);
                        if *status != ProposalStatus::Pending {
                            prop_assert_eq!(p.status, *status);
                            prop_assert_eq!((p.votes_for, p.votes_against), (*votes_for, *votes_against));
                        }
                    }
                    seen.insert(p.id, (p.status, p.votes_for, p.votes_against));
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
