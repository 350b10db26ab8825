//! Concurrent callers against a shared treasury
//!
//! Each test hammers one operation from many tasks on a multi-threaded
//! runtime and checks that exactly-once accounting still holds.

use std::sync::Arc;

use futures::future::join_all;

use custody::{
    CustodyError, ManualClock, NoopEventSink, ProposalStatus, StakeholderId, StaticWeightLedger,
    Treasury, TreasuryConfig,
};

fn voters(n: usize) -> Vec<StakeholderId> {
    (0..n).map(|i| StakeholderId::new(format!("voter-{}", i))).collect()
}

fn treasury_with(voters: &[StakeholderId], clock: Arc<ManualClock>) -> Arc<Treasury> {
    let weights = voters
        .iter()
        .fold(StaticWeightLedger::new(), |ledger, v| ledger.with_allocation(v.clone(), 10));
    Arc::new(
        Treasury::new(
            TreasuryConfig::new("admin"),
            Arc::new(weights),
            clock,
            Arc::new(NoopEventSink),
        )
        .unwrap(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_votes_all_counted_once() {
    let voters = voters(64);
    let clock = Arc::new(ManualClock::new(0));
    let treasury = treasury_with(&voters, clock.clone());
    treasury.deposit(&"depositor".into(), 100).await.unwrap();
    let id = treasury.initiate_withdrawal(&"admin".into(), 50, "payroll", 60).await.unwrap();

    let tasks = voters.iter().enumerate().map(|(i, voter)| {
        let treasury = Arc::clone(&treasury);
        let voter = voter.clone();
        tokio::spawn(async move { treasury.vote(&voter, id, i % 2 == 0, 3).await })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let proposal = treasury.proposal(id).await.unwrap();
    assert_eq!(proposal.votes_for, 32 * 3);
    assert_eq!(proposal.votes_against, 32 * 3);
    assert_eq!(proposal.voters.len(), 64);
    assert_eq!(proposal.votes.len(), 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_racing_double_votes_accept_exactly_one() {
    let voters = voters(1);
    let clock = Arc::new(ManualClock::new(0));
    let treasury = treasury_with(&voters, clock.clone());
    treasury.deposit(&"depositor".into(), 100).await.unwrap();
    let id = treasury.initiate_withdrawal(&"admin".into(), 50, "payroll", 60).await.unwrap();

    let tasks = (0..32).map(|_| {
        let treasury = Arc::clone(&treasury);
        let voter = voters[0].clone();
        tokio::spawn(async move { treasury.vote(&voter, id, true, 10).await })
    });

    let mut accepted = 0;
    for result in join_all(tasks).await {
        match result.unwrap() {
            Ok(_) => accepted += 1,
            Err(e) => assert!(matches!(e, CustodyError::AlreadyVoted { .. })),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(treasury.proposal(id).await.unwrap().votes_for, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_racing_finalize_settles_once() {
    let voters = voters(1);
    let clock = Arc::new(ManualClock::new(0));
    let treasury = treasury_with(&voters, clock.clone());
    treasury.deposit(&"depositor".into(), 100).await.unwrap();
    let id = treasury.initiate_withdrawal(&"admin".into(), 40, "payroll", 60).await.unwrap();
    treasury.vote(&voters[0], id, true, 10).await.unwrap();
    clock.advance(60);

    let tasks = (0..16).map(|_| {
        let treasury = Arc::clone(&treasury);
        tokio::spawn(async move { treasury.finalize(id).await })
    });

    let mut settled = 0;
    for result in join_all(tasks).await {
        match result.unwrap() {
            Ok(resolution) => {
                assert_eq!(resolution.status, ProposalStatus::Executed);
                settled += 1;
            }
            Err(e) => assert_eq!(e, CustodyError::AlreadyFinalized(id)),
        }
    }

    assert_eq!(settled, 1);
    assert_eq!(treasury.balance().await, 60);
    assert_eq!(treasury.disbursements().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_competing_approvals_never_overdraw() {
    let voters = voters(1);
    let clock = Arc::new(ManualClock::new(0));
    let treasury = treasury_with(&voters, clock.clone());
    treasury.deposit(&"depositor".into(), 100).await.unwrap();

    // Each proposal fits the pool alone; only three of ten fit together.
    let mut ids = Vec::new();
    for i in 0..10 {
        let id = treasury
            .initiate_withdrawal(&"admin".into(), 30, format!("grant {}", i), 60)
            .await
            .unwrap();
        treasury.vote(&voters[0], id, true, 1).await.unwrap();
        ids.push(id);
    }
    clock.advance(60);

    let tasks = ids.into_iter().map(|id| {
        let treasury = Arc::clone(&treasury);
        tokio::spawn(async move { treasury.finalize(id).await.unwrap() })
    });
    let resolutions: Vec<_> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

    let executed = resolutions.iter().filter(|r| r.status == ProposalStatus::Executed).count();
    let rejected = resolutions.iter().filter(|r| r.status == ProposalStatus::Rejected).count();
    assert_eq!(executed, 3);
    assert_eq!(rejected, 7);
    assert_eq!(treasury.balance().await, 10);

    let snapshot = treasury.ledger_snapshot().await;
    assert_eq!(snapshot.balance, snapshot.total_deposited - snapshot.total_debited);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_votes_and_deposits_interleave() {
    let voters = voters(16);
    let clock = Arc::new(ManualClock::new(0));
    let treasury = treasury_with(&voters, clock.clone());
    treasury.deposit(&"depositor".into(), 10).await.unwrap();
    let first = treasury.initiate_withdrawal(&"admin".into(), 10, "a", 60).await.unwrap();
    let second = treasury.initiate_withdrawal(&"admin".into(), 10, "b", 60).await.unwrap();

    let mut tasks = Vec::new();
    for voter in &voters {
        for id in [first, second] {
            let treasury = Arc::clone(&treasury);
            let voter = voter.clone();
            tasks.push(tokio::spawn(async move {
                treasury.vote(&voter, id, true, 1).await.map(|_| ())
            }));
        }
        let treasury = Arc::clone(&treasury);
        let depositor = voter.clone();
        tasks.push(tokio::spawn(async move {
            treasury.deposit(&depositor, 1).await.map(|_| ())
        }));
    }
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(treasury.balance().await, 26);
    assert_eq!(treasury.tally(first).await.unwrap().votes_for, 16);
    assert_eq!(treasury.tally(second).await.unwrap().votes_for, 16);
}
