//! Weighted voting
//!
//! Votes are append-only and commutative: each stakeholder votes at most once
//! per proposal, and the tally does not depend on the order votes arrive in.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use custody_common::{
    Clock, CustodyError, CustodyResult, EventSink, ProposalId, StakeholderId, TreasuryEvent,
    Weight, WeightLedger,
};

use crate::proposal::{Proposal, VoteRecord};
use crate::store::ProposalStore;

/// Result of counting a proposal's votes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Weighted total in favour
    pub votes_for: Weight,
    /// Weighted total against
    pub votes_against: Weight,
    /// Number of distinct voters
    pub voter_count: usize,
}

impl Tally {
    pub fn of(proposal: &Proposal) -> Self {
        Self {
            votes_for: proposal.votes_for,
            votes_against: proposal.votes_against,
            voter_count: proposal.voters.len(),
        }
    }

    /// Simple weighted majority of cast votes; abstentions count for nobody
    pub fn is_approved(&self) -> bool {
        self.votes_for > self.votes_against
    }

    /// Nobody put any weight behind either side
    pub fn is_empty(&self) -> bool {
        self.votes_for == 0 && self.votes_against == 0
    }
}

/// Validates and records votes
pub struct VotingEngine {
    store: Arc<ProposalStore>,
    weights: Arc<dyn WeightLedger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
}

impl VotingEngine {
    pub fn new(
        store: Arc<ProposalStore>,
        weights: Arc<dyn WeightLedger>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            weights,
            clock,
            events,
        }
    }

    /// Cast `weight` for or against a proposal on behalf of `voter`.
    ///
    /// The entitlement is resolved before the proposal is locked. The clock is
    /// read under the lock, and nothing awaits between the checks and the
    /// tally update, so a vote cannot commit after the deadline or race with
    /// another vote or with finalization.
    pub async fn vote(
        &self,
        proposal_id: ProposalId,
        support: bool,
        weight: Weight,
        voter: &StakeholderId,
    ) -> CustodyResult<Tally> {
        let entry = self.store.entry(proposal_id)?;

        // Ledger errors surface only after the proposal checks below.
        let entitlement = self.weights.entitlement_of(voter).await;

        let mut proposal = entry.lock().await;

        let now = self.clock.now();
        if !proposal.is_open_for_voting(now) {
            debug!(proposal_id, now, deadline = proposal.voting_deadline, "Vote after close");
            return Err(CustodyError::VotingClosed(proposal_id));
        }

        if proposal.has_voted(voter) {
            return Err(CustodyError::AlreadyVoted {
                proposal_id,
                voter: voter.clone(),
            });
        }

        if weight == 0 {
            return Err(CustodyError::InvalidWeight);
        }

        let entitled = entitlement?;
        if weight > entitled {
            return Err(CustodyError::ExcessiveWeight {
                requested: weight,
                entitled,
            });
        }

        proposal.record_vote(VoteRecord {
            proposal_id,
            voter: voter.clone(),
            support,
            weight,
            cast_at: now,
        })?;

        self.events.emit(TreasuryEvent::Vote {
            proposal_id,
            voter: voter.clone(),
            support,
            weight,
        });

        let tally = Tally::of(&proposal);
        info!(
            proposal_id,
            %voter,
            support,
            weight,
            votes_for = tally.votes_for,
            votes_against = tally.votes_against,
            "Vote recorded"
        );
        Ok(tally)
    }

    /// Current tally of a proposal
    pub async fn tally(&self, proposal_id: ProposalId) -> CustodyResult<Tally> {
        let entry = self.store.entry(proposal_id)?;
        let proposal = entry.lock().await;
        Ok(Tally::of(&proposal))
    }
}
