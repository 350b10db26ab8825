//! Withdrawal proposal records

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use custody_common::{
    Amount, CustodyError, CustodyResult, ProposalId, ProposalStatus, StakeholderId, Timestamp,
    Weight,
};

/// A single recorded vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    /// The proposal this vote is for
    pub proposal_id: ProposalId,
    /// The voter's identity
    pub voter: StakeholderId,
    /// true = for, false = against
    pub support: bool,
    /// Weight committed to this vote
    pub weight: Weight,
    /// When the vote was cast
    pub cast_at: Timestamp,
}

/// A withdrawal request subject to a time-boxed weighted vote
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Sequential identifier, starting at 1
    pub id: ProposalId,
    /// Requested withdrawal amount
    pub amount: Amount,
    /// Human-readable justification, never empty
    pub description: String,
    /// Who receives the funds if the proposal executes
    pub beneficiary: StakeholderId,
    /// When the proposal was created
    pub created_at: Timestamp,
    /// Length of the voting window in seconds
    pub duration_secs: u64,
    /// No vote is accepted at or after this time
    pub voting_deadline: Timestamp,
    pub status: ProposalStatus,
    /// Weighted total in favour
    pub votes_for: Weight,
    /// Weighted total against
    pub votes_against: Weight,
    /// Identities that already voted
    pub voters: BTreeSet<StakeholderId>,
    /// Votes in the order they were recorded
    pub votes: Vec<VoteRecord>,
    /// When the proposal left `Pending`
    pub finalized_at: Option<Timestamp>,
}

impl Proposal {
    pub(crate) fn new(
        id: ProposalId,
        amount: Amount,
        description: String,
        beneficiary: StakeholderId,
        created_at: Timestamp,
        duration_secs: u64,
    ) -> CustodyResult<Self> {
        let voting_deadline = created_at
            .checked_add(duration_secs)
            .ok_or(CustodyError::InvalidDuration(duration_secs))?;

        Ok(Self {
            id,
            amount,
            description,
            beneficiary,
            created_at,
            duration_secs,
            voting_deadline,
            status: ProposalStatus::Pending,
            votes_for: 0,
            votes_against: 0,
            voters: BTreeSet::new(),
            votes: Vec::new(),
            finalized_at: None,
        })
    }

    /// Whether a vote cast at `now` would be inside the voting window
    pub fn is_open_for_voting(&self, now: Timestamp) -> bool {
        self.status == ProposalStatus::Pending && now < self.voting_deadline
    }

    /// Whether `finalize` may run at `now`
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.status == ProposalStatus::Pending && now >= self.voting_deadline
    }

    pub fn has_voted(&self, voter: &StakeholderId) -> bool {
        self.voters.contains(voter)
    }

    /// Apply an already validated vote. Fails only on tally overflow, before
    /// anything is changed.
    pub(crate) fn record_vote(&mut self, record: VoteRecord) -> CustodyResult<()> {
        if record.support {
            self.votes_for = self
                .votes_for
                .checked_add(record.weight)
                .ok_or(CustodyError::Overflow)?;
        } else {
            self.votes_against = self
                .votes_against
                .checked_add(record.weight)
                .ok_or(CustodyError::Overflow)?;
        }

        self.voters.insert(record.voter.clone());
        self.votes.push(record);
        Ok(())
    }

    /// Move out of `Pending`. Transitions only go forward.
    pub(crate) fn transition(&mut self, status: ProposalStatus, now: Timestamp) {
        debug_assert!(status != ProposalStatus::Pending);
        debug_assert!(!self.status.is_final());
        self.status = status;
        if status.is_final() {
            self.finalized_at = Some(now);
        }
    }
}

impl fmt::Debug for Proposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Proposal {{ id: {}, amount: {}, status: {:?}, for: {}, against: {}, deadline: {} }}",
            self.id, self.amount, self.status, self.votes_for, self.votes_against, self.voting_deadline
        )
    }
}
