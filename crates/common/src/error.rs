//! Error types for the custody service
//!
//! Every variant is a rejection of the requested operation. None of them
//! leaves the ledger or the proposal store in a modified state.

use thiserror::Error;

use crate::types::{Amount, ProposalId, StakeholderId, Timestamp, Weight};

/// Result type used throughout the custody service
pub type CustodyResult<T> = Result<T, CustodyError>;

/// Error type for custody operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    /// Caller is not the administrator
    #[error("Allowed only for owner (caller {0})")]
    NotOwner(StakeholderId),

    /// Requested amount exceeds the pool balance
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    /// Voting duration is zero or above the configured maximum
    #[error("Invalid duration: {0} seconds")]
    InvalidDuration(u64),

    /// Proposal description is empty
    #[error("No description")]
    MissingDescription,

    /// Amount is zero
    #[error("Amount should be > 0")]
    InvalidAmount,

    /// Proposal does not exist
    #[error("Proposal not found: {0}")]
    NotFound(ProposalId),

    /// Voting window is over or the proposal is no longer pending
    #[error("Voting closed for proposal {0}")]
    VotingClosed(ProposalId),

    /// Voter already cast a vote on this proposal
    #[error("Already voted: {voter} on proposal {proposal_id}")]
    AlreadyVoted { proposal_id: ProposalId, voter: StakeholderId },

    /// Vote weight is zero
    #[error("Vote weight should be > 0")]
    InvalidWeight,

    /// Vote weight exceeds the voter's entitlement
    #[error("Excessive weight: {requested} requested, {entitled} entitled")]
    ExcessiveWeight { requested: Weight, entitled: Weight },

    /// Finalize was called before the deadline
    #[error("Voting still open for proposal {proposal_id} until {deadline}")]
    VotingStillOpen { proposal_id: ProposalId, deadline: Timestamp },

    /// Proposal already left the pending state
    #[error("Proposal {0} already finalized")]
    AlreadyFinalized(ProposalId),

    /// Arithmetic would overflow the balance or a tally
    #[error("Arithmetic overflow")]
    Overflow,

    /// Weight ledger could not answer
    #[error("Weight ledger error: {0}")]
    WeightLedger(String),
}

impl CustodyError {
    /// Create a new weight-ledger error
    pub fn weight_ledger<S: Into<String>>(msg: S) -> Self {
        CustodyError::WeightLedger(msg.into())
    }
}
