//! Governance for the custody service
//!
//! This crate owns the withdrawal-proposal lifecycle: the administrator opens
//! a proposal, stakeholders cast weighted votes until the deadline, and anyone
//! may then finalize it. Approved proposals are settled against the
//! [`custody_ledger::FundLedger`].
//!
//! Each proposal lives behind its own async mutex, so work on different
//! proposals runs in parallel while votes and finalization on the same
//! proposal are serialized. When both are held, the proposal lock is always
//! taken before the ledger lock.

pub mod access;
pub mod proposal;
pub mod resolution;
pub mod store;
pub mod voting;

// Re-exports
pub use access::AccessGuard;
pub use custody_common::ProposalStatus;
pub use proposal::{Proposal, VoteRecord};
pub use resolution::{Resolution, ResolutionEngine};
pub use store::ProposalStore;
pub use voting::{Tally, VotingEngine};
