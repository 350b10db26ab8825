//! Proposal resolution
//!
//! Once the voting window has closed anyone may finalize a proposal. The
//! majority rule decides between settlement and rejection; settlement that
//! the pool can no longer fund degrades to rejection instead of failing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use custody_common::{
    Clock, CustodyError, CustodyResult, EventSink, ProposalId, ProposalStatus, TreasuryEvent,
};
use custody_ledger::{Disbursement, FundLedger};

use crate::store::ProposalStore;
use crate::voting::Tally;

/// Outcome of a successful `finalize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub proposal_id: ProposalId,
    /// Terminal status: `Executed`, `Rejected` or `Expired`
    pub status: ProposalStatus,
    pub tally: Tally,
    /// Present only when funds were released
    pub disbursement: Option<Disbursement>,
}

/// Decides and settles proposals whose voting window has closed
pub struct ResolutionEngine {
    store: Arc<ProposalStore>,
    ledger: Arc<FundLedger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
}

impl ResolutionEngine {
    pub fn new(
        store: Arc<ProposalStore>,
        ledger: Arc<FundLedger>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            ledger,
            clock,
            events,
        }
    }

    /// Resolve a proposal. Permissionless; succeeds at most once per proposal.
    pub async fn finalize(&self, proposal_id: ProposalId) -> CustodyResult<Resolution> {
        let entry = self.store.entry(proposal_id)?;
        let mut proposal = entry.lock().await;

        if proposal.status != ProposalStatus::Pending {
            return Err(CustodyError::AlreadyFinalized(proposal_id));
        }

        let now = self.clock.now();
        if !proposal.is_due(now) {
            return Err(CustodyError::VotingStillOpen {
                proposal_id,
                deadline: proposal.voting_deadline,
            });
        }

        let tally = Tally::of(&proposal);
        let mut disbursement = None;

        let status = if tally.is_empty() {
            ProposalStatus::Expired
        } else if tally.is_approved() {
            proposal.transition(ProposalStatus::Approved, now);
            self.events.emit(TreasuryEvent::ProposalResolved {
                proposal_id,
                status: ProposalStatus::Approved,
            });

            match self
                .ledger
                .release(proposal_id, &proposal.beneficiary, proposal.amount, now)
                .await
            {
                Ok(record) => {
                    disbursement = Some(record);
                    ProposalStatus::Executed
                }
                Err(CustodyError::InsufficientFunds { requested, available }) => {
                    warn!(
                        proposal_id,
                        requested,
                        available,
                        "Approved proposal can no longer be funded; rejecting"
                    );
                    ProposalStatus::Rejected
                }
                Err(e) => {
                    error!(proposal_id, "Settlement failed: {}", e);
                    ProposalStatus::Rejected
                }
            }
        } else {
            ProposalStatus::Rejected
        };

        proposal.transition(status, now);
        self.events.emit(TreasuryEvent::ProposalResolved { proposal_id, status });

        info!(
            proposal_id,
            %status,
            votes_for = tally.votes_for,
            votes_against = tally.votes_against,
            "Proposal finalized"
        );

        Ok(Resolution {
            proposal_id,
            status,
            tally,
            disbursement,
        })
    }

    /// Finalize every pending proposal whose deadline has passed.
    ///
    /// Proposals finalized concurrently by someone else are skipped.
    pub async fn finalize_due(&self) -> Vec<Resolution> {
        let mut resolutions = Vec::new();
        for proposal_id in self.store.pending_ids().await {
            match self.finalize(proposal_id).await {
                Ok(resolution) => resolutions.push(resolution),
                Err(CustodyError::VotingStillOpen { .. }) | Err(CustodyError::AlreadyFinalized(_)) => {}
                Err(e) => error!(proposal_id, "Failed to finalize proposal: {}", e),
            }
        }
        resolutions
    }
}
