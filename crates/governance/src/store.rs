//! Proposal storage
//!
//! Proposals are kept in a concurrent map, each behind its own mutex. The map
//! guard is never held across an await; callers clone the per-proposal `Arc`
//! out and lock that.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use custody_common::{
    Amount, Clock, CustodyError, CustodyResult, EventSink, ProposalId, ProposalStatus,
    StakeholderId, TreasuryEvent,
};
use custody_ledger::FundLedger;

use crate::access::AccessGuard;
use crate::proposal::{Proposal, VoteRecord};

/// Owner of every withdrawal proposal
pub struct ProposalStore {
    proposals: DashMap<ProposalId, Arc<Mutex<Proposal>>>,
    /// Next id to hand out; held while a proposal is constructed and inserted
    next_id: Mutex<ProposalId>,
    guard: AccessGuard,
    ledger: Arc<FundLedger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    beneficiary: Option<StakeholderId>,
    max_voting_period_secs: Option<u64>,
}

impl ProposalStore {
    /// Create an empty store
    pub fn new(
        guard: AccessGuard,
        ledger: Arc<FundLedger>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            proposals: DashMap::new(),
            next_id: Mutex::new(1),
            guard,
            ledger,
            clock,
            events,
            beneficiary: None,
            max_voting_period_secs: None,
        }
    }

    /// Pay executed proposals to `beneficiary` instead of the administrator
    pub fn with_beneficiary(mut self, beneficiary: StakeholderId) -> Self {
        self.beneficiary = Some(beneficiary);
        self
    }

    /// Reject voting windows longer than `secs`
    pub fn with_max_voting_period(mut self, secs: u64) -> Self {
        self.max_voting_period_secs = Some(secs);
        self
    }

    /// Open a withdrawal proposal. Administrator only.
    ///
    /// Checks run in a fixed order (owner, funds, duration, description,
    /// amount) and nothing is stored unless all of them pass.
    pub async fn create(
        &self,
        caller: &StakeholderId,
        amount: Amount,
        description: impl Into<String>,
        duration_secs: u64,
    ) -> CustodyResult<ProposalId> {
        self.guard.require_owner(caller)?;

        let available = self.ledger.balance().await;
        if amount > available {
            return Err(CustodyError::InsufficientFunds {
                requested: amount,
                available,
            });
        }

        if duration_secs == 0
            || self
                .max_voting_period_secs
                .map_or(false, |max| duration_secs > max)
        {
            return Err(CustodyError::InvalidDuration(duration_secs));
        }

        let description = description.into();
        if description.is_empty() {
            return Err(CustodyError::MissingDescription);
        }

        if amount == 0 {
            return Err(CustodyError::InvalidAmount);
        }

        let beneficiary = self
            .beneficiary
            .clone()
            .unwrap_or_else(|| self.guard.administrator().clone());

        let mut next_id = self.next_id.lock().await;
        let proposal = Proposal::new(
            *next_id,
            amount,
            description.clone(),
            beneficiary,
            self.clock.now(),
            duration_secs,
        )?;
        let id = proposal.id;
        let deadline = proposal.voting_deadline;

        self.proposals.insert(id, Arc::new(Mutex::new(proposal)));
        *next_id += 1;

        self.events.emit(TreasuryEvent::WithdrawalRequestInitiated {
            id,
            amount,
            description,
            duration_secs,
        });

        info!(proposal_id = id, amount, deadline, "Withdrawal request initiated");
        Ok(id)
    }

    /// Snapshot of a proposal
    pub async fn get(&self, id: ProposalId) -> CustodyResult<Proposal> {
        let entry = self.entry(id)?;
        let proposal = entry.lock().await;
        Ok(proposal.clone())
    }

    /// Snapshots of every proposal, ascending by id
    pub async fn list(&self) -> Vec<Proposal> {
        let mut result = Vec::with_capacity(self.proposals.len());
        for entry in self.entries() {
            result.push(entry.lock().await.clone());
        }
        result.sort_by_key(|p| p.id);
        result
    }

    /// Votes recorded on a proposal, in the order they were cast
    pub async fn votes(&self, id: ProposalId) -> CustodyResult<Vec<VoteRecord>> {
        let entry = self.entry(id)?;
        let proposal = entry.lock().await;
        Ok(proposal.votes.clone())
    }

    /// Ids of proposals still pending, ascending
    pub async fn pending_ids(&self) -> Vec<ProposalId> {
        let mut ids = Vec::new();
        for entry in self.entries() {
            let proposal = entry.lock().await;
            if proposal.status == ProposalStatus::Pending {
                ids.push(proposal.id);
            }
        }
        ids.sort_unstable();
        debug!(count = ids.len(), "Collected pending proposals");
        ids
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Shared handle to a proposal's lock
    pub(crate) fn entry(&self, id: ProposalId) -> CustodyResult<Arc<Mutex<Proposal>>> {
        self.proposals
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(CustodyError::NotFound(id))
    }

    fn entries(&self) -> Vec<Arc<Mutex<Proposal>>> {
        self.proposals
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}
