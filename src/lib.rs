//! Custody
//!
//! Pooled fund custody whose outbound payments are released only after a
//! weighted, time-boxed stakeholder vote.
//!
//! [`Treasury`] wires the components together: deposits go into the
//! [`FundLedger`], the administrator opens withdrawal proposals, stakeholders
//! vote with weight bounded by the external [`WeightLedger`], and anyone may
//! finalize a proposal after its deadline.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

pub use custody_common::{
    Amount, BroadcastEventSink, Clock, CustodyError, CustodyResult, EventSink, ManualClock,
    MemoryEventLog, NoopEventSink, ProposalId, ProposalStatus, StakeholderId, StaticWeightLedger,
    SystemClock, Timestamp, TreasuryEvent, Weight, WeightLedger,
};
pub use custody_config::{ConfigError, TreasuryConfig};
pub use custody_governance::{Proposal, Resolution, Tally, VoteRecord};
pub use custody_ledger::{Disbursement, LedgerSnapshot};

use custody_governance::{AccessGuard, ProposalStore, ResolutionEngine, VotingEngine};
use custody_ledger::FundLedger;

/// Module version information
pub mod version {
    /// The current version of the custody library
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Re-export component crates for direct access
pub mod components {
    pub use custody_common as common;
    pub use custody_config as config;
    pub use custody_governance as governance;
    pub use custody_ledger as ledger;
}

/// The custody service
pub struct Treasury {
    config: TreasuryConfig,
    ledger: Arc<FundLedger>,
    store: Arc<ProposalStore>,
    voting: VotingEngine,
    resolution: ResolutionEngine,
}

impl Treasury {
    /// Build a treasury with an empty pool.
    ///
    /// Fails only if `config` does not validate.
    pub fn new(
        config: TreasuryConfig,
        weights: Arc<dyn WeightLedger>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
    ) -> anyhow::Result<Self> {
        config.validate().context("Invalid treasury configuration")?;

        let ledger = Arc::new(FundLedger::new(Arc::clone(&events)));

        let mut store = ProposalStore::new(
            AccessGuard::new(config.administrator.clone()),
            Arc::clone(&ledger),
            Arc::clone(&clock),
            Arc::clone(&events),
        );
        if let Some(beneficiary) = &config.beneficiary {
            store = store.with_beneficiary(beneficiary.clone());
        }
        if let Some(max) = config.max_voting_period_secs {
            store = store.with_max_voting_period(max);
        }
        let store = Arc::new(store);

        let voting = VotingEngine::new(
            Arc::clone(&store),
            weights,
            Arc::clone(&clock),
            Arc::clone(&events),
        );
        let resolution = ResolutionEngine::new(Arc::clone(&store), Arc::clone(&ledger), clock, events);

        info!(
            administrator = %config.administrator,
            payee = %config.payee(),
            "Treasury initialized"
        );

        Ok(Self {
            config,
            ledger,
            store,
            voting,
            resolution,
        })
    }

    /// Build a treasury that publishes notifications on a broadcast channel
    /// sized by `config.event_buffer`. Subscribe through the returned sink.
    pub fn with_broadcast(
        config: TreasuryConfig,
        weights: Arc<dyn WeightLedger>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<(Self, BroadcastEventSink)> {
        let sink = BroadcastEventSink::new(config.event_buffer);
        let treasury = Self::new(config, weights, clock, Arc::new(sink.clone()))?;
        Ok((treasury, sink))
    }

    pub fn config(&self) -> &TreasuryConfig {
        &self.config
    }

    /// Put `amount` into custody. Open to any caller.
    pub async fn deposit(&self, depositor: &StakeholderId, amount: Amount) -> CustodyResult<Amount> {
        self.ledger.deposit(depositor, amount).await
    }

    /// Open a withdrawal proposal. Administrator only.
    pub async fn initiate_withdrawal(
        &self,
        caller: &StakeholderId,
        amount: Amount,
        description: impl Into<String>,
        duration_secs: u64,
    ) -> CustodyResult<ProposalId> {
        self.store.create(caller, amount, description, duration_secs).await
    }

    /// Cast a weighted vote on a pending proposal
    pub async fn vote(
        &self,
        voter: &StakeholderId,
        proposal_id: ProposalId,
        support: bool,
        weight: Weight,
    ) -> CustodyResult<Tally> {
        self.voting.vote(proposal_id, support, weight, voter).await
    }

    /// Resolve a proposal whose voting window has closed
    pub async fn finalize(&self, proposal_id: ProposalId) -> CustodyResult<Resolution> {
        self.resolution.finalize(proposal_id).await
    }

    /// Resolve every proposal whose voting window has closed
    pub async fn finalize_due(&self) -> Vec<Resolution> {
        self.resolution.finalize_due().await
    }

    pub async fn proposal(&self, proposal_id: ProposalId) -> CustodyResult<Proposal> {
        self.store.get(proposal_id).await
    }

    pub async fn proposals(&self) -> Vec<Proposal> {
        self.store.list().await
    }

    pub async fn votes(&self, proposal_id: ProposalId) -> CustodyResult<Vec<VoteRecord>> {
        self.store.votes(proposal_id).await
    }

    pub async fn tally(&self, proposal_id: ProposalId) -> CustodyResult<Tally> {
        self.voting.tally(proposal_id).await
    }

    pub async fn balance(&self) -> Amount {
        self.ledger.balance().await
    }

    pub async fn ledger_snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot().await
    }

    pub async fn disbursements(&self) -> Vec<Disbursement> {
        self.ledger.disbursements().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_available() {
        assert!(!super::version::VERSION.is_empty());
    }

    #[test]
    fn test_config_is_retained() {
        let mut config = TreasuryConfig::new("alice");
        config.beneficiary = Some("payroll".into());

        let treasury = Treasury::new(
            config.clone(),
            Arc::new(StaticWeightLedger::new()),
            Arc::new(SystemClock),
            Arc::new(NoopEventSink),
        )
        .unwrap();
        assert_eq!(treasury.config(), &config);
        assert_eq!(treasury.config().payee().as_str(), "payroll");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = TreasuryConfig::new("alice");
        config.event_buffer = 0;

        let result = Treasury::new(
            config,
            Arc::new(StaticWeightLedger::new()),
            Arc::new(SystemClock),
            Arc::new(NoopEventSink),
        );
        assert!(result.is_err());
    }
}
