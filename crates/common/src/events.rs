//! Notification side channel
//!
//! State transitions produce [`TreasuryEvent`]s that are handed to an
//! [`EventSink`]. The core never waits on a consumer: sinks must accept an
//! event without blocking.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::types::{Amount, ProposalId, ProposalStatus, StakeholderId, Weight};

/// An externally observable state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TreasuryEvent {
    /// Funds entered custody
    Deposited {
        depositor: StakeholderId,
        amount: Amount,
    },
    /// The administrator opened a withdrawal proposal
    WithdrawalRequestInitiated {
        id: ProposalId,
        amount: Amount,
        description: String,
        duration_secs: u64,
    },
    /// A stakeholder cast a weighted vote
    Vote {
        proposal_id: ProposalId,
        voter: StakeholderId,
        support: bool,
        weight: Weight,
    },
    /// A proposal moved to a new status during finalization
    ProposalResolved {
        proposal_id: ProposalId,
        status: ProposalStatus,
    },
    /// Settlement debited the pool for an executed proposal
    FundsReleased {
        proposal_id: ProposalId,
        beneficiary: StakeholderId,
        amount: Amount,
    },
}

/// Consumer of treasury notifications
pub trait EventSink: Send + Sync {
    fn emit(&self, event: TreasuryEvent);
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: TreasuryEvent) {}
}

/// Fans events out to any number of tokio subscribers
///
/// Slow subscribers observe `RecvError::Lagged` rather than stalling the core.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<TreasuryEvent>,
}

/// Largest broadcast buffer a sink will allocate
pub const MAX_EVENT_BUFFER: usize = 65_536;

impl BroadcastEventSink {
    /// Create a sink retaining up to `capacity` undelivered events per subscriber.
    ///
    /// `capacity` is clamped to `1..=MAX_EVENT_BUFFER`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.clamp(1, MAX_EVENT_BUFFER));
        Self { sender }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TreasuryEvent> {
        self.sender.subscribe()
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, event: TreasuryEvent) {
        // No subscribers is not an error; the event is simply unobserved.
        if self.sender.send(event).is_err() {
            trace!("Treasury event emitted with no subscribers");
        }
    }
}

/// Append-only in-memory event log
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<TreasuryEvent>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far, in emission order
    pub fn events(&self) -> Vec<TreasuryEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemoryEventLog {
    fn emit(&self, event: TreasuryEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
