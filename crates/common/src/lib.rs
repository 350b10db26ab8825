//! Common types and plumbing for the custody service
//!
//! Everything the ledger and governance crates share lives here: identities
//! and amounts, the error type, the injected clock, the notification side
//! channel, and the weight-ledger seam.

pub mod clock;
pub mod error;
pub mod events;
pub mod logging;
pub mod types;
pub mod weights;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CustodyError, CustodyResult};
pub use events::{
    BroadcastEventSink, EventSink, MemoryEventLog, NoopEventSink, TreasuryEvent, MAX_EVENT_BUFFER,
};
pub use types::{Amount, ProposalId, ProposalStatus, StakeholderId, Timestamp, Weight};
pub use weights::{StaticWeightLedger, WeightLedger};
