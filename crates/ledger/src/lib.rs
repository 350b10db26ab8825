//! Pool balance ledger for the custody service
//!
//! Tracks the single fungible balance held in custody. Deposits increase it;
//! the only way money leaves is a checked debit, normally issued by proposal
//! settlement through [`FundLedger::release`].

pub mod disbursement;
pub mod fund;

// Re-exports
pub use disbursement::Disbursement;
pub use fund::{FundLedger, LedgerSnapshot};
