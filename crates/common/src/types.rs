//! Common types used throughout the custody service

use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount of the pooled fund, in its smallest indivisible unit
pub type Amount = u64;

/// Voting weight as reported by the weight ledger
pub type Weight = u64;

/// Sequential proposal identifier, starting at 1
pub type ProposalId = u64;

/// Unix time in seconds
pub type Timestamp = u64;

/// Identity of a stakeholder, depositor or administrator
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StakeholderId(String);

impl StakeholderId {
    /// Create a new identity
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Get the identity as a string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StakeholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StakeholderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StakeholderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status of a withdrawal proposal
///
/// Statuses only move forward: `Pending` is left exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Open for voting, or waiting to be finalized
    Pending,
    /// Majority reached; settlement is being attempted
    Approved,
    /// Majority not reached, or settlement could not be funded
    Rejected,
    /// Nobody voted before the deadline
    Expired,
    /// Approved and the funds were released
    Executed,
}

impl ProposalStatus {
    /// Whether the proposal has reached a terminal status
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Rejected | Self::Expired | Self::Executed)
    }
}

impl Default for ProposalStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Executed => "executed",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_serializes_as_plain_string() {
        let id = StakeholderId::from("alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");

        let back: StakeholderId = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(back.to_string(), "alice");
    }

    #[test]
    fn test_only_settled_statuses_are_final() {
        assert!(!ProposalStatus::Pending.is_final());
        assert!(!ProposalStatus::Approved.is_final());
        assert!(ProposalStatus::Rejected.is_final());
        assert!(ProposalStatus::Expired.is_final());
        assert!(ProposalStatus::Executed.is_final());
        assert_eq!(ProposalStatus::default(), ProposalStatus::Pending);
    }
}
