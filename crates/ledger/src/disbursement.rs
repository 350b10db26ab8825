use serde::{Deserialize, Serialize};

use custody_common::{Amount, ProposalId, StakeholderId, Timestamp};

/// Record of funds released for an executed proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disbursement {
    /// Sequence number within the ledger, starting at 1
    pub sequence: u64,
    /// The proposal that authorized the release
    pub proposal_id: ProposalId,
    /// Who receives the funds
    pub beneficiary: StakeholderId,
    pub amount: Amount,
    /// When settlement happened
    pub released_at: Timestamp,
}
