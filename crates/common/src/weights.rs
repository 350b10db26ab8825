//! Weight ledger seam
//!
//! The weight ledger is an external registry of voting power. The custody
//! core only ever reads from it, at the moment a vote is cast.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::CustodyResult;
use crate::types::{StakeholderId, Weight};

/// Read-only view of stakeholder voting weight
#[async_trait]
pub trait WeightLedger: Send + Sync {
    /// Weight `identity` may commit to a single vote; unknown identities hold zero
    async fn entitlement_of(&self, identity: &StakeholderId) -> CustodyResult<Weight>;
}

/// Fixed weight table established by a one-time initial distribution
#[derive(Debug, Clone, Default)]
pub struct StaticWeightLedger {
    allocations: HashMap<StakeholderId, Weight>,
}

impl StaticWeightLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style allocation; repeated identities accumulate
    pub fn with_allocation(mut self, identity: impl Into<StakeholderId>, weight: Weight) -> Self {
        let entry = self.allocations.entry(identity.into()).or_insert(0);
        *entry = entry.saturating_add(weight);
        self
    }

    /// Split `total` evenly across `holders`; the remainder goes to the first holder
    pub fn evenly_distributed(total: Weight, holders: &[StakeholderId]) -> Self {
        let mut ledger = Self::new();
        if holders.is_empty() {
            return ledger;
        }

        let share = total / holders.len() as Weight;
        let remainder = total % holders.len() as Weight;
        for (index, holder) in holders.iter().enumerate() {
            let weight = if index == 0 { share + remainder } else { share };
            ledger = ledger.with_allocation(holder.clone(), weight);
        }
        ledger
    }

    /// Sum of all allocations
    pub fn total_weight(&self) -> Weight {
        self.allocations
            .values()
            .fold(0, |acc: Weight, w| acc.saturating_add(*w))
    }
}

#[async_trait]
impl WeightLedger for StaticWeightLedger {
    async fn entitlement_of(&self, identity: &StakeholderId) -> CustodyResult<Weight> {
        Ok(self.allocations.get(identity).copied().unwrap_or(0))
    }
}
