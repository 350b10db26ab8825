use tracing::warn;

use custody_common::{CustodyError, CustodyResult, StakeholderId};

/// Gate for administrator-only operations
///
/// The administrator is fixed at construction; there is no rotation.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    administrator: StakeholderId,
}

impl AccessGuard {
    pub fn new(administrator: StakeholderId) -> Self {
        Self { administrator }
    }

    pub fn administrator(&self) -> &StakeholderId {
        &self.administrator
    }

    /// Fail with `NotOwner` unless `caller` is the administrator
    pub fn require_owner(&self, caller: &StakeholderId) -> CustodyResult<()> {
        if caller != &self.administrator {
            warn!(%caller, "Rejected administrator-only call");
            return Err(CustodyError::NotOwner(caller.clone()));
        }
        Ok(())
    }
}
