//! The custody pool balance
//!
//! All balance mutations go through one async mutex, so `deposit`,
//! `try_debit` and `release` are mutually exclusive and never observe each
//! other half-done.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use custody_common::{
    Amount, CustodyError, CustodyResult, EventSink, ProposalId, StakeholderId, Timestamp,
    TreasuryEvent,
};

use crate::disbursement::Disbursement;

/// Point-in-time view of the ledger totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub balance: Amount,
    pub total_deposited: Amount,
    pub total_debited: Amount,
}

#[derive(Debug, Default)]
struct LedgerState {
    balance: Amount,
    total_deposited: Amount,
    total_debited: Amount,
    disbursements: Vec<Disbursement>,
}

impl LedgerState {
    /// Validate and apply a debit. Leaves the state untouched on error.
    fn debit(&mut self, amount: Amount) -> CustodyResult<()> {
        if amount > self.balance {
            return Err(CustodyError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }
        let total_debited = self
            .total_debited
            .checked_add(amount)
            .ok_or(CustodyError::Overflow)?;

        self.balance -= amount;
        self.total_debited = total_debited;
        Ok(())
    }
}

/// Ledger holding the pooled funds
pub struct FundLedger {
    state: Mutex<LedgerState>,
    events: Arc<dyn EventSink>,
}

impl FundLedger {
    /// Create an empty ledger
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            events,
        }
    }

    /// Add `amount` to custody on behalf of `depositor`. Returns the new balance.
    pub async fn deposit(&self, depositor: &StakeholderId, amount: Amount) -> CustodyResult<Amount> {
        if amount == 0 {
            return Err(CustodyError::InvalidAmount);
        }

        let mut state = self.state.lock().await;
        let balance = state.balance.checked_add(amount).ok_or(CustodyError::Overflow)?;
        let total_deposited = state
            .total_deposited
            .checked_add(amount)
            .ok_or(CustodyError::Overflow)?;

        state.balance = balance;
        state.total_deposited = total_deposited;
        self.events.emit(TreasuryEvent::Deposited {
            depositor: depositor.clone(),
            amount,
        });

        debug!(%depositor, amount, balance, "Deposit accepted");
        Ok(balance)
    }

    /// Debit `amount` if the balance covers it. Returns the new balance.
    pub async fn try_debit(&self, amount: Amount) -> CustodyResult<Amount> {
        let mut state = self.state.lock().await;
        state.debit(amount)?;
        debug!(amount, balance = state.balance, "Debit applied");
        Ok(state.balance)
    }

    /// Settle an approved proposal: debit the pool and record the disbursement.
    ///
    /// Fails with `InsufficientFunds` without side effects if the balance no
    /// longer covers `amount`.
    pub async fn release(
        &self,
        proposal_id: ProposalId,
        beneficiary: &StakeholderId,
        amount: Amount,
        now: Timestamp,
    ) -> CustodyResult<Disbursement> {
        let mut state = self.state.lock().await;
        if let Err(e) = state.debit(amount) {
            warn!(proposal_id, amount, balance = state.balance, "Release refused: {}", e);
            return Err(e);
        }

        let disbursement = Disbursement {
            sequence: state.disbursements.len() as u64 + 1,
            proposal_id,
            beneficiary: beneficiary.clone(),
            amount,
            released_at: now,
        };
        state.disbursements.push(disbursement.clone());
        self.events.emit(TreasuryEvent::FundsReleased {
            proposal_id,
            beneficiary: beneficiary.clone(),
            amount,
        });

        info!(proposal_id, %beneficiary, amount, balance = state.balance, "Funds released");
        Ok(disbursement)
    }

    /// Current pool balance
    pub async fn balance(&self) -> Amount {
        self.state.lock().await.balance
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.lock().await;
        LedgerSnapshot {
            balance: state.balance,
            total_deposited: state.total_deposited,
            total_debited: state.total_debited,
        }
    }

    /// Every disbursement so far, oldest first
    pub async fn disbursements(&self) -> Vec<Disbursement> {
        self.state.lock().await.disbursements.clone()
    }
}
