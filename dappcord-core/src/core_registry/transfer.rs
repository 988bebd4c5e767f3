//! Value transfer seam used by withdrawals
//!
//! The registry never moves value itself. A withdrawal hands the amount to a
//! [`ValueTransfer`] and only commits the drained balance once `send` returns
//! `Ok`.

use super::errors::TransferError;
use super::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;
use tracing::debug;

/// Delivers value to a recipient
pub trait ValueTransfer: Send + Sync {
    /// Deliver `amount` to `recipient`, or fail without delivering anything
    fn send(&self, recipient: &Address, amount: Amount) -> Result<(), TransferError>;
}

/// Persistable view of an [`InMemoryLedger`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub accounts: BTreeMap<Address, Amount>,
    pub rejecting: BTreeSet<Address>,
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: BTreeMap<Address, Amount>,
    rejecting: BTreeSet<Address>,
}

/// Account ledger that credits recipients in memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a ledger from a snapshot
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                accounts: snapshot.accounts,
                rejecting: snapshot.rejecting,
            }),
        }
    }

    /// Make every future transfer to `recipient` fail
    pub fn reject(&self, recipient: Address) -> Result<(), TransferError> {
        let mut state = self.write()?;
        state.rejecting.insert(recipient);
        Ok(())
    }

    /// Accept transfers to `recipient` again
    pub fn accept(&self, recipient: &Address) -> Result<(), TransferError> {
        let mut state = self.write()?;
        state.rejecting.remove(recipient);
        Ok(())
    }

    /// Current balance of an account (zero if unknown)
    pub fn balance_of(&self, account: &Address) -> Result<Amount, TransferError> {
        let state = self
            .state
            .read()
            .map_err(|e| TransferError::Unavailable(e.to_string()))?;
        Ok(state.accounts.get(account).copied().unwrap_or_default())
    }

    pub fn snapshot(&self) -> Result<LedgerSnapshot, TransferError> {
        let state = self
            .state
            .read()
            .map_err(|e| TransferError::Unavailable(e.to_string()))?;
        Ok(LedgerSnapshot {
            accounts: state.accounts.clone(),
            rejecting: state.rejecting.clone(),
        })
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, LedgerState>, TransferError> {
        self.state
            .write()
            .map_err(|e| TransferError::Unavailable(e.to_string()))
    }
}

impl ValueTransfer for InMemoryLedger {
    fn send(&self, recipient: &Address, amount: Amount) -> Result<(), TransferError> {
        let mut state = self.write()?;

        if state.rejecting.contains(recipient) {
            return Err(TransferError::Rejected(*recipient));
        }

        let current = state.accounts.get(recipient).copied().unwrap_or_default();
        let updated = current.checked_add(amount).ok_or(TransferError::Overflow {
            recipient: *recipient,
            amount,
        })?;
        state.accounts.insert(*recipient, updated);

        debug!(recipient = %recipient, amount = %amount, "Ledger credited");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_send_credits_recipient() {
        let ledger = InMemoryLedger::new();
        ledger.send(&addr(1), Amount(10)).unwrap();
        ledger.send(&addr(1), Amount(5)).unwrap();

        assert_eq!(ledger.balance_of(&addr(1)).unwrap(), Amount(15));
        assert_eq!(ledger.balance_of(&addr(2)).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_rejecting_recipient() {
        let ledger = InMemoryLedger::new();
        ledger.reject(addr(1)).unwrap();

        let result = ledger.send(&addr(1), Amount(10));
        assert_eq!(result, Err(TransferError::Rejected(addr(1))));
        assert_eq!(ledger.balance_of(&addr(1)).unwrap(), Amount::ZERO);

        ledger.accept(&addr(1)).unwrap();
        ledger.send(&addr(1), Amount(10)).unwrap();
        assert_eq!(ledger.balance_of(&addr(1)).unwrap(), Amount(10));
    }

    #[test]
    fn test_overflow_leaves_account_untouched() {
        let ledger = InMemoryLedger::new();
        ledger.send(&addr(1), Amount(u128::MAX)).unwrap();

        let result = ledger.send(&addr(1), Amount(1));
        assert!(matches!(result, Err(TransferError::Overflow { .. })));
        assert_eq!(ledger.balance_of(&addr(1)).unwrap(), Amount(u128::MAX));
    }

    #[test]
    fn test_snapshot_restores_accounts() {
        let ledger = InMemoryLedger::new();
        ledger.send(&addr(1), Amount(7)).unwrap();
        ledger.reject(addr(2)).unwrap();

        let snapshot = ledger.snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored = InMemoryLedger::from_snapshot(serde_json::from_str(&json).unwrap());

        assert_eq!(restored.balance_of(&addr(1)).unwrap(), Amount(7));
        assert!(restored.send(&addr(2), Amount(1)).is_err());
    }
}
