// Copyright (c) 2024 The Botho Foundation

//! The value-transfer boundary between the ledger and account balances.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Address, Amount, TransferError};

/// Moves value between external accounts and the ledger's custody.
///
/// Implementations must either apply a transfer completely or return an
/// error without side effects.
pub trait ValueTransfer {
    /// Move `amount` from `from` into the ledger's custody.
    fn collect(&mut self, from: &Address, amount: Amount) -> Result<(), TransferError>;

    /// Move `amount` out of the ledger's custody to `to`.
    fn refund(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError>;
}

impl<T: ValueTransfer + ?Sized> ValueTransfer for &mut T {
    fn collect(&mut self, from: &Address, amount: Amount) -> Result<(), TransferError> {
        (**self).collect(from, amount)
    }

    fn refund(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        (**self).refund(to, amount)
    }
}

/// Account balances held in memory, plus the amount in ledger custody.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryBank {
    balances: BTreeMap<Address, Amount>,
    custody: Amount,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an external account from outside the system.
    pub fn fund(&mut self, account: &Address, amount: Amount) -> Result<(), TransferError> {
        let balance = self.balance_of(account);
        let updated = balance.checked_add(amount).ok_or(TransferError::Overflow)?;
        self.balances.insert(*account, updated);
        Ok(())
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Total value currently held by the ledger.
    pub fn custody(&self) -> Amount {
        self.custody
    }
}

impl ValueTransfer for InMemoryBank {
    fn collect(&mut self, from: &Address, amount: Amount) -> Result<(), TransferError> {
        let available = self.balance_of(from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientBalance {
                account: *from,
                needed: amount,
                available,
            })?;
        let custody = self
            .custody
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;

        self.balances.insert(*from, remaining);
        self.custody = custody;
        Ok(())
    }

    fn refund(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        let custody = self
            .custody
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientCustody {
                needed: amount,
                available: self.custody,
            })?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;

        self.custody = custody;
        self.balances.insert(*to, balance);
        Ok(())
    }
}
