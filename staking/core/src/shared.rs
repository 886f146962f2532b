// Copyright (c) 2024 The Botho Foundation

//! Thread-safe handle to a staking ledger.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::{Address, Amount, EventSink, StakingError, StakingLedger, ValueTransfer};

/// Ledger handle for concurrent access.
///
/// Writes are serialized behind the write lock; queries take the read lock
/// and only ever see the state left by a completed operation.
pub struct SharedLedger<B, S> {
    inner: Arc<RwLock<StakingLedger<B, S>>>,
}

impl<B, S> Clone for SharedLedger<B, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: ValueTransfer, S: EventSink> SharedLedger<B, S> {
    pub fn new(ledger: StakingLedger<B, S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn stake(&self, caller: &Address, amount: Amount) -> Result<(), StakingError> {
        self.inner.write().stake(caller, amount)
    }

    pub fn receive_transfer(&self, sender: &Address, amount: Amount) -> Result<(), StakingError> {
        self.inner.write().receive_transfer(sender, amount)
    }

    pub fn unstake(&self, caller: &Address) -> Result<Amount, StakingError> {
        self.inner.write().unstake(caller)
    }

    pub fn staked_amount(&self) -> Amount {
        self.inner.read().staked_amount()
    }

    pub fn validators(&self) -> Vec<Address> {
        self.inner.read().validators()
    }

    pub fn is_validator(&self, account: &Address) -> bool {
        self.inner.read().is_validator(account)
    }

    pub fn account_stake(&self, account: &Address) -> Amount {
        self.inner.read().account_stake(account)
    }

    /// Run `f` with shared access to the ledger.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&StakingLedger<B, S>) -> R) -> R {
        let ledger = self.inner.read();
        f(&ledger)
    }
}
