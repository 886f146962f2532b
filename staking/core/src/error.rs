// Copyright (c) 2024 The Botho Foundation

//! Staking ledger errors.

use thiserror::Error;

use crate::{Address, Amount};

/// Errors returned by ledger operations. Any error aborts the whole
/// operation: no state changes and no events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakingError {
    #[error("Only staker can call function")]
    NotAStaker,

    #[error("Validators can't be less than MINIMUM_REQUIRED_NUM_VALIDATORS")]
    ValidatorFloorViolation,

    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Stake amount overflow")]
    AmountOverflow,

    /// The aggregate stake is smaller than a single account's stake.
    #[error("Staked amount {staked_amount} is less than account stake {stake}")]
    InconsistentState { staked_amount: Amount, stake: Amount },
}

/// Errors raised by the value-transfer boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("Insufficient balance for {account}: needed {needed}, available {available}")]
    InsufficientBalance {
        account: Address,
        needed: Amount,
        available: Amount,
    },

    #[error("Insufficient custody: needed {needed}, available {available}")]
    InsufficientCustody { needed: Amount, available: Amount },

    #[error("Balance overflow")]
    Overflow,
}
