// Copyright (c) 2024 The Botho Foundation

//! Core types and logic for the validator staking ledger.
//!
//! This crate tracks per-account stake deposits and derives a bounded,
//! ordered validator set from a minimum stake threshold:
//!
//! - Stake records and the aggregate staked amount
//! - The ordered validator set with swap-remove semantics
//! - The value-transfer boundary that moves funds in and out of custody
//! - Staking events and the sinks that observe them
//! - Configuration structures

pub mod address;
pub mod config;
pub mod error;
pub mod event;
pub mod ledger;
pub mod shared;
pub mod transfer;
pub mod validator_set;

pub use address::Address;
pub use config::{ConfigError, StakingConfig, StakingParams};
pub use error::{StakingError, TransferError};
pub use event::{EventLog, EventSink, StakingEvent, TracingSink};
pub use ledger::{StakingLedger, StakingState};
pub use shared::SharedLedger;
pub use transfer::{InMemoryBank, ValueTransfer};
pub use validator_set::{ValidatorSet, ValidatorSetError};

/// Token amount in the smallest unit (18 decimals).
pub type Amount = u128;

/// Smallest units per whole token.
pub const UNITS_PER_TOKEN: Amount = 1_000_000_000_000_000_000;
