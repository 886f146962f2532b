// Copyright (c) 2024 The Botho Foundation

//! Staking events and the sinks that observe them.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Address, Amount};

/// An event emitted by a successful ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakingEvent {
    /// Emitted on every successful stake, whether or not it promotes
    Staked { account: Address, amount: Amount },
    /// Emitted on every successful unstake with the refunded amount
    Unstaked { account: Address, amount: Amount },
}

impl StakingEvent {
    pub fn account(&self) -> &Address {
        match self {
            StakingEvent::Staked { account, .. } | StakingEvent::Unstaked { account, .. } => {
                account
            }
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            StakingEvent::Staked { amount, .. } | StakingEvent::Unstaked { amount, .. } => *amount,
        }
    }
}

impl std::fmt::Display for StakingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StakingEvent::Staked { account, amount } => write!(f, "Staked({}, {})", account, amount),
            StakingEvent::Unstaked { account, amount } => {
                write!(f, "Unstaked({}, {})", account, amount)
            }
        }
    }
}

/// Observer of ledger events.
pub trait EventSink {
    fn emit(&mut self, event: StakingEvent);
}

/// Discards every event.
impl EventSink for () {
    fn emit(&mut self, _event: StakingEvent) {}
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: StakingEvent) {
        (**self).emit(event)
    }
}

/// Delivers each event to both sinks, in order.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: StakingEvent) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}

/// Records events in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<StakingEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[StakingEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&StakingEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take all recorded events, leaving the log empty.
    pub fn drain(&mut self) -> Vec<StakingEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: StakingEvent) {
        self.events.push(event);
    }
}

/// Logs each event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: StakingEvent) {
        match &event {
            StakingEvent::Staked { account, amount } => {
                info!(%account, amount = %amount, "Staked");
            }
            StakingEvent::Unstaked { account, amount } => {
                info!(%account, amount = %amount, "Unstaked");
            }
        }
    }
}
