// Copyright (c) 2024 The Botho Foundation

//! JSON state file holding the ledger, simulated balances and event history.

use anyhow::{anyhow, Context, Result};
use bth_staking_core::{
    EventLog, InMemoryBank, StakingLedger, StakingParams, StakingState, TracingSink,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::debug;

/// Ledger as driven by the CLI: simulated balances, events recorded and logged.
pub type CliLedger = StakingLedger<InMemoryBank, (EventLog, TracingSink)>;

/// Everything the CLI persists between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: StakingState,
    pub bank: InMemoryBank,
    pub events: EventLog,
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!(
                "Failed to read state from {}. Run 'bth-staking init' first.",
                path.display()
            )
        })?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse state from {}", path.display()))
    }

    /// Save the snapshot, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize state")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write state to {}", path.display()))?;

        debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Rebuild a ledger, rejecting state that violates the ledger invariants
    /// under `params`.
    pub fn into_ledger(self, params: StakingParams) -> Result<CliLedger> {
        self.state
            .check(&params)
            .map_err(|e| anyhow!("State is inconsistent with the configuration: {}", e))?;

        Ok(StakingLedger::from_state(
            params,
            self.state,
            self.bank,
            (self.events, TracingSink),
        ))
    }

    pub fn from_ledger(ledger: CliLedger) -> Self {
        let (state, bank, (events, _)) = ledger.into_parts();
        Self {
            state,
            bank,
            events,
        }
    }
}
