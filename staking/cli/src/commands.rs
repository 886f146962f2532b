// Copyright (c) 2024 The Botho Foundation

//! CLI command implementations.
//!
//! These functions print user-facing output to stdout; diagnostics go
//! through `tracing`.

use anyhow::{bail, Context, Result};
use bth_staking_core::{Address, StakingConfig, StakingParams};
use std::path::Path;
use tracing::info;

use crate::amount::{format_tokens, parse_amount};
use crate::store::{CliLedger, Snapshot};

/// Paths shared by every command.
pub struct Paths<'a> {
    pub config: &'a Path,
    pub state: &'a Path,
}

fn parse_address(s: &str) -> Result<Address> {
    s.parse::<Address>()
        .map_err(|e| anyhow::anyhow!("Invalid address '{}': {}", s, e))
}

fn load_params(config_path: &Path) -> Result<StakingParams> {
    let config = if config_path.exists() {
        info!("Loading configuration from {}", config_path.display());
        StakingConfig::load(config_path)?
    } else {
        info!("Using default configuration");
        StakingConfig::default()
    };
    Ok(config.staking)
}

fn open(paths: &Paths) -> Result<CliLedger> {
    let params = load_params(paths.config)?;
    Snapshot::load(paths.state)?.into_ledger(params)
}

/// Load the ledger, apply `f`, and persist the result only if `f` succeeds.
fn mutate<T>(paths: &Paths, f: impl FnOnce(&mut CliLedger) -> Result<T>) -> Result<T> {
    let mut ledger = open(paths)?;
    let out = f(&mut ledger)?;
    Snapshot::from_ledger(ledger).save(paths.state)?;
    Ok(out)
}

/// Write a default config (unless present) and an empty state file.
pub fn init(paths: &Paths, force: bool) -> Result<()> {
    if paths.state.exists() && !force {
        bail!(
            "State file {} already exists (use --force to overwrite)",
            paths.state.display()
        );
    }

    if !paths.config.exists() {
        StakingConfig::default()
            .save(paths.config)
            .context("Failed to write default config")?;
        println!("Wrote default config to {}", paths.config.display());
    }

    Snapshot::default().save(paths.state)?;
    println!("Initialized empty ledger at {}", paths.state.display());
    Ok(())
}

/// Credit a simulated external balance.
pub fn fund(paths: &Paths, address: &str, amount: &str) -> Result<()> {
    let account = parse_address(address)?;
    let amount = parse_amount(amount)?;

    let balance = mutate(paths, |ledger| {
        ledger.bank_mut().fund(&account, amount)?;
        Ok(ledger.bank().balance_of(&account))
    })?;

    println!("Funded {} with {}", account, format_tokens(amount));
    println!("Balance: {}", format_tokens(balance));
    Ok(())
}

/// Explicit stake call, or a bare transfer when `via_transfer` is set.
pub fn stake(paths: &Paths, address: &str, amount: &str, via_transfer: bool) -> Result<()> {
    let account = parse_address(address)?;
    let amount = parse_amount(amount)?;

    let (stake, is_validator) = mutate(paths, |ledger| {
        if via_transfer {
            ledger.receive_transfer(&account, amount)?;
        } else {
            ledger.stake(&account, amount)?;
        }
        Ok((ledger.account_stake(&account), ledger.is_validator(&account)))
    })?;

    println!("Staked {} from {}", format_tokens(amount), account);
    println!("Stake: {}", format_tokens(stake));
    println!("Validator: {}", is_validator);
    Ok(())
}

pub fn unstake(paths: &Paths, address: &str) -> Result<()> {
    let account = parse_address(address)?;
    let refunded = mutate(paths, |ledger| Ok(ledger.unstake(&account)?))?;

    println!("Unstaked {} to {}", format_tokens(refunded), account);
    Ok(())
}

pub fn status(paths: &Paths) -> Result<()> {
    let ledger = open(paths)?;
    let params = ledger.params();

    println!();
    println!("=== Staking Ledger ===");
    println!("Staked amount: {}", format_tokens(ledger.staked_amount()));
    println!("               {} units", ledger.staked_amount());
    println!("Custody:       {}", format_tokens(ledger.bank().custody()));
    println!("Validators:    {}", ledger.validators().len());
    println!(
        "Threshold:     {}",
        format_tokens(params.minimum_stake_threshold)
    );
    println!("Minimum set:   {}", params.minimum_required_num_validators);
    println!("Events:        {}", ledger.events().0.len());
    println!();
    Ok(())
}

pub fn validators(paths: &Paths) -> Result<()> {
    let ledger = open(paths)?;
    let validators = ledger.validators();
    if validators.is_empty() {
        println!("No validators");
        return Ok(());
    }

    for (i, account) in validators.iter().enumerate() {
        println!(
            "{:>3}  {}  {}",
            i,
            account,
            format_tokens(ledger.account_stake(account))
        );
    }
    Ok(())
}

pub fn stake_of(paths: &Paths, address: &str) -> Result<()> {
    let account = parse_address(address)?;
    let ledger = open(paths)?;
    println!("{}", ledger.account_stake(&account));
    Ok(())
}

pub fn is_validator(paths: &Paths, address: &str) -> Result<()> {
    let account = parse_address(address)?;
    let ledger = open(paths)?;
    println!("{}", ledger.is_validator(&account));
    Ok(())
}

pub fn balance(paths: &Paths, address: &str) -> Result<()> {
    let account = parse_address(address)?;
    let ledger = open(paths)?;
    let balance = ledger.bank().balance_of(&account);
    println!("{} ({} units)", format_tokens(balance), balance);
    Ok(())
}

pub fn events(paths: &Paths) -> Result<()> {
    let ledger = open(paths)?;
    for event in ledger.events().0.events() {
        println!("{}", event);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bth_staking_core::UNITS_PER_TOKEN;

    fn addr(i: u64) -> String {
        Address::from_index(i).to_string()
    }

    #[test]
    fn test_init_fund_stake_unstake() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("staking.toml");
        let state = dir.path().join("staking-state.json");
        let paths = Paths {
            config: &config,
            state: &state,
        };

        init(&paths, false).unwrap();
        assert!(config.exists());
        assert!(init(&paths, false).is_err());

        for i in 0..5 {
            fund(&paths, &addr(i), "2tok").unwrap();
            stake(&paths, &addr(i), "1tok", i % 2 == 1).unwrap();
        }

        unstake(&paths, &addr(0)).unwrap();
        let err = unstake(&paths, &addr(1)).unwrap_err();
        assert!(err
            .to_string()
            .contains("Validators can't be less than MINIMUM_REQUIRED_NUM_VALIDATORS"));

        let ledger = open(&paths).unwrap();
        assert_eq!(
            ledger.validators(),
            vec![
                Address::from_index(4),
                Address::from_index(1),
                Address::from_index(2),
                Address::from_index(3)
            ]
        );
        assert_eq!(
            ledger.bank().balance_of(&Address::from_index(0)),
            2 * UNITS_PER_TOKEN
        );
        assert_eq!(ledger.events().0.len(), 6);
    }

    #[test]
    fn test_failed_command_leaves_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("staking.toml");
        let state = dir.path().join("staking-state.json");
        let paths = Paths {
            config: &config,
            state: &state,
        };

        init(&paths, false).unwrap();
        let before = std::fs::read_to_string(&state).unwrap();

        assert!(stake(&paths, &addr(9), "1tok", false).is_err());
        assert!(unstake(&paths, &addr(9)).is_err());

        assert_eq!(std::fs::read_to_string(&state).unwrap(), before);
    }
}
