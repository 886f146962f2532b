// Copyright (c) 2024 The Botho Foundation

//! Validator staking ledger CLI
//!
//! Drives a staking ledger persisted to a local JSON state file, with
//! simulated account balances standing in for the value-transfer boundary.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod amount;
mod commands;
mod store;

use commands::Paths;

/// Stake, unstake and inspect the validator set
#[derive(Parser, Debug)]
#[command(name = "bth-staking")]
#[command(about = "Validator staking ledger", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "staking.toml")]
    config: PathBuf,

    /// Path to ledger state file
    #[arg(short, long, global = true, default_value = "staking-state.json")]
    state: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a default config and an empty ledger
    Init {
        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Credit a simulated account balance
    Fund {
        address: String,
        /// Amount in units, or tokens with a `tok` suffix (e.g. 1.5tok)
        amount: String,
    },

    /// Stake from an account
    Stake {
        address: String,
        /// Amount in units, or tokens with a `tok` suffix (e.g. 1.5tok)
        amount: String,
    },

    /// Send value directly to the ledger (staked on behalf of the sender)
    Transfer {
        address: String,
        /// Amount in units, or tokens with a `tok` suffix (e.g. 1.5tok)
        amount: String,
    },

    /// Withdraw an account's entire stake
    Unstake { address: String },

    /// Show ledger totals and parameters
    Status,

    /// List validators in order
    Validators,

    /// Show an account's stake in units
    StakeOf { address: String },

    /// Show whether an account is a validator
    IsValidator { address: String },

    /// Show an account's simulated balance
    Balance { address: String },

    /// Show emitted events
    Events,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let paths = Paths {
        config: &cli.config,
        state: &cli.state,
    };

    match cli.command {
        Commands::Init { force } => commands::init(&paths, force),
        Commands::Fund { address, amount } => commands::fund(&paths, &address, &amount),
        Commands::Stake { address, amount } => commands::stake(&paths, &address, &amount, false),
        Commands::Transfer { address, amount } => {
            commands::stake(&paths, &address, &amount, true)
        }
        Commands::Unstake { address } => commands::unstake(&paths, &address),
        Commands::Status => commands::status(&paths),
        Commands::Validators => commands::validators(&paths),
        Commands::StakeOf { address } => commands::stake_of(&paths, &address),
        Commands::IsValidator { address } => commands::is_validator(&paths, &address),
        Commands::Balance { address } => commands::balance(&paths, &address),
        Commands::Events => commands::events(&paths),
    }
}
