// Copyright (c) 2024 The Botho Foundation

//! Staking configuration types.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

use crate::{Amount, UNITS_PER_TOKEN};

/// TOML integers are 64-bit signed, so amounts are written as decimal
/// strings and read back from either form.
mod amount_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::Amount;

    pub fn serialize<S>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(u64),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Int(value) => Ok(value as Amount),
            Repr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config from {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write config to {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main staking configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Ledger parameters
    #[serde(default)]
    pub staking: StakingParams,
}

/// Parameters governing validator promotion and removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParams {
    /// Stake (in smallest units) at or above which an account becomes a
    /// validator
    #[serde(
        default = "default_minimum_stake_threshold",
        with = "amount_serde"
    )]
    pub minimum_stake_threshold: Amount,

    /// Validators can only be removed while the set is larger than this
    #[serde(default = "default_minimum_required_num_validators")]
    pub minimum_required_num_validators: usize,
}

fn default_minimum_stake_threshold() -> Amount {
    UNITS_PER_TOKEN // 1 token
}

fn default_minimum_required_num_validators() -> usize {
    4
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            minimum_stake_threshold: default_minimum_stake_threshold(),
            minimum_required_num_validators: default_minimum_required_num_validators(),
        }
    }
}

impl StakingConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.staking.minimum_stake_threshold == 0 {
            return Err(ConfigError::Invalid(
                "minimum_stake_threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
