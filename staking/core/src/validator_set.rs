// Copyright (c) 2024 The Botho Foundation

//! Ordered validator set with O(1) membership and swap-remove.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::Address;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorSetError {
    #[error("Duplicate validator: {0}")]
    Duplicate(Address),
}

/// Validators in insertion order, indexed by address.
///
/// Removal moves the last member into the vacated slot, so order is
/// preserved for every member except the one formerly last.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Address>", into = "Vec<Address>")]
pub struct ValidatorSet {
    members: Vec<Address>,
    index: HashMap<Address, usize>,
}

impl ValidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, account: &Address) -> bool {
        self.index.contains_key(account)
    }

    /// Position of `account` in the ordered sequence.
    pub fn position(&self, account: &Address) -> Option<usize> {
        self.index.get(account).copied()
    }

    pub fn as_slice(&self) -> &[Address] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.members.iter()
    }

    /// Append `account` at the end. Returns false if already a member.
    pub fn push(&mut self, account: Address) -> bool {
        if self.contains(&account) {
            return false;
        }
        self.index.insert(account, self.members.len());
        self.members.push(account);
        true
    }

    /// Swap-remove `account`. Returns false if it was not a member.
    pub fn swap_remove(&mut self, account: &Address) -> bool {
        let Some(position) = self.index.remove(account) else {
            return false;
        };

        self.members.swap_remove(position);
        if let Some(moved) = self.members.get(position) {
            self.index.insert(*moved, position);
        }
        true
    }
}

impl PartialEq for ValidatorSet {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for ValidatorSet {}

impl TryFrom<Vec<Address>> for ValidatorSet {
    type Error = ValidatorSetError;

    fn try_from(members: Vec<Address>) -> Result<Self, Self::Error> {
        let mut set = Self::new();
        for account in members {
            if !set.push(account) {
                return Err(ValidatorSetError::Duplicate(account));
            }
        }
        Ok(set)
    }
}

impl From<ValidatorSet> for Vec<Address> {
    fn from(set: ValidatorSet) -> Self {
        set.members
    }
}
