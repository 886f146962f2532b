// Copyright (c) 2024 The Botho Foundation

//! The staking ledger: stake records, aggregate stake and the validator set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::{
    Address, Amount, EventSink, StakingError, StakingEvent, StakingParams, ValidatorSet,
    ValueTransfer,
};

/// Persistent ledger state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingState {
    /// Sum of all stake records
    #[serde(default)]
    staked_amount: Amount,

    /// Stake per account; fully unstaked accounts keep a zero record
    #[serde(default)]
    stakes: BTreeMap<Address, Amount>,

    /// Active validators in promotion order
    #[serde(default)]
    validators: ValidatorSet,
}

impl StakingState {
    pub fn staked_amount(&self) -> Amount {
        self.staked_amount
    }

    pub fn stake_of(&self, account: &Address) -> Amount {
        self.stakes.get(account).copied().unwrap_or_default()
    }

    pub fn stakes(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.stakes.iter()
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    /// Check the state against the ledger invariants: stake records sum to
    /// the aggregate, and validators are exactly the accounts at or above
    /// the threshold.
    pub fn check(&self, params: &StakingParams) -> Result<(), String> {
        let sum = self
            .stakes
            .values()
            .try_fold(0 as Amount, |acc, amount| acc.checked_add(*amount))
            .ok_or_else(|| "Stake records overflow".to_string())?;
        if sum != self.staked_amount {
            return Err(format!(
                "Stake records sum to {} but staked amount is {}",
                sum, self.staked_amount
            ));
        }

        for account in self.validators.iter() {
            if self.stake_of(account) < params.minimum_stake_threshold {
                return Err(format!("Validator {} is below the stake threshold", account));
            }
        }

        for (account, amount) in &self.stakes {
            if *amount >= params.minimum_stake_threshold && !self.validators.contains(account) {
                return Err(format!("Account {} qualifies but is not a validator", account));
            }
        }

        Ok(())
    }
}

/// Tracks stake deposits and derives the validator set from them.
///
/// Every mutating operation checks its preconditions and performs the value
/// transfer before touching ledger state, so a failed operation leaves no
/// trace and emits no event.
#[derive(Debug)]
pub struct StakingLedger<B, S> {
    params: StakingParams,
    state: StakingState,
    bank: B,
    events: S,
}

impl<B: ValueTransfer, S: EventSink> StakingLedger<B, S> {
    /// Create an empty ledger.
    pub fn new(params: StakingParams, bank: B, events: S) -> Self {
        Self::from_state(params, StakingState::default(), bank, events)
    }

    /// Resume a ledger from previously saved state.
    pub fn from_state(params: StakingParams, state: StakingState, bank: B, events: S) -> Self {
        Self {
            params,
            state,
            bank,
            events,
        }
    }

    /// Stake `amount` on behalf of `caller`.
    ///
    /// A zero amount is accepted as a no-op and emits nothing.
    pub fn stake(&mut self, caller: &Address, amount: Amount) -> Result<(), StakingError> {
        self.credit_stake(caller, amount)
    }

    /// Handle a bare value transfer to the ledger. Identical to [`Self::stake`].
    pub fn receive_transfer(&mut self, sender: &Address, amount: Amount) -> Result<(), StakingError> {
        self.credit_stake(sender, amount)
    }

    fn credit_stake(&mut self, account: &Address, amount: Amount) -> Result<(), StakingError> {
        if amount == 0 {
            debug!(%account, "Ignoring zero-value stake");
            return Ok(());
        }

        let updated = self
            .account_stake(account)
            .checked_add(amount)
            .ok_or(StakingError::AmountOverflow)?;
        let total = self
            .state
            .staked_amount
            .checked_add(amount)
            .ok_or(StakingError::AmountOverflow)?;

        self.bank.collect(account, amount)?;

        self.state.stakes.insert(*account, updated);
        self.state.staked_amount = total;
        debug!(%account, amount = %amount, stake = %updated, "Stake credited");

        if updated >= self.params.minimum_stake_threshold && self.state.validators.push(*account) {
            debug!(
                %account,
                validators = self.state.validators.len(),
                "Account promoted to validator"
            );
        }

        self.events.emit(StakingEvent::Staked {
            account: *account,
            amount,
        });
        Ok(())
    }

    /// Withdraw the caller's entire stake. Returns the refunded amount.
    pub fn unstake(&mut self, caller: &Address) -> Result<Amount, StakingError> {
        let amount = self.account_stake(caller);
        if amount == 0 {
            warn!(account = %caller, "Unstake rejected: not a staker");
            return Err(StakingError::NotAStaker);
        }

        let is_validator = self.state.validators.contains(caller);
        if is_validator
            && self.state.validators.len() <= self.params.minimum_required_num_validators
        {
            warn!(
                account = %caller,
                validators = self.state.validators.len(),
                minimum = self.params.minimum_required_num_validators,
                "Unstake rejected: validator floor reached"
            );
            return Err(StakingError::ValidatorFloorViolation);
        }

        // Unreachable for state that passes `StakingState::check`.
        let total = self.state.staked_amount.checked_sub(amount).ok_or(
            StakingError::InconsistentState {
                staked_amount: self.state.staked_amount,
                stake: amount,
            },
        )?;

        self.bank.refund(caller, amount)?;

        self.state.stakes.insert(*caller, 0);
        self.state.staked_amount = total;
        debug!(account = %caller, amount = %amount, "Stake refunded");

        if is_validator {
            self.state.validators.swap_remove(caller);
            debug!(
                account = %caller,
                validators = self.state.validators.len(),
                "Validator removed"
            );
        }

        self.events.emit(StakingEvent::Unstaked {
            account: *caller,
            amount,
        });
        Ok(amount)
    }
}

impl<B, S> StakingLedger<B, S> {
    /// Aggregate stake across all accounts.
    pub fn staked_amount(&self) -> Amount {
        self.state.staked_amount
    }

    /// Snapshot of the current validators, in order.
    pub fn validators(&self) -> Vec<Address> {
        self.state.validators.as_slice().to_vec()
    }

    pub fn is_validator(&self, account: &Address) -> bool {
        self.state.validators.contains(account)
    }

    /// Stake held by `account`, zero if it never staked.
    pub fn account_stake(&self, account: &Address) -> Amount {
        self.state.stake_of(account)
    }

    pub fn params(&self) -> &StakingParams {
        &self.params
    }

    pub fn state(&self) -> &StakingState {
        &self.state
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub fn events(&self) -> &S {
        &self.events
    }

    pub fn into_parts(self) -> (StakingState, B, S) {
        (self.state, self.bank, self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventLog, InMemoryBank, TransferError, UNITS_PER_TOKEN};
    use assert_matches::assert_matches;

    const ONE: Amount = UNITS_PER_TOKEN;

    type TestLedger = StakingLedger<InMemoryBank, EventLog>;

    fn ledger_with_funded(accounts: u64) -> (TestLedger, Vec<Address>) {
        let mut bank = InMemoryBank::new();
        let addrs: Vec<Address> = (1..=accounts).map(Address::from_index).collect();
        for a in &addrs {
            bank.fund(a, 100 * ONE).unwrap();
        }
        (
            StakingLedger::new(StakingParams::default(), bank, EventLog::new()),
            addrs,
        )
    }

    #[test]
    fn test_initial_state() {
        let (ledger, addrs) = ledger_with_funded(1);
        assert_eq!(ledger.staked_amount(), 0);
        assert!(ledger.validators().is_empty());
        assert!(!ledger.is_validator(&addrs[0]));
        assert_eq!(ledger.account_stake(&addrs[0]), 0);
    }

    #[test]
    fn test_stake_accumulates_until_threshold() {
        let (mut ledger, addrs) = ledger_with_funded(1);
        let a = addrs[0];

        ledger.stake(&a, ONE / 2).unwrap();
        assert!(!ledger.is_validator(&a));

        ledger.stake(&a, ONE / 2).unwrap();
        assert!(ledger.is_validator(&a));
        assert_eq!(ledger.account_stake(&a), ONE);
        assert_eq!(ledger.validators(), vec![a]);
        assert_eq!(ledger.events().len(), 2);

        // Further stake doesn't duplicate the entry
        ledger.stake(&a, ONE).unwrap();
        assert_eq!(ledger.validators(), vec![a]);
        assert_eq!(ledger.staked_amount(), 2 * ONE);
    }

    #[test]
    fn test_zero_stake_is_noop() {
        let (mut ledger, addrs) = ledger_with_funded(1);
        ledger.stake(&addrs[0], 0).unwrap();

        assert_eq!(ledger.staked_amount(), 0);
        assert!(ledger.events().is_empty());
        assert_eq!(ledger.state(), &StakingState::default());
    }

    #[test]
    fn test_failed_collect_is_atomic() {
        let (mut ledger, addrs) = ledger_with_funded(1);
        let err = ledger.stake(&addrs[0], 101 * ONE).unwrap_err();

        assert_matches!(
            err,
            StakingError::Transfer(TransferError::InsufficientBalance { .. })
        );
        assert_eq!(ledger.staked_amount(), 0);
        assert_eq!(ledger.account_stake(&addrs[0]), 0);
        assert!(ledger.events().is_empty());
        assert_eq!(ledger.bank().balance_of(&addrs[0]), 100 * ONE);
    }

    #[test]
    fn test_overflow_rejected_before_transfer() {
        let mut bank = InMemoryBank::new();
        let a = Address::from_index(1);
        bank.fund(&a, Amount::MAX).unwrap();
        let mut ledger = StakingLedger::new(StakingParams::default(), bank, EventLog::new());

        ledger.stake(&a, Amount::MAX).unwrap();
        ledger.bank_mut().fund(&a, 1).unwrap();

        assert_matches!(ledger.stake(&a, 1), Err(StakingError::AmountOverflow));
        assert_eq!(ledger.bank().balance_of(&a), 1);
        assert_eq!(ledger.events().len(), 1);
    }

    #[test]
    fn test_failed_refund_is_atomic() {
        let (mut ledger, addrs) = ledger_with_funded(1);
        ledger.stake(&addrs[0], ONE).unwrap();

        let (state, _, events) = ledger.into_parts();
        let mut ledger = StakingLedger::from_state(
            StakingParams::default(),
            state.clone(),
            InMemoryBank::new(),
            events,
        );

        assert_matches!(
            ledger.unstake(&addrs[0]),
            Err(StakingError::Transfer(TransferError::InsufficientCustody { .. }))
        );
        assert_eq!(ledger.state(), &state);
        assert_eq!(ledger.events().len(), 1);
        assert_eq!(ledger.bank().balance_of(&addrs[0]), 0);
    }

    #[test]
    fn test_unstake_rejects_inconsistent_aggregate() {
        let a = Address::from_index(1);
        let mut state = StakingState::default();
        state.stakes.insert(a, ONE / 2);
        state.staked_amount = ONE / 4;

        let mut ledger = StakingLedger::from_state(
            StakingParams::default(),
            state.clone(),
            InMemoryBank::new(),
            EventLog::new(),
        );

        assert_matches!(
            ledger.unstake(&a),
            Err(StakingError::InconsistentState { staked_amount, stake })
                if staked_amount == ONE / 4 && stake == ONE / 2
        );
        assert_eq!(ledger.state(), &state);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_below_threshold_staker_can_always_unstake() {
        let (mut ledger, addrs) = ledger_with_funded(1);
        let a = addrs[0];

        ledger.stake(&a, ONE / 2).unwrap();
        assert_eq!(ledger.unstake(&a).unwrap(), ONE / 2);
        assert_eq!(ledger.account_stake(&a), 0);
        assert_eq!(ledger.bank().balance_of(&a), 100 * ONE);
        assert_eq!(
            ledger.events().last(),
            Some(&StakingEvent::Unstaked {
                account: a,
                amount: ONE / 2
            })
        );
    }

    #[test]
    fn test_single_validator_cannot_leave() {
        let (mut ledger, addrs) = ledger_with_funded(1);
        ledger.stake(&addrs[0], ONE).unwrap();

        assert_matches!(
            ledger.unstake(&addrs[0]),
            Err(StakingError::ValidatorFloorViolation)
        );
        assert!(ledger.is_validator(&addrs[0]));
    }

    #[test]
    fn test_unstaked_account_rejoins_at_end() {
        let (mut ledger, addrs) = ledger_with_funded(6);
        for a in &addrs {
            ledger.stake(a, ONE).unwrap();
        }

        ledger.unstake(&addrs[0]).unwrap();
        ledger.stake(&addrs[0], ONE).unwrap();

        assert_eq!(
            ledger.validators(),
            vec![addrs[5], addrs[1], addrs[2], addrs[3], addrs[4], addrs[0]]
        );
        assert!(ledger.state().check(ledger.params()).is_ok());
    }

    #[test]
    fn test_custom_floor() {
        let params = StakingParams {
            minimum_stake_threshold: 10,
            minimum_required_num_validators: 1,
        };
        let mut bank = InMemoryBank::new();
        let a = Address::from_index(1);
        let b = Address::from_index(2);
        bank.fund(&a, 10).unwrap();
        bank.fund(&b, 10).unwrap();
        let mut ledger = StakingLedger::new(params, bank, ());

        ledger.stake(&a, 10).unwrap();
        ledger.stake(&b, 10).unwrap();
        assert_eq!(ledger.unstake(&a).unwrap(), 10);
        assert_matches!(ledger.unstake(&b), Err(StakingError::ValidatorFloorViolation));
        assert_eq!(ledger.validators(), vec![b]);
    }

    #[test]
    fn test_state_check_detects_mismatch() {
        let params = StakingParams::default();
        let mut state = StakingState::default();
        state.stakes.insert(Address::from_index(1), ONE);
        assert!(state.check(&params).is_err());

        state.staked_amount = ONE;
        assert!(state.check(&params).is_err());

        state.validators.push(Address::from_index(1));
        assert!(state.check(&params).is_ok());
    }

    #[test]
    fn test_resume_from_state() {
        let (mut ledger, addrs) = ledger_with_funded(2);
        ledger.stake(&addrs[0], ONE).unwrap();
        ledger.stake(&addrs[1], ONE / 4).unwrap();

        let (state, bank, _) = ledger.into_parts();
        let json = serde_json::to_string(&state).unwrap();
        let restored: StakingState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);

        let resumed = StakingLedger::from_state(StakingParams::default(), restored, bank, ());
        assert_eq!(resumed.validators(), vec![addrs[0]]);
        assert_eq!(resumed.account_stake(&addrs[1]), ONE / 4);
        assert_eq!(resumed.staked_amount(), ONE + ONE / 4);
    }
}
