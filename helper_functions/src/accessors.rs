use anyhow::Result;
use types::{
    beacon_state::BeaconState,
    config::Config,
    consts::MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP,
    containers::{Validator, Withdrawal},
    primitives::{Epoch, ValidatorIndex},
};

use crate::{
    error::Error,
    misc::{compute_epoch_at_slot, withdrawal_address},
    predicates::{is_fully_withdrawable_validator, is_partially_withdrawable_validator},
};

#[must_use]
pub const fn get_current_epoch(state: &BeaconState) -> Epoch {
    compute_epoch_at_slot(state.slot)
}

pub fn validator(state: &BeaconState, validator_index: ValidatorIndex) -> Result<&Validator> {
    usize::try_from(validator_index)
        .ok()
        .and_then(|index| state.validators.get(index))
        .ok_or_else(|| {
            Error::ValidatorIndexOutOfBounds {
                index: validator_index,
            }
            .into()
        })
}

/// Withdrawals the execution payload of the next block must contain.
///
/// Sweeps validators starting at `state.next_withdrawal_validator_index`, wrapping around the
/// registry, until either the sweep limit or the per-payload limit is reached.
pub fn get_expected_withdrawals(config: &Config, state: &BeaconState) -> Result<Vec<Withdrawal>> {
    let epoch = get_current_epoch(state);
    let total_validators = state.validators.len_u64();
    let bound = total_validators.min(MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP);
    let max_withdrawals = usize::try_from(config.max_withdrawals_per_payload)?;

    let mut withdrawal_index = state.next_withdrawal_index;
    let mut validator_index = state.next_withdrawal_validator_index;
    let mut withdrawals = vec![];

    for _ in 0..bound {
        let validator = validator(state, validator_index)?;
        let balance = usize::try_from(validator_index)
            .ok()
            .and_then(|index| state.balances.get(index).copied())
            .ok_or(Error::ValidatorIndexOutOfBounds {
                index: validator_index,
            })?;
        let address = withdrawal_address(validator);

        let amount = if is_fully_withdrawable_validator(validator, balance, epoch) {
            Some(balance)
        } else if is_partially_withdrawable_validator(config, validator, balance) {
            Some(balance - config.max_effective_balance)
        } else {
            None
        };

        if let Some(amount) = amount {
            withdrawals.push(Withdrawal {
                index: withdrawal_index,
                validator_index,
                address,
                amount,
            });

            withdrawal_index = withdrawal_index
                .checked_add(1)
                .ok_or(Error::WithdrawalIndexOverflow)?;
        }

        if withdrawals.len() == max_withdrawals {
            break;
        }

        validator_index = validator_index
            .checked_add(1)
            .ok_or(Error::ValidatorIndexOverflow)?
            % total_validators;
    }

    Ok(withdrawals)
}
