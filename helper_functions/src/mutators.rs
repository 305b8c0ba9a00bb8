use anyhow::Result;
use types::{
    beacon_state::BeaconState,
    consts::{FAR_FUTURE_EPOCH, MIN_VALIDATOR_WITHDRAWABILITY_DELAY},
    primitives::{Gwei, ValidatorIndex},
};

use crate::{accessors::get_current_epoch, error::Error};

pub fn balance(state: &mut BeaconState, validator_index: ValidatorIndex) -> Result<&mut Gwei> {
    usize::try_from(validator_index)
        .ok()
        .and_then(|index| state.balances.get_mut(index))
        .ok_or_else(|| {
            Error::ValidatorIndexOutOfBounds {
                index: validator_index,
            }
            .into()
        })
}

#[inline]
pub fn increase_balance(balance: &mut Gwei, delta: Gwei) {
    *balance += delta;
}

#[inline]
pub fn decrease_balance(balance: &mut Gwei, delta: Gwei) {
    *balance = balance.saturating_sub(delta);
}

/// Schedules the exit of a validator for the next epoch.
///
/// Returns `false` if the validator has already initiated an exit.
pub fn initiate_validator_exit(
    state: &mut BeaconState,
    validator_index: ValidatorIndex,
) -> Result<bool> {
    let exit_epoch = get_current_epoch(state) + 1;

    let validator = usize::try_from(validator_index)
        .ok()
        .and_then(|index| state.validators.get_mut(index))
        .ok_or(Error::ValidatorIndexOutOfBounds {
            index: validator_index,
        })?;

    if validator.exit_epoch != FAR_FUTURE_EPOCH {
        return Ok(false);
    }

    validator.exit_epoch = exit_epoch;
    validator.withdrawable_epoch = exit_epoch + MIN_VALIDATOR_WITHDRAWABILITY_DELAY;

    Ok(true)
}
