use anyhow::Result;
use helper_functions::{accessors::get_current_epoch, mutators, predicates::is_active_validator};
use types::{
    beacon_state::{self, BeaconState},
    config::Config,
    consts::FAR_FUTURE_EPOCH,
    nonstandard::ValidatorUpdate,
};

use crate::validator_updates::ValidatorUpdateSet;

/// Runs at the last slot of every epoch.
pub fn process_epoch(state: &mut BeaconState) -> Result<()> {
    process_randao_mixes_reset(state)
}

fn process_randao_mixes_reset(state: &mut BeaconState) -> Result<()> {
    let current_epoch = get_current_epoch(state);
    let mix = state.randao_mix_at(current_epoch).unwrap_or_default();

    // > Set randao mix
    beacon_state::write_ring(&mut state.randao_mixes, current_epoch, mix)?;
    beacon_state::write_ring(&mut state.randao_mixes, current_epoch + 1, mix)?;

    Ok(())
}

/// Recomputes effective balances and ejects validators whose balance dropped too low.
pub fn process_effective_balance_updates(
    config: &Config,
    state: &mut BeaconState,
    updates: &mut ValidatorUpdateSet,
) -> Result<()> {
    let current_epoch = get_current_epoch(state);
    let mut ejected = vec![];

    for ((validator_index, validator), balance) in (0..)
        .zip(state.validators.iter_mut())
        .zip(state.balances.iter().copied())
    {
        let effective_balance = config.effective_balance(balance);

        if effective_balance != validator.effective_balance {
            validator.effective_balance = effective_balance;

            updates.record(
                validator_index,
                ValidatorUpdate::BalanceChange {
                    pubkey: validator.pubkey,
                    effective_balance,
                },
            );
        }

        if is_active_validator(validator, current_epoch)
            && validator.exit_epoch == FAR_FUTURE_EPOCH
            && validator.effective_balance <= config.ejection_balance
        {
            ejected.push((validator_index, validator.pubkey));
        }
    }

    for (validator_index, pubkey) in ejected {
        if mutators::initiate_validator_exit(state, validator_index)? {
            updates.record(validator_index, ValidatorUpdate::Exit { pubkey });
        }
    }

    Ok(())
}
