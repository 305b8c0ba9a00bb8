use anyhow::{ensure, Result};
use ssz::{Merkleizer, SszHash as _};
use types::{
    beacon_state::{self, BeaconState},
    consts::SLOTS_PER_EPOCH,
    primitives::Slot,
};

use crate::{epoch_processing, Context, Error};

pub fn process_slots<E>(context: &Context<'_, E>, state: &mut BeaconState, slot: Slot) -> Result<()> {
    ensure!(
        state.slot < slot,
        Error::SlotNotLater {
            state_slot: state.slot,
            target_slot: slot,
        },
    );

    while state.slot < slot {
        context.ensure_not_cancelled()?;

        process_slot(context.merkleizer, state)?;

        // > Process epoch on the start slot of the next epoch
        if (state.slot + 1) % SLOTS_PER_EPOCH == 0 {
            epoch_processing::process_epoch(state)?;
        }

        state.slot += 1;
    }

    Ok(())
}

pub fn process_slot(merkleizer: &Merkleizer, state: &mut BeaconState) -> Result<()> {
    let slot = state.slot;

    // > Cache state root
    let previous_state_root = state.hash_tree_root(merkleizer);
    beacon_state::write_ring(&mut state.state_roots, slot, previous_state_root)?;

    // > Cache latest block header state root
    if state.latest_block_header.state_root.is_zero() {
        state.latest_block_header.state_root = previous_state_root;
    }

    // > Cache block root
    let previous_block_root = state.latest_block_header.hash_tree_root(merkleizer);
    beacon_state::write_ring(&mut state.block_roots, slot, previous_block_root)?;

    Ok(())
}
