use anyhow::Result;
use ssz::{Merkleizer, SszHash as _};
use types::{
    beacon_state::{self, BeaconState},
    config::Config,
    consts::GENESIS_SLOT,
    containers::{
        BeaconBlockBody, BeaconBlockHeader, Deposit, Eth1Data, ExecutionCheckpoints,
        ExecutionPayloadHeader, Fork,
    },
    primitives::H256,
};

use crate::{block_processing, validator_updates::ValidatorUpdateSet};

/// Builds the state at [`GENESIS_SLOT`] from the genesis deposits and execution block.
///
/// Genesis validators are active from the first epoch.
pub fn initialize_beacon_state(
    config: &Config,
    merkleizer: &Merkleizer,
    deposits: impl IntoIterator<Item = Deposit>,
    execution_payload_header: ExecutionPayloadHeader,
) -> Result<BeaconState> {
    let block_hash = execution_payload_header.block_hash;

    let mut state = BeaconState {
        slot: GENESIS_SLOT,
        fork: Fork {
            previous_version: config.genesis_fork_version,
            current_version: config.genesis_fork_version,
            epoch: 0,
        },
        latest_block_header: BeaconBlockHeader {
            body_root: BeaconBlockBody::default().hash_tree_root(merkleizer),
            ..BeaconBlockHeader::default()
        },
        latest_execution_payload_header: execution_payload_header,
        execution_checkpoints: ExecutionCheckpoints::at(block_hash),
        ..BeaconState::default()
    };

    // > Seed RANDAO with the execution block hash
    beacon_state::write_ring(&mut state.randao_mixes, 0, block_hash)?;

    // Activations are implied by the validator registry.
    let mut updates = ValidatorUpdateSet::default();

    for deposit in deposits {
        block_processing::process_deposit(config, &mut state, deposit, &mut updates)?;
    }

    state.eth1_data = Eth1Data {
        deposit_root: H256::zero(),
        deposit_count: state.eth1_deposit_index,
        block_hash,
    };

    state.genesis_validators_root = state.validators.hash_tree_root(merkleizer);

    Ok(state)
}

#[cfg(test)]
mod tests {
    use types::{consts::FAR_FUTURE_EPOCH, primitives::PublicKeyBytes};

    use super::*;

    #[test]
    fn genesis_validators_are_active_immediately() -> Result<()> {
        let config = Config::default();
        let merkleizer = Merkleizer::new();

        let deposits = (0..4).map(|index| Deposit {
            pubkey: PublicKeyBytes::from_low_u64_be(index),
            amount: config.max_effective_balance,
            index,
            ..Deposit::default()
        });

        let header = ExecutionPayloadHeader {
            block_hash: H256::repeat_byte(0xee),
            ..ExecutionPayloadHeader::default()
        };

        let state = initialize_beacon_state(&config, &merkleizer, deposits, header)?;

        assert_eq!(state.validators.len(), 4);
        assert_eq!(state.eth1_deposit_index, 4);
        assert_eq!(state.randao_mix_at(0), Some(H256::repeat_byte(0xee)));
        assert_eq!(
            state.execution_checkpoints.finalized,
            H256::repeat_byte(0xee),
        );
        assert!(state.validators.iter().all(|validator| {
            validator.activation_epoch == 0
                && validator.exit_epoch == FAR_FUTURE_EPOCH
                && validator.effective_balance == config.max_effective_balance
        }));

        Ok(())
    }
}
