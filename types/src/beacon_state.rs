use ssz::{impl_ssz_container, ContiguousList, PushError};
use typenum::Unsigned;

use crate::{
    consts::{EpochsPerHistoricalVector, SlotsPerHistoricalRoot, ValidatorRegistryLimit},
    containers::{
        BeaconBlockHeader, Eth1Data, ExecutionCheckpoints, ExecutionPayloadHeader, Fork,
        Validator,
    },
    primitives::{
        DepositIndex, Gwei, PublicKeyBytes, Slot, ValidatorIndex, WithdrawalIndex, H256,
    },
};

pub type HistoricalRoots = ContiguousList<H256, SlotsPerHistoricalRoot>;
pub type RandaoMixes = ContiguousList<H256, EpochsPerHistoricalVector>;
pub type Validators = ContiguousList<Validator, ValidatorRegistryLimit>;
pub type Balances = ContiguousList<Gwei, ValidatorRegistryLimit>;

/// The beacon state as maintained by the state transition.
///
/// `block_roots`, `state_roots` and `randao_mixes` are lists used as ring buffers.
/// They grow until they reach their limit and are overwritten in place afterwards.
/// See [`write_ring`].
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct BeaconState {
    pub genesis_validators_root: H256,
    pub slot: Slot,
    pub fork: Fork,
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: HistoricalRoots,
    pub state_roots: HistoricalRoots,
    pub eth1_data: Eth1Data,
    pub eth1_deposit_index: DepositIndex,
    pub latest_execution_payload_header: ExecutionPayloadHeader,
    pub validators: Validators,
    pub balances: Balances,
    pub randao_mixes: RandaoMixes,
    pub next_withdrawal_index: WithdrawalIndex,
    pub next_withdrawal_validator_index: ValidatorIndex,
    pub execution_checkpoints: ExecutionCheckpoints,
}

impl_ssz_container! {
    BeaconState {
        genesis_validators_root: H256,
        slot: Slot,
        fork: Fork,
        latest_block_header: BeaconBlockHeader,
        block_roots: HistoricalRoots,
        state_roots: HistoricalRoots,
        eth1_data: Eth1Data,
        eth1_deposit_index: DepositIndex,
        latest_execution_payload_header: ExecutionPayloadHeader,
        validators: Validators,
        balances: Balances,
        randao_mixes: RandaoMixes,
        next_withdrawal_index: WithdrawalIndex,
        next_withdrawal_validator_index: ValidatorIndex,
        execution_checkpoints: ExecutionCheckpoints,
    }
}

impl BeaconState {
    pub fn block_root_at(&self, slot: Slot) -> Option<H256> {
        read_ring(&self.block_roots, slot)
    }

    pub fn state_root_at(&self, slot: Slot) -> Option<H256> {
        read_ring(&self.state_roots, slot)
    }

    pub fn randao_mix_at(&self, index: u64) -> Option<H256> {
        read_ring(&self.randao_mixes, index)
    }

    pub fn validator_index(&self, pubkey: &PublicKeyBytes) -> Option<ValidatorIndex> {
        self.validators
            .iter()
            .position(|validator| validator.pubkey == *pubkey)
            .map(|position| position as ValidatorIndex)
    }
}

/// Stores `value` at `index % N`.
///
/// Indices are expected to be written in increasing order, so the slot being written either
/// already exists or is the next one to be appended.
pub fn write_ring<T, N: Unsigned>(
    list: &mut ContiguousList<T, N>,
    index: u64,
    value: T,
) -> Result<(), PushError> {
    let position = ring_position::<N>(index);

    if let Some(existing) = list.get_mut(position) {
        *existing = value;
        return Ok(());
    }

    list.push(value)
}

pub fn read_ring<T: Copy, N: Unsigned>(list: &ContiguousList<T, N>, index: u64) -> Option<T> {
    list.get(ring_position::<N>(index)).copied()
}

// `N` never exceeds the largest list limit, which fits in `usize` on 64-bit targets.
#[expect(clippy::cast_possible_truncation)]
const fn ring_position<N: Unsigned>(index: u64) -> usize {
    (index % N::U64) as usize
}
