use anyhow::{ensure, Result};
use execution_engine::{ExecutionEngine, NewPayloadRequest};
use helper_functions::{
    accessors::{self, get_current_epoch, get_expected_withdrawals},
    mutators::{balance, decrease_balance, increase_balance},
};
use itertools::izip;
use ssz::{Merkleizer, SszHash as _};
use tracing::warn;
use types::{
    beacon_state::{self, BeaconState},
    config::Config,
    consts::{FAR_FUTURE_EPOCH, MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP},
    containers::{
        BeaconBlock, BeaconBlockBody, BeaconBlockHeader, Deposit, ExecutionPayload, Validator,
        Withdrawal,
    },
    nonstandard::ValidatorUpdate,
    primitives::H256,
};

use crate::{validator_updates::ValidatorUpdateSet, Context, Error};

pub fn process_block_header(
    merkleizer: &Merkleizer,
    state: &mut BeaconState,
    block: &BeaconBlock,
) -> Result<()> {
    // > Verify that the slots match
    ensure!(
        block.slot == state.slot,
        Error::SlotMismatch {
            state_slot: state.slot,
            block_slot: block.slot,
        },
    );

    // > Verify that the block is newer than latest block header
    ensure!(
        block.slot > state.latest_block_header.slot,
        Error::BlockNotNewerThanLatestBlockHeader {
            block_slot: block.slot,
            block_header_slot: state.latest_block_header.slot,
        },
    );

    // > Verify that the parent matches
    let computed = state.latest_block_header.hash_tree_root(merkleizer);
    let in_block = block.parent_root;

    ensure!(
        computed == in_block,
        Error::ParentRootMismatch { computed, in_block },
    );

    // > Verify proposer is not slashed
    let index = block.proposer_index;

    ensure!(
        !accessors::validator(state, index)?.slashed,
        Error::ProposerSlashed { index },
    );

    // > Cache current block as the new latest block
    state.latest_block_header = BeaconBlockHeader {
        // > Overwritten in the next process_slot call
        state_root: H256::zero(),
        ..block.to_header(merkleizer)
    };

    Ok(())
}

pub fn process_withdrawals(
    config: &Config,
    state: &mut BeaconState,
    execution_payload: &ExecutionPayload,
) -> Result<()> {
    let expected_withdrawals = get_expected_withdrawals(config, state)?;
    let computed = expected_withdrawals.len();
    let in_block = execution_payload.withdrawals.len();

    ensure!(
        computed == in_block,
        Error::WithdrawalCountMismatch { computed, in_block },
    );

    for (computed, in_block) in izip!(
        expected_withdrawals.iter().copied(),
        execution_payload.withdrawals.iter().copied(),
    ) {
        ensure!(
            computed == in_block,
            Error::WithdrawalMismatch { computed, in_block },
        );

        let Withdrawal {
            amount,
            validator_index,
            ..
        } = computed;

        decrease_balance(balance(state, validator_index)?, amount);
    }

    // > Update the next withdrawal index if this block contained withdrawals
    if let Some(latest_withdrawal) = expected_withdrawals.last() {
        state.next_withdrawal_index = latest_withdrawal.index + 1;
    }

    let validator_count = state.validators.len_u64();

    if validator_count == 0 {
        return Ok(());
    }

    // > Update the next validator index to start the next withdrawal sweep
    let payload_full = expected_withdrawals.len() as u64 == config.max_withdrawals_per_payload;

    let next_index = match expected_withdrawals.last() {
        // > Next sweep starts after the latest withdrawal's validator index
        Some(latest_withdrawal) if payload_full => latest_withdrawal.validator_index + 1,
        // > Advance sweep by the max length of the sweep if there was not a full set of withdrawals
        _ => state.next_withdrawal_validator_index + MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP,
    };

    state.next_withdrawal_validator_index = next_index % validator_count;

    Ok(())
}

pub async fn process_execution_payload(
    context: &Context<'_, impl ExecutionEngine>,
    state: &mut BeaconState,
    block: &BeaconBlock,
) -> Result<()> {
    let payload = &block.body.execution_payload;

    // > Verify consistency of the parent hash with respect to the previous execution payload header
    let in_state = state.latest_execution_payload_header.block_hash;
    let in_block = payload.parent_hash;

    ensure!(
        in_state == in_block,
        Error::ExecutionPayloadParentHashMismatch { in_state, in_block },
    );

    // > Verify prev_randao
    let in_state = state
        .randao_mix_at(get_current_epoch(state))
        .unwrap_or_default();
    let in_block = payload.prev_randao;

    ensure!(
        in_state == in_block,
        Error::ExecutionPayloadPrevRandaoMismatch { in_state, in_block },
    );

    // > Verify timestamp
    let in_state = state.latest_execution_payload_header.timestamp;
    let in_block = payload.timestamp;

    ensure!(
        in_block > in_state,
        Error::ExecutionPayloadTimestampNotLater { in_state, in_block },
    );

    // > Verify the execution payload is valid
    let request = NewPayloadRequest::new(block, context.optimistic_engine);

    match context
        .execution_engine
        .verify_and_notify_new_payload(request)
        .await
    {
        Ok(()) => {}
        Err(error) if error.is_transient() && context.optimistic_engine => {
            warn!(
                "continuing optimistically with payload {:?} at block number {}: {error}",
                payload.block_hash, payload.block_number,
            );
        }
        Err(error) => return Err(error.into()),
    }

    // > Cache execution payload header
    state.latest_execution_payload_header = payload.to_header(context.merkleizer);

    Ok(())
}

pub fn process_randao(state: &mut BeaconState, body: &BeaconBlockBody) -> Result<()> {
    let epoch = get_current_epoch(state);

    // > Mix in RANDAO reveal
    let mix = state.randao_mix_at(epoch).unwrap_or_default()
        ^ hashing::hash_bytes(body.randao_reveal.as_bytes());

    beacon_state::write_ring(&mut state.randao_mixes, epoch, mix)?;

    Ok(())
}

pub fn process_eth1_data(state: &mut BeaconState, body: &BeaconBlockBody) {
    state.eth1_data = body.eth1_data;
}

pub fn process_deposits(
    config: &Config,
    state: &mut BeaconState,
    body: &BeaconBlockBody,
    updates: &mut ValidatorUpdateSet,
) -> Result<()> {
    let in_block = body.deposits.len_u64();
    let maximum = config.max_deposits_per_block;

    ensure!(
        in_block <= maximum,
        Error::TooManyDeposits { in_block, maximum },
    );

    for deposit in body.deposits.iter().copied() {
        process_deposit(config, state, deposit, updates)?;
    }

    Ok(())
}

pub fn process_deposit(
    config: &Config,
    state: &mut BeaconState,
    deposit: Deposit,
    updates: &mut ValidatorUpdateSet,
) -> Result<()> {
    // Deposits must be included in the order the deposit contract emitted them.
    let expected = state.eth1_deposit_index;
    let in_block = deposit.index;

    ensure!(
        expected == in_block,
        Error::DepositIndexMismatch { expected, in_block },
    );

    apply_deposit(config, state, deposit, updates)?;

    state.eth1_deposit_index += 1;

    Ok(())
}

fn apply_deposit(
    config: &Config,
    state: &mut BeaconState,
    deposit: Deposit,
    updates: &mut ValidatorUpdateSet,
) -> Result<()> {
    let Deposit {
        pubkey,
        withdrawal_credentials,
        amount,
        ..
    } = deposit;

    if let Some(validator_index) = state.validator_index(&pubkey) {
        // > Increase balance by deposit amount
        increase_balance(balance(state, validator_index)?, amount);
        return Ok(());
    }

    if amount < config.min_deposit_amount {
        warn!("ignoring deposit {} below minimum amount: {amount}", deposit.index);
        return Ok(());
    }

    let epoch = get_current_epoch(state);
    let effective_balance = config.effective_balance(amount);
    let validator_index = state.validators.len_u64();

    // > Add validator and balance entries
    state.validators.push(Validator {
        pubkey,
        withdrawal_credentials,
        effective_balance,
        slashed: false,
        activation_eligibility_epoch: epoch,
        activation_epoch: epoch,
        exit_epoch: FAR_FUTURE_EPOCH,
        withdrawable_epoch: FAR_FUTURE_EPOCH,
    })?;

    state.balances.push(amount)?;

    updates.record(
        validator_index,
        ValidatorUpdate::Activation {
            pubkey,
            effective_balance,
        },
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use ssz::ContiguousList;
    use types::{consts::ETH1_ADDRESS_WITHDRAWAL_PREFIX, primitives::PublicKeyBytes};

    use super::*;

    const GWEI: u64 = 1_000_000_000;

    fn deposit(index: u64, pubkey: u64, amount: u64) -> Deposit {
        Deposit {
            pubkey: PublicKeyBytes::from_low_u64_be(pubkey),
            amount: amount * GWEI,
            index,
            ..Deposit::default()
        }
    }

    fn body_with_deposits(deposits: Vec<Deposit>) -> BeaconBlockBody {
        BeaconBlockBody {
            deposits: ContiguousList::try_from(deposits).expect("deposit count is within limit"),
            ..BeaconBlockBody::default()
        }
    }

    #[test]
    fn deposits_create_and_top_up_validators() -> Result<()> {
        let config = Config::default();
        let mut state = BeaconState::default();
        let mut updates = ValidatorUpdateSet::default();

        let body = body_with_deposits(vec![
            deposit(0, 1, 32),
            deposit(1, 1, 1),
            deposit(2, 2, 0),
        ]);

        process_deposits(&config, &mut state, &body, &mut updates)?;

        assert_eq!(state.eth1_deposit_index, 3);
        assert_eq!(state.validators.len(), 1);
        assert_eq!(*state.balances, [33 * GWEI]);
        assert_eq!(
            updates.into_updates(),
            [ValidatorUpdate::Activation {
                pubkey: PublicKeyBytes::from_low_u64_be(1),
                effective_balance: 32 * GWEI,
            }],
        );

        Ok(())
    }

    #[test]
    fn deposits_must_continue_from_state_index() {
        let config = Config::default();
        let mut state = BeaconState {
            eth1_deposit_index: 4,
            ..BeaconState::default()
        };

        let error = process_deposits(
            &config,
            &mut state,
            &body_with_deposits(vec![deposit(5, 1, 32)]),
            &mut ValidatorUpdateSet::default(),
        )
        .expect_err("deposit 4 is missing");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::DepositIndexMismatch {
                expected: 4,
                in_block: 5,
            }),
        ));
    }

    #[test]
    fn header_must_follow_latest_block_header() -> Result<()> {
        let merkleizer = Merkleizer::new();
        let mut state = BeaconState {
            slot: 1,
            validators: ContiguousList::try_from(vec![Validator::default()])?,
            ..BeaconState::default()
        };

        let orphan = BeaconBlock {
            slot: 1,
            parent_root: H256::repeat_byte(1),
            ..BeaconBlock::default()
        };

        let error = process_block_header(&merkleizer, &mut state.clone(), &orphan)
            .expect_err("parent root does not match");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::ParentRootMismatch { .. }),
        ));

        let block = BeaconBlock {
            parent_root: state.latest_block_header.hash_tree_root(&merkleizer),
            ..orphan
        };

        process_block_header(&merkleizer, &mut state, &block)?;

        assert_eq!(state.latest_block_header.slot, 1);
        assert!(state.latest_block_header.state_root.is_zero());
        assert_eq!(
            state.latest_block_header.body_root,
            block.body.hash_tree_root(&merkleizer),
        );

        Ok(())
    }

    #[test]
    fn withdrawals_must_match_sweep() -> Result<()> {
        let config = Config::default();

        let mut withdrawal_credentials = H256::zero();
        withdrawal_credentials.0[0] = ETH1_ADDRESS_WITHDRAWAL_PREFIX;

        let validator = Validator {
            withdrawal_credentials,
            effective_balance: 32 * GWEI,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
            ..Validator::default()
        };

        let mut state = BeaconState {
            validators: ContiguousList::try_from(vec![validator; 2])?,
            balances: ContiguousList::try_from(vec![33 * GWEI, 32 * GWEI])?,
            ..BeaconState::default()
        };

        let expected = get_expected_withdrawals(&config, &state)?;

        assert_eq!(expected.len(), 1);
        assert_eq!(expected[0].amount, GWEI);

        let error = process_withdrawals(&config, &mut state.clone(), &ExecutionPayload::default())
            .expect_err("payload is missing a withdrawal");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::WithdrawalCountMismatch {
                computed: 1,
                in_block: 0,
            }),
        ));

        let payload = ExecutionPayload {
            withdrawals: ContiguousList::try_from(expected)?,
            ..ExecutionPayload::default()
        };

        process_withdrawals(&config, &mut state, &payload)?;

        assert_eq!(*state.balances, [32 * GWEI, 32 * GWEI]);
        assert_eq!(state.next_withdrawal_index, 1);

        Ok(())
    }
}
