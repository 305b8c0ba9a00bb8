use anyhow::{ensure, Result};
use execution_engine::ExecutionEngine;
use ssz::{Merkleizer, SszHash as _};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use types::{
    beacon_state::BeaconState, config::Config, containers::BeaconBlock,
    nonstandard::ValidatorUpdates,
};

use crate::{
    block_processing, epoch_processing, slot_processing, validator_updates::ValidatorUpdateSet,
    Error,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StateRootPolicy {
    Verify,
    /// Skips the state root check.
    ///
    /// Used when the block is being built from the post-state and has no state root yet.
    Trust,
}

impl StateRootPolicy {
    pub fn verify(
        self,
        merkleizer: &Merkleizer,
        state: &BeaconState,
        block: &BeaconBlock,
    ) -> Result<()> {
        match self {
            Self::Verify => {
                let computed = state.hash_tree_root(merkleizer);
                let in_block = block.state_root;

                ensure!(
                    computed == in_block,
                    Error::StateRootMismatch { computed, in_block },
                );
            }
            Self::Trust => {}
        }

        Ok(())
    }
}

/// Everything a state transition needs apart from the state and the block.
pub struct Context<'ctx, E> {
    pub config: &'ctx Config,
    pub merkleizer: &'ctx Merkleizer,
    pub execution_engine: &'ctx E,
    pub cancellation: &'ctx CancellationToken,
    /// Whether an unavailable execution engine should be tolerated.
    pub optimistic_engine: bool,
    pub state_root_policy: StateRootPolicy,
}

impl<E> Context<'_, E> {
    pub(crate) fn ensure_not_cancelled(&self) -> Result<()> {
        ensure!(!self.cancellation.is_cancelled(), Error::Cancelled);
        Ok(())
    }
}

/// Applies `block` to `state`.
///
/// Returns the changes to the validator set ordered by validator index. On error `state` may be
/// partially modified and must be discarded.
pub async fn state_transition(
    context: &Context<'_, impl ExecutionEngine>,
    state: &mut BeaconState,
    block: &BeaconBlock,
) -> Result<ValidatorUpdates> {
    let Context {
        config,
        merkleizer,
        ..
    } = *context;

    // > Process slots (including those with no blocks) since block
    if state.slot < block.slot {
        slot_processing::process_slots(context, state, block.slot)?;
    }

    context.ensure_not_cancelled()?;

    let mut updates = ValidatorUpdateSet::default();

    block_processing::process_block_header(merkleizer, state, block)?;
    block_processing::process_withdrawals(config, state, &block.body.execution_payload)?;
    block_processing::process_execution_payload(context, state, block).await?;

    context.ensure_not_cancelled()?;

    block_processing::process_randao(state, &block.body)?;
    block_processing::process_eth1_data(state, &block.body);
    block_processing::process_deposits(config, state, &block.body, &mut updates)?;

    epoch_processing::process_effective_balance_updates(config, state, &mut updates)?;

    context.ensure_not_cancelled()?;

    // > Verify state root
    context
        .state_root_policy
        .verify(merkleizer, state, block)?;

    context.ensure_not_cancelled()?;

    let updates = updates.into_updates();

    debug!(
        "processed block at slot {} with {} validator updates",
        block.slot,
        updates.len(),
    );

    Ok(updates)
}

#[cfg(test)]
mod tests {
    use execution_engine::{
        assemble_payload, EngineError, MockExecutionEngine, NullExecutionEngine, PayloadAttributes,
    };
    use helper_functions::accessors::{get_current_epoch, get_expected_withdrawals};
    use ssz::ContiguousList;
    use types::{
        containers::{BeaconBlockBody, Deposit, ExecutionPayloadHeader},
        nonstandard::ValidatorUpdate,
        primitives::{PublicKeyBytes, H256},
    };

    use super::*;
    use crate::initialize_beacon_state;

    struct Harness {
        config: Config,
        merkleizer: Merkleizer,
        cancellation: CancellationToken,
        state: BeaconState,
    }

    impl Harness {
        fn new() -> Result<Self> {
            let config = Config::default();
            let merkleizer = Merkleizer::new();

            let deposits = (0..4).map(|index| Deposit {
                pubkey: PublicKeyBytes::from_low_u64_be(index),
                amount: config.max_effective_balance,
                index,
                ..Deposit::default()
            });

            let header = ExecutionPayloadHeader {
                block_hash: H256::repeat_byte(0x01),
                timestamp: 100,
                ..ExecutionPayloadHeader::default()
            };

            let state = initialize_beacon_state(&config, &merkleizer, deposits, header)?;

            Ok(Self {
                config,
                merkleizer,
                cancellation: CancellationToken::new(),
                state,
            })
        }

        fn context<'ctx, E>(
            &'ctx self,
            execution_engine: &'ctx E,
            optimistic_engine: bool,
            state_root_policy: StateRootPolicy,
        ) -> Context<'ctx, E> {
            Context {
                config: &self.config,
                merkleizer: &self.merkleizer,
                execution_engine,
                cancellation: &self.cancellation,
                optimistic_engine,
                state_root_policy,
            }
        }

        // Assembles a block on top of the current state the way a proposer would.
        async fn block(&self, slot: u64, body: BeaconBlockBody) -> Result<BeaconBlock> {
            let context = self.context(&NullExecutionEngine, false, StateRootPolicy::Trust);

            let mut preview = self.state.clone();
            slot_processing::process_slots(&context, &mut preview, slot)?;

            let attributes = PayloadAttributes {
                timestamp: preview.latest_execution_payload_header.timestamp + 1,
                prev_randao: preview
                    .randao_mix_at(get_current_epoch(&preview))
                    .unwrap_or_default(),
                withdrawals: get_expected_withdrawals(&self.config, &preview)?,
                ..PayloadAttributes::default()
            };

            let execution_payload =
                assemble_payload(&preview.latest_execution_payload_header, &attributes)?;

            let mut block = BeaconBlock {
                slot,
                parent_root: preview.latest_block_header.hash_tree_root(&self.merkleizer),
                body: BeaconBlockBody {
                    execution_payload,
                    ..body
                },
                ..BeaconBlock::default()
            };

            let mut post_state = self.state.clone();
            state_transition(&context, &mut post_state, &block).await?;
            block.state_root = post_state.hash_tree_root(&self.merkleizer);

            Ok(block)
        }
    }

    #[tokio::test]
    async fn valid_block_is_applied() -> Result<()> {
        let harness = Harness::new()?;
        let block = harness.block(1, BeaconBlockBody::default()).await?;
        let engine = MockExecutionEngine::new();
        let context = harness.context(&engine, false, StateRootPolicy::Verify);

        let mut state = harness.state.clone();
        let updates = state_transition(&context, &mut state, &block).await?;

        assert!(updates.is_empty());
        assert_eq!(state.slot, 1);
        assert_eq!(state.hash_tree_root(&harness.merkleizer), block.state_root);
        assert_eq!(
            state.latest_execution_payload_header.block_hash,
            block.body.execution_payload.block_hash,
        );
        assert_eq!(
            engine.verified_payloads(),
            [(block.body.execution_payload.block_hash, false)],
        );

        Ok(())
    }

    #[tokio::test]
    async fn deposits_in_block_produce_activations() -> Result<()> {
        let harness = Harness::new()?;

        let deposit = Deposit {
            pubkey: PublicKeyBytes::repeat_byte(0xde),
            amount: harness.config.max_effective_balance,
            index: 4,
            ..Deposit::default()
        };

        let body = BeaconBlockBody {
            deposits: ContiguousList::try_from(vec![deposit])?,
            ..BeaconBlockBody::default()
        };

        let block = harness.block(3, body).await?;
        let context = harness.context(&NullExecutionEngine, false, StateRootPolicy::Verify);

        let mut state = harness.state.clone();
        let updates = state_transition(&context, &mut state, &block).await?;

        assert_eq!(
            updates,
            [ValidatorUpdate::Activation {
                pubkey: deposit.pubkey,
                effective_balance: harness.config.max_effective_balance,
            }],
        );
        assert_eq!(state.eth1_deposit_index, 5);

        Ok(())
    }

    #[tokio::test]
    async fn wrong_state_root_is_rejected_unless_trusted() -> Result<()> {
        let harness = Harness::new()?;

        let block = BeaconBlock {
            state_root: H256::repeat_byte(0xff),
            ..harness.block(1, BeaconBlockBody::default()).await?
        };

        let verify = harness.context(&NullExecutionEngine, false, StateRootPolicy::Verify);
        let error = state_transition(&verify, &mut harness.state.clone(), &block)
            .await
            .expect_err("state root is wrong");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::StateRootMismatch { .. }),
        ));

        let trust = harness.context(&NullExecutionEngine, false, StateRootPolicy::Trust);
        state_transition(&trust, &mut harness.state.clone(), &block).await?;

        Ok(())
    }

    #[tokio::test]
    async fn unavailable_engine_is_tolerated_only_when_optimistic() -> Result<()> {
        let harness = Harness::new()?;
        let block = harness.block(1, BeaconBlockBody::default()).await?;
        let engine = MockExecutionEngine::new();

        engine.set_unavailable(true);

        let strict = harness.context(&engine, false, StateRootPolicy::Verify);
        let error = state_transition(&strict, &mut harness.state.clone(), &block)
            .await
            .expect_err("engine is unavailable");

        assert!(error
            .downcast_ref::<EngineError>()
            .is_some_and(EngineError::is_transient));

        let optimistic = harness.context(&engine, true, StateRootPolicy::Verify);
        state_transition(&optimistic, &mut harness.state.clone(), &block).await?;

        Ok(())
    }

    #[tokio::test]
    async fn invalid_payload_is_rejected_even_when_optimistic() -> Result<()> {
        let harness = Harness::new()?;
        let block = harness.block(1, BeaconBlockBody::default()).await?;
        let engine = MockExecutionEngine::new();

        engine.mark_invalid(block.body.execution_payload.block_hash);

        let optimistic = harness.context(&engine, true, StateRootPolicy::Verify);
        let error = state_transition(&optimistic, &mut harness.state.clone(), &block)
            .await
            .expect_err("payload is invalid");

        assert!(matches!(
            error.downcast_ref::<EngineError>(),
            Some(EngineError::InvalidPayload { .. }),
        ));

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_transition_fails() -> Result<()> {
        let harness = Harness::new()?;
        let block = harness.block(1, BeaconBlockBody::default()).await?;

        harness.cancellation.cancel();

        let context = harness.context(&NullExecutionEngine, false, StateRootPolicy::Verify);
        let error = state_transition(&context, &mut harness.state.clone(), &block)
            .await
            .expect_err("transition was cancelled");

        assert!(matches!(error.downcast_ref::<Error>(), Some(Error::Cancelled)));

        Ok(())
    }
}
