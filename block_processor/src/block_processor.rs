use std::sync::Arc;

use anyhow::{ensure, Result};
use arc_swap::ArcSwap;
use blob_store::AvailabilityStore;
use database::Database;
use eth1::DepositStore;
use execution_engine::{ExecutionEngine, ForkchoiceState, NewPayloadRequest};
use logging::{info_with_slot, warn_with_slot, SLOT_LOG_CONTEXT};
use ssz::{Merkleizer, SszHash as _, SszRead as _, SszWrite as _};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use transition_functions::{Context, StateRootPolicy};
use types::{
    beacon_state::BeaconState,
    config::Config,
    containers::{BeaconBlock, BlobSidecars, ExecutionCheckpoints},
    nonstandard::ValidatorUpdates,
    primitives::H256,
};

use crate::{sidecars::verify_blob_sidecars, task_pool::TaskPool, Error};

const STATE_KEY: &str = "state";
const STATE_ROOT_KEY: &str = "state_root";

/// Applies blocks to the beacon state of a single chain.
///
/// Readers take snapshots with [`BlockProcessor::state`] at any time. Writers are serialized, and
/// a new state is published only after every check on the block it was produced from succeeded.
pub struct BlockProcessor<E> {
    config: Arc<Config>,
    merkleizer: Arc<Merkleizer>,
    execution_engine: Arc<E>,
    database: Arc<Database>,
    state: ArcSwap<BeaconState>,
    deposit_store: DepositStore,
    availability_store: AvailabilityStore,
    task_pool: TaskPool,
    transition_lock: Mutex<()>,
}

impl<E: ExecutionEngine + 'static> BlockProcessor<E> {
    /// Resumes from the state persisted by the last [`BlockProcessor::commit`] if there is one.
    /// Otherwise starts from `anchor_state`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        config: Arc<Config>,
        merkleizer: Arc<Merkleizer>,
        execution_engine: Arc<E>,
        database: Arc<Database>,
        anchor_state: BeaconState,
    ) -> Result<Self> {
        let state = match database.get(STATE_KEY)? {
            Some(bytes) => {
                let state = BeaconState::from_ssz(bytes)?;
                info_with_slot!("resuming from persisted state at slot {}", state.slot);
                state
            }
            None => anchor_state,
        };

        SLOT_LOG_CONTEXT.set_slot(state.slot);

        Ok(Self {
            config,
            merkleizer,
            execution_engine,
            deposit_store: DepositStore::new(Arc::clone(&database))?,
            availability_store: AvailabilityStore::new(Arc::clone(&database)),
            database,
            state: ArcSwap::from_pointee(state),
            task_pool: TaskPool::new(),
            transition_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn state(&self) -> Arc<BeaconState> {
        self.state.load_full()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn merkleizer(&self) -> &Merkleizer {
        &self.merkleizer
    }

    #[must_use]
    pub fn execution_engine(&self) -> &E {
        &self.execution_engine
    }

    #[must_use]
    pub const fn deposit_store(&self) -> &DepositStore {
        &self.deposit_store
    }

    #[must_use]
    pub const fn availability_store(&self) -> &AvailabilityStore {
        &self.availability_store
    }

    /// Applies `block` to the current state after checking it together with `sidecars`.
    ///
    /// The state transition and sidecar verification run concurrently. The first of them to fail
    /// cancels the other. On any error the current state is left untouched.
    pub async fn process_state_transition(
        &self,
        block: Option<Arc<BeaconBlock>>,
        sidecars: &BlobSidecars,
        optimistic_engine: bool,
    ) -> Result<ValidatorUpdates> {
        let block = block.filter(|block| !block.is_empty()).ok_or(Error::NilBlock)?;

        let _guard = self.transition_lock.lock().await;

        let pre_state = self.state.load_full();
        let cancellation = CancellationToken::new();

        let context = Context {
            config: &self.config,
            merkleizer: &self.merkleizer,
            execution_engine: &*self.execution_engine,
            cancellation: &cancellation,
            optimistic_engine,
            state_root_policy: StateRootPolicy::Verify,
        };

        let transition = async {
            let mut post_state = BeaconState::clone(&pre_state);

            match transition_functions::state_transition(&context, &mut post_state, &block).await
            {
                Ok(updates) => Ok((post_state, updates)),
                Err(error) => {
                    cancellation.cancel();
                    Err(Error::Transition(error))
                }
            }
        };

        let sidecar_verification = async {
            verify_blob_sidecars(&self.merkleizer, &block, sidecars, &cancellation)
                .await
                .map_err(|error| {
                    cancellation.cancel();
                    Error::Sidecar(error)
                })
        };

        let ((post_state, updates), ()) = tokio::try_join!(transition, sidecar_verification)?;

        self.availability_store.persist(block.slot, sidecars.iter())?;

        ensure!(
            self.availability_store
                .is_data_available(block.slot, &block.body)?,
            Error::DataNotAvailable { slot: block.slot },
        );

        self.process_deposit_bookkeeping(&post_state).await?;

        self.spawn_forkchoice_update(&post_state, &block);

        let slot = post_state.slot;

        self.state.store(Arc::new(post_state));
        SLOT_LOG_CONTEXT.set_slot(slot);

        debug!(
            "state transition to slot {slot} applied with {} validator updates",
            updates.len(),
        );

        Ok(updates)
    }

    /// Checks the execution payload of `block` with the execution engine.
    pub async fn verify_payload_on_block(&self, block: &BeaconBlock) -> Result<()> {
        let payload = &block.body.execution_payload;

        self.execution_engine
            .verify_and_notify_new_payload(NewPayloadRequest::new(block, false))
            .await?;

        info_with_slot!(
            "successfully verified execution payload (block number: {}, transactions: {})",
            payload.block_number,
            payload.transactions.len(),
        );

        Ok(())
    }

    /// Moves the execution chain head to the payload of `block` and marks it as finalized.
    ///
    /// `block` must be the last block applied to the state. A failed fork choice update is logged
    /// and does not prevent the checkpoints from moving.
    pub async fn finalize_block(&self, block: &BeaconBlock) -> Result<()> {
        let block_hash = block.body.execution_payload.block_hash;

        self.ensure_head_payload(block_hash)?;

        if let Err(error) = self
            .execution_engine
            .notify_forkchoice_updated(ForkchoiceState::at(block_hash), None)
            .await
        {
            warn_with_slot!(
                "fork choice update for finalized block {block_hash:?} failed: {error}",
            );
        }

        let _guard = self.transition_lock.lock().await;

        // Another block may have been applied while the fork choice update was in flight.
        self.ensure_head_payload(block_hash)?;

        self.state.rcu(|state| {
            let mut state = BeaconState::clone(state);
            state.execution_checkpoints = ExecutionCheckpoints::at(block_hash);
            state
        });

        debug!("execution checkpoints moved to {block_hash:?}");

        Ok(())
    }

    /// Persists the current state and returns its root.
    pub async fn commit(&self) -> Result<H256> {
        let _guard = self.transition_lock.lock().await;

        let state = self.state.load_full();
        let state_root = state.hash_tree_root(&self.merkleizer);

        self.database.put_batch([
            (STATE_KEY, state.to_ssz()?),
            (STATE_ROOT_KEY, state_root.to_ssz()?),
        ])?;

        info_with_slot!("committed state at slot {} with root {state_root:?}", state.slot);

        Ok(state_root)
    }

    /// Root stored by the last [`BlockProcessor::commit`].
    pub fn committed_state_root(&self) -> Result<Option<H256>> {
        let Some(bytes) = self.database.get(STATE_ROOT_KEY)? else {
            return Ok(None);
        };

        Ok(Some(H256::from_ssz(bytes)?))
    }

    /// Waits for background tasks such as fork choice updates to finish.
    pub async fn wait_for_background_tasks(&self) {
        self.task_pool.wait_idle().await;
    }

    pub async fn shutdown(&self) {
        self.task_pool.shutdown().await;
    }

    fn spawn_forkchoice_update(&self, post_state: &BeaconState, block: &BeaconBlock) {
        let execution_engine = Arc::clone(&self.execution_engine);
        let checkpoints = post_state.execution_checkpoints;

        let forkchoice_state = ForkchoiceState {
            head_block_hash: block.body.execution_payload.block_hash,
            safe_block_hash: checkpoints.safe,
            finalized_block_hash: checkpoints.finalized,
        };

        self.task_pool.spawn("forkchoice update", async move {
            execution_engine
                .notify_forkchoice_updated(forkchoice_state, None)
                .await?;

            Ok(())
        });
    }

    fn ensure_head_payload(&self, block_hash: H256) -> Result<()> {
        let head_block_hash = self
            .state
            .load()
            .latest_execution_payload_header
            .block_hash;

        ensure!(
            block_hash == head_block_hash,
            Error::NotHeadPayload {
                block_hash,
                head_block_hash,
            },
        );

        Ok(())
    }

    /// Fetches new deposit logs and then prunes the deposit log up to the deposits included in
    /// `post_state`.
    ///
    /// Pruning is the last fallible step so that a failed log query leaves the log unchanged.
    async fn process_deposit_bookkeeping(&self, post_state: &BeaconState) -> Result<()> {
        let upto = post_state.eth1_deposit_index;

        self.deposit_store
            .ensure_prunable(upto)
            .map_err(index_regression)?;

        self.deposit_store
            .retrieve_deposits(
                &self.config,
                &*self.execution_engine,
                post_state.latest_execution_payload_header.block_number,
            )
            .await?;

        self.deposit_store
            .prune_deposit_log(upto)
            .map_err(index_regression)
    }
}

fn index_regression(error: anyhow::Error) -> anyhow::Error {
    match error.downcast_ref::<eth1::Error>() {
        Some(eth1::Error::IndexRegression {
            requested,
            last_pruned,
        }) => Error::IndexRegression {
            requested: *requested,
            last_pruned: *last_pruned,
        }
        .into(),
        None => error,
    }
}
