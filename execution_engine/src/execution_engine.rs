#![expect(clippy::module_name_repetitions)]

use core::{ops::Range, time::Duration};
use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use types::{
    containers::ExecutionPayloadHeader,
    primitives::{Blob, ExecutionBlockHash, ExecutionBlockNumber, KzgCommitment, KzgProof},
};

use crate::{
    types::{
        assemble_payload, BuiltPayload, DepositEvent, ForkchoiceState, NewPayloadRequest,
        PayloadAttributes,
    },
    EngineError,
};

/// The part of the execution layer that the consensus core talks to.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// [`verify_and_notify_new_payload`](https://github.com/ethereum/consensus-specs/blob/dev/specs/deneb/beacon-chain.md#modified-verify_and_notify_new_payload)
    async fn verify_and_notify_new_payload(
        &self,
        request: NewPayloadRequest,
    ) -> Result<(), EngineError>;

    /// [`notify_forkchoice_updated`](https://github.com/ethereum/consensus-specs/blob/dev/specs/bellatrix/fork-choice.md#notify_forkchoice_updated)
    async fn notify_forkchoice_updated(
        &self,
        state: ForkchoiceState,
        payload_attributes: Option<PayloadAttributes>,
    ) -> Result<(), EngineError>;

    /// Deposit contract logs emitted in `block_numbers`, ordered by deposit index.
    async fn deposit_logs(
        &self,
        block_numbers: Range<ExecutionBlockNumber>,
    ) -> Result<Vec<DepositEvent>, EngineError>;

    async fn build_payload(
        &self,
        parent: &ExecutionPayloadHeader,
        attributes: PayloadAttributes,
    ) -> Result<BuiltPayload, EngineError>;
}

#[async_trait]
impl<E: ExecutionEngine + ?Sized> ExecutionEngine for Arc<E> {
    async fn verify_and_notify_new_payload(
        &self,
        request: NewPayloadRequest,
    ) -> Result<(), EngineError> {
        self.as_ref().verify_and_notify_new_payload(request).await
    }

    async fn notify_forkchoice_updated(
        &self,
        state: ForkchoiceState,
        payload_attributes: Option<PayloadAttributes>,
    ) -> Result<(), EngineError> {
        self.as_ref()
            .notify_forkchoice_updated(state, payload_attributes)
            .await
    }

    async fn deposit_logs(
        &self,
        block_numbers: Range<ExecutionBlockNumber>,
    ) -> Result<Vec<DepositEvent>, EngineError> {
        self.as_ref().deposit_logs(block_numbers).await
    }

    async fn build_payload(
        &self,
        parent: &ExecutionPayloadHeader,
        attributes: PayloadAttributes,
    ) -> Result<BuiltPayload, EngineError> {
        self.as_ref().build_payload(parent, attributes).await
    }
}

/// Accepts every payload and never reports deposits.
#[derive(Clone, Copy, Default, Debug)]
pub struct NullExecutionEngine;

#[async_trait]
impl ExecutionEngine for NullExecutionEngine {
    async fn verify_and_notify_new_payload(&self, _: NewPayloadRequest) -> Result<(), EngineError> {
        Ok(())
    }

    async fn notify_forkchoice_updated(
        &self,
        _: ForkchoiceState,
        _: Option<PayloadAttributes>,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    async fn deposit_logs(
        &self,
        _: Range<ExecutionBlockNumber>,
    ) -> Result<Vec<DepositEvent>, EngineError> {
        Ok(vec![])
    }

    async fn build_payload(
        &self,
        parent: &ExecutionPayloadHeader,
        attributes: PayloadAttributes,
    ) -> Result<BuiltPayload, EngineError> {
        Ok(BuiltPayload {
            payload: assemble_payload(parent, &attributes)?,
            ..BuiltPayload::default()
        })
    }
}

#[derive(Default)]
struct MockState {
    invalid_block_hashes: HashSet<ExecutionBlockHash>,
    unavailable: bool,
    fail_forkchoice_updates: bool,
    failing_deposit_log_queries: usize,
    new_payload_delay: Option<Duration>,
    blobs_per_payload: usize,
    deposit_events: Vec<DepositEvent>,
    verified_payloads: Vec<(ExecutionBlockHash, bool)>,
    forkchoice_updates: Vec<ForkchoiceState>,
    deposit_log_queries: Vec<Range<ExecutionBlockNumber>>,
}

/// In-memory engine for tests.
///
/// Every call is recorded. Payload validity, availability and the deposit logs it serves can be
/// changed while the engine is shared.
#[derive(Default)]
pub struct MockExecutionEngine {
    state: Mutex<MockState>,
}

impl MockExecutionEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_invalid(&self, block_hash: ExecutionBlockHash) {
        self.state.lock().invalid_block_hashes.insert(block_hash);
    }

    /// Makes payload verification fail with [`EngineError::Transient`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    pub fn set_fail_forkchoice_updates(&self, fail: bool) {
        self.state.lock().fail_forkchoice_updates = fail;
    }

    /// Makes the next `count` deposit log queries fail with [`EngineError::Transient`].
    pub fn fail_deposit_log_queries(&self, count: usize) {
        self.state.lock().failing_deposit_log_queries = count;
    }

    pub fn set_new_payload_delay(&self, delay: Duration) {
        self.state.lock().new_payload_delay = Some(delay);
    }

    pub fn set_blobs_per_payload(&self, count: usize) {
        self.state.lock().blobs_per_payload = count;
    }

    pub fn add_deposit_event(&self, event: DepositEvent) {
        self.state.lock().deposit_events.push(event);
    }

    /// Block hashes passed to [`ExecutionEngine::verify_and_notify_new_payload`] along with the
    /// `optimistic` flag of each request.
    #[must_use]
    pub fn verified_payloads(&self) -> Vec<(ExecutionBlockHash, bool)> {
        self.state.lock().verified_payloads.clone()
    }

    #[must_use]
    pub fn forkchoice_updates(&self) -> Vec<ForkchoiceState> {
        self.state.lock().forkchoice_updates.clone()
    }

    #[must_use]
    pub fn deposit_log_queries(&self) -> Vec<Range<ExecutionBlockNumber>> {
        self.state.lock().deposit_log_queries.clone()
    }
}

#[async_trait]
impl ExecutionEngine for MockExecutionEngine {
    async fn verify_and_notify_new_payload(
        &self,
        request: NewPayloadRequest,
    ) -> Result<(), EngineError> {
        let block_hash = request.block_hash();

        // The lock must not be held across the await point.
        let delay = self.state.lock().new_payload_delay;

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();

        state
            .verified_payloads
            .push((block_hash, request.optimistic));

        if state.unavailable {
            return Err(EngineError::Transient {
                message: "mock execution engine is unavailable".to_owned(),
            });
        }

        if state.invalid_block_hashes.contains(&block_hash) {
            return Err(EngineError::InvalidPayload {
                block_hash,
                reason: "marked invalid".to_owned(),
            });
        }

        debug!("mock execution engine accepted payload {block_hash:?}");

        Ok(())
    }

    async fn notify_forkchoice_updated(
        &self,
        forkchoice_state: ForkchoiceState,
        _: Option<PayloadAttributes>,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock();

        state.forkchoice_updates.push(forkchoice_state);

        if state.fail_forkchoice_updates {
            return Err(EngineError::Transient {
                message: "mock execution engine rejected forkchoice update".to_owned(),
            });
        }

        Ok(())
    }

    async fn deposit_logs(
        &self,
        block_numbers: Range<ExecutionBlockNumber>,
    ) -> Result<Vec<DepositEvent>, EngineError> {
        let mut state = self.state.lock();

        state.deposit_log_queries.push(block_numbers.clone());

        if state.failing_deposit_log_queries > 0 {
            state.failing_deposit_log_queries -= 1;

            return Err(EngineError::Transient {
                message: "mock execution engine timed out serving deposit logs".to_owned(),
            });
        }

        let mut events = state
            .deposit_events
            .iter()
            .filter(|event| block_numbers.contains(&event.block_number))
            .copied()
            .collect::<Vec<_>>();

        events.sort_by_key(|event| event.deposit.index);

        Ok(events)
    }

    async fn build_payload(
        &self,
        parent: &ExecutionPayloadHeader,
        attributes: PayloadAttributes,
    ) -> Result<BuiltPayload, EngineError> {
        let payload = assemble_payload(parent, &attributes)?;
        let blob_count = self.state.lock().blobs_per_payload;

        let commitments = (0..blob_count)
            .map(|index| mock_commitment(payload.block_hash, index))
            .collect::<Vec<_>>();

        Ok(BuiltPayload {
            payload,
            blobs: vec![Blob::default(); blob_count],
            proofs: vec![KzgProof::zero(); blob_count],
            commitments,
        })
    }
}

fn mock_commitment(block_hash: ExecutionBlockHash, index: usize) -> KzgCommitment {
    let mut preimage = block_hash.as_bytes().to_vec();
    preimage.extend_from_slice(&index.to_le_bytes());

    let mut commitment = KzgCommitment::zero();
    commitment[..32].copy_from_slice(hashing::hash_bytes(preimage).as_bytes());
    commitment
}
