use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{ensure, Result};
use block_processor::BlockProcessor;
use dispatcher::{
    BlockVerified, BuildBlock, BuildBlockRequest, Dispatcher, ValidatorUpdatesFinalized,
    VerifySidecars, VerifySidecarsRequest,
};
use execution_engine::ExecutionEngine;
use logging::info_with_slot;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use types::{nonstandard::ValidatorUpdates, primitives::H256};

use crate::{
    BlockGossiper, BuilderStage, Error, NoopGossiper, ProposalRequest, SidecarGossiper,
    SidecarVerifierStage,
};

/// Drives a [`BlockProcessor`] through the propose, verify, finalize and commit calls made by
/// the consensus engine.
pub struct ConsensusDriver<E> {
    processor: Arc<BlockProcessor<E>>,
    dispatcher: Arc<Dispatcher>,
    block_gossiper: Box<dyn BlockGossiper>,
    sidecar_gossiper: Box<dyn SidecarGossiper>,
    finalized: AtomicBool,
    cancellation: CancellationToken,
    stages: Mutex<Vec<JoinHandle<()>>>,
}

impl<E: ExecutionEngine + 'static> ConsensusDriver<E> {
    /// Starts the builder and sidecar verifier stages.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(processor: Arc<BlockProcessor<E>>, dispatcher: Arc<Dispatcher>) -> Result<Self> {
        Self::with_gossipers(
            processor,
            dispatcher,
            Box::new(NoopGossiper),
            Box::new(NoopGossiper),
        )
    }

    pub fn with_gossipers(
        processor: Arc<BlockProcessor<E>>,
        dispatcher: Arc<Dispatcher>,
        block_gossiper: Box<dyn BlockGossiper>,
        sidecar_gossiper: Box<dyn SidecarGossiper>,
    ) -> Result<Self> {
        let cancellation = CancellationToken::new();

        let stages = vec![
            BuilderStage::spawn(
                Arc::clone(&processor),
                Arc::clone(&dispatcher),
                cancellation.clone(),
            )?,
            SidecarVerifierStage::spawn(
                Arc::clone(&processor),
                Arc::clone(&dispatcher),
                cancellation.clone(),
            )?,
        ];

        Ok(Self {
            processor,
            dispatcher,
            block_gossiper,
            sidecar_gossiper,
            finalized: AtomicBool::new(false),
            cancellation,
            stages: Mutex::new(stages),
        })
    }

    #[must_use]
    pub const fn processor(&self) -> &Arc<BlockProcessor<E>> {
        &self.processor
    }

    #[must_use]
    pub const fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Builds a proposal for `request.height`.
    ///
    /// Returns the transactions of the proposal: the block followed by its blob sidecars.
    pub async fn prepare_proposal(&self, request: &ProposalRequest) -> Result<Vec<Vec<u8>>> {
        let built = self
            .dispatcher
            .send_request::<BuildBlock>(BuildBlockRequest {
                slot: request.height,
                proposer_index: request.proposer_index,
                timestamp: request.time,
            })?
            .await??;

        let txs = vec![
            self.block_gossiper.publish(&built.block)?,
            self.sidecar_gossiper.publish(&built.sidecars)?,
        ];

        info_with_slot!("prepared proposal for height {}", request.height);

        Ok(txs)
    }

    /// Accepts a proposal only if its execution payload and blob sidecars are valid.
    pub async fn process_proposal(&self, request: Option<&ProposalRequest>) -> Result<()> {
        let block = Arc::new(self.block_gossiper.request(request)?);
        let sidecars = Arc::new(self.sidecar_gossiper.request(request)?);

        let verify_payload = async {
            self.processor.verify_payload_on_block(&block).await?;
            self.dispatcher.publish::<BlockVerified>(Arc::clone(&block));
            Ok::<_, anyhow::Error>(())
        };

        let verify_sidecars = async {
            let response = self
                .dispatcher
                .send_request::<VerifySidecars>(VerifySidecarsRequest {
                    block: Arc::clone(&block),
                    sidecars,
                })?;

            response.await?
        };

        tokio::try_join!(verify_payload, verify_sidecars)?;

        debug!("accepted proposal for slot {}", block.slot);

        Ok(())
    }

    /// Applies the decided block and finalizes its execution payload.
    pub async fn finalize_block(
        &self,
        request: Option<&ProposalRequest>,
    ) -> Result<ValidatorUpdates> {
        self.finalized.store(false, Ordering::Release);

        let block = Arc::new(self.block_gossiper.request(request)?);
        let sidecars = self.sidecar_gossiper.request(request)?;

        let updates = self
            .processor
            .process_state_transition(Some(Arc::clone(&block)), &sidecars, true)
            .await?;

        self.processor.finalize_block(&block).await?;

        self.dispatcher
            .publish::<ValidatorUpdatesFinalized>(Arc::new(updates.clone()));

        self.finalized.store(true, Ordering::Release);

        info_with_slot!(
            "finalized block at slot {} with {} validator updates",
            block.slot,
            updates.len(),
        );

        Ok(updates)
    }

    /// Persists the state produced by the last successful [`ConsensusDriver::finalize_block`].
    pub async fn commit(&self) -> Result<H256> {
        ensure!(
            self.finalized.swap(false, Ordering::AcqRel),
            Error::CommitBeforeFinalize,
        );

        self.processor.commit().await
    }

    /// Stops the stages and waits for background tasks of the processor.
    pub async fn shutdown(&self) {
        self.cancellation.cancel();

        for stage in self.stages.lock().await.drain(..) {
            if let Err(error) = stage.await {
                debug!("stage stopped abnormally: {error}");
            }
        }

        self.processor.shutdown().await;
    }
}
