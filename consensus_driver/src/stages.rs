use std::sync::Arc;

use anyhow::Result;
use block_processor::{build_block, verify_blob_sidecars, BlockProcessor};
use dispatcher::{
    BlockBuilt, BuildBlock, BuildBlockRequest, BuiltBlock, Dispatcher, SidecarsBuilt,
    SidecarsVerified, VerifySidecars, VerifySidecarsRequest,
};
use execution_engine::ExecutionEngine;
use futures::StreamExt as _;
use logging::{info_with_slot, warn_with_slot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Answers [`BuildBlock`] requests by assembling blocks on top of the current state.
pub struct BuilderStage;

impl BuilderStage {
    /// Registers the stage as the receiver of [`BuildBlock`] and runs it until `cancellation`
    /// fires.
    pub fn spawn<E: ExecutionEngine + 'static>(
        processor: Arc<BlockProcessor<E>>,
        dispatcher: Arc<Dispatcher>,
        cancellation: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        let mut requests = dispatcher.register_receiver::<BuildBlock>()?;

        Ok(tokio::spawn(async move {
            loop {
                let envelope = tokio::select! {
                    () = cancellation.cancelled() => break,
                    envelope = requests.next() => match envelope {
                        Some(envelope) => envelope,
                        None => break,
                    },
                };

                let BuildBlockRequest {
                    slot,
                    proposer_index,
                    timestamp,
                } = envelope.request;

                let response = build_block(&processor, slot, proposer_index, timestamp)
                    .await
                    .map(|(block, sidecars)| {
                        let built = BuiltBlock {
                            block: Arc::new(block),
                            sidecars: Arc::new(sidecars),
                        };

                        dispatcher.publish::<BlockBuilt>(Arc::clone(&built.block));
                        dispatcher.publish::<SidecarsBuilt>(Arc::clone(&built.sidecars));

                        info_with_slot!(
                            "built block for slot {slot} with {} blob sidecars",
                            built.sidecars.len(),
                        );

                        built
                    });

                if let Err(error) = &response {
                    warn_with_slot!("failed to build block for slot {slot}: {error:?}");
                }

                envelope.respond(response);
            }

            debug!("builder stage stopped");
        }))
    }
}

/// Answers [`VerifySidecars`] requests.
pub struct SidecarVerifierStage;

impl SidecarVerifierStage {
    pub fn spawn<E: ExecutionEngine + 'static>(
        processor: Arc<BlockProcessor<E>>,
        dispatcher: Arc<Dispatcher>,
        cancellation: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        let mut requests = dispatcher.register_receiver::<VerifySidecars>()?;

        Ok(tokio::spawn(async move {
            loop {
                let envelope = tokio::select! {
                    () = cancellation.cancelled() => break,
                    envelope = requests.next() => match envelope {
                        Some(envelope) => envelope,
                        None => break,
                    },
                };

                let VerifySidecarsRequest { block, sidecars } = &envelope.request;

                let result = verify_blob_sidecars(
                    processor.merkleizer(),
                    block,
                    sidecars,
                    &cancellation,
                )
                .await;

                let response = match result {
                    Ok(()) => {
                        debug!(
                            "verified {} blob sidecars for slot {}",
                            sidecars.len(),
                            block.slot,
                        );

                        dispatcher.publish::<SidecarsVerified>(Arc::clone(sidecars));

                        Ok(())
                    }
                    Err(error) => Err(error.into()),
                };

                envelope.respond(response);
            }

            debug!("sidecar verifier stage stopped");
        }))
    }
}
