use anyhow::Result;
use execution_engine::{ExecutionEngine, NullExecutionEngine, PayloadAttributes};
use helper_functions::{
    accessors::{get_current_epoch, get_expected_withdrawals},
    misc::kzg_commitment_inclusion_proof,
};
use itertools::izip;
use ssz::{ContiguousList, SszHash as _};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use transition_functions::{Context, StateRootPolicy};
use types::{
    beacon_state::BeaconState,
    containers::{
        BeaconBlock, BeaconBlockBody, BlobSidecar, BlobSidecars, Eth1Data,
        SignedBeaconBlockHeader,
    },
    primitives::{Slot, UnixSeconds, ValidatorIndex},
};

use crate::BlockProcessor;

/// Assembles a block for `slot` on top of the current state of `processor` along with its blob
/// sidecars.
///
/// The payload timestamp is `timestamp` unless that would not be later than the parent payload.
/// Pending deposits are included in index order.
pub async fn build_block(
    processor: &BlockProcessor<impl ExecutionEngine + 'static>,
    slot: Slot,
    proposer_index: ValidatorIndex,
    timestamp: UnixSeconds,
) -> Result<(BeaconBlock, BlobSidecars)> {
    let config = processor.config();
    let merkleizer = processor.merkleizer();
    let state = processor.state();
    let cancellation = CancellationToken::new();

    // The proposer's own payload needs no verification.
    let context = Context {
        config,
        merkleizer,
        execution_engine: &NullExecutionEngine,
        cancellation: &cancellation,
        optimistic_engine: false,
        state_root_policy: StateRootPolicy::Trust,
    };

    let mut preview = BeaconState::clone(&state);

    if preview.slot < slot {
        transition_functions::process_slots(&context, &mut preview, slot)?;
    }

    let parent_root = preview.latest_block_header.hash_tree_root(merkleizer);
    let parent_payload = &preview.latest_execution_payload_header;

    let attributes = PayloadAttributes {
        timestamp: timestamp.max(parent_payload.timestamp + 1),
        prev_randao: preview
            .randao_mix_at(get_current_epoch(&preview))
            .unwrap_or_default(),
        withdrawals: get_expected_withdrawals(config, &preview)?,
        parent_beacon_block_root: parent_root,
        ..PayloadAttributes::default()
    };

    let built = processor
        .execution_engine()
        .build_payload(parent_payload, attributes)
        .await?;

    let max_deposits = usize::try_from(config.max_deposits_per_block)?;
    let deposits = processor
        .deposit_store()
        .pending_deposits(preview.eth1_deposit_index, max_deposits)?;

    let eth1_data = Eth1Data {
        deposit_count: preview.eth1_deposit_index + deposits.len() as u64,
        ..preview.eth1_data
    };

    let mut block = BeaconBlock {
        slot,
        proposer_index,
        parent_root,
        body: BeaconBlockBody {
            eth1_data,
            deposits: ContiguousList::try_from(deposits)?,
            execution_payload: built.payload,
            blob_kzg_commitments: ContiguousList::try_from(built.commitments.clone())?,
            ..BeaconBlockBody::default()
        },
        ..BeaconBlock::default()
    };

    let mut post_state = BeaconState::clone(&state);
    transition_functions::state_transition(&context, &mut post_state, &block).await?;
    block.state_root = post_state.hash_tree_root(merkleizer);

    let signed_block_header = SignedBeaconBlockHeader {
        message: block.to_header(merkleizer),
        ..SignedBeaconBlockHeader::default()
    };

    let sidecars = izip!(0.., built.blobs, built.commitments, built.proofs)
        .map(|(index, blob, kzg_commitment, kzg_proof)| {
            Ok(BlobSidecar {
                index,
                blob,
                kzg_commitment,
                kzg_proof,
                signed_block_header,
                kzg_commitment_inclusion_proof: kzg_commitment_inclusion_proof(
                    &block.body,
                    index,
                    merkleizer,
                )?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "built block at slot {slot} with {} deposits and {} blobs",
        block.body.deposits.len(),
        sidecars.len(),
    );

    Ok((block, ContiguousList::try_from(sidecars)?))
}
