use std::collections::HashSet;

use helper_functions::predicates::is_valid_blob_sidecar_inclusion_proof;
use ssz::{Merkleizer, SszHash as _};
use tokio_util::sync::CancellationToken;
use types::containers::{BeaconBlock, BlobSidecar};

use crate::SidecarError;

/// Checks that `sidecars` carry the blobs committed to in `block`.
///
/// KZG proofs of the blobs themselves are not checked here.
/// Verification yields to the runtime between sidecars and stops once `cancellation` fires.
pub async fn verify_blob_sidecars(
    merkleizer: &Merkleizer,
    block: &BeaconBlock,
    sidecars: &[BlobSidecar],
    cancellation: &CancellationToken,
) -> Result<(), SidecarError> {
    let commitments = &block.body.blob_kzg_commitments;
    let body_root = block.body.hash_tree_root(merkleizer);
    let mut seen = HashSet::with_capacity(sidecars.len());

    for sidecar in sidecars {
        if cancellation.is_cancelled() {
            return Err(SidecarError::Cancelled);
        }

        let index = sidecar.index;

        let commitment = usize::try_from(index)
            .ok()
            .and_then(|position| commitments.get(position))
            .ok_or(SidecarError::IndexOutOfBounds {
                index,
                commitment_count: commitments.len(),
            })?;

        if !seen.insert(index) {
            return Err(SidecarError::DuplicateIndex { index });
        }

        if sidecar.kzg_commitment != *commitment {
            return Err(SidecarError::CommitmentMismatch { index });
        }

        let header = sidecar.signed_block_header.message;

        if header.slot != block.slot {
            return Err(SidecarError::SlotMismatch {
                index,
                in_sidecar: header.slot,
                in_block: block.slot,
            });
        }

        if header.body_root != body_root {
            return Err(SidecarError::BodyRootMismatch {
                index,
                in_sidecar: header.body_root,
                in_block: body_root,
            });
        }

        if !is_valid_blob_sidecar_inclusion_proof(sidecar, merkleizer) {
            return Err(SidecarError::InvalidInclusionProof { index });
        }

        tokio::task::yield_now().await;
    }

    Ok(())
}
