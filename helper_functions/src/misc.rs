use anyhow::Result;
use ssz::{Merkleizer, SszHash as _};
use typenum::Unsigned as _;
use types::{
    consts::{
        MaxBlobCommitmentsPerBlock, BEACON_BLOCK_BODY_FIELD_COUNT,
        BLOB_KZG_COMMITMENTS_FIELD_INDEX, SLOTS_PER_EPOCH, VERSIONED_HASH_VERSION_KZG,
    },
    containers::{BeaconBlockBody, BlobCommitmentInclusionProof, Validator},
    primitives::{BlobIndex, Epoch, ExecutionAddress, KzgCommitment, Slot, VersionedHash, H256},
};

use crate::error::Error;

#[must_use]
pub const fn compute_epoch_at_slot(slot: Slot) -> Epoch {
    slot / SLOTS_PER_EPOCH
}

/// Hash the execution layer uses to refer to a blob.
///
/// The SHA-256 hash of the commitment with the first byte replaced by the version.
#[must_use]
pub fn kzg_commitment_to_versioned_hash(kzg_commitment: KzgCommitment) -> VersionedHash {
    let mut versioned_hash = hashing::hash_384(kzg_commitment.as_fixed_bytes());
    versioned_hash[..VERSIONED_HASH_VERSION_KZG.len()].copy_from_slice(VERSIONED_HASH_VERSION_KZG);
    versioned_hash
}

/// Builds the branch proving that the commitment at `commitment_index` is part of `body`.
///
/// The branch consists of the siblings in the commitment list, the length of the list and the
/// siblings of `body.blob_kzg_commitments` among the other fields of the body.
pub fn kzg_commitment_inclusion_proof(
    body: &BeaconBlockBody,
    commitment_index: BlobIndex,
    merkleizer: &Merkleizer,
) -> Result<BlobCommitmentInclusionProof> {
    let commitments = &body.blob_kzg_commitments;
    let length = commitments.len();

    let index = usize::try_from(commitment_index)
        .ok()
        .filter(|index| *index < length)
        .ok_or(Error::CommitmentIndexOutOfBounds {
            index: commitment_index,
            length,
        })?;

    let chunks = commitments
        .iter()
        .map(|commitment| commitment.hash_tree_root(merkleizer))
        .collect::<Vec<_>>();

    let mut length_chunk = H256::zero();
    length_chunk[..size_of::<u64>()].copy_from_slice(&commitments.len_u64().to_le_bytes());

    let field_index = usize::try_from(BLOB_KZG_COMMITMENTS_FIELD_INDEX)?;
    let field_roots = body.field_roots(merkleizer);

    let mut branch = merkleizer.merkle_proof(&chunks, MaxBlobCommitmentsPerBlock::U64, index);
    branch.push(length_chunk);
    branch.extend(merkleizer.merkle_proof(
        &field_roots,
        BEACON_BLOCK_BODY_FIELD_COUNT,
        field_index,
    ));

    BlobCommitmentInclusionProof::try_from(branch).map_err(Into::into)
}

/// Execution address stored in the last 20 bytes of 0x01 withdrawal credentials.
#[must_use]
pub fn withdrawal_address(validator: &Validator) -> ExecutionAddress {
    let credentials = validator.withdrawal_credentials.as_bytes();
    ExecutionAddress::from_slice(&credentials[H256::len_bytes() - ExecutionAddress::len_bytes()..])
}
