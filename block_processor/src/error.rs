use thiserror::Error;
use types::primitives::{BlobIndex, DepositIndex, Slot, H256};

#[derive(Debug, Error)]
pub enum Error {
    #[error("block is missing or empty")]
    NilBlock,
    #[error("state transition failed")]
    Transition(#[source] anyhow::Error),
    #[error("blob sidecar verification failed")]
    Sidecar(#[source] SidecarError),
    #[error("blob data for block at slot {slot} is not available")]
    DataNotAvailable { slot: Slot },
    #[error(
        "finalized execution payload {block_hash:?} is not the head \
         of the current state ({head_block_hash:?})"
    )]
    NotHeadPayload {
        block_hash: H256,
        head_block_hash: H256,
    },
    #[error(
        "deposit log cannot be pruned back to {requested} \
         after being pruned up to {last_pruned}"
    )]
    IndexRegression {
        requested: DepositIndex,
        last_pruned: DepositIndex,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum SidecarError {
    #[error("sidecar verification was cancelled")]
    Cancelled,
    #[error("sidecar index {index} is out of bounds for {commitment_count} commitments")]
    IndexOutOfBounds {
        index: BlobIndex,
        commitment_count: usize,
    },
    #[error("multiple sidecars with index {index}")]
    DuplicateIndex { index: BlobIndex },
    #[error("KZG commitment in sidecar {index} does not match block")]
    CommitmentMismatch { index: BlobIndex },
    #[error("sidecar {index} is for slot {in_sidecar} rather than {in_block}")]
    SlotMismatch {
        index: BlobIndex,
        in_sidecar: Slot,
        in_block: Slot,
    },
    #[error("body root in sidecar {index} ({in_sidecar:?}) does not match block ({in_block:?})")]
    BodyRootMismatch {
        index: BlobIndex,
        in_sidecar: H256,
        in_block: H256,
    },
    #[error("KZG commitment inclusion proof in sidecar {index} is invalid")]
    InvalidInclusionProof { index: BlobIndex },
}
