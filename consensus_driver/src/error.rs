use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("consensus request is missing")]
    NilRequest,
    #[error("consensus request does not contain a beacon block")]
    NoBeaconBlockInRequest,
    #[error("transaction index {index} is out of bounds for {tx_count} transactions")]
    TxIndexOutOfBounds { index: usize, tx_count: usize },
    #[error("consensus request does not contain blob sidecars")]
    NilBlobSidecarsInRequest,
    #[error("commit requested without a finalized block")]
    CommitBeforeFinalize,
}
