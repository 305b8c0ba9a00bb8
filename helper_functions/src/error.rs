use thiserror::Error;
use types::primitives::{BlobIndex, ValidatorIndex};

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("commitment index {index} is out of bounds for {length} commitments")]
    CommitmentIndexOutOfBounds { index: BlobIndex, length: usize },
    #[error("validator index {index} is out of bounds")]
    ValidatorIndexOutOfBounds { index: ValidatorIndex },
    #[error("validator index overflowed")]
    ValidatorIndexOverflow,
    #[error("withdrawal index overflowed")]
    WithdrawalIndexOverflow,
}
