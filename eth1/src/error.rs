use thiserror::Error;
use types::primitives::DepositIndex;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error(
        "attempted to prune deposit log up to {requested} \
         after it was already pruned up to {last_pruned}"
    )]
    IndexRegression {
        requested: DepositIndex,
        last_pruned: DepositIndex,
    },
}
