use thiserror::Error;
use types::{
    containers::Withdrawal,
    primitives::{
        DepositIndex, ExecutionBlockHash, Slot, UnixSeconds, ValidatorIndex, H256,
    },
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("block is not newer than latest block header ({block_slot} <= {block_header_slot})")]
    BlockNotNewerThanLatestBlockHeader {
        block_slot: Slot,
        block_header_slot: Slot,
    },
    #[error("state transition was cancelled")]
    Cancelled,
    #[error("deposit index is incorrect (expected: {expected}, in_block: {in_block})")]
    DepositIndexMismatch {
        expected: DepositIndex,
        in_block: DepositIndex,
    },
    #[error(
        "parent hash in execution payload ({in_block:?}) \
         does not match latest execution payload header ({in_state:?})"
    )]
    ExecutionPayloadParentHashMismatch {
        in_state: ExecutionBlockHash,
        in_block: ExecutionBlockHash,
    },
    #[error(
        "previous RANDAO mix in execution payload is incorrect \
         (in_state: {in_state:?}, in_block: {in_block:?})"
    )]
    ExecutionPayloadPrevRandaoMismatch { in_state: H256, in_block: H256 },
    #[error(
        "timestamp in execution payload ({in_block}) \
         is not later than in latest execution payload header ({in_state})"
    )]
    ExecutionPayloadTimestampNotLater {
        in_state: UnixSeconds,
        in_block: UnixSeconds,
    },
    #[error("block parent root ({in_block:?}) does not match latest block header ({computed:?})")]
    ParentRootMismatch { computed: H256, in_block: H256 },
    #[error("proposer is slashed (index: {index})")]
    ProposerSlashed { index: ValidatorIndex },
    #[error("slot {target_slot} is not later than state slot {state_slot}")]
    SlotNotLater { state_slot: Slot, target_slot: Slot },
    #[error("block slot ({block_slot}) does not match state slot ({state_slot})")]
    SlotMismatch { state_slot: Slot, block_slot: Slot },
    #[error("state root in block ({in_block:?}) does not match state ({computed:?})")]
    StateRootMismatch { computed: H256, in_block: H256 },
    #[error("too many deposits (in_block: {in_block}, maximum: {maximum})")]
    TooManyDeposits { in_block: u64, maximum: u64 },
    #[error("withdrawal count is incorrect (computed: {computed}, in_block: {in_block})")]
    WithdrawalCountMismatch { computed: usize, in_block: usize },
    #[error("withdrawal is incorrect (computed: {computed:?}, in_block: {in_block:?})")]
    WithdrawalMismatch {
        computed: Withdrawal,
        in_block: Withdrawal,
    },
}
