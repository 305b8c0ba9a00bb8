use types::primitives::{Slot, UnixSeconds, ValidatorIndex};

/// Proposal as delivered by the consensus engine.
///
/// Transactions of a proposal built by this node hold the SSZ encoded block followed by its
/// SSZ encoded blob sidecars.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct ProposalRequest {
    pub height: Slot,
    pub time: UnixSeconds,
    pub proposer_index: ValidatorIndex,
    pub txs: Vec<Vec<u8>>,
}
