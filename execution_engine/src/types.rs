use helper_functions::misc;
use ssz::ContiguousList;
use types::{
    containers::{BeaconBlock, Deposit, ExecutionPayload, ExecutionPayloadHeader, Withdrawal},
    primitives::{
        Blob, ExecutionAddress, ExecutionBlockHash, ExecutionBlockNumber, KzgCommitment, KzgProof,
        UnixSeconds, VersionedHash, H256,
    },
};

use crate::EngineError;

/// Everything the execution engine needs to validate the payload of a beacon block.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NewPayloadRequest {
    pub payload: ExecutionPayload,
    pub versioned_hashes: Vec<VersionedHash>,
    pub parent_beacon_block_root: H256,
    /// Whether the caller tolerates the engine being unavailable.
    pub optimistic: bool,
}

impl NewPayloadRequest {
    #[must_use]
    pub fn new(block: &BeaconBlock, optimistic: bool) -> Self {
        let versioned_hashes = block
            .body
            .blob_kzg_commitments
            .iter()
            .copied()
            .map(misc::kzg_commitment_to_versioned_hash)
            .collect();

        Self {
            payload: block.body.execution_payload.clone(),
            versioned_hashes,
            parent_beacon_block_root: block.parent_root,
            optimistic,
        }
    }

    #[must_use]
    pub const fn block_hash(&self) -> ExecutionBlockHash {
        self.payload.block_hash
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ForkchoiceState {
    pub head_block_hash: ExecutionBlockHash,
    pub safe_block_hash: ExecutionBlockHash,
    pub finalized_block_hash: ExecutionBlockHash,
}

impl ForkchoiceState {
    /// Points head, safe and finalized at the same block.
    #[must_use]
    pub const fn at(block_hash: ExecutionBlockHash) -> Self {
        Self {
            head_block_hash: block_hash,
            safe_block_hash: block_hash,
            finalized_block_hash: block_hash,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct PayloadAttributes {
    pub timestamp: UnixSeconds,
    pub prev_randao: H256,
    pub suggested_fee_recipient: ExecutionAddress,
    pub withdrawals: Vec<Withdrawal>,
    pub parent_beacon_block_root: H256,
}

/// A deposit observed in the logs of the deposit contract.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DepositEvent {
    pub block_number: ExecutionBlockNumber,
    pub deposit: Deposit,
}

/// A payload built by the execution engine along with the blobs its transactions carry.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct BuiltPayload {
    pub payload: ExecutionPayload,
    pub blobs: Vec<Blob>,
    pub commitments: Vec<KzgCommitment>,
    pub proofs: Vec<KzgProof>,
}

/// Builds an empty payload on top of `parent`.
///
/// The block hash is derived from the parent hash, block number and timestamp, so payloads built
/// from the same inputs are identical.
pub fn assemble_payload(
    parent: &ExecutionPayloadHeader,
    attributes: &PayloadAttributes,
) -> Result<ExecutionPayload, EngineError> {
    let block_number = parent.block_number + 1;

    let mut preimage = parent.block_hash.as_bytes().to_vec();
    preimage.extend_from_slice(&block_number.to_le_bytes());
    preimage.extend_from_slice(&attributes.timestamp.to_le_bytes());

    let withdrawals = ContiguousList::try_from(attributes.withdrawals.clone()).map_err(|error| {
        EngineError::Transient {
            message: error.to_string(),
        }
    })?;

    Ok(ExecutionPayload {
        parent_hash: parent.block_hash,
        fee_recipient: attributes.suggested_fee_recipient,
        state_root: parent.state_root,
        receipts_root: parent.receipts_root,
        prev_randao: attributes.prev_randao,
        block_number,
        gas_limit: parent.gas_limit,
        timestamp: attributes.timestamp,
        base_fee_per_gas: parent.base_fee_per_gas,
        block_hash: hashing::hash_bytes(preimage),
        withdrawals,
        ..ExecutionPayload::default()
    })
}

#[cfg(test)]
mod tests {
    use ssz::ContiguousList;

    use super::*;

    #[test]
    fn request_carries_versioned_hashes_in_commitment_order() {
        let block = BeaconBlock {
            parent_root: H256::repeat_byte(9),
            body: types::containers::BeaconBlockBody {
                blob_kzg_commitments: ContiguousList::try_from(vec![
                    KzgCommitment::repeat_byte(1),
                    KzgCommitment::repeat_byte(2),
                ])
                .expect("commitment count is within limit"),
                ..Default::default()
            },
            ..BeaconBlock::default()
        };

        let request = NewPayloadRequest::new(&block, false);

        assert_eq!(request.parent_beacon_block_root, H256::repeat_byte(9));
        assert_eq!(
            request.versioned_hashes,
            [
                misc::kzg_commitment_to_versioned_hash(KzgCommitment::repeat_byte(1)),
                misc::kzg_commitment_to_versioned_hash(KzgCommitment::repeat_byte(2)),
            ],
        );
        assert!(!request.optimistic);
    }

    #[test]
    fn assembled_payload_extends_parent_deterministically() -> Result<(), EngineError> {
        let parent = ExecutionPayloadHeader {
            block_hash: H256::repeat_byte(1),
            block_number: 41,
            gas_limit: 30_000_000,
            ..ExecutionPayloadHeader::default()
        };

        let attributes = PayloadAttributes {
            timestamp: 12,
            ..PayloadAttributes::default()
        };

        let payload = assemble_payload(&parent, &attributes)?;

        assert_eq!(payload.parent_hash, parent.block_hash);
        assert_eq!(payload.block_number, 42);
        assert_eq!(payload.gas_limit, 30_000_000);
        assert_ne!(payload.block_hash, parent.block_hash);
        assert_eq!(assemble_payload(&parent, &attributes)?, payload);

        let later = PayloadAttributes {
            timestamp: 13,
            ..attributes
        };

        assert_ne!(assemble_payload(&parent, &later)?.block_hash, payload.block_hash);

        Ok(())
    }
}
