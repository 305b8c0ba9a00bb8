use ssz::{impl_ssz_container, ContiguousList, ContiguousVector, Merkleizer, SszHash as _};

use crate::{
    consts::{
        KzgCommitmentInclusionProofDepth, MaxBlobCommitmentsPerBlock, MaxBlobsPerBlock,
        MaxDepositsPerBlock, MaxTransactionsPerPayload, MaxWithdrawalsPerPayload,
    },
    primitives::{
        Blob, BlobIndex, DepositIndex, Epoch, ExecutionAddress, ExecutionBlockHash,
        ExecutionBlockNumber, ExtraData, Gas, Gwei, KzgCommitment, KzgProof, LogsBloom,
        PublicKeyBytes, SignatureBytes, Slot, Transaction, UnixSeconds, ValidatorIndex, Version,
        WithdrawalIndex, H256, U256,
    },
};

pub type BlobSidecars = ContiguousList<BlobSidecar, MaxBlobsPerBlock>;
pub type Deposits = ContiguousList<Deposit, MaxDepositsPerBlock>;
pub type Transactions = ContiguousList<Transaction, MaxTransactionsPerPayload>;
pub type Withdrawals = ContiguousList<Withdrawal, MaxWithdrawalsPerPayload>;
pub type BlobKzgCommitments = ContiguousList<KzgCommitment, MaxBlobCommitmentsPerBlock>;
pub type BlobCommitmentInclusionProof = ContiguousVector<H256, KzgCommitmentInclusionProofDepth>;

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Fork {
    pub previous_version: Version,
    pub current_version: Version,
    pub epoch: Epoch,
}

impl_ssz_container! {
    Fork {
        previous_version: Version,
        current_version: Version,
        epoch: Epoch,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Eth1Data {
    pub deposit_root: H256,
    pub deposit_count: u64,
    pub block_hash: ExecutionBlockHash,
}

impl_ssz_container! {
    Eth1Data {
        deposit_root: H256,
        deposit_count: u64,
        block_hash: ExecutionBlockHash,
    }
}

/// Deposit as emitted by the deposit contract.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Deposit {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: H256,
    pub amount: Gwei,
    pub signature: SignatureBytes,
    pub index: DepositIndex,
}

impl_ssz_container! {
    Deposit {
        pubkey: PublicKeyBytes,
        withdrawal_credentials: H256,
        amount: Gwei,
        signature: SignatureBytes,
        index: DepositIndex,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Withdrawal {
    pub index: WithdrawalIndex,
    pub validator_index: ValidatorIndex,
    pub address: ExecutionAddress,
    pub amount: Gwei,
}

impl_ssz_container! {
    Withdrawal {
        index: WithdrawalIndex,
        validator_index: ValidatorIndex,
        address: ExecutionAddress,
        amount: Gwei,
    }
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct ExecutionPayload {
    pub parent_hash: ExecutionBlockHash,
    pub fee_recipient: ExecutionAddress,
    pub state_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: LogsBloom,
    pub prev_randao: H256,
    pub block_number: ExecutionBlockNumber,
    pub gas_limit: Gas,
    pub gas_used: Gas,
    pub timestamp: UnixSeconds,
    pub extra_data: ExtraData,
    pub base_fee_per_gas: U256,
    pub block_hash: ExecutionBlockHash,
    pub transactions: Transactions,
    pub withdrawals: Withdrawals,
    pub blob_gas_used: Gas,
    pub excess_blob_gas: Gas,
}

impl_ssz_container! {
    ExecutionPayload {
        parent_hash: ExecutionBlockHash,
        fee_recipient: ExecutionAddress,
        state_root: H256,
        receipts_root: H256,
        logs_bloom: LogsBloom,
        prev_randao: H256,
        block_number: ExecutionBlockNumber,
        gas_limit: Gas,
        gas_used: Gas,
        timestamp: UnixSeconds,
        extra_data: ExtraData,
        base_fee_per_gas: U256,
        block_hash: ExecutionBlockHash,
        transactions: Transactions,
        withdrawals: Withdrawals,
        blob_gas_used: Gas,
        excess_blob_gas: Gas,
    }
}

impl ExecutionPayload {
    /// Replaces the transaction and withdrawal lists with their roots.
    #[must_use]
    pub fn to_header(&self, merkleizer: &Merkleizer) -> ExecutionPayloadHeader {
        ExecutionPayloadHeader {
            parent_hash: self.parent_hash,
            fee_recipient: self.fee_recipient,
            state_root: self.state_root,
            receipts_root: self.receipts_root,
            logs_bloom: self.logs_bloom.clone(),
            prev_randao: self.prev_randao,
            block_number: self.block_number,
            gas_limit: self.gas_limit,
            gas_used: self.gas_used,
            timestamp: self.timestamp,
            extra_data: self.extra_data.clone(),
            base_fee_per_gas: self.base_fee_per_gas,
            block_hash: self.block_hash,
            transactions_root: self.transactions.hash_tree_root(merkleizer),
            withdrawals_root: self.withdrawals.hash_tree_root(merkleizer),
            blob_gas_used: self.blob_gas_used,
            excess_blob_gas: self.excess_blob_gas,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct ExecutionPayloadHeader {
    pub parent_hash: ExecutionBlockHash,
    pub fee_recipient: ExecutionAddress,
    pub state_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: LogsBloom,
    pub prev_randao: H256,
    pub block_number: ExecutionBlockNumber,
    pub gas_limit: Gas,
    pub gas_used: Gas,
    pub timestamp: UnixSeconds,
    pub extra_data: ExtraData,
    pub base_fee_per_gas: U256,
    pub block_hash: ExecutionBlockHash,
    pub transactions_root: H256,
    pub withdrawals_root: H256,
    pub blob_gas_used: Gas,
    pub excess_blob_gas: Gas,
}

impl_ssz_container! {
    ExecutionPayloadHeader {
        parent_hash: ExecutionBlockHash,
        fee_recipient: ExecutionAddress,
        state_root: H256,
        receipts_root: H256,
        logs_bloom: LogsBloom,
        prev_randao: H256,
        block_number: ExecutionBlockNumber,
        gas_limit: Gas,
        gas_used: Gas,
        timestamp: UnixSeconds,
        extra_data: ExtraData,
        base_fee_per_gas: U256,
        block_hash: ExecutionBlockHash,
        transactions_root: H256,
        withdrawals_root: H256,
        blob_gas_used: Gas,
        excess_blob_gas: Gas,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct BeaconBlockHeader {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body_root: H256,
}

impl_ssz_container! {
    BeaconBlockHeader {
        slot: Slot,
        proposer_index: ValidatorIndex,
        parent_root: H256,
        state_root: H256,
        body_root: H256,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct SignedBeaconBlockHeader {
    pub message: BeaconBlockHeader,
    pub signature: SignatureBytes,
}

impl_ssz_container! {
    SignedBeaconBlockHeader {
        message: BeaconBlockHeader,
        signature: SignatureBytes,
    }
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct BeaconBlockBody {
    pub randao_reveal: SignatureBytes,
    pub eth1_data: Eth1Data,
    pub graffiti: H256,
    pub deposits: Deposits,
    pub execution_payload: ExecutionPayload,
    pub blob_kzg_commitments: BlobKzgCommitments,
}

impl_ssz_container! {
    BeaconBlockBody {
        randao_reveal: SignatureBytes,
        eth1_data: Eth1Data,
        graffiti: H256,
        deposits: Deposits,
        execution_payload: ExecutionPayload,
        blob_kzg_commitments: BlobKzgCommitments,
    }
}

impl BeaconBlockBody {
    /// Roots of the fields of the body in declaration order.
    #[must_use]
    pub fn field_roots(&self, merkleizer: &Merkleizer) -> [H256; 6] {
        [
            self.randao_reveal.hash_tree_root(merkleizer),
            self.eth1_data.hash_tree_root(merkleizer),
            self.graffiti,
            self.deposits.hash_tree_root(merkleizer),
            self.execution_payload.hash_tree_root(merkleizer),
            self.blob_kzg_commitments.hash_tree_root(merkleizer),
        ]
    }
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct BeaconBlock {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body: BeaconBlockBody,
}

impl_ssz_container! {
    BeaconBlock {
        slot: Slot,
        proposer_index: ValidatorIndex,
        parent_root: H256,
        state_root: H256,
        body: BeaconBlockBody,
    }
}

impl BeaconBlock {
    /// A block with every field set to its default value stands in for the absence of a block.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn to_header(&self, merkleizer: &Merkleizer) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot: self.slot,
            proposer_index: self.proposer_index,
            parent_root: self.parent_root,
            state_root: self.state_root,
            body_root: self.body.hash_tree_root(merkleizer),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct BlobSidecar {
    pub index: BlobIndex,
    pub blob: Blob,
    pub kzg_commitment: KzgCommitment,
    pub kzg_proof: KzgProof,
    pub signed_block_header: SignedBeaconBlockHeader,
    pub kzg_commitment_inclusion_proof: BlobCommitmentInclusionProof,
}

impl_ssz_container! {
    BlobSidecar {
        index: BlobIndex,
        blob: Blob,
        kzg_commitment: KzgCommitment,
        kzg_proof: KzgProof,
        signed_block_header: SignedBeaconBlockHeader,
        kzg_commitment_inclusion_proof: BlobCommitmentInclusionProof,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Validator {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: H256,
    pub effective_balance: Gwei,
    pub slashed: bool,
    pub activation_eligibility_epoch: Epoch,
    pub activation_epoch: Epoch,
    pub exit_epoch: Epoch,
    pub withdrawable_epoch: Epoch,
}

impl_ssz_container! {
    Validator {
        pubkey: PublicKeyBytes,
        withdrawal_credentials: H256,
        effective_balance: Gwei,
        slashed: bool,
        activation_eligibility_epoch: Epoch,
        activation_epoch: Epoch,
        exit_epoch: Epoch,
        withdrawable_epoch: Epoch,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ExecutionCheckpoints {
    pub finalized: ExecutionBlockHash,
    pub safe: ExecutionBlockHash,
    pub last_valid_head: ExecutionBlockHash,
}

impl_ssz_container! {
    ExecutionCheckpoints {
        finalized: ExecutionBlockHash,
        safe: ExecutionBlockHash,
        last_valid_head: ExecutionBlockHash,
    }
}

impl ExecutionCheckpoints {
    /// Checkpoints with all three hashes pointing at the same block.
    #[must_use]
    pub const fn at(block_hash: ExecutionBlockHash) -> Self {
        Self {
            finalized: block_hash,
            safe: block_hash,
            last_valid_head: block_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use ssz::{SszRead as _, SszSize as _, SszWrite as _, Size};

    use super::*;

    fn payload() -> ExecutionPayload {
        let transactions = [vec![0xf8, 0x6c], vec![0x02; 100]]
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<Vec<_>, _>>()
            .expect("transactions are within limit");

        ExecutionPayload {
            parent_hash: H256::repeat_byte(1),
            block_number: 7,
            gas_limit: 30_000_000,
            timestamp: 1_700_000_000,
            extra_data: ExtraData::try_from(b"beacon".to_vec()).expect("within limit"),
            base_fee_per_gas: U256::from(7),
            block_hash: H256::repeat_byte(2),
            transactions: Transactions::try_from(transactions).expect("within limit"),
            withdrawals: Withdrawals::try_from(vec![Withdrawal {
                index: 3,
                validator_index: 4,
                address: ExecutionAddress::repeat_byte(5),
                amount: 6,
            }])
            .expect("within limit"),
            ..ExecutionPayload::default()
        }
    }

    #[test]
    fn execution_payload_has_528_byte_fixed_part() {
        assert_eq!(
            ExecutionPayload::SIZE,
            Size::Variable { minimum_size: 528 },
        );
        assert_eq!(Withdrawal::SIZE, Size::Fixed { size: 44 });
    }

    #[test]
    fn execution_payload_round_trips() {
        let bytes = payload().to_ssz().expect("offsets fit in 4 bytes");

        assert_eq!(ExecutionPayload::from_ssz(&bytes), Ok(payload()));
        assert_eq!(payload().to_ssz(), Ok(bytes));
    }

    #[test]
    fn withdrawal_encoding_and_root_match_known_values() {
        let merkleizer = Merkleizer::new();

        let withdrawal = Withdrawal {
            index: 3,
            validator_index: 4,
            address: ExecutionAddress::repeat_byte(5),
            amount: 6,
        };

        assert_eq!(
            withdrawal.to_ssz(),
            Ok(hex!(
                "0300000000000000"
                "0400000000000000"
                "0505050505050505050505050505050505050505"
                "0600000000000000"
            )
            .to_vec()),
        );

        assert_eq!(
            withdrawal.hash_tree_root(&merkleizer),
            H256(hex!("43a19ba8d6952398bddb5336e5bcf0e0f323d853929daed3db07479475ae6186")),
        );

        assert_eq!(
            Withdrawal::default().hash_tree_root(&merkleizer),
            H256(hex!("db56114e00fdd4c1f85c892bf35ac9a89289aaecb1ebd0a96cde606a748b5d71")),
        );
    }

    #[test]
    fn execution_payload_encoding_matches_known_layout() {
        let expected = [
            &[0x01; 32][..],
            &[0; 20][..],
            &[0; 32 + 32 + 256 + 32][..],
            &hex!("0700000000000000")[..],
            &hex!("80c3c90100000000")[..],
            &hex!("0000000000000000")[..],
            &hex!("00f1536500000000")[..],
            &hex!("10020000")[..],
            &hex!("0700000000000000000000000000000000000000000000000000000000000000")[..],
            &[0x02; 32][..],
            &hex!("16020000")[..],
            &hex!("84020000")[..],
            &[0; 16][..],
            &b"beacon"[..],
            &hex!("080000000a000000")[..],
            &hex!("f86c")[..],
            &[0x02; 100][..],
            &hex!("0300000000000000040000000000000005050505050505050505050505050505050505050600000000000000")[..],
        ]
        .concat();

        assert_eq!(expected.len(), 688);
        assert_eq!(payload().to_ssz(), Ok(expected));
    }

    #[test]
    fn execution_payload_roots_match_known_values() {
        let merkleizer = Merkleizer::new();
        let payload = payload();

        assert_eq!(
            payload.transactions.hash_tree_root(&merkleizer),
            H256(hex!("e69cc309868b78f32d0bce1bbb3da1e26cfaac54ee70f187842a30daafdbd0c0")),
        );

        assert_eq!(
            payload.withdrawals.hash_tree_root(&merkleizer),
            H256(hex!("38e5bbfd1f725e365c2c80b4887edbba7df2ea5a65cf481906dca801b602e60e")),
        );

        assert_eq!(
            payload.hash_tree_root(&merkleizer),
            H256(hex!("52cef869b220de2dab12b9996a7b5a0b1aaf2280a0a8b5003dd77693cd6215aa")),
        );
    }

    #[test]
    fn header_root_matches_payload_root() {
        let merkleizer = Merkleizer::new();

        assert_eq!(
            payload().to_header(&merkleizer).hash_tree_root(&merkleizer),
            payload().hash_tree_root(&merkleizer),
        );
    }

    #[test]
    fn block_round_trips_and_roots_are_stable() {
        let merkleizer = Merkleizer::new();

        let block = BeaconBlock {
            slot: 10,
            proposer_index: 1,
            body: BeaconBlockBody {
                execution_payload: payload(),
                blob_kzg_commitments: BlobKzgCommitments::try_from(vec![
                    KzgCommitment::repeat_byte(9),
                ])
                .expect("within limit"),
                ..BeaconBlockBody::default()
            },
            ..BeaconBlock::default()
        };

        let bytes = block.to_ssz().expect("offsets fit in 4 bytes");
        let decoded = BeaconBlock::from_ssz(bytes).expect("encoding is valid");

        assert_eq!(decoded, block);
        assert_eq!(
            decoded.hash_tree_root(&merkleizer),
            block.hash_tree_root(&merkleizer),
        );
        assert!(!block.is_empty());
        assert!(BeaconBlock::default().is_empty());
    }

    #[test]
    fn body_root_is_root_of_field_roots() {
        let merkleizer = Merkleizer::new();
        let body = BeaconBlockBody::default();

        assert_eq!(
            body.hash_tree_root(&merkleizer),
            merkleizer.merkleize_fields(&body.field_roots(&merkleizer)),
        );
    }
}
