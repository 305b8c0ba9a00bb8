use ssz::{Merkleizer, SszHash as _};
use types::{
    config::Config,
    consts::{
        MaxBlobCommitmentsPerBlock, BLOB_KZG_COMMITMENTS_FIELD_INDEX,
        ETH1_ADDRESS_WITHDRAWAL_PREFIX,
    },
    containers::{BlobCommitmentInclusionProof, BlobSidecar, Validator},
    primitives::{BlobIndex, Epoch, Gwei, KzgCommitment, H256},
};
use typenum::Unsigned as _;

#[inline]
#[must_use]
pub const fn is_active_validator(validator: &Validator, epoch: Epoch) -> bool {
    validator.activation_epoch <= epoch && epoch < validator.exit_epoch
}

#[must_use]
pub fn has_eth1_withdrawal_credential(validator: &Validator) -> bool {
    validator.withdrawal_credentials[0] == ETH1_ADDRESS_WITHDRAWAL_PREFIX
}

#[must_use]
pub fn is_fully_withdrawable_validator(validator: &Validator, balance: Gwei, epoch: Epoch) -> bool {
    has_eth1_withdrawal_credential(validator) && validator.withdrawable_epoch <= epoch && balance > 0
}

#[must_use]
pub fn is_partially_withdrawable_validator(
    config: &Config,
    validator: &Validator,
    balance: Gwei,
) -> bool {
    let has_max_effective_balance = validator.effective_balance == config.max_effective_balance;
    let has_excess_balance = balance > config.max_effective_balance;
    has_eth1_withdrawal_credential(validator) && has_max_effective_balance && has_excess_balance
}

/// Checks that the commitment in `blob_sidecar` is part of the body its header refers to.
#[must_use]
pub fn is_valid_blob_sidecar_inclusion_proof(
    blob_sidecar: &BlobSidecar,
    merkleizer: &Merkleizer,
) -> bool {
    is_valid_kzg_commitment_inclusion_proof(
        blob_sidecar.kzg_commitment,
        &blob_sidecar.kzg_commitment_inclusion_proof,
        blob_sidecar.index,
        blob_sidecar.signed_block_header.message.body_root,
        merkleizer,
    )
}

#[must_use]
pub fn is_valid_kzg_commitment_inclusion_proof(
    kzg_commitment: KzgCommitment,
    proof: &BlobCommitmentInclusionProof,
    commitment_index: BlobIndex,
    body_root: H256,
    merkleizer: &Merkleizer,
) -> bool {
    if commitment_index >= MaxBlobCommitmentsPerBlock::U64 {
        return false;
    }

    ssz::is_valid_merkle_branch(
        kzg_commitment.hash_tree_root(merkleizer),
        proof.iter().copied(),
        index_at_commitment_depth(commitment_index),
        body_root,
    )
}

// Position of the commitment among the nodes at the depth of the commitments themselves.
// The tree that makes up `BeaconBlockBody` looks like this:
// ```text
// 1┬─2┬─4┬─8 body.randao_reveal
//  │  │  └─9 body.eth1_data
//  │  └─5┬10 body.graffiti
//  │     └11 body.deposits
//  └─3┬─6┬12 body.execution_payload
//     │  └13 body.blob_kzg_commitments ┬26 commitments (4 levels, 16 leaves)
//     │                                └27 length
//     └─7┬14 padding
//        └15 padding
// ```
// Below node 26 the commitment is at `commitment_index`. Node 26 is the left child of node 13,
// which is at field index 5 of the body.
const fn index_at_commitment_depth(commitment_index: BlobIndex) -> u64 {
    let list_depth = ssz::depth_for_limit(MaxBlobCommitmentsPerBlock::U64) as u64;
    commitment_index | (BLOB_KZG_COMMITMENTS_FIELD_INDEX << (list_depth + 1))
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use ssz::ContiguousList;
    use types::{
        consts::FAR_FUTURE_EPOCH,
        containers::BeaconBlockBody,
    };

    use crate::misc;

    use super::*;

    fn eth1_validator(effective_balance: Gwei) -> Validator {
        Validator {
            withdrawal_credentials: H256(hex!(
                "010000000000000000000000bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
            )),
            effective_balance,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
            ..Validator::default()
        }
    }

    #[test]
    fn commitment_depth_index_combines_list_and_field_positions() {
        assert_eq!(index_at_commitment_depth(0), 160);
        assert_eq!(index_at_commitment_depth(15), 175);
    }

    #[test]
    fn active_validator_is_between_activation_and_exit() {
        let validator = Validator {
            activation_epoch: 2,
            exit_epoch: 5,
            ..Validator::default()
        };

        assert!(!is_active_validator(&validator, 1));
        assert!(is_active_validator(&validator, 2));
        assert!(is_active_validator(&validator, 4));
        assert!(!is_active_validator(&validator, 5));
    }

    #[test]
    fn withdrawability_requires_eth1_credentials() {
        let config = Config::default();
        let validator = eth1_validator(config.max_effective_balance);

        assert!(has_eth1_withdrawal_credential(&validator));
        assert!(is_partially_withdrawable_validator(
            &config,
            &validator,
            config.max_effective_balance + 1,
        ));
        assert!(!is_partially_withdrawable_validator(
            &config,
            &validator,
            config.max_effective_balance,
        ));
        assert!(!is_fully_withdrawable_validator(&validator, 1, 0));

        let bls_validator = Validator {
            withdrawal_credentials: H256::zero(),
            ..validator
        };

        assert!(!is_partially_withdrawable_validator(
            &config,
            &bls_validator,
            config.max_effective_balance + 1,
        ));
    }

    #[test]
    fn sidecar_with_tampered_commitment_is_rejected() {
        let merkleizer = Merkleizer::new();

        let body = BeaconBlockBody {
            blob_kzg_commitments: ContiguousList::try_from(vec![
                KzgCommitment::repeat_byte(1),
                KzgCommitment::repeat_byte(2),
            ])
            .expect("commitment count is within limit"),
            ..BeaconBlockBody::default()
        };

        let mut sidecar = BlobSidecar {
            index: 1,
            kzg_commitment: KzgCommitment::repeat_byte(2),
            kzg_commitment_inclusion_proof: misc::kzg_commitment_inclusion_proof(
                &body,
                1,
                &merkleizer,
            )
            .expect("index is within bounds"),
            ..BlobSidecar::default()
        };

        sidecar.signed_block_header.message.body_root = body.hash_tree_root(&merkleizer);

        assert!(is_valid_blob_sidecar_inclusion_proof(&sidecar, &merkleizer));

        sidecar.kzg_commitment = KzgCommitment::repeat_byte(1);

        assert!(!is_valid_blob_sidecar_inclusion_proof(&sidecar, &merkleizer));

        sidecar.kzg_commitment = KzgCommitment::repeat_byte(2);
        sidecar.index = 0;

        assert!(!is_valid_blob_sidecar_inclusion_proof(&sidecar, &merkleizer));
    }
}
