use hex_literal::hex;
use typenum::{U1048576, U1073741824, U1099511627776, U131072, U16, U256, U32, U65536, U8, U8192};

use crate::primitives::{Epoch, Slot};

pub const FAR_FUTURE_EPOCH: Epoch = Epoch::MAX;
pub const GENESIS_SLOT: Slot = 0;
pub const SLOTS_PER_EPOCH: u64 = 32;
pub const VERSIONED_HASH_VERSION_KZG: &[u8] = &hex!("01");

pub const MIN_VALIDATOR_WITHDRAWABILITY_DELAY: Epoch = 256;

/// Upper bound on the number of validators checked for withdrawals in a single block.
pub const MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP: u64 = 1 << 14;

/// Withdrawal credentials starting with this byte contain an execution address.
pub const ETH1_ADDRESS_WITHDRAWAL_PREFIX: u8 = 0x01;

/// Number of fields in `BeaconBlockBody`.
pub const BEACON_BLOCK_BODY_FIELD_COUNT: u64 = 6;

/// Position of `blob_kzg_commitments` among the fields of `BeaconBlockBody`.
pub const BLOB_KZG_COMMITMENTS_FIELD_INDEX: u64 = 5;

pub type BytesPerBlob = U131072;
pub type BytesPerLogsBloom = U256;
pub type EpochsPerHistoricalVector = U65536;
pub type KzgCommitmentInclusionProofDepth = U8;
pub type MaxBlobCommitmentsPerBlock = U16;
pub type MaxBlobsPerBlock = U16;
pub type MaxBytesPerTransaction = U1073741824;
pub type MaxDepositsPerBlock = U16;
pub type MaxExtraDataBytes = U32;
pub type MaxTransactionsPerPayload = U1048576;
pub type MaxWithdrawalsPerPayload = U16;
pub type SlotsPerHistoricalRoot = U8192;
pub type ValidatorRegistryLimit = U1099511627776;
