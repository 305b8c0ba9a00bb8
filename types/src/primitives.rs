pub use ethereum_types::{H160, H256, H32, U256};
pub use primitive_types::{H384, H768};

use ssz::{ByteList, ByteVector};

use crate::consts::{BytesPerBlob, BytesPerLogsBloom, MaxBytesPerTransaction, MaxExtraDataBytes};

pub type BlobIndex = u64;
pub type DepositIndex = u64;
pub type Epoch = u64;
pub type ExecutionAddress = H160;
pub type ExecutionBlockHash = H256;
pub type ExecutionBlockNumber = u64;
pub type Gas = u64;
pub type Gwei = u64;
pub type Slot = u64;
pub type UnixSeconds = u64;
pub type ValidatorIndex = u64;
pub type Version = H32;
pub type VersionedHash = H256;
pub type WithdrawalIndex = u64;

pub type KzgCommitment = H384;
pub type KzgProof = H384;
pub type PublicKeyBytes = H384;
pub type SignatureBytes = H768;

pub type Blob = ByteVector<BytesPerBlob>;
pub type ExtraData = ByteList<MaxExtraDataBytes>;
pub type LogsBloom = ByteVector<BytesPerLogsBloom>;
pub type Transaction = ByteList<MaxBytesPerTransaction>;
