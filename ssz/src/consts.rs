use byteorder::LittleEndian;
use ethereum_types::H256;

pub const BYTES_PER_CHUNK: usize = H256::len_bytes();
pub const BYTES_PER_LENGTH_OFFSET: usize = size_of::<Offset>();

/// Zero hashes are precomputed up to this depth. A tree this deep can hold `2^64` chunks,
/// which covers every limit expressible as a `u64`.
pub const MAX_TREE_DEPTH: usize = 64;

pub type Endianness = LittleEndian;
pub type Offset = u32;
