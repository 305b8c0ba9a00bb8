use ethereum_types::H256;
use generic_array::GenericArray;
use hex_literal::hex;
use rayon::{
    iter::{IndexedParallelIterator as _, ParallelIterator as _},
    slice::ParallelSlice as _,
};
use sha2::{
    digest::{core_api::BlockSizeUser, generic_array::typenum::Unsigned as _},
    Digest as _, Sha256,
};

// Hashing a level of a tree in parallel only pays off once there are enough pairs to amortize
// the cost of splitting work between `rayon` threads.
const PARALLEL_PAIR_THRESHOLD: usize = 1 << 12;

// Hardcoding the padding lets every hash of a fixed-size input go straight to `sha2::compress256`.

#[rustfmt::skip]
const BLOCK_WITH_PADDING_FOR_384_BITS: Sha256Block = hex!("
    00000000 00000000 00000000 00000000
    00000000 00000000 00000000 00000000
    00000000 00000000 00000000 00000000
    80000000 00000000 00000000 00000180
");

#[rustfmt::skip]
const PADDING_BLOCK_FOR_512_BITS: Sha256Block = hex!("
    80000000 00000000 00000000 00000000
    00000000 00000000 00000000 00000000
    00000000 00000000 00000000 00000000
    00000000 00000000 00000000 00000200
");

type Sha256BlockSize = <Sha256 as BlockSizeUser>::BlockSize;
type Sha256Block = [u8; Sha256BlockSize::USIZE];

struct Sha256State([u32; 8]);

impl Default for Sha256State {
    #[rustfmt::skip]
    fn default() -> Self {
        Self([
            0x6a09_e667, 0xbb67_ae85, 0x3c6e_f372, 0xa54f_f53a,
            0x510e_527f, 0x9b05_688c, 0x1f83_d9ab, 0x5be0_cd19,
        ])
    }
}

impl Sha256State {
    fn compress(mut self, blocks: &[GenericArray<u8, Sha256BlockSize>]) -> Self {
        sha2::compress256(&mut self.0, blocks);
        self
    }

    fn output(self) -> H256 {
        let mut output = H256::zero();

        for (destination, word) in output.as_bytes_mut().chunks_exact_mut(4).zip(self.0) {
            destination.copy_from_slice(&word.to_be_bytes());
        }

        output
    }
}

/// Hashes the concatenation of two 32 byte values. This is the inner node function of every
/// Merkle tree in the workspace.
#[inline]
#[must_use]
pub fn hash_256_256(left: H256, right: H256) -> H256 {
    let mut block = GenericArray::default();
    block[..32].copy_from_slice(left.as_bytes());
    block[32..].copy_from_slice(right.as_bytes());

    let padding_block = *GenericArray::from_slice(&PADDING_BLOCK_FOR_512_BITS);

    Sha256State::default()
        .compress(&[block, padding_block])
        .output()
}

/// Hashes `root` together with `length` encoded as a little-endian 32 byte integer.
#[inline]
#[must_use]
pub fn hash_256_length(root: H256, length: u64) -> H256 {
    let mut length_chunk = H256::zero();
    length_chunk[..size_of::<u64>()].copy_from_slice(&length.to_le_bytes());
    hash_256_256(root, length_chunk)
}

/// Hashes a 48 byte value such as a KZG commitment.
#[inline]
#[must_use]
pub fn hash_384(bytes: &[u8; 48]) -> H256 {
    let mut block = BLOCK_WITH_PADDING_FOR_384_BITS;
    block[..48].copy_from_slice(bytes);

    Sha256State::default()
        .compress(core::slice::from_ref(GenericArray::from_slice(&block)))
        .output()
}

/// Hashes input of arbitrary length. Used for values outside Merkle trees.
#[must_use]
pub fn hash_bytes(bytes: impl AsRef<[u8]>) -> H256 {
    H256(Sha256::digest(bytes).into())
}

/// Hashes adjacent pairs of `nodes`, producing the next level of a Merkle tree.
///
/// `nodes` must have an even length. Large levels are hashed in parallel.
/// The output is identical to hashing the pairs one at a time.
#[must_use]
pub fn hash_pairs(nodes: &[H256]) -> Vec<H256> {
    debug_assert!(nodes.len() % 2 == 0);

    if nodes.len() / 2 < PARALLEL_PAIR_THRESHOLD {
        return nodes
            .chunks_exact(2)
            .map(|pair| hash_256_256(pair[0], pair[1]))
            .collect();
    }

    nodes
        .par_chunks_exact(2)
        .with_min_len(PARALLEL_PAIR_THRESHOLD / 4)
        .map(|pair| hash_256_256(pair[0], pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    const ZERO_HASH_1: H256 = H256(hex!(
        "f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a92759fb4b"
    ));

    #[test]
    fn hash_256_256_matches_generic_sha256() {
        let left = H256::repeat_byte(0x11);
        let right = H256::repeat_byte(0xaa);

        let mut concatenated = left.as_bytes().to_vec();
        concatenated.extend_from_slice(right.as_bytes());

        assert_eq!(hash_256_256(left, right), hash_bytes(concatenated));
        assert_eq!(hash_256_256(H256::zero(), H256::zero()), ZERO_HASH_1);
    }

    #[test]
    fn hash_256_length_encodes_length_little_endian() {
        let root = H256::repeat_byte(7);

        let mut preimage = root.as_bytes().to_vec();
        preimage.extend_from_slice(&[3, 1]);
        preimage.resize(64, 0);

        assert_eq!(hash_256_length(root, 0x0103), hash_bytes(preimage));
    }

    #[test]
    fn hash_384_matches_generic_sha256() {
        let bytes = [0x5c; 48];
        assert_eq!(hash_384(&bytes), hash_bytes(bytes));
    }

    #[test_case(2)]
    #[test_case(64)]
    #[test_case(PARALLEL_PAIR_THRESHOLD * 2 + 2; "parallel")]
    fn hash_pairs_matches_sequential_hashing(node_count: usize) {
        let nodes = (0..node_count)
            .map(|index| H256::from_low_u64_le(index as u64))
            .collect::<Vec<_>>();

        let expected = nodes
            .chunks_exact(2)
            .map(|pair| hash_256_256(pair[0], pair[1]))
            .collect::<Vec<_>>();

        assert_eq!(hash_pairs(&nodes), expected);
    }
}
