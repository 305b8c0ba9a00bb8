use ethereum_types::H256;

use crate::{
    consts::{BYTES_PER_CHUNK, MAX_TREE_DEPTH},
    error::MerkleError,
};

/// Computes Merkle roots over 32 byte chunks.
///
/// Owns the table of zero hashes used to pad trees. The table is built once in
/// [`Merkleizer::new`] and never modified afterwards, so a single instance can be shared between
/// threads (usually as an `Arc<Merkleizer>`) and passed to every [`SszHash`] call.
///
/// [`SszHash`]: crate::SszHash
#[derive(Debug)]
pub struct Merkleizer {
    zero_hashes: Box<[H256; MAX_TREE_DEPTH + 1]>,
}

impl Default for Merkleizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Merkleizer {
    #[must_use]
    pub fn new() -> Self {
        let mut zero_hashes = Box::new([H256::zero(); MAX_TREE_DEPTH + 1]);

        for depth in 1..=MAX_TREE_DEPTH {
            let below = zero_hashes[depth - 1];
            zero_hashes[depth] = hashing::hash_256_256(below, below);
        }

        Self { zero_hashes }
    }

    /// Root of a tree of the given depth in which every leaf is a zero chunk.
    #[must_use]
    pub fn zero_hash(&self, depth: usize) -> H256 {
        self.zero_hashes[depth]
    }

    /// Merkleizes `chunks` as the leaves of a tree deep enough to hold `limit` chunks.
    ///
    /// Callers must ensure `chunks.len() <= limit`.
    /// Use [`Merkleizer::merkleize_vector_safe`] for unvalidated input.
    #[must_use]
    pub fn merkleize_vector(&self, chunks: &[H256], limit: u64) -> H256 {
        let depth = depth_for_limit(limit);

        let Some((first, rest)) = chunks.split_first() else {
            return self.zero_hash(depth);
        };

        if rest.is_empty() {
            return self.pad_to_depth(*first, 0, depth);
        }

        let mut layer = chunks.to_vec();

        for level in 0..depth {
            if layer.len() == 1 {
                return self.pad_to_depth(layer[0], level, depth);
            }

            if layer.len() % 2 == 1 {
                layer.push(self.zero_hashes[level]);
            }

            layer = hashing::hash_pairs(&layer);
        }

        layer[0]
    }

    pub fn merkleize_vector_safe(&self, chunks: &[H256], limit: u64) -> Result<H256, MerkleError> {
        validate_chunk_count(chunks, limit)?;
        Ok(self.merkleize_vector(chunks, limit))
    }

    /// Merkleizes `chunks` with list semantics and mixes in `chunks.len()`.
    #[must_use]
    pub fn merkleize_vector_mixin_length(&self, chunks: &[H256], limit: u64) -> H256 {
        let root = self.merkleize_vector(chunks, limit);
        mix_in_length(root, chunks.len())
    }

    pub fn merkleize_vector_mixin_length_safe(
        &self,
        chunks: &[H256],
        limit: u64,
    ) -> Result<H256, MerkleError> {
        validate_chunk_count(chunks, limit)?;
        Ok(self.merkleize_vector_mixin_length(chunks, limit))
    }

    /// Root of a container given the roots of its fields in declaration order.
    #[must_use]
    pub fn merkleize_fields(&self, field_roots: &[H256]) -> H256 {
        self.merkleize_vector(field_roots, field_roots.len() as u64)
    }

    /// Packs `bytes` into zero-padded chunks and merkleizes them.
    #[must_use]
    pub fn merkleize_bytes(&self, bytes: &[u8], chunk_limit: u64) -> H256 {
        self.merkleize_vector(&pack(bytes), chunk_limit)
    }

    /// Sibling nodes on the path from the leaf at `index` to the root, ordered bottom-up.
    #[must_use]
    pub fn merkle_proof(&self, chunks: &[H256], limit: u64, index: usize) -> Vec<H256> {
        let depth = depth_for_limit(limit);
        let mut proof = Vec::with_capacity(depth);
        let mut layer = chunks.to_vec();
        let mut position = index;

        for level in 0..depth {
            let sibling = layer
                .get(position ^ 1)
                .copied()
                .unwrap_or(self.zero_hashes[level]);

            proof.push(sibling);

            if layer.len() % 2 == 1 {
                layer.push(self.zero_hashes[level]);
            }

            layer = hashing::hash_pairs(&layer);
            position /= 2;
        }

        proof
    }

    fn pad_to_depth(&self, mut node: H256, from_level: usize, depth: usize) -> H256 {
        for level in from_level..depth {
            node = hashing::hash_256_256(node, self.zero_hashes[level]);
        }

        node
    }
}

#[must_use]
pub fn mix_in_length(root: H256, length: usize) -> H256 {
    // `usize` is never wider than 64 bits on supported platforms.
    hashing::hash_256_length(root, length as u64)
}

/// Checks a Merkle branch produced by [`Merkleizer::merkle_proof`].
///
/// `index` is the position of `leaf` among the leaves at the bottom of the branch.
#[must_use]
pub fn is_valid_merkle_branch(
    leaf: H256,
    branch: impl IntoIterator<Item = H256>,
    index: u64,
    root: H256,
) -> bool {
    let mut node = leaf;

    for (height, sibling) in branch.into_iter().enumerate() {
        if (index >> height) & 1 == 1 {
            node = hashing::hash_256_256(sibling, node);
        } else {
            node = hashing::hash_256_256(node, sibling);
        }
    }

    node == root
}

/// Splits `bytes` into chunks, padding the last one with zeros.
#[must_use]
pub fn pack(bytes: &[u8]) -> Vec<H256> {
    bytes
        .chunks(BYTES_PER_CHUNK)
        .map(|bytes| {
            let mut chunk = H256::zero();
            chunk[..bytes.len()].copy_from_slice(bytes);
            chunk
        })
        .collect()
}

/// Number of chunks needed to hold `length` bytes.
#[must_use]
pub const fn chunk_count(length: u64) -> u64 {
    length.div_ceil(BYTES_PER_CHUNK as u64)
}

/// `ceil(log2(limit))`, with limits of 0 and 1 both yielding a tree consisting of a single leaf.
#[must_use]
pub const fn depth_for_limit(limit: u64) -> usize {
    if limit <= 1 {
        return 0;
    }

    (u64::BITS - (limit - 1).leading_zeros()) as usize
}

fn validate_chunk_count(chunks: &[H256], limit: u64) -> Result<(), MerkleError> {
    let length = chunks.len();

    if length as u64 > limit {
        return Err(MerkleError::LimitExceeded { length, limit });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn chunks(count: u64) -> Vec<H256> {
        (1..=count).map(H256::from_low_u64_be).collect()
    }

    // Straightforward pairwise implementation used as a reference.
    fn reference_root(chunks: &[H256], limit: u64) -> H256 {
        let depth = depth_for_limit(limit);
        let mut layer = chunks.to_vec();
        layer.resize(1 << depth, H256::zero());

        for _ in 0..depth {
            layer = layer
                .chunks_exact(2)
                .map(|pair| hashing::hash_256_256(pair[0], pair[1]))
                .collect();
        }

        layer[0]
    }

    #[test_case(0 => 0)]
    #[test_case(1 => 0)]
    #[test_case(2 => 1)]
    #[test_case(3 => 2)]
    #[test_case(4 => 2)]
    #[test_case(5 => 3)]
    #[test_case(16 => 4)]
    #[test_case(1 << 40 => 40)]
    #[test_case(u64::MAX => 64)]
    fn depth_is_ceiling_of_log2(limit: u64) -> usize {
        depth_for_limit(limit)
    }

    #[test]
    fn higher_zero_hashes_are_calculated_from_lower_ones() {
        let merkleizer = Merkleizer::new();

        for depth in 1..=MAX_TREE_DEPTH {
            let below = merkleizer.zero_hash(depth - 1);
            assert_eq!(
                hashing::hash_256_256(below, below),
                merkleizer.zero_hash(depth),
            );
        }
    }

    #[test_case(1, 0)]
    #[test_case(2, 1)]
    #[test_case(4, 2)]
    #[test_case(8, 3)]
    #[test_case(16, 4)]
    fn empty_vector_root_is_zero_hash_at_depth(limit: u64, depth: usize) {
        let merkleizer = Merkleizer::new();

        assert_eq!(
            merkleizer.merkleize_vector(&[], limit),
            merkleizer.zero_hash(depth),
        );
    }

    #[test_case(1, 1)]
    #[test_case(3, 4)]
    #[test_case(5, 8)]
    #[test_case(7, 16)]
    #[test_case(100, 1024)]
    #[test_case(9000, 9000)]
    fn root_matches_pairwise_reference(count: u64, limit: u64) {
        let merkleizer = Merkleizer::new();
        let chunks = chunks(count);

        assert_eq!(
            merkleizer.merkleize_vector(&chunks, limit),
            reference_root(&chunks, limit),
        );
    }

    #[test]
    fn odd_length_level_is_padded_with_zero_hash() {
        let merkleizer = Merkleizer::new();
        let odd = chunks(3);
        let mut padded = odd.clone();
        padded.push(merkleizer.zero_hash(0));

        assert_eq!(
            merkleizer.merkleize_vector(&odd, 4),
            merkleizer.merkleize_vector(&padded, 4),
        );

        // Three chunks become two nodes at level 1, then one. Five chunks have an odd level 1.
        let five = chunks(5);
        let mut level_1 = hashing::hash_pairs(&[five.clone(), vec![H256::zero()]].concat());
        level_1.push(merkleizer.zero_hash(1));
        let level_2 = hashing::hash_pairs(&level_1);
        let expected = hashing::hash_256_256(level_2[0], level_2[1]);

        assert_eq!(merkleizer.merkleize_vector(&five, 8), expected);
    }

    #[test_case(1)]
    #[test_case(2)]
    #[test_case(3)]
    #[test_case(16)]
    fn safe_merkleization_rejects_more_chunks_than_limit(limit: u64) {
        let merkleizer = Merkleizer::new();
        let chunks = chunks(limit + 1);

        assert_eq!(
            merkleizer.merkleize_vector_safe(&chunks, limit),
            Err(MerkleError::LimitExceeded {
                length: chunks.len(),
                limit,
            }),
        );

        assert_eq!(
            merkleizer.merkleize_vector_mixin_length_safe(&chunks, limit),
            Err(MerkleError::LimitExceeded {
                length: chunks.len(),
                limit,
            }),
        );

        assert!(merkleizer
            .merkleize_vector_safe(&chunks[..chunks.len() - 1], limit)
            .is_ok());
    }

    #[test]
    fn mixin_distinguishes_lengths_with_identical_vector_roots() {
        let merkleizer = Merkleizer::new();
        let one_zero_chunk = [H256::zero()];
        let two_zero_chunks = [H256::zero(), H256::zero()];

        // Zero chunks are indistinguishable from padding.
        assert_eq!(
            merkleizer.merkleize_vector(&one_zero_chunk, 4),
            merkleizer.merkleize_vector(&two_zero_chunks, 4),
        );

        assert_ne!(
            merkleizer.merkleize_vector_mixin_length(&one_zero_chunk, 4),
            merkleizer.merkleize_vector_mixin_length(&two_zero_chunks, 4),
        );
    }

    #[test]
    fn proofs_verify_against_root() {
        let merkleizer = Merkleizer::new();
        let chunks = chunks(6);
        let root = merkleizer.merkleize_vector(&chunks, 16);

        for (index, leaf) in chunks.iter().copied().enumerate() {
            let proof = merkleizer.merkle_proof(&chunks, 16, index);

            assert_eq!(proof.len(), 4);
            assert!(is_valid_merkle_branch(leaf, proof.iter().copied(), index as u64, root));
            assert!(!is_valid_merkle_branch(leaf, proof, index as u64 + 1, root));
        }
    }
}
