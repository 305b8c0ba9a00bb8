// Fixed-size hashes correspond to `BytesN` in SSZ. They are not basic types, so they are never
// packed together when they appear in lists.

use ethereum_types::{H160, H256, H32};
use primitive_types::{H384, H768};

use crate::{
    error::ReadError,
    merkleizer::{self, Merkleizer},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    size::Size,
};

macro_rules! impl_for_fixed_hash {
    ($type: ty) => {
        impl SszSize for $type {
            const SIZE: Size = Size::Fixed {
                size: <$type>::len_bytes(),
            };
        }

        impl SszRead for $type {
            #[inline]
            fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
                Ok(Self::from_slice(bytes))
            }
        }

        impl SszWrite for $type {
            #[inline]
            fn write_fixed(&self, bytes: &mut [u8]) {
                bytes.copy_from_slice(self.as_bytes());
            }
        }

        impl SszHash for $type {
            #[inline]
            fn hash_tree_root(&self, merkleizer: &Merkleizer) -> H256 {
                let chunk_limit = merkleizer::chunk_count(<$type>::len_bytes() as u64);
                merkleizer.merkleize_bytes(self.as_bytes(), chunk_limit)
            }
        }
    };
}

impl_for_fixed_hash!(H32);
impl_for_fixed_hash!(H160);
impl_for_fixed_hash!(H384);
impl_for_fixed_hash!(H768);

impl SszSize for H256 {
    const SIZE: Size = Size::Fixed {
        size: Self::len_bytes(),
    };
}

impl SszRead for H256 {
    #[inline]
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self::from_slice(bytes))
    }
}

impl SszWrite for H256 {
    #[inline]
    fn write_fixed(&self, bytes: &mut [u8]) {
        bytes.copy_from_slice(self.as_bytes());
    }
}

impl SszHash for H256 {
    #[inline]
    fn hash_tree_root(&self, _merkleizer: &Merkleizer) -> H256 {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h384_root_is_root_of_two_chunks() {
        let merkleizer = Merkleizer::new();
        let value = H384::repeat_byte(0x42);

        let mut second = H256::zero();
        second[..16].copy_from_slice(&[0x42; 16]);

        assert_eq!(
            value.hash_tree_root(&merkleizer),
            hashing::hash_256_256(H256::repeat_byte(0x42), second),
        );
    }

    #[test]
    fn h160_root_is_zero_padded() {
        let merkleizer = Merkleizer::new();
        let address = H160::repeat_byte(0xee);

        let mut expected = H256::zero();
        expected[..20].copy_from_slice(address.as_bytes());

        assert_eq!(address.hash_tree_root(&merkleizer), expected);
    }
}
