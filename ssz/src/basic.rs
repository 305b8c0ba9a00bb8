use byteorder::ByteOrder as _;
use ethereum_types::{H256, U256};

use crate::{
    consts::{Endianness, BYTES_PER_CHUNK},
    error::ReadError,
    merkleizer::Merkleizer,
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    size::Size,
};

impl SszSize for bool {
    const SIZE: Size = Size::Fixed { size: 1 };
}

impl SszRead for bool {
    #[inline]
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        match bytes[0] {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(ReadError::InvalidBool { value }),
        }
    }
}

impl SszWrite for bool {
    #[inline]
    fn write_fixed(&self, bytes: &mut [u8]) {
        bytes[0] = (*self).into();
    }
}

impl SszHash for bool {
    const PACKING_FACTOR: usize = BYTES_PER_CHUNK;

    #[inline]
    fn hash_tree_root(&self, _merkleizer: &Merkleizer) -> H256 {
        let mut chunk = H256::zero();
        chunk.0[0] = (*self).into();
        chunk
    }
}

impl SszSize for u8 {
    const SIZE: Size = Size::Fixed { size: 1 };
}

impl SszRead for u8 {
    #[inline]
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(bytes[0])
    }
}

impl SszWrite for u8 {
    #[inline]
    fn write_fixed(&self, bytes: &mut [u8]) {
        bytes[0] = *self;
    }
}

impl SszHash for u8 {
    const PACKING_FACTOR: usize = BYTES_PER_CHUNK;

    #[inline]
    fn hash_tree_root(&self, _merkleizer: &Merkleizer) -> H256 {
        let mut chunk = H256::zero();
        chunk.0[0] = *self;
        chunk
    }
}

macro_rules! impl_for_unsigned {
    ($type: ty, $read: ident, $write: ident) => {
        impl SszSize for $type {
            const SIZE: Size = Size::Fixed {
                size: size_of::<$type>(),
            };
        }

        impl SszRead for $type {
            #[inline]
            fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
                Ok(Endianness::$read(bytes))
            }
        }

        impl SszWrite for $type {
            #[inline]
            fn write_fixed(&self, bytes: &mut [u8]) {
                Endianness::$write(bytes, *self);
            }
        }

        impl SszHash for $type {
            const PACKING_FACTOR: usize = BYTES_PER_CHUNK / size_of::<$type>();

            #[inline]
            fn hash_tree_root(&self, _merkleizer: &Merkleizer) -> H256 {
                let mut chunk = H256::zero();
                self.write_fixed(&mut chunk[..size_of::<$type>()]);
                chunk
            }
        }
    };
}

impl_for_unsigned!(u16, read_u16, write_u16);
impl_for_unsigned!(u32, read_u32, write_u32);
impl_for_unsigned!(u64, read_u64, write_u64);

impl SszSize for U256 {
    const SIZE: Size = Size::Fixed {
        size: BYTES_PER_CHUNK,
    };
}

impl SszRead for U256 {
    #[inline]
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self::from_little_endian(bytes))
    }
}

impl SszWrite for U256 {
    #[inline]
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.to_little_endian(bytes);
    }
}

impl SszHash for U256 {
    #[inline]
    fn hash_tree_root(&self, _merkleizer: &Merkleizer) -> H256 {
        let mut chunk = H256::zero();
        self.to_little_endian(chunk.as_bytes_mut());
        chunk
    }
}
