use core::{
    fmt::{Debug, Formatter, Result as FmtResult},
    marker::PhantomData,
};

use derivative::Derivative;
use derive_more::Deref;
use ethereum_types::H256;
use typenum::Unsigned;

use crate::{
    error::ReadError,
    merkleizer::{self, Merkleizer},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    size::Size,
};

/// Byte string of exactly `N` bytes.
#[derive(Deref, Derivative)]
#[derivative(Clone(bound = ""), PartialEq(bound = ""), Eq(bound = ""))]
pub struct ByteVector<N> {
    #[deref(forward)]
    bytes: Box<[u8]>,
    phantom: PhantomData<N>,
}

impl<N: Unsigned> Default for ByteVector<N> {
    fn default() -> Self {
        Self {
            bytes: vec![0; N::USIZE].into_boxed_slice(),
            phantom: PhantomData,
        }
    }
}

impl<N: Unsigned> TryFrom<Vec<u8>> for ByteVector<N> {
    type Error = ReadError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::try_from(bytes.as_slice())
    }
}

impl<N: Unsigned> TryFrom<&[u8]> for ByteVector<N> {
    type Error = ReadError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let expected = N::USIZE;
        let actual = bytes.len();

        if actual != expected {
            return Err(ReadError::BytesLengthMismatch { expected, actual });
        }

        Ok(Self {
            bytes: bytes.into(),
            phantom: PhantomData,
        })
    }
}

impl<N> ByteVector<N> {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl<N> AsRef<[u8]> for ByteVector<N> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<N> Debug for ByteVector<N> {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "0x{}", hex::encode(&self.bytes))
    }
}

impl<N: Unsigned> SszSize for ByteVector<N> {
    const SIZE: Size = Size::Fixed { size: N::USIZE };
}

impl<N: Unsigned> SszRead for ByteVector<N> {
    #[inline]
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Self::try_from(bytes)
    }
}

impl<N: Unsigned> SszWrite for ByteVector<N> {
    #[inline]
    fn write_fixed(&self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.bytes);
    }
}

impl<N: Unsigned> SszHash for ByteVector<N> {
    fn hash_tree_root(&self, merkleizer: &Merkleizer) -> H256 {
        merkleizer.merkleize_bytes(&self.bytes, merkleizer::chunk_count(N::U64))
    }
}
