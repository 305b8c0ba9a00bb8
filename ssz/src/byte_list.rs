use core::{
    fmt::{Debug, Formatter, Result as FmtResult},
    marker::PhantomData,
};

use derivative::Derivative;
use derive_more::Deref;
use ethereum_types::H256;
use typenum::Unsigned;

use crate::{
    error::{ReadError, WriteError},
    merkleizer::{self, Merkleizer},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    size::Size,
};

/// Byte string of at most `N` bytes.
#[derive(Deref, Derivative)]
#[derivative(
    Clone(bound = ""),
    PartialEq(bound = ""),
    Eq(bound = ""),
    Default(bound = "")
)]
pub struct ByteList<N> {
    #[deref(forward)]
    bytes: Vec<u8>,
    phantom: PhantomData<N>,
}

impl<N: Unsigned> TryFrom<Vec<u8>> for ByteList<N> {
    type Error = ReadError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        validate_length::<N>(bytes.len())?;

        Ok(Self {
            bytes,
            phantom: PhantomData,
        })
    }
}

impl<N> ByteList<N> {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<N> AsRef<[u8]> for ByteList<N> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<N> Debug for ByteList<N> {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "0x{}", hex::encode(&self.bytes))
    }
}

impl<N> SszSize for ByteList<N> {
    const SIZE: Size = Size::Variable { minimum_size: 0 };
}

impl<N: Unsigned> SszRead for ByteList<N> {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Self::try_from(bytes.to_vec())
    }
}

impl<N> SszWrite for ByteList<N> {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        bytes.extend_from_slice(&self.bytes);
        Ok(())
    }
}

impl<N: Unsigned> SszHash for ByteList<N> {
    fn hash_tree_root(&self, merkleizer: &Merkleizer) -> H256 {
        let root = merkleizer.merkleize_bytes(&self.bytes, merkleizer::chunk_count(N::U64));
        merkleizer::mix_in_length(root, self.bytes.len())
    }
}

pub(crate) fn validate_length<N: Unsigned>(actual: usize) -> Result<(), ReadError> {
    let limit = N::USIZE;

    if actual > limit {
        return Err(ReadError::ListTooLarge { limit, actual });
    }

    Ok(())
}
