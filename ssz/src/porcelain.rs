use ethereum_types::H256;

use crate::{
    error::{ReadError, WriteError},
    merkleizer::Merkleizer,
    size::Size,
};

pub trait SszSize {
    const SIZE: Size;
}

pub trait SszRead: SszSize + Sized {
    /// Attempts to deserialize `bytes` into `Self` without checking the length of `bytes`.
    ///
    /// Fixed-size impls may assume `bytes` has exactly [`SszSize::SIZE`] bytes.
    /// Call [`SszRead::from_ssz`] outside of other `SszRead` impls.
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError>;

    fn from_ssz(bytes: impl AsRef<[u8]>) -> Result<Self, ReadError> {
        let bytes = bytes.as_ref();

        if let Size::Fixed { size: expected } = Self::SIZE {
            let actual = bytes.len();

            if actual != expected {
                return Err(ReadError::FixedSizeMismatch { expected, actual });
            }
        }

        Self::from_ssz_unchecked(bytes)
    }
}

pub trait SszWrite: SszSize {
    // Exactly one of these is called for any given type depending on `SszSize::SIZE`.
    fn write_fixed(&self, _bytes: &mut [u8]) {
        panic!("SszWrite::write_fixed must be implemented for fixed-size types");
    }

    fn write_variable(&self, _bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        panic!("SszWrite::write_variable must be implemented for variable-size types");
    }

    fn to_ssz(&self) -> Result<Vec<u8>, WriteError> {
        match Self::SIZE {
            Size::Fixed { size } => {
                let mut bytes = vec![0; size];
                self.write_fixed(bytes.as_mut_slice());
                Ok(bytes)
            }
            Size::Variable { minimum_size } => {
                let mut bytes = Vec::with_capacity(minimum_size);
                self.write_variable(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

pub trait SszHash {
    /// Number of values packed into a single chunk when the type is an element of a list or
    /// vector. Only basic types have a packing factor greater than 1.
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self, merkleizer: &Merkleizer) -> H256;
}
