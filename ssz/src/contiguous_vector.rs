use core::{fmt::Debug, marker::PhantomData};

use derivative::Derivative;
use derive_more::{Deref, DerefMut};
use ethereum_types::H256;
use typenum::Unsigned;

use crate::{
    contiguous_list,
    error::{ReadError, WriteError},
    merkleizer::Merkleizer,
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    shared,
    size::Size,
};

/// Sequence of exactly `N` elements. Used for the ring buffers in `BeaconState`.
#[derive(Deref, DerefMut, Derivative)]
#[derivative(
    Clone(bound = "T: Clone"),
    PartialEq(bound = "T: PartialEq"),
    Eq(bound = "T: Eq"),
    Debug(bound = "T: Debug")
)]
pub struct ContiguousVector<T, N> {
    #[deref(forward)]
    #[deref_mut(forward)]
    elements: Box<[T]>,
    #[derivative(Debug = "ignore")]
    phantom: PhantomData<N>,
}

impl<T: Clone + Default, N: Unsigned> Default for ContiguousVector<T, N> {
    fn default() -> Self {
        Self {
            elements: vec![T::default(); N::USIZE].into_boxed_slice(),
            phantom: PhantomData,
        }
    }
}

impl<T, N: Unsigned> TryFrom<Vec<T>> for ContiguousVector<T, N> {
    type Error = ReadError;

    fn try_from(elements: Vec<T>) -> Result<Self, Self::Error> {
        let expected = N::USIZE;
        let actual = elements.len();

        if actual != expected {
            return Err(ReadError::VectorSizeMismatch { expected, actual });
        }

        Ok(Self {
            elements: elements.into_boxed_slice(),
            phantom: PhantomData,
        })
    }
}

impl<T, N: Unsigned> ContiguousVector<T, N> {
    /// Accesses the vector as a ring buffer.
    #[must_use]
    pub fn mod_index(&self, index: u64) -> &T {
        &self.elements[Self::wrap(index)]
    }

    pub fn mod_index_mut(&mut self, index: u64) -> &mut T {
        &mut self.elements[Self::wrap(index)]
    }

    #[expect(clippy::cast_possible_truncation)]
    const fn wrap(index: u64) -> usize {
        (index % N::U64) as usize
    }
}

impl<T: SszSize, N: Unsigned> SszSize for ContiguousVector<T, N> {
    const SIZE: Size = Size::for_vector(T::SIZE, N::USIZE);
}

impl<T: SszRead, N: Unsigned> SszRead for ContiguousVector<T, N> {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        shared::read_list(bytes)?.try_into()
    }
}

impl<T: SszWrite, N: Unsigned> SszWrite for ContiguousVector<T, N> {
    fn write_fixed(&self, bytes: &mut [u8]) {
        let size = T::SIZE.fixed_part();

        for (element, destination) in self.elements.iter().zip(bytes.chunks_exact_mut(size)) {
            element.write_fixed(destination);
        }
    }

    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        shared::write_list(bytes, &self.elements)
    }
}

impl<T: SszHash + SszWrite, N: Unsigned> SszHash for ContiguousVector<T, N> {
    fn hash_tree_root(&self, merkleizer: &Merkleizer) -> H256 {
        contiguous_list::merkleize_elements(merkleizer, &self.elements, N::U64)
    }
}

#[cfg(test)]
mod tests {
    use typenum::{U3, U8};

    use super::*;

    #[test]
    fn wrong_number_of_elements_is_rejected() {
        assert_eq!(
            ContiguousVector::<H256, U3>::from_ssz([0; 64]),
            Err(ReadError::FixedSizeMismatch {
                expected: 96,
                actual: 64,
            }),
        );

        assert_eq!(
            ContiguousVector::<u64, U3>::try_from(vec![1, 2]),
            Err(ReadError::VectorSizeMismatch {
                expected: 3,
                actual: 2,
            }),
        );
    }

    #[test]
    fn indices_wrap_around() {
        let mut vector = ContiguousVector::<u64, U8>::default();
        *vector.mod_index_mut(11) = 7;

        assert_eq!(vector[3], 7);
        assert_eq!(*vector.mod_index(19), 7);
    }

    #[test]
    fn vector_root_has_no_length_mixin() {
        let merkleizer = Merkleizer::new();
        let roots = vec![H256::repeat_byte(1), H256::repeat_byte(2), H256::repeat_byte(3)];
        let vector = ContiguousVector::<H256, U3>::try_from(roots.clone()).expect("3 elements");

        assert_eq!(
            vector.hash_tree_root(&merkleizer),
            merkleizer.merkleize_vector(&roots, 3),
        );
    }
}
