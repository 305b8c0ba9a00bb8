use core::{fmt::Debug, marker::PhantomData};

use derivative::Derivative;
use derive_more::{Deref, DerefMut};
use ethereum_types::H256;
use typenum::Unsigned;

use crate::{
    byte_list,
    error::{PushError, ReadError, WriteError},
    merkleizer::{self, Merkleizer},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    shared,
    size::Size,
};

/// List of at most `N` elements stored contiguously in memory.
///
/// The limit is enforced on construction, so a value of this type can always be encoded.
#[derive(Deref, DerefMut, Derivative)]
#[derivative(
    Clone(bound = "T: Clone"),
    PartialEq(bound = "T: PartialEq"),
    Eq(bound = "T: Eq"),
    Default(bound = ""),
    Debug(bound = "T: Debug")
)]
pub struct ContiguousList<T, N> {
    #[deref(forward)]
    #[deref_mut(forward)]
    elements: Vec<T>,
    #[derivative(Debug = "ignore")]
    phantom: PhantomData<N>,
}

impl<T, N: Unsigned> TryFrom<Vec<T>> for ContiguousList<T, N> {
    type Error = ReadError;

    fn try_from(elements: Vec<T>) -> Result<Self, Self::Error> {
        byte_list::validate_length::<N>(elements.len())?;

        Ok(Self {
            elements,
            phantom: PhantomData,
        })
    }
}

impl<'list, T, N> IntoIterator for &'list ContiguousList<T, N> {
    type Item = &'list T;
    type IntoIter = core::slice::Iter<'list, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T, N> IntoIterator for ContiguousList<T, N> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<T, N: Unsigned> ContiguousList<T, N> {
    pub fn push(&mut self, element: T) -> Result<(), PushError> {
        if self.elements.len() >= N::USIZE {
            return Err(PushError::ListFull);
        }

        self.elements.push(element);

        Ok(())
    }

    #[must_use]
    pub fn len_u64(&self) -> u64 {
        self.elements.len() as u64
    }
}

impl<T, N> SszSize for ContiguousList<T, N> {
    const SIZE: Size = Size::Variable { minimum_size: 0 };
}

impl<T: SszRead, N: Unsigned> SszRead for ContiguousList<T, N> {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        // Reject oversized lists of fixed-size elements before decoding any of them.
        if let Size::Fixed { size } = T::SIZE {
            byte_list::validate_length::<N>(bytes.len() / size)?;
        }

        shared::read_list(bytes)?.try_into()
    }
}

impl<T: SszWrite, N> SszWrite for ContiguousList<T, N> {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        shared::write_list(bytes, &self.elements)
    }
}

impl<T: SszHash + SszWrite, N: Unsigned> SszHash for ContiguousList<T, N> {
    fn hash_tree_root(&self, merkleizer: &Merkleizer) -> H256 {
        let root = merkleize_elements(merkleizer, &self.elements, N::U64);
        merkleizer::mix_in_length(root, self.elements.len())
    }
}

/// Merkleizes a sequence of up to `limit` elements, packing basic values into shared chunks.
pub(crate) fn merkleize_elements<T: SszHash + SszWrite>(
    merkleizer: &Merkleizer,
    elements: &[T],
    limit: u64,
) -> H256 {
    if T::PACKING_FACTOR == 1 {
        let roots = elements
            .iter()
            .map(|element| element.hash_tree_root(merkleizer))
            .collect::<Vec<_>>();

        return merkleizer.merkleize_vector(&roots, limit);
    }

    let element_size = T::SIZE.fixed_part();
    let mut bytes = vec![0; elements.len() * element_size];

    for (element, destination) in elements.iter().zip(bytes.chunks_exact_mut(element_size)) {
        element.write_fixed(destination);
    }

    let chunk_limit = limit.div_ceil(T::PACKING_FACTOR as u64);

    merkleizer.merkleize_bytes(&bytes, chunk_limit)
}

#[cfg(test)]
mod tests {
    use typenum::{U16, U2, U4};

    use super::*;
    use crate::byte_list::ByteList;

    #[test]
    fn push_fails_when_list_is_full() {
        let mut list = ContiguousList::<u64, U2>::try_from(vec![1, 2]).expect("within limit");
        assert_eq!(list.push(3), Err(PushError::ListFull));
    }

    #[test]
    fn decoding_more_elements_than_limit_fails() {
        let bytes = [0_u8; 8 * 3];

        assert_eq!(
            ContiguousList::<u64, U2>::from_ssz(bytes),
            Err(ReadError::ListTooLarge {
                limit: 2,
                actual: 3,
            }),
        );
    }

    #[test]
    fn list_of_variable_size_elements_round_trips() {
        let elements = [vec![1, 2, 3], vec![], vec![4]]
            .into_iter()
            .map(ByteList::<U16>::try_from)
            .collect::<Result<Vec<_>, _>>()
            .expect("elements are within limit");

        let list = ContiguousList::<_, U4>::try_from(elements).expect("within limit");
        let bytes = list.to_ssz().expect("offsets fit in 4 bytes");

        assert_eq!(bytes[..12], [12, 0, 0, 0, 15, 0, 0, 0, 15, 0, 0, 0]);
        assert_eq!(ContiguousList::from_ssz(bytes), Ok(list));
    }

    #[test]
    fn u64_values_are_packed_four_per_chunk() {
        let merkleizer = Merkleizer::new();
        let list = ContiguousList::<u64, U16>::try_from(vec![1, 2, 3, 4, 5]).expect("within limit");

        let mut first = H256::zero();
        for (index, value) in [1_u64, 2, 3, 4].into_iter().enumerate() {
            first[index * 8..index * 8 + 8].copy_from_slice(&value.to_le_bytes());
        }

        let mut second = H256::zero();
        second[..8].copy_from_slice(&5_u64.to_le_bytes());

        let expected = hashing::hash_256_length(merkleizer.merkleize_vector(&[first, second], 4), 5);

        assert_eq!(list.hash_tree_root(&merkleizer), expected);
    }
}
