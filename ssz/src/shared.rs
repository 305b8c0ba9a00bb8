// Decoding has to reject every malformed input without panicking, so all slicing of untrusted
// bytes goes through `subslice` and every offset is validated before it is used.

use core::ops::Range;

use itertools::Itertools as _;

use crate::{
    consts::{Offset, BYTES_PER_LENGTH_OFFSET},
    error::{ReadError, WriteError},
    porcelain::{SszRead, SszWrite},
    size::Size,
};

#[inline]
pub fn subslice(bytes: &[u8], range: Range<usize>) -> Result<&[u8], ReadError> {
    let length = bytes.len();

    bytes.get(range.clone()).ok_or(ReadError::OffsetOutOfBounds {
        offset: range.end.max(range.start),
        length,
    })
}

#[inline]
pub fn read_offset(bytes: &[u8], position: usize) -> Result<usize, ReadError> {
    let offset_bytes = subslice(bytes, position..position + BYTES_PER_LENGTH_OFFSET)?;
    let offset = Offset::from_ssz(offset_bytes)?;

    offset
        .try_into()
        .map_err(|_| ReadError::OffsetDoesNotFitInUsize { offset })
}

#[inline]
pub fn write_offset(bytes: &mut [u8], destination: usize, offset: usize) -> Result<(), WriteError> {
    let offset = Offset::try_from(offset).map_err(|_| WriteError::OffsetTooBig { offset })?;
    offset.write_fixed(&mut bytes[destination..destination + BYTES_PER_LENGTH_OFFSET]);
    Ok(())
}

/// Validates a sequence of offsets and turns it into the byte ranges they delimit.
///
/// The first offset must not point into the fixed part, offsets must not decrease and none may
/// point past the end of the buffer. The last range extends to the end of the buffer.
pub fn offsets_to_ranges(
    offsets: &[usize],
    fixed_part: usize,
    length: usize,
) -> Result<Vec<Range<usize>>, ReadError> {
    if let Some(first) = offsets.first().copied() {
        if first < fixed_part {
            return Err(ReadError::FirstOffsetTooSmall {
                minimum: fixed_part,
                actual: first,
            });
        }
    }

    if let Some(last) = offsets.last().copied() {
        if last > length {
            return Err(ReadError::OffsetOutOfBounds {
                offset: last,
                length,
            });
        }
    }

    offsets
        .iter()
        .copied()
        .chain(core::iter::once(length))
        .tuple_windows()
        .map(|(previous, current)| {
            if previous > current {
                return Err(ReadError::OffsetsNotMonotonic { previous, current });
            }

            Ok(previous..current)
        })
        .collect()
}

pub fn read_list<T: SszRead>(bytes: &[u8]) -> Result<Vec<T>, ReadError> {
    if let Size::Fixed { size } = T::SIZE {
        if bytes.len() % size != 0 {
            return Err(ReadError::ListElementsMisaligned {
                length: bytes.len(),
                element_size: size,
            });
        }

        return bytes.chunks_exact(size).map(T::from_ssz_unchecked).collect();
    }

    if bytes.is_empty() {
        return Ok(vec![]);
    }

    let first_offset = read_offset(bytes, 0)?;

    if first_offset % BYTES_PER_LENGTH_OFFSET != 0 || first_offset == 0 {
        return Err(ReadError::ListFirstOffsetUnaligned { first_offset });
    }

    let element_count = first_offset / BYTES_PER_LENGTH_OFFSET;

    let offsets = (0..element_count)
        .map(|index| read_offset(bytes, index * BYTES_PER_LENGTH_OFFSET))
        .collect::<Result<Vec<_>, _>>()?;

    offsets_to_ranges(&offsets, first_offset, bytes.len())?
        .into_iter()
        .map(|range| T::from_ssz(&bytes[range]))
        .collect()
}

pub fn write_list<T: SszWrite>(bytes: &mut Vec<u8>, elements: &[T]) -> Result<(), WriteError> {
    let length_before = bytes.len();

    if let Size::Fixed { size } = T::SIZE {
        bytes.resize(length_before + elements.len() * size, 0);

        for (element, destination) in elements
            .iter()
            .zip(bytes[length_before..].chunks_exact_mut(size))
        {
            element.write_fixed(destination);
        }

        return Ok(());
    }

    bytes.resize(length_before + elements.len() * BYTES_PER_LENGTH_OFFSET, 0);

    for (index, element) in elements.iter().enumerate() {
        let destination = length_before + index * BYTES_PER_LENGTH_OFFSET;
        let offset = bytes.len() - length_before;

        write_offset(bytes, destination, offset)?;
        element.write_variable(bytes)?;
    }

    Ok(())
}
