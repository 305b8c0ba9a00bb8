use core::ops::Range;

use crate::{
    consts::BYTES_PER_LENGTH_OFFSET,
    error::{ReadError, WriteError},
    porcelain::{SszRead, SszWrite},
    shared,
    size::Size,
};

/// Splits the encoding of a container into per-field byte ranges.
///
/// Offsets of all variable-size fields are read and validated up front, so fields can then be
/// decoded in declaration order with [`ContainerReader::read_next`].
pub struct ContainerReader<'bytes> {
    bytes: &'bytes [u8],
    ranges: Vec<Range<usize>>,
    next_field: usize,
}

impl<'bytes> ContainerReader<'bytes> {
    pub fn new(bytes: &'bytes [u8], fields: &[Size]) -> Result<Self, ReadError> {
        let fixed_region = Size::fixed_region(fields);

        if bytes.len() < fixed_region {
            return Err(ReadError::BufferTooShort {
                expected: fixed_region,
                actual: bytes.len(),
            });
        }

        let mut ranges = Vec::with_capacity(fields.len());
        let mut variable_fields = vec![];
        let mut offsets = vec![];
        let mut position = 0;

        for (index, field) in fields.iter().copied().enumerate() {
            match field {
                Size::Fixed { size } => ranges.push(position..position + size),
                Size::Variable { .. } => {
                    offsets.push(shared::read_offset(bytes, position)?);
                    variable_fields.push(index);
                    ranges.push(0..0);
                }
            }

            position += field.fixed_part();
        }

        let variable_ranges = shared::offsets_to_ranges(&offsets, fixed_region, bytes.len())?;

        for (index, range) in variable_fields.into_iter().zip(variable_ranges) {
            ranges[index] = range;
        }

        Ok(Self {
            bytes,
            ranges,
            next_field: 0,
        })
    }

    pub fn read_next<T: SszRead>(&mut self) -> Result<T, ReadError> {
        let range = self.ranges[self.next_field].clone();
        self.next_field += 1;
        T::from_ssz(&self.bytes[range])
    }
}

/// Writes the fixed part of a container consisting only of fixed-size fields.
pub struct FixedWriter<'bytes> {
    bytes: &'bytes mut [u8],
    position: usize,
}

impl<'bytes> FixedWriter<'bytes> {
    pub fn new(bytes: &'bytes mut [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn write<T: SszWrite>(&mut self, value: &T) {
        let size = T::SIZE.fixed_part();
        value.write_fixed(&mut self.bytes[self.position..self.position + size]);
        self.position += size;
    }
}

/// Appends a container with variable-size fields to a buffer.
///
/// Variable-size fields are written after the fixed region in declaration order. Each one
/// leaves an offset in the fixed region pointing at where its bytes start.
pub struct ContainerWriter<'bytes> {
    bytes: &'bytes mut Vec<u8>,
    start: usize,
    position: usize,
}

impl<'bytes> ContainerWriter<'bytes> {
    pub fn new(bytes: &'bytes mut Vec<u8>, fixed_region: usize) -> Self {
        let start = bytes.len();
        bytes.resize(start + fixed_region, 0);

        Self {
            bytes,
            start,
            position: start,
        }
    }

    pub fn write_field<T: SszWrite>(&mut self, value: &T) -> Result<(), WriteError> {
        match T::SIZE {
            Size::Fixed { size } => {
                value.write_fixed(&mut self.bytes[self.position..self.position + size]);
                self.position += size;
            }
            Size::Variable { .. } => {
                let offset = self.bytes.len() - self.start;
                shared::write_offset(self.bytes, self.position, offset)?;
                self.position += BYTES_PER_LENGTH_OFFSET;
                value.write_variable(self.bytes)?;
            }
        }

        Ok(())
    }
}

/// Implements [`SszSize`], [`SszRead`], [`SszWrite`] and [`SszHash`] for a struct.
///
/// Fields must be listed with their types in the order they appear in the encoding.
/// The listing serves as the schema of the container:
///
/// ```ignore
/// ssz::impl_ssz_container! {
///     Withdrawal {
///         index: u64,
///         validator_index: u64,
///         address: H160,
///         amount: u64,
///     }
/// }
/// ```
///
/// [`SszSize`]: crate::SszSize
/// [`SszRead`]: crate::SszRead
/// [`SszWrite`]: crate::SszWrite
/// [`SszHash`]: crate::SszHash
#[macro_export]
macro_rules! impl_ssz_container {
    ($name: ident { $($field: ident: $type: ty),+ $(,)? }) => {
        impl $crate::SszSize for $name {
            const SIZE: $crate::Size = $crate::Size::for_container(&[
                $(<$type as $crate::SszSize>::SIZE),+
            ]);
        }

        impl $crate::SszRead for $name {
            fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, $crate::ReadError> {
                let mut reader = $crate::ContainerReader::new(bytes, &[
                    $(<$type as $crate::SszSize>::SIZE),+
                ])?;

                Ok(Self {
                    $($field: reader.read_next::<$type>()?,)+
                })
            }
        }

        impl $crate::SszWrite for $name {
            fn write_fixed(&self, bytes: &mut [u8]) {
                let mut writer = $crate::FixedWriter::new(bytes);
                $(writer.write::<$type>(&self.$field);)+
            }

            fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), $crate::WriteError> {
                let fixed_region = $crate::Size::fixed_region(&[
                    $(<$type as $crate::SszSize>::SIZE),+
                ]);

                let mut writer = $crate::ContainerWriter::new(bytes, fixed_region);
                $(writer.write_field::<$type>(&self.$field)?;)+

                Ok(())
            }
        }

        impl $crate::SszHash for $name {
            fn hash_tree_root(&self, merkleizer: &$crate::Merkleizer) -> $crate::H256 {
                merkleizer.merkleize_fields(&[
                    $(<$type as $crate::SszHash>::hash_tree_root(&self.$field, merkleizer)),+
                ])
            }
        }
    };
}
