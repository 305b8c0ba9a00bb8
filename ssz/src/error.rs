use thiserror::Error;

use crate::consts::{Offset, BYTES_PER_LENGTH_OFFSET};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum ReadError {
    #[error("expected fixed-size value of {expected} bytes, found {actual} bytes")]
    FixedSizeMismatch { expected: usize, actual: usize },
    #[error("expected byte vector of {expected} bytes, found {actual} bytes")]
    BytesLengthMismatch { expected: usize, actual: usize },
    #[error("expected list to have no more than {limit} elements, found {actual} elements")]
    ListTooLarge { limit: usize, actual: usize },
    #[error("buffer of {actual} bytes is shorter than fixed part of {expected} bytes")]
    BufferTooShort { expected: usize, actual: usize },
    #[error("first offset {actual} points into fixed part of {minimum} bytes")]
    FirstOffsetTooSmall { minimum: usize, actual: usize },
    #[error("offset {current} is smaller than preceding offset {previous}")]
    OffsetsNotMonotonic { previous: usize, current: usize },
    #[error("offset {offset} is past the end of buffer of {length} bytes")]
    OffsetOutOfBounds { offset: usize, length: usize },
    #[error("offset {offset} does not fit in usize")]
    OffsetDoesNotFitInUsize { offset: Offset },
    #[error("first offset of list ({first_offset}) is not a multiple of offset size")]
    ListFirstOffsetUnaligned { first_offset: usize },
    #[error("list of {length} bytes cannot be split into elements of {element_size} bytes")]
    ListElementsMisaligned { length: usize, element_size: usize },
    #[error("expected vector to have {expected} elements, found {actual} elements")]
    VectorSizeMismatch { expected: usize, actual: usize },
    #[error("expected boolean to be 0 or 1, found {value}")]
    InvalidBool { value: u8 },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum WriteError {
    #[error("offset {offset} does not fit in {BYTES_PER_LENGTH_OFFSET} bytes")]
    OffsetTooBig { offset: usize },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum MerkleError {
    #[error("{length} chunks exceed limit of {limit}")]
    LimitExceeded { length: usize, limit: u64 },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum IndexError {
    #[error("index {index} is out of bounds for collection of length {length}")]
    OutOfBounds { length: usize, index: u64 },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum PushError {
    #[error("list is full")]
    ListFull,
}
