//! SSZ encoding and Merkleization.
//!
//! Basic types and collections implement [`SszRead`], [`SszWrite`] and [`SszHash`] directly.
//! Containers declare their layout with [`impl_ssz_container!`].

pub use ethereum_types::H256;

pub use crate::{
    byte_list::ByteList,
    byte_vector::ByteVector,
    consts::{Endianness, Offset, BYTES_PER_CHUNK, BYTES_PER_LENGTH_OFFSET, MAX_TREE_DEPTH},
    container::{ContainerReader, ContainerWriter, FixedWriter},
    contiguous_list::ContiguousList,
    contiguous_vector::ContiguousVector,
    error::{IndexError, MerkleError, PushError, ReadError, WriteError},
    merkleizer::{
        chunk_count, depth_for_limit, is_valid_merkle_branch, mix_in_length, pack, Merkleizer,
    },
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    size::Size,
};

mod arrays;
mod basic;
mod byte_list;
mod byte_vector;
mod consts;
mod container;
mod contiguous_list;
mod contiguous_vector;
mod error;
mod merkleizer;
mod porcelain;
mod shared;
mod size;
