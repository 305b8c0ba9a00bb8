pub use crate::{
    block_builder::build_block,
    block_processor::BlockProcessor,
    error::{Error, SidecarError},
    sidecars::verify_blob_sidecars,
    task_pool::TaskPool,
};

mod block_builder;
mod block_processor;
mod error;
mod sidecars;
mod task_pool;
