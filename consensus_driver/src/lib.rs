pub use crate::{
    consensus_driver::ConsensusDriver,
    error::Error,
    gossip::{
        beacon_block_from_request, blob_sidecars_from_request, BlockGossiper, NoopGossiper,
        SidecarGossiper, BEACON_BLOCK_TX_INDEX, BLOB_SIDECARS_TX_INDEX,
    },
    request::ProposalRequest,
    stages::{BuilderStage, SidecarVerifierStage},
};

mod consensus_driver;
mod error;
mod gossip;
mod request;
mod stages;
