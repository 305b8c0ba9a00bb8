use anyhow::Result;
use ssz::{SszRead as _, SszWrite as _};
use types::containers::{BeaconBlock, BlobSidecars};

use crate::{Error, ProposalRequest};

pub const BEACON_BLOCK_TX_INDEX: usize = 0;
pub const BLOB_SIDECARS_TX_INDEX: usize = 1;

/// Distributes blocks to other nodes and receives theirs.
pub trait BlockGossiper: Send + Sync {
    /// Returns the transaction carrying `block` in a proposal.
    fn publish(&self, block: &BeaconBlock) -> Result<Vec<u8>>;

    fn request(&self, request: Option<&ProposalRequest>) -> Result<BeaconBlock>;
}

/// Distributes blob sidecars to other nodes and receives theirs.
pub trait SidecarGossiper: Send + Sync {
    /// Returns the transaction carrying `sidecars` in a proposal.
    fn publish(&self, sidecars: &BlobSidecars) -> Result<Vec<u8>>;

    fn request(&self, request: Option<&ProposalRequest>) -> Result<BlobSidecars>;
}

/// Sends nothing over the network. Blocks and sidecars travel inside proposals instead.
#[derive(Clone, Copy, Default, Debug)]
pub struct NoopGossiper;

impl BlockGossiper for NoopGossiper {
    fn publish(&self, block: &BeaconBlock) -> Result<Vec<u8>> {
        Ok(block.to_ssz()?)
    }

    fn request(&self, request: Option<&ProposalRequest>) -> Result<BeaconBlock> {
        beacon_block_from_request(request, BEACON_BLOCK_TX_INDEX)
    }
}

impl SidecarGossiper for NoopGossiper {
    fn publish(&self, sidecars: &BlobSidecars) -> Result<Vec<u8>> {
        Ok(sidecars.to_ssz()?)
    }

    fn request(&self, request: Option<&ProposalRequest>) -> Result<BlobSidecars> {
        blob_sidecars_from_request(request, BLOB_SIDECARS_TX_INDEX)
    }
}

pub fn beacon_block_from_request(
    request: Option<&ProposalRequest>,
    index: usize,
) -> Result<BeaconBlock> {
    let txs = &request.ok_or(Error::NilRequest)?.txs;

    if txs.is_empty() {
        return Err(Error::NoBeaconBlockInRequest.into());
    }

    let bytes = txs.get(index).ok_or(Error::TxIndexOutOfBounds {
        index,
        tx_count: txs.len(),
    })?;

    if bytes.is_empty() {
        return Err(Error::NoBeaconBlockInRequest.into());
    }

    Ok(BeaconBlock::from_ssz(bytes)?)
}

/// A missing sidecar transaction is an error. An empty one decodes to an empty list.
pub fn blob_sidecars_from_request(
    request: Option<&ProposalRequest>,
    index: usize,
) -> Result<BlobSidecars> {
    let txs = &request.ok_or(Error::NilRequest)?.txs;
    let bytes = txs.get(index).ok_or(Error::NilBlobSidecarsInRequest)?;

    Ok(BlobSidecars::from_ssz(bytes)?)
}
