use std::sync::Arc;

use anyhow::Result;
use types::{
    containers::{BeaconBlock, BlobSidecars},
    nonstandard::ValidatorUpdates,
    primitives::{Slot, UnixSeconds, ValidatorIndex},
};

use crate::{Route, Topic};

pub struct BlockBuilt;

impl Topic for BlockBuilt {
    const NAME: &'static str = "block_built";

    type Payload = Arc<BeaconBlock>;
}

pub struct SidecarsBuilt;

impl Topic for SidecarsBuilt {
    const NAME: &'static str = "sidecars_built";

    type Payload = Arc<BlobSidecars>;
}

/// Published once the execution payload of a proposed block has been accepted.
pub struct BlockVerified;

impl Topic for BlockVerified {
    const NAME: &'static str = "block_verified";

    type Payload = Arc<BeaconBlock>;
}

/// Published once the sidecars of a proposed block have been checked against it.
pub struct SidecarsVerified;

impl Topic for SidecarsVerified {
    const NAME: &'static str = "sidecars_verified";

    type Payload = Arc<BlobSidecars>;
}

pub struct ValidatorUpdatesFinalized;

impl Topic for ValidatorUpdatesFinalized {
    const NAME: &'static str = "validator_updates_finalized";

    type Payload = Arc<ValidatorUpdates>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BuildBlockRequest {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub timestamp: UnixSeconds,
}

#[derive(Clone, Debug)]
pub struct BuiltBlock {
    pub block: Arc<BeaconBlock>,
    pub sidecars: Arc<BlobSidecars>,
}

pub struct BuildBlock;

impl Route for BuildBlock {
    const NAME: &'static str = "build_block";

    type Request = BuildBlockRequest;
    type Response = Result<BuiltBlock>;
}

#[derive(Clone, Debug)]
pub struct VerifySidecarsRequest {
    pub block: Arc<BeaconBlock>,
    pub sidecars: Arc<BlobSidecars>,
}

pub struct VerifySidecars;

impl Route for VerifySidecars {
    const NAME: &'static str = "verify_sidecars";

    type Request = VerifySidecarsRequest;
    type Response = Result<()>;
}
