//! Typed publish/subscribe bus connecting the stages of a node.
//!
//! Topics are broadcast to every subscriber. Routes deliver each request to a single registered
//! receiver and carry its response back to the sender.

pub use crate::{
    dispatcher::{Dispatcher, Envelope, DEFAULT_TOPIC_CAPACITY},
    error::Error,
    messages::{
        BlockBuilt, BlockVerified, BuildBlock, BuildBlockRequest, BuiltBlock, SidecarsBuilt,
        SidecarsVerified, ValidatorUpdatesFinalized, VerifySidecars, VerifySidecarsRequest,
    },
    traits::{Route, Topic},
};

mod dispatcher;
mod error;
mod messages;
mod traits;
