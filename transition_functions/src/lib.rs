pub use crate::{
    error::Error,
    genesis::initialize_beacon_state,
    slot_processing::{process_slot, process_slots},
    state_transition::{state_transition, Context, StateRootPolicy},
};

mod block_processing;
mod epoch_processing;
mod error;
mod genesis;
mod slot_processing;
mod state_transition;
mod validator_updates;
