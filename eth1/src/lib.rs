pub use crate::{deposit_store::DepositStore, error::Error};

mod deposit_store;
mod error;
