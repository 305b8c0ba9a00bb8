use strum::AsRefStr;

use crate::primitives::{Gwei, PublicKeyBytes};

/// A change to the validator set produced by a state transition.
///
/// Updates are reported to the consensus engine, which uses them to maintain its own view of
/// voting power.
#[derive(Clone, Copy, PartialEq, Eq, Debug, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ValidatorUpdate {
    Activation {
        pubkey: PublicKeyBytes,
        effective_balance: Gwei,
    },
    Exit {
        pubkey: PublicKeyBytes,
    },
    BalanceChange {
        pubkey: PublicKeyBytes,
        effective_balance: Gwei,
    },
}

impl ValidatorUpdate {
    #[must_use]
    pub const fn pubkey(&self) -> PublicKeyBytes {
        match *self {
            Self::Activation { pubkey, .. }
            | Self::Exit { pubkey }
            | Self::BalanceChange { pubkey, .. } => pubkey,
        }
    }

    /// Voting power after the update. Exited validators have none.
    #[must_use]
    pub const fn effective_balance(&self) -> Gwei {
        match *self {
            Self::Activation {
                effective_balance, ..
            }
            | Self::BalanceChange {
                effective_balance, ..
            } => effective_balance,
            Self::Exit { .. } => 0,
        }
    }
}

pub type ValidatorUpdates = Vec<ValidatorUpdate>;
