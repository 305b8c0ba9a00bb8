use std::borrow::Cow;

use anyhow::Result;
use hex_literal::hex;
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use thiserror::Error;
use typenum::Unsigned as _;

use crate::{
    consts::{
        EpochsPerHistoricalVector, MaxDepositsPerBlock, MaxWithdrawalsPerPayload,
        SlotsPerHistoricalRoot,
    },
    primitives::{Gwei, Version, H32},
};

/// Chain parameters customizable at runtime.
///
/// Numeric fields accept both integers and strings, which is how they appear in most
/// configuration files.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    // Meta
    pub config_name: Cow<'static, str>,

    // Genesis
    pub genesis_fork_version: Version,

    // Execution layer
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub eth1_follow_distance: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_deposits_per_block: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_withdrawals_per_payload: u64,

    // Balances
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub min_deposit_amount: Gwei,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_effective_balance: Gwei,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub effective_balance_increment: Gwei,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub ejection_balance: Gwei,

    // State history
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub slots_per_historical_root: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub epochs_per_historical_vector: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Meta
            //
            // Use `default` as the default `config_name` so data for custom chains is not mixed up
            // with data for named ones when `CONFIG_NAME` is omitted.
            config_name: Cow::Borrowed("default"),

            // Genesis
            genesis_fork_version: H32(hex!("04000000")),

            // Execution layer
            eth1_follow_distance: 1,
            max_deposits_per_block: MaxDepositsPerBlock::U64,
            max_withdrawals_per_payload: MaxWithdrawalsPerPayload::U64,

            // Balances
            min_deposit_amount: 1_000_000_000,
            max_effective_balance: 32_000_000_000,
            effective_balance_increment: 1_000_000_000,
            ejection_balance: 16_000_000_000,

            // State history
            slots_per_historical_root: SlotsPerHistoricalRoot::U64,
            epochs_per_historical_vector: EpochsPerHistoricalVector::U64,
        }
    }
}

impl Config {
    /// Configuration for a local chain with a single validator set and no reorg protection.
    #[must_use]
    pub fn devnet() -> Self {
        Self {
            config_name: Cow::Borrowed("devnet"),
            genesis_fork_version: H32(hex!("04000001")),
            ..Self::default()
        }
    }

    /// Parses a configuration file and validates it. Missing fields take default values.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config = serde_yaml::from_str::<Self>(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.config_name.is_empty() {
            return Err(Error::NameEmpty);
        }

        for character in self.config_name.chars() {
            if !matches!(character, 'a'..='z' | '0'..='9' | '-') {
                return Err(Error::NameContainsIllegalCharacters);
            }
        }

        if self.max_deposits_per_block > MaxDepositsPerBlock::U64 {
            return Err(Error::ExceedsListLimit {
                field: "MAX_DEPOSITS_PER_BLOCK",
                limit: MaxDepositsPerBlock::U64,
            });
        }

        if self.max_withdrawals_per_payload > MaxWithdrawalsPerPayload::U64 {
            return Err(Error::ExceedsListLimit {
                field: "MAX_WITHDRAWALS_PER_PAYLOAD",
                limit: MaxWithdrawalsPerPayload::U64,
            });
        }

        if self.slots_per_historical_root > SlotsPerHistoricalRoot::U64 {
            return Err(Error::ExceedsListLimit {
                field: "SLOTS_PER_HISTORICAL_ROOT",
                limit: SlotsPerHistoricalRoot::U64,
            });
        }

        if self.epochs_per_historical_vector > EpochsPerHistoricalVector::U64 {
            return Err(Error::ExceedsListLimit {
                field: "EPOCHS_PER_HISTORICAL_VECTOR",
                limit: EpochsPerHistoricalVector::U64,
            });
        }

        if self.effective_balance_increment == 0
            || self.max_effective_balance % self.effective_balance_increment != 0
        {
            return Err(Error::MaxEffectiveBalanceNotMultipleOfIncrement);
        }

        Ok(())
    }

    /// Rounds `balance` down to a multiple of the increment and caps it.
    #[must_use]
    pub const fn effective_balance(&self, balance: Gwei) -> Gwei {
        let rounded = balance - balance % self.effective_balance_increment;

        if rounded < self.max_effective_balance {
            rounded
        } else {
            self.max_effective_balance
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration name is empty")]
    NameEmpty,
    #[error("configuration name contains illegal characters")]
    NameContainsIllegalCharacters,
    #[error("{field} exceeds the list limit of {limit}")]
    ExceedsListLimit { field: &'static str, limit: u64 },
    #[error("MAX_EFFECTIVE_BALANCE is not a multiple of EFFECTIVE_BALANCE_INCREMENT")]
    MaxEffectiveBalanceNotMultipleOfIncrement,
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Refactoring worsens readability, which is more important in tests."
)]
