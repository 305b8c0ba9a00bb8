use std::collections::{btree_map::Entry, BTreeMap};

use types::{
    nonstandard::{ValidatorUpdate, ValidatorUpdates},
    primitives::ValidatorIndex,
};

/// Validator updates produced while processing a block, at most one per validator.
#[derive(Default)]
pub struct ValidatorUpdateSet {
    updates: BTreeMap<ValidatorIndex, ValidatorUpdate>,
}

impl ValidatorUpdateSet {
    /// Records `update`, merging it with an earlier update for the same validator.
    ///
    /// An exit overrides everything else. A validator activated in the same block stays an
    /// activation with the latest effective balance.
    pub fn record(&mut self, validator_index: ValidatorIndex, update: ValidatorUpdate) {
        match self.updates.entry(validator_index) {
            Entry::Vacant(vacant) => {
                vacant.insert(update);
            }
            Entry::Occupied(mut occupied) => {
                let merged = match (*occupied.get(), update) {
                    (exit @ ValidatorUpdate::Exit { .. }, _) => exit,
                    (
                        ValidatorUpdate::Activation { pubkey, .. },
                        ValidatorUpdate::Activation {
                            effective_balance, ..
                        }
                        | ValidatorUpdate::BalanceChange {
                            effective_balance, ..
                        },
                    ) => ValidatorUpdate::Activation {
                        pubkey,
                        effective_balance,
                    },
                    (_, later) => later,
                };

                occupied.insert(merged);
            }
        }
    }

    pub fn into_updates(self) -> ValidatorUpdates {
        self.updates.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use types::primitives::PublicKeyBytes;

    use super::*;

    const PUBKEY: PublicKeyBytes = PublicKeyBytes::repeat_byte(1);

    #[test]
    fn updates_are_ordered_by_validator_index() {
        let mut set = ValidatorUpdateSet::default();

        set.record(3, ValidatorUpdate::Exit { pubkey: PUBKEY });
        set.record(
            1,
            ValidatorUpdate::BalanceChange {
                pubkey: PUBKEY,
                effective_balance: 5,
            },
        );

        let kinds = set
            .into_updates()
            .iter()
            .map(|update| update.as_ref().to_owned())
            .collect::<Vec<_>>();

        assert_eq!(kinds, ["balance_change", "exit"]);
    }

    #[test]
    fn activation_absorbs_later_balance_change() {
        let mut set = ValidatorUpdateSet::default();

        set.record(
            0,
            ValidatorUpdate::Activation {
                pubkey: PUBKEY,
                effective_balance: 32,
            },
        );
        set.record(
            0,
            ValidatorUpdate::BalanceChange {
                pubkey: PUBKEY,
                effective_balance: 31,
            },
        );

        assert_eq!(
            set.into_updates(),
            [ValidatorUpdate::Activation {
                pubkey: PUBKEY,
                effective_balance: 31,
            }],
        );
    }

    #[test]
    fn exit_overrides_other_updates() {
        let mut set = ValidatorUpdateSet::default();

        set.record(
            0,
            ValidatorUpdate::BalanceChange {
                pubkey: PUBKEY,
                effective_balance: 15,
            },
        );
        set.record(0, ValidatorUpdate::Exit { pubkey: PUBKEY });
        set.record(
            0,
            ValidatorUpdate::BalanceChange {
                pubkey: PUBKEY,
                effective_balance: 14,
            },
        );

        assert_eq!(set.into_updates(), [ValidatorUpdate::Exit { pubkey: PUBKEY }]);
    }
}
