use core::ops::Range;
use std::sync::Arc;

use anyhow::{ensure, Result};
use database::Database;
use execution_engine::ExecutionEngine;
use itertools::Itertools as _;
use log::{debug, info};
use parking_lot::Mutex;
use ssz::{SszRead as _, SszWrite as _};
use types::{
    config::Config,
    containers::Deposit,
    primitives::{DepositIndex, ExecutionBlockNumber},
};

use crate::Error;

const DEPOSIT_KEY_PREFIX: &str = "d";
const LAST_PRUNED_KEY: &str = "last_pruned_deposit_index";

/// Deposits seen in execution layer logs that have not yet been included in a block.
///
/// Deposits are keyed by index. Pruning only ever moves forward.
pub struct DepositStore {
    database: Arc<Database>,
    last_pruned: Mutex<DepositIndex>,
}

impl DepositStore {
    pub fn new(database: Arc<Database>) -> Result<Self> {
        let last_pruned = match database.get(LAST_PRUNED_KEY)? {
            Some(bytes) => DepositIndex::from_ssz(bytes)?,
            None => 0,
        };

        Ok(Self {
            database,
            last_pruned: Mutex::new(last_pruned),
        })
    }

    #[must_use]
    pub fn last_pruned(&self) -> DepositIndex {
        *self.last_pruned.lock()
    }

    /// Stores `deposits` in index order.
    ///
    /// Deposits that are already stored or were already pruned are skipped.
    /// Returns the deposits that were stored.
    pub fn enqueue_deposits(
        &self,
        deposits: impl IntoIterator<Item = Deposit>,
    ) -> Result<Vec<Deposit>> {
        let last_pruned = self.last_pruned.lock();

        let mut new_deposits = vec![];

        for deposit in deposits
            .into_iter()
            .sorted_by_key(|deposit| deposit.index)
            .dedup_by(|left, right| left.index == right.index)
        {
            let known = deposit.index < *last_pruned
                || self.database.contains_key(deposit_key(deposit.index))?;

            if known {
                continue;
            }

            new_deposits.push(deposit);
        }

        let pairs = new_deposits
            .iter()
            .map(|deposit| Ok((deposit_key(deposit.index), deposit.to_ssz()?)))
            .collect::<Result<Vec<_>>>()?;

        self.database.put_batch(pairs)?;

        Ok(new_deposits)
    }

    /// Up to `max` consecutive deposits starting at `from_index`.
    pub fn pending_deposits(&self, from_index: DepositIndex, max: usize) -> Result<Vec<Deposit>> {
        let pairs = self
            .database
            .iterator_ascending(deposit_key(from_index)..)?
            .take_while(|(key_bytes, _)| key_bytes.starts_with(DEPOSIT_KEY_PREFIX.as_bytes()))
            .take(max);

        let mut deposits = Vec::with_capacity(max);

        for (expected_index, (_, value_bytes)) in (from_index..).zip(pairs) {
            let deposit = Deposit::from_ssz(value_bytes)?;

            if deposit.index != expected_index {
                break;
            }

            deposits.push(deposit);
        }

        Ok(deposits)
    }

    /// Fails with [`Error::IndexRegression`] if the log was already pruned past `upto`.
    pub fn ensure_prunable(&self, upto: DepositIndex) -> Result<()> {
        check_regression(upto, *self.last_pruned.lock())
    }

    /// Removes deposits with indices lower than `upto`.
    ///
    /// Fails with [`Error::IndexRegression`] if the log was already pruned past `upto`.
    pub fn prune_deposit_log(&self, upto: DepositIndex) -> Result<()> {
        let mut last_pruned = self.last_pruned.lock();

        check_regression(upto, *last_pruned)?;

        if upto == *last_pruned {
            return Ok(());
        }

        self.database
            .delete_range(deposit_key(*last_pruned)..deposit_key(upto))?;
        self.database.put(LAST_PRUNED_KEY, upto.to_ssz()?)?;

        debug!("pruned deposit log from index {} up to {upto}", *last_pruned);

        *last_pruned = upto;

        Ok(())
    }

    /// Fetches deposit events for blocks in
    /// `[from_block_number - eth1_follow_distance, from_block_number]` and stores them.
    ///
    /// Returns the newly stored deposits ordered by index.
    pub async fn retrieve_deposits(
        &self,
        config: &Config,
        engine: &impl ExecutionEngine,
        from_block_number: ExecutionBlockNumber,
    ) -> Result<Vec<Deposit>> {
        let block_numbers = deposit_block_range(config, from_block_number);
        let events = engine.deposit_logs(block_numbers.clone()).await?;

        let deposits = self.enqueue_deposits(events.into_iter().map(|event| event.deposit))?;

        if !deposits.is_empty() {
            info!(
                "stored {} deposits from execution blocks {} to {}",
                deposits.len(),
                block_numbers.start,
                block_numbers.end - 1,
            );
        }

        Ok(deposits)
    }
}

fn check_regression(upto: DepositIndex, last_pruned: DepositIndex) -> Result<()> {
    ensure!(
        upto >= last_pruned,
        Error::IndexRegression {
            requested: upto,
            last_pruned,
        },
    );

    Ok(())
}

fn deposit_block_range(
    config: &Config,
    from_block_number: ExecutionBlockNumber,
) -> Range<ExecutionBlockNumber> {
    from_block_number.saturating_sub(config.eth1_follow_distance)
        ..from_block_number.saturating_add(1)
}

fn deposit_key(index: DepositIndex) -> String {
    format!("{DEPOSIT_KEY_PREFIX}{index:020}")
}
