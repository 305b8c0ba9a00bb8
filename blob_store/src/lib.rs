//! Storage of blob sidecars by slot and KZG commitment.

use std::sync::Arc;

use anyhow::Result;
use database::Database;
use log::debug;
use ssz::{SszRead as _, SszWrite as _};
use types::{
    containers::{BeaconBlockBody, BlobSidecar},
    primitives::{KzgCommitment, Slot},
};

const SIDECAR_KEY_PREFIX: &str = "b";

pub struct AvailabilityStore {
    database: Arc<Database>,
}

impl AvailabilityStore {
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Returns `true` if a sidecar is stored under `slot` for every commitment in `body`.
    ///
    /// Sidecars stored for other commitments do not affect the result.
    pub fn is_data_available(&self, slot: Slot, body: &BeaconBlockBody) -> Result<bool> {
        for commitment in body.blob_kzg_commitments.iter().copied() {
            if !self.database.contains_key(sidecar_key(slot, commitment))? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub fn persist<'sidecars>(
        &self,
        slot: Slot,
        sidecars: impl IntoIterator<Item = &'sidecars BlobSidecar>,
    ) -> Result<()> {
        let pairs = sidecars
            .into_iter()
            .map(|sidecar| Ok((sidecar_key(slot, sidecar.kzg_commitment), sidecar.to_ssz()?)))
            .collect::<Result<Vec<_>>>()?;

        debug!("persisting {} blob sidecars for slot {slot}", pairs.len());

        self.database.put_batch(pairs)
    }

    pub fn sidecar(&self, slot: Slot, commitment: KzgCommitment) -> Result<Option<BlobSidecar>> {
        self.database
            .get(sidecar_key(slot, commitment))?
            .map(BlobSidecar::from_ssz)
            .transpose()
            .map_err(Into::into)
    }

    /// Sidecars stored under `slot`, ordered by commitment.
    pub fn sidecars(&self, slot: Slot) -> Result<Vec<BlobSidecar>> {
        let slot_prefix = slot_prefix(slot);

        self.database
            .iterator_ascending(slot_prefix.clone()..)?
            .take_while(|(key_bytes, _)| key_bytes.starts_with(slot_prefix.as_bytes()))
            .map(|(_, value_bytes)| BlobSidecar::from_ssz(value_bytes).map_err(Into::into))
            .collect()
    }

    /// Removes sidecars for slots lower than `slot`.
    pub fn prune_before(&self, slot: Slot) -> Result<()> {
        self.database
            .delete_range(slot_prefix(0)..slot_prefix(slot))
    }
}

fn slot_prefix(slot: Slot) -> String {
    format!("{SIDECAR_KEY_PREFIX}{slot:020}")
}

fn sidecar_key(slot: Slot, commitment: KzgCommitment) -> String {
    format!("{}{commitment:x}", slot_prefix(slot))
}
