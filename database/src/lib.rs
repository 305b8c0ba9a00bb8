//! Ordered key-value storage.
//!
//! Keys are compared bytewise. Writes made through [`Database::put_batch`] and
//! [`Database::delete_range`] become visible to readers all at once.

use core::ops::{Range, RangeFrom, RangeToInclusive};
use std::sync::Arc;

use anyhow::Result;
use im::OrdMap;
use log::debug;
use parking_lot::Mutex;

type Map = OrdMap<Arc<[u8]>, Arc<[u8]>>;

/// In-memory database backed by a persistent ordered map.
///
/// Iterators operate on a snapshot of the map taken when they were created, so they are not
/// affected by later writes.
#[derive(Default)]
pub struct Database {
    map: Mutex<Map>,
}

impl Database {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        Ok(self.map.lock().contains_key(key.as_ref()))
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        Ok(self.map.lock().get(key.as_ref()).map(|value| value.to_vec()))
    }

    pub fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        self.put_batch(core::iter::once((key, value)))
    }

    pub fn put_batch(
        &self,
        pairs: impl IntoIterator<Item = (impl AsRef<[u8]>, impl AsRef<[u8]>)>,
    ) -> Result<()> {
        let mut map = self.map.lock();

        for (key, value) in pairs {
            map.insert(key.as_ref().into(), value.as_ref().into());
        }

        Ok(())
    }

    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        self.map.lock().remove(key.as_ref());
        Ok(())
    }

    /// Deletes every key in `range`. The end of the range is excluded.
    pub fn delete_range(&self, range: Range<impl AsRef<[u8]>>) -> Result<()> {
        let start = range.start.as_ref();
        let end = range.end.as_ref();

        let mut map = self.map.lock();
        let end_pair = map.get_key_value(end).map(|(key, value)| (key.clone(), value.clone()));

        let (below, _) = map.split(start);
        let (_, above) = map.split(end);
        let mut remaining = below.union(above);

        if let Some((key, value)) = end_pair {
            remaining.insert(key, value);
        }

        debug!(
            "deleted {} entries from database",
            map.len() - remaining.len(),
        );

        *map = remaining;

        Ok(())
    }

    /// Iterates over entries with keys greater than or equal to `range.start` in ascending order.
    pub fn iterator_ascending(
        &self,
        range: RangeFrom<impl AsRef<[u8]>>,
    ) -> Result<impl Iterator<Item = (Vec<u8>, Vec<u8>)>> {
        let start = range.start.as_ref();
        let map = self.snapshot();
        let start_pair = map.get_key_value(start).map(|(key, value)| (key.clone(), value.clone()));
        let (_, mut above) = map.split(start);

        if let Some((key, value)) = start_pair {
            above.insert(key, value);
        }

        Ok(above.into_iter().map(to_owned_pair))
    }

    /// Iterates over entries with keys less than or equal to `range.end` in descending order.
    pub fn iterator_descending(
        &self,
        range: RangeToInclusive<impl AsRef<[u8]>>,
    ) -> Result<impl Iterator<Item = (Vec<u8>, Vec<u8>)>> {
        let end = range.end.as_ref();
        let map = self.snapshot();
        let end_pair = map.get_key_value(end).map(|(key, value)| (key.clone(), value.clone()));
        let (mut below, _) = map.split(end);

        if let Some((key, value)) = end_pair {
            below.insert(key, value);
        }

        Ok(below.into_iter().rev().map(to_owned_pair))
    }

    /// Returns the entry with the greatest key less than or equal to `key`.
    pub fn prev(&self, key: impl AsRef<[u8]>) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .map
            .lock()
            .get_prev(key.as_ref())
            .map(|(key, value)| (key.to_vec(), value.to_vec())))
    }

    /// Returns the entry with the least key greater than or equal to `key`.
    pub fn next(&self, key: impl AsRef<[u8]>) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .map
            .lock()
            .get_next(key.as_ref())
            .map(|(key, value)| (key.to_vec(), value.to_vec())))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.lock().is_empty()
    }

    fn snapshot(&self) -> Map {
        self.map.lock().clone()
    }
}

fn to_owned_pair((key, value): (Arc<[u8]>, Arc<[u8]>)) -> (Vec<u8>, Vec<u8>) {
    (key.to_vec(), value.to_vec())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn populated() -> Result<Database> {
        let database = Database::in_memory();
        database.put_batch([("A", "1"), ("B", "2"), ("C", "3")])?;
        database.put("E", "5")?;
        Ok(database)
    }

    fn strings(pairs: impl IntoIterator<Item = (Vec<u8>, Vec<u8>)>) -> Vec<(String, String)> {
        pairs
            .into_iter()
            .map(|(key, value)| {
                (
                    String::from_utf8_lossy(&key).into_owned(),
                    String::from_utf8_lossy(&value).into_owned(),
                )
            })
            .collect()
    }

    fn expected(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test_case("0", &[("A", "1"), ("B", "2"), ("C", "3"), ("E", "5")])]
    #[test_case("B", &[("B", "2"), ("C", "3"), ("E", "5")])]
    #[test_case("D", &[("E", "5")])]
    #[test_case("F", &[])]
    fn ascending_iteration_starts_at_first_key_not_less_than_start(
        start: &str,
        pairs: &[(&str, &str)],
    ) -> Result<()> {
        let database = populated()?;
        assert_eq!(strings(database.iterator_ascending(start..)?), expected(pairs));
        Ok(())
    }

    #[test_case("F", &[("E", "5"), ("C", "3"), ("B", "2"), ("A", "1")])]
    #[test_case("D", &[("C", "3"), ("B", "2"), ("A", "1")])]
    #[test_case("A", &[("A", "1")])]
    #[test_case("0", &[])]
    fn descending_iteration_includes_end(end: &str, pairs: &[(&str, &str)]) -> Result<()> {
        let database = populated()?;
        assert_eq!(strings(database.iterator_descending(..=end)?), expected(pairs));
        Ok(())
    }

    #[test_case("B".."C", &[("A", "1"), ("C", "3"), ("E", "5")])]
    #[test_case("D".."F", &[("A", "1"), ("B", "2"), ("C", "3")])]
    #[test_case("0".."E", &[("E", "5")])]
    fn range_deletion_excludes_end(range: Range<&str>, pairs: &[(&str, &str)]) -> Result<()> {
        let database = populated()?;
        database.delete_range(range)?;
        assert_eq!(strings(database.iterator_ascending("0"..)?), expected(pairs));
        Ok(())
    }

    #[test]
    fn later_writes_to_same_key_win() -> Result<()> {
        let database = populated()?;

        database.put_batch([("A", "1"), ("A", "2"), ("A", "3")])?;

        assert_eq!(database.get("A")?, Some(b"3".to_vec()));
        assert_eq!(database.len(), 4);

        Ok(())
    }

    #[test]
    fn neighbors_are_found_inclusively() -> Result<()> {
        let database = populated()?;

        assert_eq!(database.prev("0")?, None);
        assert_eq!(database.prev("D")?, Some((b"C".to_vec(), b"3".to_vec())));
        assert_eq!(database.next("D")?, Some((b"E".to_vec(), b"5".to_vec())));
        assert_eq!(database.next("E")?, Some((b"E".to_vec(), b"5".to_vec())));
        assert_eq!(database.next("F")?, None);

        Ok(())
    }

    #[test]
    fn iterators_see_snapshot() -> Result<()> {
        let database = populated()?;
        let iterator = database.iterator_ascending("A"..)?;

        database.delete_range("A".."F")?;
        database.delete("E")?;

        assert!(database.is_empty());
        assert!(!database.contains_key("A")?);
        assert_eq!(strings(iterator).len(), 4);

        Ok(())
    }
}
