//! Record Store Module
//!
//! The keyed table of freshness records. `RecordStore` is the seam the
//! pipeline writes through; `MemoryStore` is the in-process table backing it.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::records::Record;

// == Record Store ==
/// Durable keyed table of records, primary key = `id`.
///
/// Implementations serialize conflicting writes per key. Each method is atomic
/// with respect to the others.
#[async_trait]
pub trait RecordStore: Debug + Send + Sync {
    /// Writes every record, overwriting all fields on id conflict.
    ///
    /// Either the whole slice is written or an error is returned.
    async fn upsert(&self, records: &[Record]) -> Result<()>;

    /// Deletes the records among `ids` whose timestamp is `<= threshold`.
    ///
    /// Returns the number of records removed.
    async fn delete_stale(&self, ids: &[i64], threshold: i64) -> Result<usize>;

    /// Fetches a single record.
    async fn get(&self, id: i64) -> Result<Option<Record>>;

    /// Returns every stored record ordered by id.
    async fn list(&self) -> Result<Vec<Record>>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<()>;
}

// == Memory Store ==
/// In-process record table guarded by a single `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<i64, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn upsert(&self, records: &[Record]) -> Result<()> {
        let mut table = self.records.write().await;
        for record in records {
            table.insert(record.id, *record);
        }
        Ok(())
    }

    async fn delete_stale(&self, ids: &[i64], threshold: i64) -> Result<usize> {
        let mut table = self.records.write().await;
        let mut removed = 0;
        for id in ids {
            // Check and remove under the same write guard
            if table.get(id).is_some_and(|r| r.is_stale(threshold)) {
                table.remove(id);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn get(&self, id: i64) -> Result<Option<Record>> {
        Ok(self.records.read().await.get(&id).copied())
    }

    async fn list(&self) -> Result<Vec<Record>> {
        let mut all: Vec<Record> = self.records.read().await.values().copied().collect();
        all.sort_by_key(|r| r.id);
        Ok(all)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_new_is_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_upsert_and_get() {
        let store = MemoryStore::new();
        store.upsert(&[Record::new(123, true, 1111111)]).await.unwrap();

        assert_eq!(
            store.get(123).await.unwrap(),
            Some(Record::new(123, true, 1111111))
        );
        assert_eq!(store.get(124).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_upsert_same_record_twice() {
        let store = MemoryStore::new();
        let record = Record::new(123, true, 1111111);

        store.upsert(&[record]).await.unwrap();
        store.upsert(&[record]).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_store_upsert_overwrites_on_conflict() {
        let store = MemoryStore::new();

        store.upsert(&[Record::new(123, false, 0)]).await.unwrap();
        store.upsert(&[Record::new(123, true, 1111111)]).await.unwrap();

        assert_eq!(
            store.list().await.unwrap(),
            vec![Record::new(123, true, 1111111)]
        );
    }

    #[tokio::test]
    async fn test_store_delete_stale_only_bound_ids() {
        let store = MemoryStore::new();
        store
            .upsert(&[
                Record::new(1, true, 10),
                Record::new(2, true, 10),
                Record::new(3, true, 10),
            ])
            .await
            .unwrap();

        let removed = store.delete_stale(&[1, 2], 50).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.list().await.unwrap(), vec![Record::new(3, true, 10)]);
    }

    #[tokio::test]
    async fn test_store_delete_stale_keeps_fresh_records() {
        let store = MemoryStore::new();
        store
            .upsert(&[Record::new(1, true, 10), Record::new(2, true, 60)])
            .await
            .unwrap();

        let removed = store.delete_stale(&[1, 2], 50).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.get(2).await.unwrap(), Some(Record::new(2, true, 60)));
    }

    #[tokio::test]
    async fn test_store_delete_stale_missing_ids() {
        let store = MemoryStore::new();
        let removed = store.delete_stale(&[404], i64::MAX).await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_store_list_ordered_by_id() {
        let store = MemoryStore::new();
        store
            .upsert(&[
                Record::new(91, true, 1),
                Record::new(10, true, 1),
                Record::new(78, true, 1),
            ])
            .await
            .unwrap();

        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 78, 91]);
    }
}
