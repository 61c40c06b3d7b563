use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use stockroom_core::ItemName;
use stockroom_inventory::InventoryItem;

use super::r#trait::{InventoryStore, StoreUnavailable};

/// In-memory inventory store for tests/dev.
///
/// Records enumerate in key order, matching the document store's default
/// listing order. Outages can be simulated with [`set_offline`] and
/// [`fail_writes_after`].
///
/// [`set_offline`]: InMemoryInventoryStore::set_offline
/// [`fail_writes_after`]: InMemoryInventoryStore::fail_writes_after
#[derive(Debug)]
pub struct InMemoryInventoryStore {
    records: RwLock<BTreeMap<ItemName, u64>>,
    offline: AtomicBool,
    /// Remaining successful writes before every write fails; `usize::MAX` = unlimited.
    write_budget: AtomicUsize,
    round_trips: AtomicUsize,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            offline: AtomicBool::new(false),
            write_budget: AtomicUsize::new(usize::MAX),
            round_trips: AtomicUsize::new(0),
        }
    }

    /// Seed the store with `(name, quantity)` records.
    ///
    /// Entries with quantity 0 are skipped; they cannot exist in the store.
    pub fn with_records<'a>(records: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.records.write() {
            for (raw, quantity) in records {
                if quantity == 0 {
                    continue;
                }
                if let Ok(name) = ItemName::parse(raw) {
                    map.insert(name, quantity);
                }
            }
        }
        store
    }

    /// Make every call fail (or succeed again) with `StoreUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Allow `n` more successful writes; later writes fail until reset.
    pub fn fail_writes_after(&self, n: usize) {
        self.write_budget.store(n, Ordering::SeqCst);
    }

    /// Lift any write budget set by [`fail_writes_after`](Self::fail_writes_after).
    pub fn reset_write_budget(&self) {
        self.write_budget.store(usize::MAX, Ordering::SeqCst);
    }

    /// Number of calls made against this store (successful or not).
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> Result<(), StoreUnavailable> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreUnavailable::new("in-memory store is offline"));
        }
        Ok(())
    }

    fn begin_write(&self) -> Result<(), StoreUnavailable> {
        self.begin_call()?;
        let consumed = self
            .write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                usize::MAX => Some(usize::MAX),
                0 => None,
                n => Some(n - 1),
            });
        consumed
            .map(|_| ())
            .map_err(|_| StoreUnavailable::new("in-memory store rejected write (budget exhausted)"))
    }

    fn lock_poisoned() -> StoreUnavailable {
        StoreUnavailable::new("in-memory store lock poisoned")
    }
}

impl Default for InMemoryInventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreUnavailable> {
        self.begin_call()?;
        let map = self.records.read().map_err(|_| Self::lock_poisoned())?;
        map.iter()
            .map(|(name, quantity)| {
                InventoryItem::new(name.clone(), *quantity)
                    .map_err(|e| StoreUnavailable::new(e.to_string()))
            })
            .collect()
    }

    async fn get(&self, name: &ItemName) -> Result<Option<InventoryItem>, StoreUnavailable> {
        self.begin_call()?;
        let map = self.records.read().map_err(|_| Self::lock_poisoned())?;
        match map.get(name) {
            Some(quantity) => InventoryItem::new(name.clone(), *quantity)
                .map(Some)
                .map_err(|e| StoreUnavailable::new(e.to_string())),
            None => Ok(None),
        }
    }

    async fn put(&self, name: &ItemName, quantity: u64) -> Result<(), StoreUnavailable> {
        self.begin_write()?;
        if quantity == 0 {
            return Err(StoreUnavailable::new(format!(
                "refusing to store {name} with quantity 0"
            )));
        }
        let mut map = self.records.write().map_err(|_| Self::lock_poisoned())?;
        map.insert(name.clone(), quantity);
        Ok(())
    }

    async fn delete(&self, name: &ItemName) -> Result<(), StoreUnavailable> {
        self.begin_write()?;
        let mut map = self.records.write().map_err(|_| Self::lock_poisoned())?;
        map.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> ItemName {
        ItemName::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = InMemoryInventoryStore::new();
        assert_eq!(store.get(&name("apple")).await.unwrap(), None);

        store.put(&name("apple"), 2).await.unwrap();
        let item = store.get(&name("apple")).await.unwrap().unwrap();
        assert_eq!(item.quantity(), 2);

        store.put(&name("apple"), 5).await.unwrap();
        assert_eq!(store.get(&name("apple")).await.unwrap().unwrap().quantity(), 5);

        store.delete(&name("apple")).await.unwrap();
        assert_eq!(store.get(&name("apple")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_of_missing_key_succeeds() {
        let store = InMemoryInventoryStore::new();
        store.delete(&name("ghost")).await.unwrap();
    }

    #[tokio::test]
    async fn list_enumerates_in_key_order() {
        let store = InMemoryInventoryStore::with_records([("plum", 1), ("apple", 2), ("zero", 0)]);
        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(names, ["apple", "plum"]);
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = InMemoryInventoryStore::with_records([("apple", 1)]);
        store.set_offline(true);
        assert!(store.list().await.is_err());
        assert!(store.get(&name("apple")).await.is_err());
        assert!(store.put(&name("apple"), 2).await.is_err());

        store.set_offline(false);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn write_budget_fails_later_writes_only() {
        let store = InMemoryInventoryStore::new();
        store.fail_writes_after(1);

        store.put(&name("apple"), 1).await.unwrap();
        assert!(store.put(&name("pear"), 1).await.is_err());
        // Reads are unaffected.
        assert_eq!(store.list().await.unwrap().len(), 1);

        store.reset_write_budget();
        store.put(&name("pear"), 1).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn zero_quantity_put_is_refused() {
        let store = InMemoryInventoryStore::new();
        assert!(store.put(&name("apple"), 0).await.is_err());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn round_trips_are_counted() {
        let store = InMemoryInventoryStore::new();
        store.list().await.unwrap();
        store.get(&name("apple")).await.unwrap();
        assert_eq!(store.round_trips(), 2);
    }
}
