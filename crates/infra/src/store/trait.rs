use std::sync::Arc;

use thiserror::Error;

use stockroom_core::ItemName;
use stockroom_inventory::InventoryItem;

/// The store could not complete a round trip.
///
/// This is the only failure the store boundary distinguishes: network and
/// service errors, timeouts, and records the store returned that cannot be
/// decoded all surface here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("store unavailable: {reason}")]
pub struct StoreUnavailable {
    reason: String,
}

impl StoreUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Key-keyed inventory collection in an external document store.
///
/// ## Contract
///
/// - `list` returns every record in the store's enumeration order.
/// - `get` returns `None` for a missing key (not an error).
/// - `put` is an upsert with an absolute quantity (callers never pass 0).
/// - `delete` of a missing key succeeds.
///
/// Implementations perform one round trip per call and keep no cache. There is
/// no atomic increment and no conditional write; read-then-write sequences built
/// on top can lose updates under concurrent writers.
#[async_trait::async_trait]
pub trait InventoryStore: Send + Sync {
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreUnavailable>;

    async fn get(&self, name: &ItemName) -> Result<Option<InventoryItem>, StoreUnavailable>;

    async fn put(&self, name: &ItemName, quantity: u64) -> Result<(), StoreUnavailable>;

    async fn delete(&self, name: &ItemName) -> Result<(), StoreUnavailable>;
}

#[async_trait::async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreUnavailable> {
        (**self).list().await
    }

    async fn get(&self, name: &ItemName) -> Result<Option<InventoryItem>, StoreUnavailable> {
        (**self).get(name).await
    }

    async fn put(&self, name: &ItemName, quantity: u64) -> Result<(), StoreUnavailable> {
        (**self).put(name, quantity).await
    }

    async fn delete(&self, name: &ItemName) -> Result<(), StoreUnavailable> {
        (**self).delete(name).await
    }
}

/// Decode a raw `(key, quantity)` pair read back from a backend.
///
/// The key must already be in normalized form. A key such as `"Apple"` could
/// never be addressed again through an [`ItemName`], so it is malformed.
pub(crate) fn decode_record(key: &str, quantity: i64) -> Result<InventoryItem, StoreUnavailable> {
    let name = ItemName::parse(key)
        .map_err(|e| StoreUnavailable::new(format!("malformed record key {key:?}: {e}")))?;
    let expected = name.as_str();
    if expected != key {
        return Err(StoreUnavailable::new(format!(
            "non-normalized record key {key:?} (expected {expected:?})"
        )));
    }
    let quantity = u64::try_from(quantity)
        .map_err(|_| StoreUnavailable::new(format!("malformed quantity {quantity} for {name}")))?;
    InventoryItem::new(name, quantity)
        .map_err(|e| StoreUnavailable::new(format!("malformed record: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_positive_quantities() {
        let item = decode_record("apple", 3).unwrap();
        assert_eq!(item.name().as_str(), "apple");
        assert_eq!(item.quantity(), 3);
    }

    #[test]
    fn decode_rejects_zero_and_negative_quantities() {
        assert!(decode_record("apple", 0).is_err());
        assert!(decode_record("apple", -2).is_err());
    }

    #[test]
    fn decode_rejects_non_normalized_keys() {
        for key in ["Apple", " apple", "GREEN tea"] {
            let err = decode_record(key, 1).unwrap_err();
            assert!(err.reason().contains("non-normalized"), "{key:?}: {err}");
        }
    }

    #[test]
    fn decode_rejects_blank_keys() {
        let err = decode_record("  ", 1).unwrap_err();
        assert!(err.reason().contains("malformed record key"));
    }
}
