use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ItemName};

/// A persisted inventory record: one name, a positive count.
///
/// A record with quantity zero never exists; reaching zero deletes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawItem")]
pub struct InventoryItem {
    name: ItemName,
    quantity: u64,
}

#[derive(Deserialize)]
struct RawItem {
    name: ItemName,
    quantity: u64,
}

impl TryFrom<RawItem> for InventoryItem {
    type Error = DomainError;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.quantity)
    }
}

impl InventoryItem {
    pub fn new(name: ItemName, quantity: u64) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::invariant(format!(
                "{name} cannot be stored with quantity 0"
            )));
        }
        Ok(Self { name, quantity })
    }

    pub fn name(&self) -> &ItemName {
        &self.name
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }
}

impl Entity for InventoryItem {
    type Id = ItemName;

    fn id(&self) -> &Self::Id {
        &self.name
    }
}

/// Full copy of the store's records at last refresh, in store enumeration order.
///
/// Snapshots are disposable: they are rebuilt from a fresh listing after every
/// mutation and never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventorySnapshot(Vec<InventoryItem>);

impl InventorySnapshot {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self(items)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &InventoryItem> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &ItemName) -> Option<&InventoryItem> {
        self.0.iter().find(|item| item.id() == name)
    }
}

impl From<Vec<InventoryItem>> for InventorySnapshot {
    fn from(items: Vec<InventoryItem>) -> Self {
        Self(items)
    }
}

impl FromIterator<InventoryItem> for InventorySnapshot {
    fn from_iter<T: IntoIterator<Item = InventoryItem>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a InventorySnapshot {
    type Item = &'a InventoryItem;
    type IntoIter = core::slice::Iter<'a, InventoryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
