//! Document-store boundary.
//!
//! The store holds one collection of `name → {quantity}` records. Everything
//! above this module depends only on list/get/put/delete-by-key.

pub mod firestore;
pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use firestore::{FirestoreConfig, FirestoreInventoryStore};
pub use in_memory::InMemoryInventoryStore;
pub use r#trait::{InventoryStore, StoreUnavailable};
pub use sqlite::SqliteInventoryStore;
