//! Inventory domain module.
//!
//! This crate contains business rules for inventory, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Store access lives
//! in `stockroom-infra`, which executes the plans computed here.

pub mod item;
pub mod projection;
pub mod reconcile;

pub use item::{InventoryItem, InventorySnapshot};
pub use projection::filter;
pub use reconcile::{Effect, Plan, StoreWrite};
