//! View projection: search filtering over a snapshot.

use crate::item::InventorySnapshot;

/// Items whose name contains `query`, case-insensitively, in snapshot order.
///
/// An empty query returns the snapshot unchanged. Surrounding whitespace in
/// the query is significant: `" "` only matches names with a space.
pub fn filter(snapshot: &InventorySnapshot, query: &str) -> InventorySnapshot {
    if query.is_empty() {
        return snapshot.clone();
    }

    let needle = query.to_lowercase();
    snapshot
        .iter()
        .filter(|item| item.name().as_str().contains(&needle))
        .cloned()
        .collect()
}
