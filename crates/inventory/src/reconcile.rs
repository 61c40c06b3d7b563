//! Reconciliation planning: user intents → store writes.
//!
//! Each function takes the records the caller just read from the store and
//! returns a [`Plan`]: the ordered writes that move the store to the intended
//! state, plus an [`Effect`] describing the result. Planning is pure; the
//! infrastructure layer performs the reads, then applies `writes` in order.
//!
//! ## Consistency
//!
//! Plans are computed from a read that may already be stale when the writes
//! land. Two overlapping read-then-write sequences on the same name can lose an
//! update (both observe the same pre-state). No version check is carried in a
//! [`StoreWrite`]; callers needing correctness under concurrent writers must
//! use a store with atomic increments or conditional writes.

use serde::Serialize;

use stockroom_core::{DomainError, DomainResult, ItemName};

use crate::item::{InventoryItem, InventorySnapshot};

/// A single store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreWrite {
    /// Upsert `name` with an absolute quantity (always >= 1).
    Put { name: ItemName, quantity: u64 },
    /// Remove the record for `name`.
    Delete { name: ItemName },
}

impl StoreWrite {
    pub fn name(&self) -> &ItemName {
        match self {
            StoreWrite::Put { name, .. } => name,
            StoreWrite::Delete { name } => name,
        }
    }
}

/// What a plan does, in domain terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// First `add` of a name.
    Created { name: ItemName },
    /// `add` on an existing record.
    Incremented { name: ItemName, quantity: u64 },
    /// `remove` on a record with quantity > 1.
    Decremented { name: ItemName, quantity: u64 },
    /// `remove` on a record with quantity 1.
    Deleted { name: ItemName },
    /// `remove`/`rename` on a name that has no record.
    NotFound { name: ItemName },
    /// `rename` onto a name with no record.
    Renamed { from: ItemName, to: ItemName, quantity: u64 },
    /// `rename` onto an existing record; counts are combined.
    Merged { from: ItemName, to: ItemName, quantity: u64 },
    /// `rename` of a name onto itself.
    SameName { name: ItemName },
    /// `clear_all` over `count` records.
    Cleared { count: usize },
}

impl Effect {
    /// Whether the effect leaves the store untouched.
    pub fn is_noop(&self) -> bool {
        matches!(
            self,
            Effect::NotFound { .. } | Effect::SameName { .. } | Effect::Cleared { count: 0 }
        )
    }
}

impl core::fmt::Display for Effect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Effect::Created { name } => write!(f, "added {name} (quantity 1)"),
            Effect::Incremented { name, quantity } => {
                write!(f, "added {name} (quantity {quantity})")
            }
            Effect::Decremented { name, quantity } => {
                write!(f, "removed one {name} ({quantity} left)")
            }
            Effect::Deleted { name } => write!(f, "removed {name}"),
            Effect::NotFound { name } => write!(f, "{name} is not in the inventory"),
            Effect::Renamed { from, to, quantity } => {
                write!(f, "renamed {from} to {to} (quantity {quantity})")
            }
            Effect::Merged { from, to, quantity } => {
                write!(f, "merged {from} into {to} (quantity {quantity})")
            }
            Effect::SameName { name } => write!(f, "{name} already has that name"),
            Effect::Cleared { count: 0 } => write!(f, "inventory is already empty"),
            Effect::Cleared { count: 1 } => write!(f, "cleared 1 item"),
            Effect::Cleared { count } => write!(f, "cleared {count} items"),
        }
    }
}

/// Ordered writes plus their described effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub writes: Vec<StoreWrite>,
    pub effect: Effect,
}

impl Plan {
    fn noop(effect: Effect) -> Self {
        Self {
            writes: Vec::new(),
            effect,
        }
    }
}

/// Plan `add(name)`: increment an existing record or create it at 1.
pub fn plan_add(name: &ItemName, current: Option<&InventoryItem>) -> DomainResult<Plan> {
    ensure_matches(name, current)?;

    match current {
        Some(item) => {
            let quantity = item
                .quantity()
                .checked_add(1)
                .ok_or_else(|| DomainError::invariant(format!("quantity of {name} overflows")))?;
            Ok(Plan {
                writes: vec![StoreWrite::Put {
                    name: name.clone(),
                    quantity,
                }],
                effect: Effect::Incremented {
                    name: name.clone(),
                    quantity,
                },
            })
        }
        None => Ok(Plan {
            writes: vec![StoreWrite::Put {
                name: name.clone(),
                quantity: 1,
            }],
            effect: Effect::Created { name: name.clone() },
        }),
    }
}

/// Plan `remove(name)`: decrement, delete at one, or no-op when absent.
pub fn plan_remove(name: &ItemName, current: Option<&InventoryItem>) -> DomainResult<Plan> {
    ensure_matches(name, current)?;

    let Some(item) = current else {
        return Ok(Plan::noop(Effect::NotFound { name: name.clone() }));
    };

    if item.quantity() == 1 {
        return Ok(Plan {
            writes: vec![StoreWrite::Delete { name: name.clone() }],
            effect: Effect::Deleted { name: name.clone() },
        });
    }

    let quantity = item.quantity() - 1;
    Ok(Plan {
        writes: vec![StoreWrite::Put {
            name: name.clone(),
            quantity,
        }],
        effect: Effect::Decremented {
            name: name.clone(),
            quantity,
        },
    })
}

/// Plan `rename(from, to)`.
///
/// Renaming onto an existing record merges the counts. The destination is
/// written before the source is deleted, so an interrupted rename leaves both
/// records rather than neither. Renaming a name onto itself is a no-op.
pub fn plan_rename(
    from: &ItemName,
    to: &ItemName,
    source: Option<&InventoryItem>,
    destination: Option<&InventoryItem>,
) -> DomainResult<Plan> {
    if from == to {
        return Ok(Plan::noop(Effect::SameName { name: from.clone() }));
    }
    ensure_matches(from, source)?;
    ensure_matches(to, destination)?;

    let Some(source) = source else {
        return Ok(Plan::noop(Effect::NotFound { name: from.clone() }));
    };

    let (quantity, effect) = match destination {
        Some(dest) => {
            let quantity = dest.quantity().checked_add(source.quantity()).ok_or_else(|| {
                DomainError::invariant(format!("merging {from} into {to} overflows quantity"))
            })?;
            (
                quantity,
                Effect::Merged {
                    from: from.clone(),
                    to: to.clone(),
                    quantity,
                },
            )
        }
        None => (
            source.quantity(),
            Effect::Renamed {
                from: from.clone(),
                to: to.clone(),
                quantity: source.quantity(),
            },
        ),
    };

    Ok(Plan {
        writes: vec![
            StoreWrite::Put {
                name: to.clone(),
                quantity,
            },
            StoreWrite::Delete { name: from.clone() },
        ],
        effect,
    })
}

/// Plan `clear_all()`: one independent delete per listed record.
pub fn plan_clear(snapshot: &InventorySnapshot) -> Plan {
    Plan {
        writes: snapshot
            .iter()
            .map(|item| StoreWrite::Delete {
                name: item.name().clone(),
            })
            .collect(),
        effect: Effect::Cleared {
            count: snapshot.len(),
        },
    }
}

fn ensure_matches(name: &ItemName, current: Option<&InventoryItem>) -> DomainResult<()> {
    match current {
        Some(item) if item.name() != name => Err(DomainError::invariant(format!(
            "record {} does not belong to {name}",
            item.name()
        ))),
        _ => Ok(()),
    }
}
