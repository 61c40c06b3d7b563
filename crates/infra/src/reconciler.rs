//! Reconciler: executes inventory plans against a store.
//!
//! Every operation follows the same pipeline:
//!
//! ```text
//! intent
//!   ↓
//! 1. Read the affected records (one store call each)
//!   ↓
//! 2. Plan (pure, `stockroom_inventory::reconcile`)
//!   ↓
//! 3. Apply writes in plan order (one store call each)
//! ```
//!
//! There is no lock, no retry and no rollback. A failure after some writes
//! landed is reported as [`ReconcileError::Partial`]; the store keeps whatever
//! was applied. Every store call is bounded by a timeout so a hung store
//! surfaces as [`StoreUnavailable`] instead of blocking the caller forever.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use stockroom_core::{DomainError, ItemName};
use stockroom_inventory::reconcile::{self, Effect, Plan, StoreWrite};
use stockroom_inventory::InventorySnapshot;

use crate::store::{InventoryStore, StoreUnavailable};

/// Default upper bound for a single store round trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// The plan could not be built (e.g. quantity overflow).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A store call failed before anything was written.
    #[error(transparent)]
    Store(#[from] StoreUnavailable),

    /// A store call failed after `applied` of `planned` writes landed.
    #[error(
        "{source} (after {applied} of {planned} writes, intended: {intended}; \
         nothing was rolled back)"
    )]
    Partial {
        applied: usize,
        planned: usize,
        intended: Effect,
        #[source]
        source: StoreUnavailable,
    },
}

/// Executes add/remove/rename/clear as sequential read-then-write sequences.
#[derive(Debug, Clone)]
pub struct Reconciler<S> {
    store: S,
    timeout: Duration,
}

impl<S> Reconciler<S>
where
    S: InventoryStore,
{
    pub fn new(store: S) -> Self {
        Self::with_timeout(store, DEFAULT_STORE_TIMEOUT)
    }

    pub fn with_timeout(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Full listing of the store, in its enumeration order.
    pub async fn list(&self) -> Result<InventorySnapshot, ReconcileError> {
        let items = self.call("list", self.store.list()).await?;
        Ok(InventorySnapshot::new(items))
    }

    pub async fn add(&self, name: &ItemName) -> Result<Effect, ReconcileError> {
        let current = self.call("get", self.store.get(name)).await?;
        let plan = reconcile::plan_add(name, current.as_ref())?;
        self.apply(plan).await
    }

    pub async fn remove(&self, name: &ItemName) -> Result<Effect, ReconcileError> {
        let current = self.call("get", self.store.get(name)).await?;
        let plan = reconcile::plan_remove(name, current.as_ref())?;
        self.apply(plan).await
    }

    pub async fn rename(&self, from: &ItemName, to: &ItemName) -> Result<Effect, ReconcileError> {
        if from == to {
            // Self-rename never reads, so it can never double-merge.
            let plan = reconcile::plan_rename(from, to, None, None)?;
            return Ok(plan.effect);
        }

        let source = self.call("get", self.store.get(from)).await?;
        if source.is_none() {
            let plan = reconcile::plan_rename(from, to, None, None)?;
            return Ok(plan.effect);
        }
        let destination = self.call("get", self.store.get(to)).await?;

        let plan = reconcile::plan_rename(from, to, source.as_ref(), destination.as_ref())?;
        self.apply(plan).await
    }

    /// Delete every listed record independently.
    ///
    /// Not atomic: a failure partway leaves some records deleted and reports
    /// [`ReconcileError::Partial`].
    pub async fn clear_all(&self) -> Result<Effect, ReconcileError> {
        let snapshot = self.list().await?;
        let plan = reconcile::plan_clear(&snapshot);
        self.apply(plan).await
    }

    async fn apply(&self, plan: Plan) -> Result<Effect, ReconcileError> {
        let Plan { writes, effect } = plan;
        let planned = writes.len();

        for (applied, write) in writes.iter().enumerate() {
            let result = match write {
                StoreWrite::Put { name, quantity } => {
                    tracing::debug!(item = %name, quantity, "store put");
                    self.call("put", self.store.put(name, *quantity)).await
                }
                StoreWrite::Delete { name } => {
                    tracing::debug!(item = %name, "store delete");
                    self.call("delete", self.store.delete(name)).await
                }
            };

            if let Err(source) = result {
                if applied == 0 {
                    return Err(ReconcileError::Store(source));
                }
                tracing::warn!(
                    applied,
                    planned,
                    error = %source,
                    "reconcile stopped partway; applied writes are kept"
                );
                return Err(ReconcileError::Partial {
                    applied,
                    planned,
                    intended: effect,
                    source,
                });
            }
        }

        tracing::info!(writes = planned, effect = %effect, "reconcile applied");
        Ok(effect)
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, StoreUnavailable>>,
    ) -> Result<T, StoreUnavailable> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(operation, timeout_ms, "store call timed out");
                Err(StoreUnavailable::new(format!(
                    "{operation} timed out after {timeout_ms} ms"
                )))
            }
        }
    }
}
