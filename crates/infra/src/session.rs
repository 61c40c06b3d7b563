//! Inventory session: the state a UI renders and the operations it calls.
//!
//! A session holds the last snapshot listed from the store, the current search
//! text, a busy flag and the outcome of the last operation. It is an explicit
//! object owned by whoever drives the UI (one per UI session), never ambient
//! global state.
//!
//! ## Operation lifecycle
//!
//! 1. Validate names (invalid input is `Rejected` without touching the store)
//! 2. Acquire the busy flag (an overlapping call is refused as `Busy`)
//! 3. Run the reconciler operation
//! 4. Re-list the store into a fresh snapshot, success or failure
//! 5. Release busy, record and return the [`Outcome`]
//!
//! Typed errors stop here: callers only ever see an `Outcome` with a message.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use stockroom_core::ItemName;
use stockroom_inventory::reconcile::Effect;
use stockroom_inventory::{InventorySnapshot, filter};

use crate::reconciler::{ReconcileError, Reconciler};
use crate::store::InventoryStore;

/// The user intent an outcome belongs to (names as the user typed them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Refresh,
    Add { name: String },
    Remove { name: String },
    Rename { from: String, to: String },
    ClearAll,
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Operation::Refresh => write!(f, "refresh the inventory"),
            Operation::Add { name } => write!(f, "add {name:?}"),
            Operation::Remove { name } => write!(f, "remove {name:?}"),
            Operation::Rename { from, to } => write!(f, "rename {from:?} to {to:?}"),
            Operation::ClearAll => write!(f, "clear the inventory"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The store was changed (or re-listed) as requested.
    Applied,
    /// Nothing to do (absent item, self-rename, empty clear).
    NoOp,
    /// Input or a domain rule refused the operation; the store was not written.
    Rejected,
    /// Another operation was still in flight; nothing was attempted.
    Busy,
    /// A store round trip failed. Writes already applied are kept.
    Failed,
}

/// Result of one session operation, suitable for transient display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub operation_id: Uuid,
    pub operation: Operation,
    pub kind: OutcomeKind,
    pub message: String,
    pub completed_at: DateTime<Utc>,
}

impl Outcome {
    fn new(operation: Operation, kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            operation_id: Uuid::now_v7(),
            operation,
            kind,
            message: message.into(),
            completed_at: Utc::now(),
        }
    }

    fn from_result(operation: Operation, result: Result<Effect, ReconcileError>) -> Self {
        match result {
            Ok(effect) if effect.is_noop() => {
                Self::new(operation, OutcomeKind::NoOp, effect.to_string())
            }
            Ok(effect) => Self::new(operation, OutcomeKind::Applied, effect.to_string()),
            Err(ReconcileError::Domain(e)) => {
                let message = format!("could not {operation}: {e}");
                Self::new(operation, OutcomeKind::Rejected, message)
            }
            Err(e) => {
                let message = format!("could not {operation}: {e}");
                Self::new(operation, OutcomeKind::Failed, message)
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.kind, OutcomeKind::Applied | OutcomeKind::NoOp)
    }
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub items: InventorySnapshot,
    pub filtered: InventorySnapshot,
    pub query: String,
    pub busy: bool,
    /// True until the first successful listing, and after a failed re-list.
    pub stale: bool,
    pub last_outcome: Option<Outcome>,
}

#[derive(Debug)]
struct SessionState {
    snapshot: InventorySnapshot,
    query: String,
    stale: bool,
    last_outcome: Option<Outcome>,
}

/// Releases the busy flag on drop, including when the operation future is cancelled.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Session controller over a reconciler.
#[derive(Debug)]
pub struct InventorySession<S> {
    reconciler: Reconciler<S>,
    state: RwLock<SessionState>,
    busy: AtomicBool,
}

impl<S> InventorySession<S>
where
    S: InventoryStore,
{
    pub fn new(reconciler: Reconciler<S>) -> Self {
        Self {
            reconciler,
            state: RwLock::new(SessionState {
                snapshot: InventorySnapshot::empty(),
                query: String::new(),
                stale: true,
                last_outcome: None,
            }),
            busy: AtomicBool::new(false),
        }
    }

    /// Initial listing when the session is mounted.
    pub async fn start(&self) -> Outcome {
        tracing::info!("starting inventory session");
        self.refresh().await
    }

    /// Re-list the store into the snapshot.
    pub async fn refresh(&self) -> Outcome {
        let operation = Operation::Refresh;
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            return self.record(Self::busy_outcome(operation));
        };

        let outcome = match self.reload().await {
            Ok(count) => Outcome::new(
                operation,
                OutcomeKind::Applied,
                format!("inventory refreshed ({count} items)"),
            ),
            Err(e) => {
                let message = format!("could not {operation}: {e}");
                Outcome::new(operation, OutcomeKind::Failed, message)
            }
        };
        self.record(outcome)
    }

    pub async fn add(&self, raw_name: &str) -> Outcome {
        let operation = Operation::Add {
            name: raw_name.to_string(),
        };
        let name = match ItemName::parse(raw_name) {
            Ok(name) => name,
            Err(e) => return self.reject(operation, e),
        };
        self.mutate(operation, self.reconciler.add(&name)).await
    }

    pub async fn remove(&self, raw_name: &str) -> Outcome {
        let operation = Operation::Remove {
            name: raw_name.to_string(),
        };
        let name = match ItemName::parse(raw_name) {
            Ok(name) => name,
            Err(e) => return self.reject(operation, e),
        };
        self.mutate(operation, self.reconciler.remove(&name)).await
    }

    /// Rename `raw_from` to `raw_to`, merging counts if the destination exists.
    pub async fn rename(&self, raw_from: &str, raw_to: &str) -> Outcome {
        let operation = Operation::Rename {
            from: raw_from.to_string(),
            to: raw_to.to_string(),
        };
        let names = ItemName::parse(raw_from).and_then(|from| Ok((from, ItemName::parse(raw_to)?)));
        let (from, to) = match names {
            Ok(names) => names,
            Err(e) => return self.reject(operation, e),
        };
        self.mutate(operation, self.reconciler.rename(&from, &to)).await
    }

    /// Delete every record. Not atomic; see [`Reconciler::clear_all`].
    pub async fn clear_all(&self) -> Outcome {
        self.mutate(Operation::ClearAll, self.reconciler.clear_all())
            .await
    }

    /// Set the search text and return the updated view. No store access.
    pub fn set_query(&self, query: impl Into<String>) -> SessionView {
        self.write_state().query = query.into();
        self.view()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn view(&self) -> SessionView {
        let state = self.read_state();
        SessionView {
            items: state.snapshot.clone(),
            filtered: filter(&state.snapshot, &state.query),
            query: state.query.clone(),
            busy: self.is_busy(),
            stale: state.stale,
            last_outcome: state.last_outcome.clone(),
        }
    }

    async fn mutate(
        &self,
        operation: Operation,
        work: impl Future<Output = Result<Effect, ReconcileError>>,
    ) -> Outcome {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            return self.record(Self::busy_outcome(operation));
        };

        let mut outcome = Outcome::from_result(operation, work.await);

        // The view always re-syncs with the store, even after a failure.
        if let Err(e) = self.reload().await {
            outcome.message = format!("{}; the list could not be refreshed: {e}", outcome.message);
        }
        self.record(outcome)
    }

    async fn reload(&self) -> Result<usize, ReconcileError> {
        match self.reconciler.list().await {
            Ok(snapshot) => {
                let count = snapshot.len();
                let mut state = self.write_state();
                state.snapshot = snapshot;
                state.stale = false;
                Ok(count)
            }
            Err(e) => {
                self.write_state().stale = true;
                Err(e)
            }
        }
    }

    fn reject(&self, operation: Operation, err: stockroom_core::DomainError) -> Outcome {
        let message = format!("could not {operation}: {err}");
        self.record(Outcome::new(operation, OutcomeKind::Rejected, message))
    }

    fn busy_outcome(operation: Operation) -> Outcome {
        let message = format!("could not {operation}: another operation is still in progress");
        Outcome::new(operation, OutcomeKind::Busy, message)
    }

    fn record(&self, outcome: Outcome) -> Outcome {
        match outcome.kind {
            OutcomeKind::Applied | OutcomeKind::NoOp => tracing::info!(
                operation_id = %outcome.operation_id,
                kind = ?outcome.kind,
                message = %outcome.message,
                "inventory operation finished"
            ),
            _ => tracing::warn!(
                operation_id = %outcome.operation_id,
                kind = ?outcome.kind,
                message = %outcome.message,
                "inventory operation did not apply"
            ),
        }
        self.write_state().last_outcome = Some(outcome.clone());
        outcome
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use stockroom_inventory::InventoryItem;
    use tokio::sync::Notify;

    use super::*;
    use crate::store::{InMemoryInventoryStore, StoreUnavailable};

    type MemSession = InventorySession<Arc<InMemoryInventoryStore>>;

    fn session(records: &[(&str, u64)]) -> (Arc<InMemoryInventoryStore>, MemSession) {
        let store = Arc::new(InMemoryInventoryStore::with_records(records.iter().copied()));
        (store.clone(), InventorySession::new(Reconciler::new(store)))
    }

    fn listed(view: &SessionView) -> Vec<(String, u64)> {
        view.items
            .iter()
            .map(|i| (i.name().to_string(), i.quantity()))
            .collect()
    }

    fn pairs(items: &[(&str, u64)]) -> Vec<(String, u64)> {
        items.iter().map(|(n, q)| (n.to_string(), *q)).collect()
    }

    #[tokio::test]
    async fn start_lists_the_store() {
        let (_store, session) = session(&[("apple", 2)]);
        assert!(session.view().stale);

        let outcome = session.start().await;
        assert_eq!(outcome.kind, OutcomeKind::Applied);

        let view = session.view();
        assert!(!view.stale);
        assert!(!view.busy);
        assert_eq!(listed(&view), pairs(&[("apple", 2)]));
    }

    #[tokio::test]
    async fn add_and_remove_lifecycle() {
        let (_store, session) = session(&[]);
        session.start().await;

        session.add("Apple").await;
        assert_eq!(listed(&session.view()), pairs(&[("apple", 1)]));

        session.add("apple").await;
        assert_eq!(listed(&session.view()), pairs(&[("apple", 2)]));

        session.remove("apple").await;
        assert_eq!(listed(&session.view()), pairs(&[("apple", 1)]));

        let outcome = session.remove("apple").await;
        assert_eq!(outcome.kind, OutcomeKind::Applied);
        assert!(session.view().items.is_empty());
    }

    #[tokio::test]
    async fn rename_merges_into_existing_item() {
        let (_store, session) = session(&[]);
        session.start().await;

        session.add("Pear").await;
        session.add("Plum").await;
        let outcome = session.rename("pear", "plum").await;

        assert_eq!(outcome.kind, OutcomeKind::Applied);
        assert_eq!(outcome.message, "merged pear into plum (quantity 2)");
        assert_eq!(listed(&session.view()), pairs(&[("plum", 2)]));
    }

    #[tokio::test]
    async fn remove_of_absent_item_is_soft_noop() {
        let (_store, session) = session(&[("pear", 1)]);
        session.start().await;
        let before = session.view().items;

        let outcome = session.remove("apple").await;
        assert_eq!(outcome.kind, OutcomeKind::NoOp);
        assert!(outcome.is_success());
        assert_eq!(session.view().items, before);
    }

    #[tokio::test]
    async fn invalid_names_are_rejected_without_store_calls() {
        let (store, session) = session(&[]);
        let outcome = session.add("   ").await;
        assert_eq!(outcome.kind, OutcomeKind::Rejected);

        let outcome = session.rename("pear", "").await;
        assert_eq!(outcome.kind, OutcomeKind::Rejected);

        assert_eq!(store.round_trips(), 0);
        assert_eq!(session.view().last_outcome, Some(outcome));
    }

    #[tokio::test]
    async fn clear_all_empties_snapshot() {
        let (_store, session) = session(&[("a", 1), ("b", 4)]);
        session.start().await;

        let outcome = session.clear_all().await;
        assert_eq!(outcome.message, "cleared 2 items");
        assert!(session.view().items.is_empty());
    }

    #[tokio::test]
    async fn partial_clear_reports_failure_and_view_reflects_store() {
        let (store, session) = session(&[("a", 1), ("b", 1), ("c", 1)]);
        session.start().await;
        store.fail_writes_after(1);

        let outcome = session.clear_all().await;
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(outcome.message.contains("after 1 of 3 writes"));

        let view = session.view();
        assert!(!view.stale);
        assert_eq!(listed(&view), pairs(&[("b", 1), ("c", 1)]));
    }

    #[tokio::test]
    async fn store_outage_fails_and_marks_view_stale() {
        let (store, session) = session(&[("apple", 1)]);
        session.start().await;
        store.set_offline(true);

        let outcome = session.add("apple").await;
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(outcome.message.contains("store unavailable"));
        assert!(outcome.message.contains("could not be refreshed"));

        let view = session.view();
        assert!(view.stale);
        assert!(!view.busy);
        // Last good snapshot is kept.
        assert_eq!(listed(&view), pairs(&[("apple", 1)]));

        store.set_offline(false);
        assert_eq!(session.refresh().await.kind, OutcomeKind::Applied);
        assert!(!session.view().stale);
    }

    #[tokio::test]
    async fn search_filters_the_view() {
        let (_store, session) = session(&[("apple", 1), ("pineapple", 2), ("pear", 3)]);
        session.start().await;

        let view = session.set_query("APP");
        let filtered: Vec<_> = view.filtered.iter().map(|i| i.name().as_str()).collect();
        assert_eq!(filtered, ["apple", "pineapple"]);
        assert_eq!(view.items.len(), 3);

        let view = session.set_query("");
        assert_eq!(view.filtered, view.items);
    }

    #[tokio::test]
    async fn filter_follows_snapshot_after_mutation() {
        let (_store, session) = session(&[]);
        session.start().await;
        session.set_query("ki");

        session.add("kiwi").await;
        session.add("lime").await;

        let view = session.view();
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.filtered.len(), 1);
    }

    /// Store whose `get` blocks until released, to hold an operation in flight.
    struct GatedStore {
        inner: InMemoryInventoryStore,
        gate: Notify,
        entered: Notify,
    }

    #[async_trait::async_trait]
    impl InventoryStore for GatedStore {
        async fn list(&self) -> Result<Vec<InventoryItem>, StoreUnavailable> {
            self.inner.list().await
        }

        async fn get(&self, name: &ItemName) -> Result<Option<InventoryItem>, StoreUnavailable> {
            self.entered.notify_one();
            self.gate.notified().await;
            self.inner.get(name).await
        }

        async fn put(&self, name: &ItemName, quantity: u64) -> Result<(), StoreUnavailable> {
            self.inner.put(name, quantity).await
        }

        async fn delete(&self, name: &ItemName) -> Result<(), StoreUnavailable> {
            self.inner.delete(name).await
        }
    }

    #[tokio::test]
    async fn overlapping_mutation_is_refused_as_busy() {
        let store = Arc::new(GatedStore {
            inner: InMemoryInventoryStore::new(),
            gate: Notify::new(),
            entered: Notify::new(),
        });
        let session = Arc::new(InventorySession::new(Reconciler::new(store.clone())));

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.add("apple").await })
        };

        store.entered.notified().await;
        assert!(session.is_busy());

        let second = session.add("apple").await;
        assert_eq!(second.kind, OutcomeKind::Busy);
        assert_eq!(session.refresh().await.kind, OutcomeKind::Busy);

        store.gate.notify_one();
        let first = first.await.unwrap();
        assert_eq!(first.kind, OutcomeKind::Applied);
        assert!(!session.is_busy());
        assert_eq!(listed(&session.view()), pairs(&[("apple", 1)]));
    }

    /// Store that never answers.
    struct SilentStore;

    #[async_trait::async_trait]
    impl InventoryStore for SilentStore {
        async fn list(&self) -> Result<Vec<InventoryItem>, StoreUnavailable> {
            std::future::pending().await
        }

        async fn get(&self, _name: &ItemName) -> Result<Option<InventoryItem>, StoreUnavailable> {
            std::future::pending().await
        }

        async fn put(&self, _name: &ItemName, _quantity: u64) -> Result<(), StoreUnavailable> {
            std::future::pending().await
        }

        async fn delete(&self, _name: &ItemName) -> Result<(), StoreUnavailable> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn hung_store_releases_busy_after_timeout() {
        let session = InventorySession::new(Reconciler::with_timeout(
            SilentStore,
            Duration::from_millis(20),
        ));

        let outcome = session.add("apple").await;
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(outcome.message.contains("timed out"));
        assert!(!session.is_busy());
        assert!(session.view().stale);
    }

    #[tokio::test]
    async fn cancelled_operation_releases_busy() {
        let session = InventorySession::new(Reconciler::with_timeout(
            SilentStore,
            Duration::from_secs(60),
        ));

        let cancelled = tokio::time::timeout(Duration::from_millis(10), session.add("apple")).await;
        assert!(cancelled.is_err());
        assert!(!session.is_busy());
    }
}
