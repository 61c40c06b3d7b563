use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use stockroom_infra::store::{
    FirestoreInventoryStore, InMemoryInventoryStore, InventoryStore, SqliteInventoryStore,
};
use stockroom_infra::{AppConfig, InventorySession, Reconciler, StoreBackend};

/// Type-erased store so one binary can run against any backend.
pub type DynStore = Arc<dyn InventoryStore>;

/// The process-wide session every handler shares.
pub type SharedSession = Arc<InventorySession<DynStore>>;

pub async fn build_store(backend: &StoreBackend) -> anyhow::Result<DynStore> {
    let store: DynStore = match backend {
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; inventory is lost on restart");
            Arc::new(InMemoryInventoryStore::new())
        }
        StoreBackend::Sqlite { path } => {
            tracing::info!(path = %path.display(), "opening sqlite inventory store");
            Arc::new(SqliteInventoryStore::open(path).await?)
        }
        StoreBackend::Firestore(config) => {
            tracing::info!(
                project = %config.project_id,
                collection = %config.collection,
                "using firestore inventory store"
            );
            let store = FirestoreInventoryStore::new(config.clone())
                .context("failed to configure the firestore store")?;
            Arc::new(store)
        }
    };
    Ok(store)
}

/// Build an unstarted session for the configured backend.
pub async fn build_session(config: &AppConfig) -> anyhow::Result<SharedSession> {
    let store = build_store(&config.store).await?;
    Ok(session_over(store, config.store_timeout))
}

pub fn session_over(store: DynStore, timeout: Duration) -> SharedSession {
    Arc::new(InventorySession::new(Reconciler::with_timeout(store, timeout)))
}
