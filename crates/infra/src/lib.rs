//! Infrastructure layer: store backends, reconciler execution, session state, config.

pub mod config;
pub mod reconciler;
pub mod session;
pub mod store;

pub use config::{AppConfig, ConfigError, StoreBackend};
pub use reconciler::{ReconcileError, Reconciler};
pub use session::{InventorySession, Outcome, OutcomeKind, SessionView};
pub use store::{InventoryStore, StoreUnavailable};
