//! Configuration loading and representation.
//!
//! Everything comes from environment variables. [`AppConfig::from_lookup`]
//! takes any key → value function so tests never touch the process
//! environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::reconciler::DEFAULT_STORE_TIMEOUT;
use crate::store::firestore::{DEFAULT_BASE_URL, DEFAULT_COLLECTION, FirestoreConfig};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_SQLITE_PATH: &str = "stockroom.db";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is required when STOCKROOM_STORE={backend}")]
    Missing { key: &'static str, backend: &'static str },

    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Which store backend a process talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite { path: PathBuf },
    Firestore(FirestoreConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub store: StoreBackend,
    pub store_timeout: Duration,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("STOCKROOM_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            key: "STOCKROOM_BIND",
            message: format!("{bind_raw:?}: {e}"),
        })?;

        let store_timeout = match get("STOCKROOM_STORE_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                    key: "STOCKROOM_STORE_TIMEOUT_MS",
                    message: format!("{raw:?}: {e}"),
                })?;
                if ms == 0 {
                    return Err(ConfigError::Invalid {
                        key: "STOCKROOM_STORE_TIMEOUT_MS",
                        message: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_millis(ms)
            }
            None => DEFAULT_STORE_TIMEOUT,
        };

        let backend = get("STOCKROOM_STORE").unwrap_or_else(|| "memory".to_string());
        let store = match backend.trim().to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "sqlite" => StoreBackend::Sqlite {
                path: get("STOCKROOM_SQLITE_PATH")
                    .unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string())
                    .into(),
            },
            "firestore" => {
                let project_id = get("FIRESTORE_PROJECT_ID").ok_or(ConfigError::Missing {
                    key: "FIRESTORE_PROJECT_ID",
                    backend: "firestore",
                })?;
                StoreBackend::Firestore(FirestoreConfig {
                    project_id,
                    collection: get("STOCKROOM_COLLECTION")
                        .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
                    base_url: get("FIRESTORE_BASE_URL")
                        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                    api_key: get("FIRESTORE_API_KEY"),
                    bearer_token: get("FIRESTORE_BEARER_TOKEN"),
                })
            }
            other => {
                return Err(ConfigError::Invalid {
                    key: "STOCKROOM_STORE",
                    message: format!("{other:?} (expected memory, sqlite or firestore)"),
                });
            }
        };

        Ok(Self {
            bind,
            store,
            store_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_in_memory_store() {
        let config = load(&[]).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.bind, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.store_timeout, DEFAULT_STORE_TIMEOUT);
    }

    #[test]
    fn sqlite_backend_uses_configured_path() {
        let config = load(&[
            ("STOCKROOM_STORE", "SQLite"),
            ("STOCKROOM_SQLITE_PATH", "/tmp/inv.db"),
        ])
        .unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Sqlite {
                path: PathBuf::from("/tmp/inv.db")
            }
        );
    }

    #[test]
    fn firestore_requires_project_id() {
        let err = load(&[("STOCKROOM_STORE", "firestore")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                key: "FIRESTORE_PROJECT_ID",
                backend: "firestore"
            }
        );
    }

    #[test]
    fn firestore_settings_are_collected() {
        let config = load(&[
            ("STOCKROOM_STORE", "firestore"),
            ("FIRESTORE_PROJECT_ID", "inventory-app"),
            ("FIRESTORE_API_KEY", "k"),
            ("STOCKROOM_COLLECTION", "pantry"),
        ])
        .unwrap();

        match config.store {
            StoreBackend::Firestore(fs) => {
                assert_eq!(fs.project_id, "inventory-app");
                assert_eq!(fs.collection, "pantry");
                assert_eq!(fs.api_key.as_deref(), Some("k"));
                assert_eq!(fs.bearer_token, None);
                assert_eq!(fs.base_url, DEFAULT_BASE_URL);
            }
            other => panic!("expected firestore backend, got {other:?}"),
        }
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            load(&[("STOCKROOM_STORE", "redis")]),
            Err(ConfigError::Invalid { key: "STOCKROOM_STORE", .. })
        ));
        assert!(matches!(
            load(&[("STOCKROOM_BIND", "nowhere")]),
            Err(ConfigError::Invalid { key: "STOCKROOM_BIND", .. })
        ));
        assert!(matches!(
            load(&[("STOCKROOM_STORE_TIMEOUT_MS", "0")]),
            Err(ConfigError::Invalid { key: "STOCKROOM_STORE_TIMEOUT_MS", .. })
        ));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[
            ("STOCKROOM_STORE", "  "),
            ("STOCKROOM_STORE_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.store_timeout, Duration::from_millis(250));
    }
}
