//! SQLite-backed inventory store.
//!
//! Local single-file stand-in for the hosted document store. Records keep
//! their insertion order (`rowid`) in listings; an upsert of an existing key
//! keeps its place.

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use stockroom_core::ItemName;
use stockroom_inventory::InventoryItem;

use super::r#trait::{InventoryStore, StoreUnavailable, decode_record};

/// SQLite inventory store.
#[derive(Debug, Clone)]
pub struct SqliteInventoryStore {
    pool: SqlitePool,
}

impl SqliteInventoryStore {
    /// Open (creating if missing) a database file and ensure the schema exists.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {parent:?}"))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open SQLite inventory at {path:?}"))?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database (tests/dev).
    ///
    /// Pinned to a single connection: every `:memory:` connection is its own database.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("invalid in-memory SQLite URL")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("failed to open in-memory SQLite inventory")?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS inventory_items (
                name       TEXT PRIMARY KEY NOT NULL,
                quantity   INTEGER NOT NULL CHECK (quantity > 0),
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create inventory_items table")?;

        Ok(Self { pool })
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreUnavailable {
    tracing::warn!(operation, error = %err, "sqlite store call failed");
    StoreUnavailable::new(format!("sqlite {operation} failed: {err}"))
}

fn to_column(name: &ItemName, quantity: u64) -> Result<i64, StoreUnavailable> {
    i64::try_from(quantity).map_err(|_| {
        StoreUnavailable::new(format!("quantity {quantity} of {name} exceeds SQLite INTEGER"))
    })
}

#[async_trait::async_trait]
impl InventoryStore for SqliteInventoryStore {
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreUnavailable> {
        let rows = sqlx::query("SELECT name, quantity FROM inventory_items ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter()
            .map(|row| {
                let name: String = row.try_get("name").map_err(|e| map_sqlx_error("list", e))?;
                let quantity: i64 = row
                    .try_get("quantity")
                    .map_err(|e| map_sqlx_error("list", e))?;
                decode_record(&name, quantity)
            })
            .collect()
    }

    async fn get(&self, name: &ItemName) -> Result<Option<InventoryItem>, StoreUnavailable> {
        let row = sqlx::query("SELECT quantity FROM inventory_items WHERE name = ?1")
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        match row {
            Some(row) => {
                let quantity: i64 = row
                    .try_get("quantity")
                    .map_err(|e| map_sqlx_error("get", e))?;
                decode_record(name.as_str(), quantity).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, name: &ItemName, quantity: u64) -> Result<(), StoreUnavailable> {
        let quantity = to_column(name, quantity)?;
        sqlx::query(
            r#"
            INSERT INTO inventory_items (name, quantity, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET
                quantity = excluded.quantity,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(name.as_str())
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("put", e))?;

        Ok(())
    }

    async fn delete(&self, name: &ItemName) -> Result<(), StoreUnavailable> {
        sqlx::query("DELETE FROM inventory_items WHERE name = ?1")
            .bind(name.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        Ok(())
    }
}
