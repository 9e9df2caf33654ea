//! SQLite-backed addon store.
//!
//! Single `addons` table; service definitions are stored as a JSON column
//! since the engine only ever reads them back whole.

use super::{AddonPatch, AddonStore, NewAddon};
use crate::addon::{Addon, AddonStatus, ServiceSpec};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use std::path::Path;
use tokio_rusqlite::Connection;
use uuid::Uuid;

pub struct SqliteAddonStore {
    conn: Connection,
}

impl SqliteAddonStore {
    /// Open (or create) the store at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).await?;
        let store = Self { conn };
        store.configure().await?;
        Ok(store)
    }

    /// Ephemeral in-memory store.
    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open(":memory:").await?;
        let store = Self { conn };
        store.configure().await?;
        Ok(store)
    }

    async fn configure(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.pragma_update(None, "journal_mode", "WAL")?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.pragma_update(None, "busy_timeout", 5000)?;
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS addons (
                        id TEXT PRIMARY KEY,
                        marketplace_id TEXT NOT NULL,
                        status TEXT NOT NULL,
                        services TEXT NOT NULL,
                        created_at TEXT NOT NULL,
                        updated_at TEXT NOT NULL
                    )",
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn row_to_addon(row: &rusqlite::Row<'_>) -> rusqlite::Result<Addon> {
    let status_str: String = row.get(2)?;
    let services_json: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(Addon {
        id: row.get(0)?,
        marketplace_id: row.get(1)?,
        status: status_str
            .parse::<AddonStatus>()
            .unwrap_or(AddonStatus::Failed),
        services: serde_json::from_str::<Vec<ServiceSpec>>(&services_json).unwrap_or_default(),
        created_at: created_at
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
        updated_at: updated_at
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[async_trait]
impl AddonStore for SqliteAddonStore {
    async fn create_addon(&self, addon: NewAddon) -> Result<Addon> {
        let now = Utc::now();
        let record = Addon {
            id: Uuid::new_v4().to_string(),
            marketplace_id: addon.marketplace_id,
            status: addon.status,
            services: addon.services,
            created_at: now,
            updated_at: now,
        };

        let services_json = serde_json::to_string(&record.services)?;
        let insert = record.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO addons (id, marketplace_id, status, services, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        insert.id,
                        insert.marketplace_id,
                        insert.status.to_string(),
                        services_json,
                        insert.created_at.to_rfc3339(),
                        insert.updated_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;

        Ok(record)
    }

    async fn update_addon(&self, id: &str, patch: AddonPatch) -> Result<()> {
        let current = self
            .get_addon(id)
            .await?
            .ok_or_else(|| Error::AddonNotFound(id.to_string()))?;

        if let Some(to) = patch.status {
            if !current.status.can_transition(to) {
                return Err(Error::InvalidStatusTransition {
                    from: current.status,
                    to,
                });
            }
        }

        let status = patch.status.unwrap_or(current.status);
        let services = patch.services.unwrap_or(current.services);
        let services_json = serde_json::to_string(&services)?;
        let id = id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE addons SET status = ?1, services = ?2, updated_at = ?3 WHERE id = ?4",
                    rusqlite::params![
                        status.to_string(),
                        services_json,
                        Utc::now().to_rfc3339(),
                        id,
                    ],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn get_addon(&self, id: &str) -> Result<Option<Addon>> {
        let id = id.to_string();
        let addon = self
            .conn
            .call(move |conn| {
                let addon = conn
                    .query_row(
                        "SELECT id, marketplace_id, status, services, created_at, updated_at
                         FROM addons WHERE id = ?1",
                        [id],
                        row_to_addon,
                    )
                    .optional()?;
                Ok(addon)
            })
            .await?;
        Ok(addon)
    }

    async fn find_active_addons(&self) -> Result<Vec<Addon>> {
        let addons = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, marketplace_id, status, services, created_at, updated_at
                     FROM addons WHERE status != 'failed' ORDER BY created_at",
                )?;
                let rows = stmt
                    .query_map([], row_to_addon)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;
        Ok(addons)
    }
}
