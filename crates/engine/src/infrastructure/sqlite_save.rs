//! SQLite-backed save slots.

use async_trait::async_trait;
use retrodesk_domain::MysterySnapshot;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::infrastructure::ports::{ClockPort, SaveError, SaveStorePort};

/// SQLite implementation for save slot storage. One row per slot, snapshot
/// stored as JSON.
pub struct SqliteSaveStore {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteSaveStore {
    pub async fn new(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, SaveError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| SaveError::database("connect", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS save_slots (
                slot TEXT PRIMARY KEY NOT NULL,
                snapshot_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| SaveError::database("migrate", e))?;

        Ok(Self { pool, clock })
    }
}

#[async_trait]
impl SaveStorePort for SqliteSaveStore {
    async fn load(&self, slot: &str) -> Result<Option<MysterySnapshot>, SaveError> {
        let row = sqlx::query("SELECT snapshot_json FROM save_slots WHERE slot = ?")
            .bind(slot)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SaveError::database("load", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("snapshot_json");
                let snapshot = serde_json::from_str(&json).map_err(SaveError::serialization)?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, slot: &str, snapshot: &MysterySnapshot) -> Result<(), SaveError> {
        let json = serde_json::to_string(snapshot).map_err(SaveError::serialization)?;
        let now = self.clock.now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO save_slots (slot, snapshot_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(slot) DO UPDATE SET
                snapshot_json = excluded.snapshot_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(slot)
        .bind(json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| SaveError::database("save", e))?;

        tracing::debug!(slot = %slot, "Saved mystery snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use retrodesk_domain::{AccessLevel, ClueId, PatternId};

    async fn store_in(dir: &tempfile::TempDir) -> SqliteSaveStore {
        let path = dir.path().join("saves.db");
        SqliteSaveStore::new(path.to_str().unwrap(), Arc::new(SystemClock::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn missing_slot_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        assert!(store.load("default").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let mut snapshot = MysterySnapshot::default();
        snapshot
            .discovered_clues
            .insert(ClueId::new("admin-access").unwrap());
        snapshot
            .active_patterns
            .insert(PatternId::new("admin-password-then-admin-command").unwrap());
        snapshot.access_level = AccessLevel::Admin;
        store.save("default", &snapshot).await.unwrap();

        assert_eq!(store.load("default").await.unwrap(), Some(snapshot.clone()));

        snapshot.access_level = AccessLevel::System;
        store.save("default", &snapshot).await.unwrap();
        let reloaded = store.load("default").await.unwrap().unwrap();
        assert_eq!(reloaded.access_level, AccessLevel::System);
        assert!(store.load("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = store_in(&dir).await;
            let mut snapshot = MysterySnapshot::default();
            snapshot
                .pattern_progress
                .insert(PatternId::new("starfield-cartographer").unwrap(), 0.5);
            store.save("slot-1", &snapshot).await.unwrap();
        }
        let store = store_in(&dir).await;
        let snapshot = store.load("slot-1").await.unwrap().unwrap();
        assert_eq!(snapshot.progress_of("starfield-cartographer"), 0.5);
    }
}
