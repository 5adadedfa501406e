use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use atoll_core::TripState;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRecord {
    pub state: TripState,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub trait TripRepository: Send + Sync {
    async fn load_trip(&self, trip_id: &str) -> Result<Option<TripRecord>>;
    async fn upsert_trip(&self, record: &TripRecord) -> Result<()>;
    async fn delete_trip(&self, trip_id: &str) -> Result<bool>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    trips: Arc<RwLock<HashMap<String, TripRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TripRepository for MemoryStore {
    async fn load_trip(&self, trip_id: &str) -> Result<Option<TripRecord>> {
        Ok(self.trips.read().get(trip_id).cloned())
    }

    async fn upsert_trip(&self, record: &TripRecord) -> Result<()> {
        self.trips
            .write()
            .insert(record.state.trip_id.clone(), record.clone());
        Ok(())
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<bool> {
        Ok(self.trips.write().remove(trip_id).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut removed = 0_u64;
        self.trips.write().retain(|_, record| {
            let keep = record.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });

        Ok(removed)
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trips (
              trip_id TEXT PRIMARY KEY,
              version INTEGER NOT NULL,
              updated_at TEXT NOT NULL,
              expires_at TEXT NOT NULL,
              state_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl TripRepository for SqliteStore {
    async fn load_trip(&self, trip_id: &str) -> Result<Option<TripRecord>> {
        let row = sqlx::query(
            r#"
            SELECT trip_id, updated_at, expires_at, state_json
            FROM trips
            WHERE trip_id = ?1
            "#,
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let state_json: String = row.get("state_json");
        let state: TripState = serde_json::from_str(&state_json)
            .with_context(|| format!("corrupt state_json for trip {}", trip_id))?;

        let record = TripRecord {
            state,
            updated_at: row
                .get::<String, _>("updated_at")
                .parse()
                .unwrap_or_else(|_| Utc::now()),
            expires_at: row
                .get::<String, _>("expires_at")
                .parse()
                .unwrap_or_else(|_| Utc::now()),
        };

        Ok(Some(record))
    }

    async fn upsert_trip(&self, record: &TripRecord) -> Result<()> {
        let state_json = serde_json::to_string(&record.state)?;

        sqlx::query(
            r#"
            INSERT INTO trips (trip_id, version, updated_at, expires_at, state_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(trip_id) DO UPDATE SET
              version=excluded.version,
              updated_at=excluded.updated_at,
              expires_at=excluded.expires_at,
              state_json=excluded.state_json
            "#,
        )
        .bind(&record.state.trip_id)
        .bind(record.state.version as i64)
        .bind(record.updated_at.to_rfc3339())
        .bind(record.expires_at.to_rfc3339())
        .bind(state_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM trips WHERE trip_id = ?1")
            .bind(trip_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM trips WHERE expires_at < ?1")
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }
}

impl TripRepository for Store {
    async fn load_trip(&self, trip_id: &str) -> Result<Option<TripRecord>> {
        match self {
            Store::Memory(store) => store.load_trip(trip_id).await,
            Store::Sqlite(store) => store.load_trip(trip_id).await,
        }
    }

    async fn upsert_trip(&self, record: &TripRecord) -> Result<()> {
        match self {
            Store::Memory(store) => store.upsert_trip(record).await,
            Store::Sqlite(store) => store.upsert_trip(record).await,
        }
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<bool> {
        match self {
            Store::Memory(store) => store.delete_trip(trip_id).await,
            Store::Sqlite(store) => store.delete_trip(trip_id).await,
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        match self {
            Store::Memory(store) => store.purge_expired(now).await,
            Store::Sqlite(store) => store.purge_expired(now).await,
        }
    }
}
