//! Member profile storage
//!
//! Profiles are the only persisted state. Vitals and status are attached by
//! the roster after loading and never written back.

use crate::types::{MemberProfile, NewMember};
use chrono::Utc;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS members (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        age INTEGER NOT NULL,
        relationship TEXT NOT NULL,
        health_history TEXT NOT NULL,
        device_id TEXT,
        user_id TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_members_created_at ON members(created_at);
"#;

/// Member store backed by SQLite
pub struct MemberStore {
    pool: SqlitePool,
}

impl MemberStore {
    /// Open (or create) a store at the given file path
    pub async fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, sqlx::Error> {
        if let Some(parent) = db_path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let db_url = format!("sqlite://{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;
        let store = Self::with_pool(pool).await?;
        info!("Member store initialized at {}", db_path.as_ref().display());
        Ok(store)
    }

    /// Store that lives only as long as the process
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        // Every connection to :memory: is a separate database, so keep exactly
        // one alive for the lifetime of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::with_pool(pool).await?;
        info!("Member store initialized in memory");
        Ok(store)
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert a validated submission and return the stored profile
    pub async fn insert(
        &self,
        new: &NewMember,
        default_user_id: &str,
    ) -> Result<MemberProfile, sqlx::Error> {
        let profile = MemberProfile {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            age: new.age,
            relationship: new.relationship.trim().to_string(),
            health_history: new.health_history.trim().to_string(),
            device_id: new.device_id.as_ref().map(|d| d.trim().to_string()),
            user_id: new
                .user_id
                .clone()
                .unwrap_or_else(|| default_user_id.to_string()),
            created_at: Utc::now().timestamp_millis(),
        };

        sqlx::query(
            r#"
            INSERT INTO members (
                id, name, age, relationship, health_history, device_id, user_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(profile.id.to_string())
        .bind(&profile.name)
        .bind(i64::from(profile.age))
        .bind(&profile.relationship)
        .bind(&profile.health_history)
        .bind(&profile.device_id)
        .bind(&profile.user_id)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;

        debug!("Inserted member {} ({})", profile.id, profile.name);
        Ok(profile)
    }

    /// All profiles, newest first
    pub async fn list(&self) -> Result<Vec<MemberProfile>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, age, relationship, health_history, device_id, user_id, created_at
            FROM members
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(profile_from_row).collect()
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }
}

fn profile_from_row(row: &SqliteRow) -> Result<MemberProfile, sqlx::Error> {
    let raw_id: String = row.try_get(0)?;
    let id = Uuid::parse_str(&raw_id).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let age: i64 = row.try_get(2)?;
    let age = u32::try_from(age).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(MemberProfile {
        id,
        name: row.try_get(1)?,
        age,
        relationship: row.try_get(3)?,
        health_history: row.try_get(4)?,
        device_id: row.try_get(5)?,
        user_id: row.try_get(6)?,
        created_at: row.try_get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str) -> NewMember {
        NewMember {
            name: name.to_string(),
            age: 70,
            relationship: "Parent".to_string(),
            health_history: "Arthritis".to_string(),
            device_id: Some(format!("FitBand-{name}")),
            user_id: None,
        }
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = MemberStore::in_memory().await.unwrap();
        store.insert(&submission("first"), "u1").await.unwrap();
        store.insert(&submission("second"), "u1").await.unwrap();
        store.insert(&submission("third"), "u1").await.unwrap();

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn insert_fills_owner_and_trims_fields() {
        let store = MemberStore::in_memory().await.unwrap();
        let mut new = submission("  Mary Johnson ");
        new.user_id = Some("caregiver-7".to_string());
        let profile = store.insert(&new, "fallback").await.unwrap();
        assert_eq!(profile.name, "Mary Johnson");
        assert_eq!(profile.user_id, "caregiver-7");

        let default_owner = store.insert(&submission("Tom"), "fallback").await.unwrap();
        assert_eq!(default_owner.user_id, "fallback");
    }

    #[tokio::test]
    async fn profiles_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guardian").join("members.db");

        let inserted = {
            let store = MemberStore::open(&path).await.unwrap();
            store.insert(&submission("Mary"), "u1").await.unwrap()
        };

        let store = MemberStore::open(&path).await.unwrap();
        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![inserted]);
    }
}
