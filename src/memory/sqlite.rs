//! SQLite-backed triplet store.

use crate::error::Result;
use crate::memory::facts::TripletStore;
use crate::memory::types::Triplet;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr as _;

/// Triplet store persisted in a SQLite table.
///
/// `add` is idempotent (the full tuple is unique) and `neighbors` returns
/// triplets in insertion order.
#[derive(Debug, Clone)]
pub struct SqliteTripletStore {
    pool: SqlitePool,
}

impl SqliteTripletStore {
    /// Open (or create) the database at `database_url` and apply migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // An in-memory database lives only as long as its single connection.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, applying migrations.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!("triplet store migrations applied");
        Ok(Self { pool })
    }

    /// Remove every stored triplet.
    pub async fn wipe(&self) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM triplets")
            .execute(&self.pool)
            .await?
            .rows_affected();
        tracing::info!(deleted, "triplet store wiped");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM triplets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TripletStore for SqliteTripletStore {
    async fn add(&self, triplet: Triplet) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO triplets (subject, predicate, object) VALUES (?, ?, ?)")
            .bind(&triplet.subject)
            .bind(&triplet.predicate)
            .bind(&triplet.object)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, triplet: &Triplet) -> Result<()> {
        sqlx::query("DELETE FROM triplets WHERE subject = ? AND predicate = ? AND object = ?")
            .bind(&triplet.subject)
            .bind(&triplet.predicate)
            .bind(&triplet.object)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn neighbors(&self, subject: &str) -> Result<Vec<Triplet>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT subject, predicate, object FROM triplets WHERE subject = ? ORDER BY rowid",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(subject, predicate, object)| Triplet {
                subject,
                predicate,
                object,
            })
            .collect())
    }
}
