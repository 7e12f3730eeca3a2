//! Relational scoreboard backend. `ScoreboardSink` is the core's only
//! contract with the database; the concrete implementation below is a
//! Postgres pool reached through `sqlx`.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::session::RetiredRecord;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreboardRecord {
    pub name: String,
    pub score: i64,
    #[serde(rename = "playTime")]
    pub play_time: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ScoreboardError {
    #[error("database error: {0}")]
    Database(String),
}

#[async_trait::async_trait]
pub trait ScoreboardSink: Send + Sync + 'static {
    async fn insert(&self, record: &RetiredRecord) -> Result<(), ScoreboardError>;
    async fn page(&self, start: i64, max_items: i64) -> Result<Vec<ScoreboardRecord>, ScoreboardError>;
}

/// Postgres-backed sink. Table and index are created idempotently on
/// connect, matching the original database manager's bootstrap.
pub struct PgScoreboardSink {
    pool: PgPool,
}

impl PgScoreboardSink {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS retired_players (
                id SERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                score INT NOT NULL,
                play_time REAL NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_score_play_time
                ON retired_players (score DESC, play_time ASC, name ASC)",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl ScoreboardSink for PgScoreboardSink {
    async fn insert(&self, record: &RetiredRecord) -> Result<(), ScoreboardError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ScoreboardError::Database(e.to_string()))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(|e| ScoreboardError::Database(e.to_string()))?;

        sqlx::query("INSERT INTO retired_players (name, score, play_time) VALUES ($1, $2, $3)")
            .bind(&record.name)
            .bind(record.score as i32)
            .bind(record.play_time as f32)
            .execute(&mut *tx)
            .await
            .map_err(|e| ScoreboardError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| ScoreboardError::Database(e.to_string()))?;

        Ok(())
    }

    async fn page(&self, start: i64, max_items: i64) -> Result<Vec<ScoreboardRecord>, ScoreboardError> {
        let rows: Vec<(String, i32, f32)> = sqlx::query_as(
            "SELECT name, score, play_time FROM retired_players
             ORDER BY score DESC, play_time ASC, name ASC
             LIMIT $1 OFFSET $2",
        )
        .bind(max_items)
        .bind(start)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ScoreboardError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(name, score, play_time)| ScoreboardRecord {
                name,
                score: score as i64,
                play_time: play_time as f64,
            })
            .collect())
    }
}

/// In-memory test double, mirroring the shape of the teacher's
/// `InMemoryPersistenceSink`.
#[derive(Default)]
pub struct InMemoryScoreboardSink {
    records: std::sync::Mutex<Vec<ScoreboardRecord>>,
}

impl InMemoryScoreboardSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ScoreboardSink for InMemoryScoreboardSink {
    async fn insert(&self, record: &RetiredRecord) -> Result<(), ScoreboardError> {
        self.records.lock().unwrap().push(ScoreboardRecord {
            name: record.name.clone(),
            score: record.score,
            play_time: record.play_time,
        });
        Ok(())
    }

    async fn page(&self, start: i64, max_items: i64) -> Result<Vec<ScoreboardRecord>, ScoreboardError> {
        let mut all = self.records.lock().unwrap().clone();
        all.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.play_time.partial_cmp(&b.play_time).unwrap())
                .then(a.name.cmp(&b.name))
        });
        let start = start.max(0) as usize;
        let max_items = max_items.max(0) as usize;
        Ok(all.into_iter().skip(start).take(max_items).collect())
    }
}
