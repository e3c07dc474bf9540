//! Query history

use crate::error::QueryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHistoryEntry {
    pub query: String,
    pub sql: String,
    pub status: QueryStatus,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
    pub executed_at: DateTime<Utc>,
}

/// Records every query attempt.
#[async_trait::async_trait]
pub trait Historizer: Send + Sync {
    async fn save_successful_query(&self, query: &str, sql: &str, duration_ms: u64) -> Result<(), HistoryError>;

    async fn save_failed_query(&self, query: &str, sql: &str, error: &QueryError) -> Result<(), HistoryError>;
}

/// Keeps the history in memory.
#[derive(Debug, Default)]
pub struct MemoryHistorizer {
    entries: RwLock<Vec<QueryHistoryEntry>>,
}

impl MemoryHistorizer {
    pub fn new() -> Self {
        MemoryHistorizer::default()
    }

    /// Entries in insertion order.
    pub async fn entries(&self) -> Vec<QueryHistoryEntry> {
        self.entries.read().await.clone()
    }

    async fn push(&self, entry: QueryHistoryEntry) {
        self.entries.write().await.push(entry);
    }
}

#[async_trait::async_trait]
impl Historizer for MemoryHistorizer {
    async fn save_successful_query(&self, query: &str, sql: &str, duration_ms: u64) -> Result<(), HistoryError> {
        self.push(QueryHistoryEntry {
            query: query.to_string(),
            sql: sql.to_string(),
            status: QueryStatus::Success,
            duration_ms: Some(duration_ms),
            error: None,
            executed_at: Utc::now(),
        })
        .await;
        Ok(())
    }

    async fn save_failed_query(&self, query: &str, sql: &str, error: &QueryError) -> Result<(), HistoryError> {
        self.push(QueryHistoryEntry {
            query: query.to_string(),
            sql: sql.to_string(),
            status: QueryStatus::Failure,
            duration_ms: None,
            error: Some(error.to_string()),
            executed_at: Utc::now(),
        })
        .await;
        Ok(())
    }
}
