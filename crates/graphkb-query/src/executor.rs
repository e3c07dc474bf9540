//! Execution of translated queries

use crate::error::QueryError;
use crate::translator::{Projection, SqlTranslation};
use std::collections::VecDeque;

/// One result row, one value per selected column.
pub type Row = Vec<serde_json::Value>;

/// Forward-only iterator over result rows.
#[async_trait::async_trait]
pub trait Cursor: Send {
    fn has_more(&self) -> bool;

    async fn read(&mut self) -> Result<Row, QueryError>;
}

pub struct GraphQueryResult {
    pub cursor: Box<dyn Cursor>,
    pub projections: Vec<Projection>,
}

#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn query(&self, translation: &SqlTranslation) -> Result<GraphQueryResult, QueryError>;
}

/// Cursor over rows already held in memory.
#[derive(Debug, Default)]
pub struct VecCursor {
    rows: VecDeque<Row>,
}

impl VecCursor {
    pub fn new(rows: Vec<Row>) -> Self {
        VecCursor { rows: rows.into() }
    }
}

#[async_trait::async_trait]
impl Cursor for VecCursor {
    fn has_more(&self) -> bool {
        !self.rows.is_empty()
    }

    async fn read(&mut self) -> Result<Row, QueryError> {
        self.rows
            .pop_front()
            .ok_or_else(|| QueryError::Execution("cursor exhausted".to_string()))
    }
}

/// Drain a cursor.
pub async fn collect_rows(cursor: &mut dyn Cursor) -> Result<Vec<Row>, QueryError> {
    let mut rows = Vec::new();
    while cursor.has_more() {
        rows.push(cursor.read().await?);
    }
    Ok(rows)
}
