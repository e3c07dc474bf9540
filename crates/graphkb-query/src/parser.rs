//! Query parser seam

use crate::ast::CypherQuery;
use crate::error::QueryError;

/// Turns query text into a query tree.
pub trait QueryParser: Send + Sync {
    fn parse(&self, query: &str) -> Result<CypherQuery, QueryError>;
}

/// Reads queries already parsed into their JSON tree form.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonQueryParser;

impl QueryParser for JsonQueryParser {
    fn parse(&self, query: &str) -> Result<CypherQuery, QueryError> {
        let parsed: CypherQuery =
            serde_json::from_str(query).map_err(|e| QueryError::Parse(e.to_string()))?;
        if parsed.match_clauses.iter().any(|c| c.patterns.is_empty()) {
            return Err(QueryError::Parse("MATCH clause without pattern".to_string()));
        }
        Ok(parsed)
    }
}
