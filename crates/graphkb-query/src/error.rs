//! Query error types

use crate::history::HistoryError;
use crate::variables::VariableType;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while building a query graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryGraphError {
    #[error("variable '{name}' is assigned to a different type ({found})")]
    TypeMismatch { name: String, found: VariableType },
    #[error("variable '{0}' already defined with different labels")]
    LabelMismatch(String),
    #[error("cannot push relation bound to unexisting node {0}")]
    UnknownNode(usize),
    #[error("invalid node index {0}")]
    InvalidNodeIndex(usize),
    #[error("invalid relation index {0}")]
    InvalidRelationIndex(usize),
    #[error("repeated alias {0}")]
    RepeatedAlias(String),
    #[error("unable to find variable {0}")]
    UnknownVariable(String),
}

/// Errors surfaced by the query pipeline.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Graph(#[from] QueryGraphError),
    #[error("translation error: {0}")]
    Translation(String),
    #[error("execution error: {0}")]
    Execution(String),
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
    #[error("unable to save query history: {0}")]
    History(#[source] HistoryError),
}
