//! Query pipeline for graphkb
//!
//! Turns a parsed pattern-matching query into a typed query graph, translates
//! it to SQL, executes it through a storage executor and records every
//! attempt in the query history.

pub mod ast;
pub mod builder;
pub mod constraint;
pub mod error;
pub mod executor;
pub mod history;
pub mod parser;
pub mod querier;
pub mod query_graph;
pub mod scope;
pub mod translator;
pub mod variables;


pub use ast::*;
pub use builder::{BuiltQuery, ProjectionItem, ProjectionTarget, QueryGraphBuilder};
pub use constraint::{Constraint, ElementRef, ResolvedOperand};
pub use error::{QueryError, QueryGraphError};
pub use executor::{Cursor, GraphQueryResult, QueryExecutor, Row, VecCursor, collect_rows};
pub use history::{HistoryError, Historizer, MemoryHistorizer, QueryHistoryEntry, QueryStatus};
pub use parser::{JsonQueryParser, QueryParser};
pub use querier::{Querier, QuerierResult, Statistics, measure_duration};
pub use query_graph::{QueryGraph, QueryNode, QueryRelation, RelationDirection};
pub use scope::{PatternContext, Scope, ScopeSet};
pub use translator::{ExpressionType, Projection, QueryTranslator, SqlDialect, SqlTranslation, SqlTranslator};
pub use variables::{VariableBinding, VariableType, VariablesIndex};
