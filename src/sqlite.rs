//! In-memory SQLite copy of the store, queried with translated SQL

use graphkb_core::{Asset, Graph};
use graphkb_query::{GraphQueryResult, QueryError, QueryExecutor, Row, SqlTranslation, VecCursor};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Statement, params};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

const SCHEMA: &str = r#"
CREATE TABLE assets (
    id    INTEGER PRIMARY KEY,
    value TEXT NOT NULL,
    type  TEXT NOT NULL
);
CREATE TABLE relations (
    id      INTEGER PRIMARY KEY,
    from_id INTEGER NOT NULL,
    to_id   INTEGER NOT NULL,
    type    TEXT NOT NULL
);
CREATE INDEX idx_assets_type ON assets(type);
CREATE INDEX idx_relations_from ON relations(from_id);
CREATE INDEX idx_relations_to ON relations(to_id);
"#;

/// Executes queries against the union of the source graphs it was loaded with.
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
}

struct Loader<'a> {
    insert_asset: Statement<'a>,
    insert_relation: Statement<'a>,
    asset_ids: HashMap<Asset, i64>,
}

impl Loader<'_> {
    fn asset_id(&mut self, asset: &Asset) -> rusqlite::Result<i64> {
        if let Some(id) = self.asset_ids.get(asset) {
            return Ok(*id);
        }
        let id = self.asset_ids.len() as i64 + 1;
        self.insert_asset
            .execute(params![id, asset.key, asset.asset_type.as_str()])?;
        self.asset_ids.insert(asset.clone(), id);
        Ok(id)
    }
}

impl SqliteExecutor {
    /// Build the database from `graphs`. Assets and relations published by
    /// several sources are stored once.
    pub fn load<'g>(graphs: impl IntoIterator<Item = &'g Graph>) -> rusqlite::Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        {
            let mut loader = Loader {
                insert_asset: tx.prepare("INSERT INTO assets(id, value, type) VALUES (?1, ?2, ?3)")?,
                insert_relation: tx.prepare("INSERT INTO relations(from_id, to_id, type) VALUES (?1, ?2, ?3)")?,
                asset_ids: HashMap::new(),
            };
            let mut relations = HashSet::new();
            for graph in graphs {
                let mut assets: Vec<&Asset> = graph.assets().collect();
                assets.sort();
                for asset in assets {
                    loader.asset_id(asset)?;
                }
                let mut sorted: Vec<_> = graph.relations().collect();
                sorted.sort();
                for relation in sorted {
                    if !relations.insert(relation.clone()) {
                        continue;
                    }
                    let from = loader.asset_id(&relation.from)?;
                    let to = loader.asset_id(&relation.to)?;
                    loader
                        .insert_relation
                        .execute(params![from, to, relation.relation_type.as_str()])?;
                }
            }
            tracing::debug!(
                "Loaded {} assets and {} relations into SQLite",
                loader.asset_ids.len(),
                relations.len()
            );
        }
        tx.commit()?;

        Ok(SqliteExecutor {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(value) => value.into(),
        ValueRef::Real(value) => serde_json::Number::from_f64(value).map_or(serde_json::Value::Null, Into::into),
        ValueRef::Text(text) | ValueRef::Blob(text) => String::from_utf8_lossy(text).into_owned().into(),
    }
}

fn fetch_rows(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<Row>> {
    let mut statement = conn.prepare(sql)?;
    let width = statement.column_count();
    let mut rows = statement.query([])?;
    let mut fetched = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for index in 0..width {
            values.push(to_json(row.get_ref(index)?));
        }
        fetched.push(values);
    }
    Ok(fetched)
}

#[async_trait::async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn query(&self, translation: &SqlTranslation) -> Result<GraphQueryResult, QueryError> {
        let conn = self.conn.clone();
        let sql = translation.query.clone();
        let rows = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| QueryError::Execution("SQLite connection poisoned".to_string()))?;
            fetch_rows(&conn, &sql).map_err(|e| QueryError::Execution(e.to_string()))
        })
        .await
        .map_err(|e| QueryError::Execution(e.to_string()))??;

        Ok(GraphQueryResult {
            cursor: Box::new(VecCursor::new(rows)),
            projections: translation.projections.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphkb_query::*;
    use serde_json::json;

    fn key_query(operator: ComparisonOperator, value: &str) -> CypherQuery {
        CypherQuery {
            match_clauses: vec![MatchClause {
                patterns: vec![PatternPart::node(NodePattern::named("n"))],
                where_clause: Some(Expression::compare(
                    Operand::property("n", "key"),
                    operator,
                    Operand::string(value),
                )),
            }],
            returns: vec![ReturnItem::property("n", "key")],
            ..CypherQuery::default()
        }
    }

    async fn run(executor: &SqliteExecutor, query: &CypherQuery) -> Vec<Row> {
        let translation = SqlTranslator::new().translate(query).unwrap();
        let mut result = executor.query(&translation).await.unwrap();
        collect_rows(result.cursor.as_mut()).await.unwrap()
    }

    #[tokio::test]
    async fn test_starts_with_literal_percent() {
        let mut graph = Graph::new();
        graph.add_asset("promo", "50%off");
        graph.add_asset("promo", "50\\%x");
        graph.add_asset("promo", "500");
        let executor = SqliteExecutor::load([&graph]).unwrap();

        let rows = run(&executor, &key_query(ComparisonOperator::StartsWith, "50%")).await;
        assert_eq!(rows, vec![vec![json!("50%off")]]);

        let rows = run(&executor, &key_query(ComparisonOperator::EndsWith, "\\%x")).await;
        assert_eq!(rows, vec![vec![json!("50\\%x")]]);
    }

    #[tokio::test]
    async fn test_backslash_quote_stays_one_literal() {
        let mut graph = Graph::new();
        graph.add_asset("host", "web1");
        graph.add_asset("host", "x\\' OR 1=1 -- ");
        let executor = SqliteExecutor::load([&graph]).unwrap();

        let rows = run(&executor, &key_query(ComparisonOperator::Eq, "x\\' OR 1=1 -- ")).await;
        assert_eq!(rows, vec![vec![json!("x\\' OR 1=1 -- ")]]);
    }

    #[tokio::test]
    async fn test_bidirectional_needs_reverse_row() {
        let mut graph = Graph::new();
        let a = graph.add_asset("ip", "10.0.0.1");
        let b = graph.add_asset("ip", "10.0.0.2");
        let c = graph.add_asset("ip", "10.0.0.3");
        graph.add_relation(&a, "linked", &b);
        graph.add_relation(&b, "linked", &a);
        graph.add_relation(&c, "linked", &a);
        graph.add_relation(&a, "resolves_to", &c);
        let executor = SqliteExecutor::load([&graph]).unwrap();

        let pattern = PatternPart::node(NodePattern::named("x")).link(
            RelationshipPattern::new(true, true).with_labels(&["linked"]),
            NodePattern::named("y"),
        );
        let query = CypherQuery {
            match_clauses: vec![MatchClause {
                patterns: vec![pattern],
                where_clause: None,
            }],
            returns: vec![ReturnItem::property("x", "key"), ReturnItem::property("y", "key")],
            ..CypherQuery::default()
        };
        let mut rows = run(&executor, &query).await;
        rows.sort_by_key(|row| row[0].to_string());
        assert_eq!(
            rows,
            vec![
                vec![json!("10.0.0.1"), json!("10.0.0.2")],
                vec![json!("10.0.0.2"), json!("10.0.0.1")],
            ]
        );
    }

    #[tokio::test]
    async fn test_shared_assets_loaded_once() {
        let mut first = Graph::new();
        let a = first.add_asset("ip", "127.0.0.1");
        let b = first.add_asset("ip", "192.168.0.1");
        first.add_relation(&a, "linked", &b);
        let mut second = Graph::new();
        second.add_asset("ip", "127.0.0.1");
        second.add_relation(&a, "linked", &b);
        let executor = SqliteExecutor::load([&first, &second]).unwrap();

        let query = CypherQuery {
            match_clauses: vec![MatchClause {
                patterns: vec![PatternPart::node(NodePattern::named("n"))],
                where_clause: None,
            }],
            returns: vec![ReturnItem::variable("n")],
            skip: Some(1),
            ..CypherQuery::default()
        };
        assert_eq!(run(&executor, &query).await.len(), 1);

        let translation = SqlTranslation {
            query: "SELECT COUNT(*) FROM relations".to_string(),
            projections: Vec::new(),
        };
        let mut result = executor.query(&translation).await.unwrap();
        assert_eq!(collect_rows(result.cursor.as_mut()).await.unwrap(), vec![vec![json!(1)]]);
    }

    #[tokio::test]
    async fn test_invalid_sql_is_execution_error() {
        let graphs: Vec<Graph> = Vec::new();
        let executor = SqliteExecutor::load(&graphs).unwrap();
        let translation = SqlTranslation {
            query: "SELECT nope FROM nowhere".to_string(),
            projections: Vec::new(),
        };
        assert!(matches!(
            executor.query(&translation).await,
            Err(QueryError::Execution(_))
        ));
    }
}
