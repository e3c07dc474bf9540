//! Integration tests for graphkb
//!
//! These tests verify that ingestion, storage and querying work together.

use graphkb_core::{Asset, RelationType};
use graphkb_ingest::{EventBus, FileStore, GraphStore, GraphUpdater, SchemaPersistor, Transaction};
use graphkb_query::*;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

fn graphkb(workdir: &Path, data_dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_graphkb"))
        .args(args)
        .current_dir(workdir)
        .env("GRAPHKB_DATA_DIR", data_dir)
        .output()
        .expect("Failed to execute graphkb")
}

/// A source publishes twice through the event bus; the second cycle only
/// carries what changed.
#[tokio::test]
async fn test_two_publish_cycles() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let updater = Arc::new(GraphUpdater::new(store.clone(), store.clone()));
    let (bus, receiver) = EventBus::channel(8);
    let listener = updater.listen(receiver);
    let linked = RelationType::new("ip", "linked", "ip");

    let mut tx = Transaction::new("source1", None);
    tx.relate("127.0.0.1", &linked, "192.168.0.1");
    let (first, snapshot) = tx.commit();
    bus.publish(first).await.unwrap();

    let mut tx = Transaction::new("source1", Some(snapshot));
    tx.relate("127.0.0.1", &linked, "192.168.0.1");
    tx.relate("10.0.0.1", &linked, "127.0.0.1");
    let (second, _) = tx.commit();
    assert_eq!(second.updates.asset_upserts, vec![Asset::new("ip", "10.0.0.1")]);
    assert_eq!(second.updates.relation_upserts.len(), 1);
    assert!(second.updates.asset_removals.is_empty());
    assert!(second.updates.relation_removals.is_empty());
    bus.publish(second).await.unwrap();

    drop(bus);
    assert_eq!(listener.await.unwrap(), 2);

    let reopened = FileStore::open(dir.path()).unwrap();
    assert_eq!(reopened.count_assets().await.unwrap(), 3);
    assert_eq!(reopened.count_relations().await.unwrap(), 2);
    let schema = reopened.load_schema("source1").await.unwrap().unwrap();
    assert_eq!(schema.relation_types().count(), 1);
}

/// A query that cannot be parsed is recorded as failed and never yields rows.
#[tokio::test]
async fn test_failed_parse_is_historized() {
    struct NoExecutor;

    #[async_trait::async_trait]
    impl QueryExecutor for NoExecutor {
        async fn query(&self, _translation: &SqlTranslation) -> Result<GraphQueryResult, QueryError> {
            panic!("executor must not be reached");
        }
    }

    let history = Arc::new(MemoryHistorizer::new());
    let querier = Querier::new(
        Arc::new(JsonQueryParser),
        Arc::new(SqlTranslator::new()),
        Arc::new(NoExecutor),
        history.clone(),
    );

    let err = querier.query("MATCH (n) RETURN n").await.unwrap_err();
    assert!(matches!(err, QueryError::Parse(_)));

    let entries = history.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].query, "MATCH (n) RETURN n");
    assert_eq!(entries[0].status, QueryStatus::Failure);
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    let output = graphkb(dir.path(), &dir.path().join("data"), &["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("graphkb v"));
}

#[test]
fn test_cli_publish_count_read() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let file = dir.path().join("source1.yml");
    std::fs::write(
        &file,
        "relations:\n  - { from: 127.0.0.1, from_type: ip, type: linked, to: 192.168.0.1, to_type: ip }\n",
    )
    .unwrap();

    let output = graphkb(dir.path(), &data_dir, &["publish", "source1", file.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = graphkb(dir.path(), &data_dir, &["count"]);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "2 assets, 1 relations");

    let output = graphkb(dir.path(), &data_dir, &["read", "source1"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ip:127.0.0.1"));
    assert!(stdout.contains("(ip:127.0.0.1)-[linked]->(ip:192.168.0.1)"));

    let output = graphkb(dir.path(), &data_dir, &["flush"]);
    assert!(output.status.success());
    let output = graphkb(dir.path(), &data_dir, &["count"]);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0 assets, 0 relations");
}

#[test]
fn test_cli_translate() {
    let dir = TempDir::new().unwrap();
    let query = CypherQuery {
        match_clauses: vec![MatchClause {
            patterns: vec![PatternPart::node(NodePattern::named("n").with_labels(&["ip"]))],
            where_clause: None,
        }],
        returns: vec![ReturnItem::property("n", "key")],
        ..CypherQuery::default()
    };
    let file = dir.path().join("query.json");
    std::fs::write(&file, serde_json::to_string(&query).unwrap()).unwrap();

    let output = graphkb(dir.path(), &dir.path().join("data"), &["translate", file.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("SELECT a0.value FROM assets a0 WHERE a0.type IN ('ip')"));
}

#[test]
fn test_cli_query() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let source = dir.path().join("source1.yml");
    std::fs::write(
        &source,
        "relations:\n  - { from: 127.0.0.1, from_type: ip, type: linked, to: 192.168.0.1, to_type: ip }\n  - { from: 127.0.0.1, from_type: ip, type: linked, to: 10.0.0.1, to_type: ip }\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("graphkb.yml"), "query_timeout_secs: 5\n").unwrap();
    let output = graphkb(dir.path(), &data_dir, &["publish", "source1", source.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let query = CypherQuery {
        match_clauses: vec![MatchClause {
            patterns: vec![PatternPart::node(NodePattern::named("a").with_labels(&["ip"])).link(
                RelationshipPattern::right().with_labels(&["linked"]),
                NodePattern::named("b"),
            )],
            where_clause: Some(Expression::compare(
                Operand::property("b", "key"),
                ComparisonOperator::StartsWith,
                Operand::string("192.168"),
            )),
        }],
        returns: vec![ReturnItem::property("a", "key").alias("from"), ReturnItem::variable("b")],
        ..CypherQuery::default()
    };
    let file = dir.path().join("query.json");
    std::fs::write(&file, serde_json::to_string(&query).unwrap()).unwrap();

    let output = graphkb(dir.path(), &data_dir, &["query", file.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let rows: Vec<serde_json::Value> = stdout.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["from"], "127.0.0.1");
    assert_eq!(rows[0]["b"]["key"], "192.168.0.1");
    assert_eq!(rows[0]["b"]["type"], "ip");

    std::fs::write(&file, "{\"match_clauses\": 3}").unwrap();
    let output = graphkb(dir.path(), &data_dir, &["query", file.to_str().unwrap()]);
    assert!(!output.status.success());
}
