//! CLI command implementations

use crate::config::Config;
use crate::sqlite::SqliteExecutor;
use graphkb_core::{Graph, generate_graph_updates_bulk};
use graphkb_ingest::{DataSourceFile, EventBus, FileStore, GraphStore, GraphUpdater, Transaction};
use graphkb_query::{
    ExpressionType, JsonQueryParser, MemoryHistorizer, Projection, Querier, QueryParser, QueryTranslator, Row,
    SqlTranslator, collect_rows,
};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

fn open_store(config: &Config) -> anyhow::Result<Arc<FileStore>> {
    Ok(Arc::new(FileStore::open(&config.data_dir)?))
}

pub async fn count(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let assets = store.count_assets().await?;
    let relations = store.count_relations().await?;
    println!("{} assets, {} relations", assets, relations);
    Ok(())
}

pub async fn flush(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    store.flush_all().await?;
    tracing::info!("Store flushed");
    Ok(())
}

pub async fn read(config: &Config, source: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let Some(graph) = store.read_graph(source).await? else {
        anyhow::bail!("Unknown source {}", source);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
    } else {
        print_graph(&graph);
    }
    Ok(())
}

fn print_graph(graph: &Graph) {
    let mut assets: Vec<_> = graph.assets().collect();
    assets.sort();
    for asset in assets {
        println!("{}", asset);
    }
    let mut relations: Vec<_> = graph.relations().collect();
    relations.sort();
    for relation in relations {
        println!("{}", relation);
    }
}

/// Diff the file against the stored graph of the source and apply the
/// result through the event bus.
pub async fn publish(config: &Config, source: &str, file: &Path) -> anyhow::Result<()> {
    let data = DataSourceFile::load(file)?;
    let store = open_store(config)?;

    let previous = store.read_graph(source).await?;
    let mut transaction = Transaction::new(source, previous);
    data.apply(&mut transaction);
    let (event, _) = transaction.commit();
    let changes = event.updates.len();

    let updater = Arc::new(GraphUpdater::new(store.clone(), store.clone()));
    let (bus, receiver) = EventBus::channel(config.event_bus_capacity);
    let listener = updater.listen(receiver);
    bus.publish(event).await?;
    drop(bus);

    if listener.await? != 1 {
        anyhow::bail!("Updates of source {} were not applied", source);
    }
    println!("{}: {} changes applied", source, changes);
    Ok(())
}

pub fn diff(old: &Path, new: &Path) -> anyhow::Result<()> {
    let old = DataSourceFile::load(old)?.to_graph();
    let new = DataSourceFile::load(new)?.to_graph();
    let bulk = generate_graph_updates_bulk(Some(&old), Some(&new));
    println!("{}", serde_json::to_string_pretty(&bulk)?);
    Ok(())
}

pub fn translate(query: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(query)?;
    let parsed = JsonQueryParser.parse(&text)?;
    let translation = SqlTranslator::new().translate(&parsed)?;
    println!("{}", translation.query);
    for projection in &translation.projections {
        println!("-- {}: {:?}", projection.alias, projection.expression_type);
    }
    Ok(())
}

/// Run a JSON query over every stored source and print one JSON object per
/// row, keyed by projection alias.
pub async fn query(config: &Config, file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)?;
    let store = open_store(config)?;
    let mut graphs = Vec::new();
    for source in store.sources().await? {
        if let Some(graph) = store.read_graph(&source).await? {
            graphs.push(graph);
        }
    }
    let executor = SqliteExecutor::load(&graphs)?;

    let history = Arc::new(MemoryHistorizer::new());
    let mut querier = Querier::new(
        Arc::new(JsonQueryParser),
        Arc::new(SqlTranslator::new()),
        Arc::new(executor),
        history.clone(),
    );
    if let Some(timeout) = config.query_timeout() {
        querier = querier.with_timeout(timeout);
    }

    let mut result = querier.query(&text).await?;
    let rows = collect_rows(result.cursor.as_mut()).await?;
    for row in &rows {
        println!("{}", serde_json::to_string(&shape_row(&result.projections, row)?)?);
    }
    tracing::debug!(
        "{} rows in {:?}, {} queries recorded",
        rows.len(),
        result.statistics.total(),
        history.entries().await.len()
    );
    Ok(())
}

/// Group the flat columns of a row by projection.
fn shape_row(projections: &[Projection], row: &Row) -> anyhow::Result<Map<String, Value>> {
    let mut values = row.iter().cloned();
    let mut take = |name: &str| {
        values
            .next()
            .ok_or_else(|| anyhow::anyhow!("Row is missing column {}", name))
    };

    let mut shaped = Map::new();
    for projection in projections {
        let value = match projection.expression_type {
            ExpressionType::Property => take(projection.alias.as_str())?,
            ExpressionType::Node => {
                let mut node = Map::new();
                for field in ["id", "key", "type"] {
                    node.insert(field.to_string(), take(projection.alias.as_str())?);
                }
                Value::Object(node)
            }
            ExpressionType::Relation => {
                let mut relation = Map::new();
                for field in ["id", "from_id", "to_id", "type"] {
                    relation.insert(field.to_string(), take(projection.alias.as_str())?);
                }
                Value::Object(relation)
            }
        };
        shaped.insert(projection.alias.clone(), value);
    }
    Ok(shaped)
}
