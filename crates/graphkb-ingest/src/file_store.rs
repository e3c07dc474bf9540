//! Graph store persisted to a directory of snapshots

use crate::memory::MemoryStore;
use crate::store::{GraphStore, SchemaPersistor, StoreError};
use graphkb_core::{
    Asset, Graph, Relation, SchemaGraph, clear_snapshots, list_snapshots, load_snapshot, save_snapshot,
    validate_source_name,
};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const SCHEMA_SUFFIX: &str = ".schema.json";

/// A [`MemoryStore`] whose content is written to `dir` after every change:
/// one bincode snapshot per source graph and one JSON file per schema.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    memory: MemoryStore,
    writes: Mutex<()>,
}

fn schema_path(dir: &Path, source: &str) -> PathBuf {
    dir.join(format!("{}{}", source, SCHEMA_SUFFIX))
}

fn schema_sources(dir: &Path) -> Result<Vec<String>, StoreError> {
    let mut sources = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name();
        if let Some(source) = name.to_str().and_then(|n| n.strip_suffix(SCHEMA_SUFFIX)) {
            sources.push(source.to_string());
        }
    }
    Ok(sources)
}

impl FileStore {
    /// Open the store, loading every snapshot and schema already in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let memory = MemoryStore::new();
        for source in list_snapshots(&dir)? {
            if let Some(graph) = load_snapshot(&dir, &source)? {
                memory.put_graph(&source, graph);
            }
        }
        for source in schema_sources(&dir)? {
            let text = std::fs::read_to_string(schema_path(&dir, &source))?;
            memory.put_schema(&source, serde_json::from_str(&text)?);
        }

        tracing::info!(
            "Opened file store at {} with {} sources",
            dir.display(),
            memory.source_names().len()
        );
        Ok(FileStore {
            dir,
            memory,
            writes: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Apply `f` to a copy of the source graph. Memory only takes the copy
    /// once its snapshot is on disk.
    async fn commit(&self, source: &str, create: bool, f: impl FnOnce(&mut Graph)) -> Result<(), StoreError> {
        validate_source_name(source)?;
        let _guard = self.writes.lock().await;
        let mut graph = match self.memory.graph(source) {
            Some(graph) => graph,
            None if create => Graph::new(),
            None => return Ok(()),
        };
        f(&mut graph);

        let dir = self.dir.clone();
        let name = source.to_string();
        let graph = blocking(move || {
            save_snapshot(&graph, &dir, &name)?;
            Ok(graph)
        })
        .await?;
        self.memory.put_graph(source, graph);
        Ok(())
    }
}

/// Run filesystem work on the blocking pool.
async fn blocking<T: Send + 'static>(
    f: impl FnOnce() -> Result<T, StoreError> + Send + 'static,
) -> Result<T, StoreError> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
}

#[async_trait::async_trait]
impl GraphStore for FileStore {
    async fn insert_assets(&self, source: &str, assets: &[Asset]) -> Result<(), StoreError> {
        self.commit(source, true, |graph| {
            for asset in assets {
                graph.insert_asset(asset.clone());
            }
        })
        .await
    }

    async fn remove_assets(&self, source: &str, assets: &[Asset]) -> Result<(), StoreError> {
        self.commit(source, false, |graph| {
            for asset in assets {
                graph.remove_asset(asset);
            }
        })
        .await
    }

    async fn insert_relations(&self, source: &str, relations: &[Relation]) -> Result<(), StoreError> {
        self.commit(source, true, |graph| {
            for relation in relations {
                graph.insert_relation(relation.clone());
            }
        })
        .await
    }

    async fn remove_relations(&self, source: &str, relations: &[Relation]) -> Result<(), StoreError> {
        self.commit(source, false, |graph| {
            for relation in relations {
                graph.remove_relation(relation);
            }
        })
        .await
    }

    async fn read_graph(&self, source: &str) -> Result<Option<Graph>, StoreError> {
        self.memory.read_graph(source).await
    }

    async fn sources(&self) -> Result<Vec<String>, StoreError> {
        self.memory.sources().await
    }

    async fn count_assets(&self) -> Result<usize, StoreError> {
        self.memory.count_assets().await
    }

    async fn count_relations(&self) -> Result<usize, StoreError> {
        self.memory.count_relations().await
    }

    async fn flush_all(&self) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        let dir = self.dir.clone();
        blocking(move || {
            clear_snapshots(&dir)?;
            for source in schema_sources(&dir)? {
                std::fs::remove_file(schema_path(&dir, &source))?;
            }
            Ok(())
        })
        .await?;
        self.memory.clear();
        tracing::info!("File store at {} flushed", self.dir.display());
        Ok(())
    }
}

#[async_trait::async_trait]
impl SchemaPersistor for FileStore {
    async fn load_schema(&self, source: &str) -> Result<Option<SchemaGraph>, StoreError> {
        self.memory.load_schema(source).await
    }

    async fn save_schema(&self, source: &str, schema: &SchemaGraph) -> Result<(), StoreError> {
        validate_source_name(source)?;
        let text = serde_json::to_string_pretty(schema)?;
        tokio::fs::write(schema_path(&self.dir, source), text).await?;
        self.memory.put_schema(source, schema.clone());
        Ok(())
    }
}
