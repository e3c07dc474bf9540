//! On-disk snapshots of source graphs

use crate::graph::Graph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Snapshot file extension.
pub const SNAPSHOT_EXTENSION: &str = "snapshot";

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid source name: {0:?}")]
    InvalidSource(String),
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error("snapshot belongs to source {found}, expected {expected}")]
    SourceMismatch { expected: String, found: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    source: String,
    saved_at: DateTime<Utc>,
    graph: Graph,
}

/// Source names end up in file names, so only `[A-Za-z0-9._-]` is accepted
/// and a leading dot is refused.
pub fn validate_source_name(source: &str) -> Result<(), SnapshotError> {
    let valid = !source.is_empty()
        && !source.starts_with('.')
        && source
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(SnapshotError::InvalidSource(source.to_string()))
    }
}

/// Get the snapshot file path of a source
pub fn snapshot_path(dir: &Path, source: &str) -> PathBuf {
    dir.join(format!("{}.{}", source, SNAPSHOT_EXTENSION))
}

fn ensure_snapshot_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Serialize the graph of a source into `dir`.
pub fn save_snapshot(graph: &Graph, dir: &Path, source: &str) -> Result<(), SnapshotError> {
    validate_source_name(source)?;
    ensure_snapshot_dir(dir)?;

    let file = SnapshotFile {
        version: SNAPSHOT_VERSION,
        source: source.to_string(),
        saved_at: Utc::now(),
        graph: graph.clone(),
    };
    let bytes = bincode::serialize(&file)?;

    // Readers only ever see a complete file.
    let path = snapshot_path(dir, source);
    let tmp = path.with_extension(format!("{}.tmp", SNAPSHOT_EXTENSION));
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, &path)?;

    tracing::debug!(
        "Snapshot of {} saved: {} assets, {} relations",
        source,
        graph.asset_count(),
        graph.relation_count()
    );
    Ok(())
}

/// Load the graph of a source, `None` if it was never saved.
pub fn load_snapshot(dir: &Path, source: &str) -> Result<Option<Graph>, SnapshotError> {
    validate_source_name(source)?;
    let path = snapshot_path(dir, source);
    if !path.exists() {
        return Ok(None);
    }

    let bytes = std::fs::read(&path)?;
    let file: SnapshotFile = bincode::deserialize(&bytes)?;
    if file.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(file.version));
    }
    if file.source != source {
        return Err(SnapshotError::SourceMismatch {
            expected: source.to_string(),
            found: file.source,
        });
    }

    tracing::debug!("Snapshot of {} loaded (saved at {})", source, file.saved_at.to_rfc3339());
    Ok(Some(file.graph))
}

/// Names of every source with a snapshot in `dir`, sorted.
pub fn list_snapshots(dir: &Path) -> Result<Vec<String>, SnapshotError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            sources.push(stem.to_string());
        }
    }
    sources.sort();
    Ok(sources)
}

/// Remove the snapshot of one source.
pub fn remove_snapshot(dir: &Path, source: &str) -> Result<(), SnapshotError> {
    validate_source_name(source)?;
    let path = snapshot_path(dir, source);
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// Remove every snapshot stored in `dir`.
pub fn clear_snapshots(dir: &Path) -> Result<(), SnapshotError> {
    for source in list_snapshots(dir)? {
        remove_snapshot(dir, &source)?;
    }
    Ok(())
}
