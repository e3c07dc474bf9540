//! YAML data-source files
//!
//! ```yaml
//! assets:
//!   - { type: ip, key: 127.0.0.1 }
//! relations:
//!   - { from: 127.0.0.1, from_type: ip, type: linked, to: 10.0.0.1, to_type: ip }
//! ```

use crate::transaction::Transaction;
use graphkb_core::{Asset, Graph, GraphBinder, RelationType};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("unable to read data source file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid data source file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A relation described by endpoint keys and types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub from: String,
    pub from_type: String,
    #[serde(rename = "type")]
    pub relation_type: String,
    pub to: String,
    pub to_type: String,
}

impl RelationRecord {
    pub fn relation_type(&self) -> RelationType {
        RelationType::new(
            self.from_type.as_str(),
            self.relation_type.as_str(),
            self.to_type.as_str(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceFile {
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
}

impl DataSourceFile {
    pub fn from_yaml(text: &str) -> Result<Self, DataSourceError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataSourceError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Bind every asset and relation of the file into a transaction.
    pub fn apply(&self, transaction: &mut Transaction) {
        for asset in &self.assets {
            transaction.bind(&asset.key, asset.asset_type.clone());
        }
        for record in &self.relations {
            transaction.relate(&record.from, &record.relation_type(), &record.to);
        }
    }

    /// The graph the file describes.
    pub fn to_graph(&self) -> Graph {
        let mut graph = Graph::new();
        let mut binder = GraphBinder::new(&mut graph);
        for asset in &self.assets {
            binder.bind(&asset.key, asset.asset_type.clone());
        }
        for record in &self.relations {
            binder.relate(&record.from, &record.relation_type(), &record.to);
        }
        graph
    }
}
