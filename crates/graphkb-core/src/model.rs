//! Core data structures for the knowledge graph

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type of an asset, e.g. `ip` or `host`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetType(pub String);

impl AssetType {
    pub fn new(asset_type: impl Into<String>) -> Self {
        AssetType(asset_type.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetType {
    fn from(value: &str) -> Self {
        AssetType(value.to_string())
    }
}

impl From<String> for AssetType {
    fn from(value: String) -> Self {
        AssetType(value)
    }
}

/// Type of a relation, e.g. `linked` or `resolves_to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationKeyType(pub String);

impl RelationKeyType {
    pub fn new(relation_type: impl Into<String>) -> Self {
        RelationKeyType(relation_type.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RelationKeyType {
    fn from(value: &str) -> Self {
        RelationKeyType(value.to_string())
    }
}

impl From<String> for RelationKeyType {
    fn from(value: String) -> Self {
        RelationKeyType(value)
    }
}

/// A typed, keyed entity. The `(type, key)` pair is its whole identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub key: String,
}

impl Asset {
    pub fn new(asset_type: impl Into<AssetType>, key: impl Into<String>) -> Self {
        Asset {
            asset_type: asset_type.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.asset_type, self.key)
    }
}

/// A directed, typed edge between two assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relation {
    pub from: Asset,
    #[serde(rename = "type")]
    pub relation_type: RelationKeyType,
    pub to: Asset,
}

impl Relation {
    pub fn new(from: Asset, relation_type: impl Into<RelationKeyType>, to: Asset) -> Self {
        Relation {
            from,
            relation_type: relation_type.into(),
            to,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})-[{}]->({})", self.from, self.relation_type, self.to)
    }
}
