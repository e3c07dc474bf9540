//! Typed graph of the nodes and relations a query refers to

use crate::ast::{NodePattern, RelationshipPattern};
use crate::constraint::Constraint;
use crate::error::QueryGraphError;
use crate::scope::{Scope, ScopeSet};
use crate::variables::{VariableBinding, VariablesIndex};
use serde::Serialize;
use std::collections::BTreeSet;

/// Direction a relation pattern is matched in, relative to its left node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelationDirection {
    /// `<--`
    Left,
    /// `-->`
    Right,
    /// `--`
    Either,
    /// `<-->`
    Both,
}

impl RelationDirection {
    pub fn from_arrows(left_arrow: bool, right_arrow: bool) -> Self {
        match (left_arrow, right_arrow) {
            (true, false) => RelationDirection::Left,
            (false, true) => RelationDirection::Right,
            (false, false) => RelationDirection::Either,
            (true, true) => RelationDirection::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryNode {
    pub id: usize,
    pub labels: Option<Vec<String>>,
    pub constraints: Vec<Constraint>,
    pub scopes: ScopeSet,
    pub variable: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRelation {
    pub id: usize,
    pub labels: Vec<String>,
    pub constraints: Vec<Constraint>,
    pub scopes: ScopeSet,
    pub variable: Option<String>,
    pub left_idx: usize,
    pub right_idx: usize,
    pub direction: RelationDirection,
}

/// Nodes and relations are only ever appended so their indices stay valid
/// for the lifetime of the graph.
#[derive(Debug, Clone, Default)]
pub struct QueryGraph {
    nodes: Vec<QueryNode>,
    relations: Vec<QueryRelation>,
    variables: VariablesIndex,
}

fn same_labels(current: &[String], requested: &[String]) -> bool {
    current.iter().collect::<BTreeSet<_>>() == requested.iter().collect::<BTreeSet<_>>()
}

impl QueryGraph {
    pub fn new() -> Self {
        QueryGraph::default()
    }

    /// Resolve a node pattern to an existing node or allocate a new one, and
    /// record `scope` on it. Returns the node index.
    pub fn push_node(&mut self, pattern: &NodePattern, scope: Scope) -> Result<usize, QueryGraphError> {
        if let Some(name) = pattern.variable.as_deref() {
            match self.variables.get(name) {
                Some(VariableBinding::Node(index)) => {
                    let node = &mut self.nodes[index];
                    if let Some(requested) = &pattern.labels {
                        let current = node.labels.as_deref().unwrap_or_default();
                        if !same_labels(current, requested) {
                            return Err(QueryGraphError::LabelMismatch(name.to_string()));
                        }
                    }
                    node.scopes.insert(scope);
                    return Ok(index);
                }
                Some(other) => {
                    return Err(QueryGraphError::TypeMismatch {
                        name: name.to_string(),
                        found: other.variable_type(),
                    });
                }
                None => {}
            }
        }

        let index = self.nodes.len();
        if let Some(name) = pattern.variable.as_deref() {
            self.variables.bind(name, VariableBinding::Node(index));
        }
        self.nodes.push(QueryNode {
            id: index,
            labels: pattern.labels.clone(),
            constraints: Vec::new(),
            scopes: ScopeSet::with(scope),
            variable: pattern.variable.clone(),
        });
        tracing::trace!("Query node {} allocated", index);
        Ok(index)
    }

    /// Resolve a relation pattern between two existing nodes to an existing
    /// relation or allocate a new one. Returns the relation index.
    pub fn push_relation(
        &mut self,
        pattern: &RelationshipPattern,
        left_idx: usize,
        right_idx: usize,
        scope: Scope,
    ) -> Result<usize, QueryGraphError> {
        if let Some(name) = pattern.variable() {
            match self.variables.get(name) {
                Some(VariableBinding::Relation(index)) => {
                    let relation = &mut self.relations[index];
                    let requested = pattern.labels();
                    if !requested.is_empty() && !same_labels(&relation.labels, requested) {
                        return Err(QueryGraphError::LabelMismatch(name.to_string()));
                    }
                    relation.scopes.insert(scope);
                    return Ok(index);
                }
                Some(other) => {
                    return Err(QueryGraphError::TypeMismatch {
                        name: name.to_string(),
                        found: other.variable_type(),
                    });
                }
                None => {}
            }
        }

        for endpoint in [left_idx, right_idx] {
            if endpoint >= self.nodes.len() {
                return Err(QueryGraphError::UnknownNode(endpoint));
            }
        }

        let index = self.relations.len();
        if let Some(name) = pattern.variable() {
            self.variables.bind(name, VariableBinding::Relation(index));
        }
        self.relations.push(QueryRelation {
            id: index,
            labels: pattern.labels().to_vec(),
            constraints: Vec::new(),
            scopes: ScopeSet::with(scope),
            variable: pattern.variable().map(str::to_string),
            left_idx,
            right_idx,
            direction: RelationDirection::from_arrows(pattern.left_arrow, pattern.right_arrow),
        });
        tracing::trace!("Query relation {} allocated ({} -> {})", index, left_idx, right_idx);
        Ok(index)
    }

    /// Bind a projection alias.
    pub fn push_property(&mut self, name: &str) -> Result<(), QueryGraphError> {
        if self.variables.bind(name, VariableBinding::Property) {
            Ok(())
        } else {
            Err(QueryGraphError::RepeatedAlias(name.to_string()))
        }
    }

    pub fn add_node_constraint(&mut self, index: usize, constraint: Constraint) -> Result<(), QueryGraphError> {
        let node = self
            .nodes
            .get_mut(index)
            .ok_or(QueryGraphError::InvalidNodeIndex(index))?;
        node.constraints.push(constraint);
        Ok(())
    }

    pub fn add_relation_constraint(&mut self, index: usize, constraint: Constraint) -> Result<(), QueryGraphError> {
        let relation = self
            .relations
            .get_mut(index)
            .ok_or(QueryGraphError::InvalidRelationIndex(index))?;
        relation.constraints.push(constraint);
        Ok(())
    }

    /// Relations having the node as one of their endpoints.
    pub fn relations_by_node(&self, node_idx: usize) -> impl Iterator<Item = &QueryRelation> {
        self.relations
            .iter()
            .filter(move |r| r.left_idx == node_idx || r.right_idx == node_idx)
    }

    /// Left and right endpoints of a relation.
    pub fn nodes_by_relation(&self, relation: &QueryRelation) -> Result<(&QueryNode, &QueryNode), QueryGraphError> {
        Ok((self.node(relation.left_idx)?, self.node(relation.right_idx)?))
    }

    pub fn find_variable(&self, name: &str) -> Result<VariableBinding, QueryGraphError> {
        self.variables
            .get(name)
            .ok_or_else(|| QueryGraphError::UnknownVariable(name.to_string()))
    }

    pub fn node(&self, index: usize) -> Result<&QueryNode, QueryGraphError> {
        self.nodes
            .get(index)
            .ok_or(QueryGraphError::InvalidNodeIndex(index))
    }

    pub fn relation(&self, index: usize) -> Result<&QueryRelation, QueryGraphError> {
        self.relations
            .get(index)
            .ok_or(QueryGraphError::InvalidRelationIndex(index))
    }

    pub fn nodes(&self) -> &[QueryNode] {
        &self.nodes
    }

    pub fn relations(&self) -> &[QueryRelation] {
        &self.relations
    }

    pub fn variables(&self) -> &VariablesIndex {
        &self.variables
    }
}
