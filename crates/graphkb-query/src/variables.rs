//! Variable table of a query graph

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    Node,
    Relation,
    Property,
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableType::Node => "node",
            VariableType::Relation => "relation",
            VariableType::Property => "property",
        };
        f.write_str(name)
    }
}

/// What a variable name is bound to. Node and relation bindings carry the
/// index of the element in the query graph, property aliases carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableBinding {
    Node(usize),
    Relation(usize),
    Property,
}

impl VariableBinding {
    pub fn variable_type(&self) -> VariableType {
        match self {
            VariableBinding::Node(_) => VariableType::Node,
            VariableBinding::Relation(_) => VariableType::Relation,
            VariableBinding::Property => VariableType::Property,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            VariableBinding::Node(index) | VariableBinding::Relation(index) => Some(*index),
            VariableBinding::Property => None,
        }
    }
}

/// Variable name to binding. A name is bound once and never rebound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariablesIndex {
    variables: HashMap<String, VariableBinding>,
}

impl VariablesIndex {
    pub fn new() -> Self {
        VariablesIndex::default()
    }

    /// Look up a binding by name.
    pub fn get(&self, name: &str) -> Option<VariableBinding> {
        self.variables.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Bind `name`. Returns false, leaving the table untouched, if the name
    /// is already bound.
    pub fn bind(&mut self, name: &str, binding: VariableBinding) -> bool {
        if self.variables.contains_key(name) {
            return false;
        }
        self.variables.insert(name.to_string(), binding);
        true
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, VariableBinding)> {
        self.variables.iter().map(|(name, binding)| (name.as_str(), *binding))
    }
}
