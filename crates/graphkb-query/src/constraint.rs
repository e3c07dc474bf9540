//! WHERE expressions resolved against the query graph

use crate::ast::{ComparisonOperator, Literal};
use crate::scope::Scope;

/// Reference to an element of a query graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementRef {
    Node(usize),
    Relation(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedOperand {
    Property { element: ElementRef, key: String },
    Literal(Literal),
}

/// A filter whose variables were all resolved to graph elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Comparison {
        left: ResolvedOperand,
        operator: ComparisonOperator,
        right: ResolvedOperand,
    },
    And(Vec<Constraint>),
    Or(Vec<Constraint>),
    Not(Box<Constraint>),
    /// The elements introduced in this WHERE scope must have a match.
    Exists(Scope),
}

impl Constraint {
    /// Split nested conjunctions into their operands.
    pub fn into_conjuncts(self) -> Vec<Constraint> {
        match self {
            Constraint::And(operands) => operands
                .into_iter()
                .flat_map(Constraint::into_conjuncts)
                .collect(),
            other => vec![other],
        }
    }

    /// The only element this constraint reads, if it reads exactly one and
    /// holds no pattern predicate.
    pub fn single_element(&self) -> Option<ElementRef> {
        let mut elements = Vec::new();
        if !self.collect_elements(&mut elements) {
            return None;
        }
        elements.sort();
        elements.dedup();
        match elements.as_slice() {
            [element] => Some(*element),
            _ => None,
        }
    }

    fn collect_elements(&self, out: &mut Vec<ElementRef>) -> bool {
        match self {
            Constraint::Comparison { left, right, .. } => {
                for operand in [left, right] {
                    if let ResolvedOperand::Property { element, .. } = operand {
                        out.push(*element);
                    }
                }
                true
            }
            Constraint::And(operands) | Constraint::Or(operands) => {
                operands.iter().all(|c| c.collect_elements(out))
            }
            Constraint::Not(operand) => operand.collect_elements(out),
            Constraint::Exists(_) => false,
        }
    }
}
