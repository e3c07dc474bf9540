//! Build a query graph out of a parsed query

use crate::ast::{CypherQuery, Expression, Operand, PatternPart, ReturnExpression};
use crate::constraint::{Constraint, ElementRef, ResolvedOperand};
use crate::error::QueryGraphError;
use crate::query_graph::QueryGraph;
use crate::scope::Scope;
use crate::variables::{VariableBinding, VariableType};

/// What a RETURN item points at.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionTarget {
    Node(usize),
    Relation(usize),
    Property { element: ElementRef, key: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionItem {
    pub alias: String,
    pub target: ProjectionTarget,
}

/// A query graph plus everything needed to render the final statement.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub graph: QueryGraph,
    /// Filters spanning several elements or holding pattern predicates.
    pub constraints: Vec<Constraint>,
    pub projections: Vec<ProjectionItem>,
    pub distinct: bool,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

pub struct QueryGraphBuilder {
    graph: QueryGraph,
    constraints: Vec<Constraint>,
    where_patterns: usize,
}

impl QueryGraphBuilder {
    fn new() -> Self {
        QueryGraphBuilder {
            graph: QueryGraph::new(),
            constraints: Vec::new(),
            where_patterns: 0,
        }
    }

    /// Walk MATCH patterns, WHERE filters then RETURN items in query order.
    pub fn build(query: &CypherQuery) -> Result<BuiltQuery, QueryGraphError> {
        let mut builder = QueryGraphBuilder::new();

        for (id, clause) in query.match_clauses.iter().enumerate() {
            let scope = Scope::match_clause(id);
            for pattern in &clause.patterns {
                builder.push_pattern(pattern, scope)?;
            }
            if let Some(expression) = &clause.where_clause {
                builder.push_where(expression)?;
            }
        }

        let mut projections = Vec::with_capacity(query.returns.len());
        for item in &query.returns {
            let (default_alias, target) = match &item.expression {
                ReturnExpression::Variable { name } => {
                    let target = match builder.graph.find_variable(name)? {
                        VariableBinding::Node(index) => ProjectionTarget::Node(index),
                        VariableBinding::Relation(index) => ProjectionTarget::Relation(index),
                        VariableBinding::Property => {
                            return Err(QueryGraphError::TypeMismatch {
                                name: name.clone(),
                                found: VariableType::Property,
                            });
                        }
                    };
                    (name.clone(), target)
                }
                ReturnExpression::Property { variable, key } => {
                    let element = builder.resolve_element(variable)?;
                    (
                        format!("{}.{}", variable, key),
                        ProjectionTarget::Property {
                            element,
                            key: key.clone(),
                        },
                    )
                }
            };

            if let Some(alias) = &item.alias {
                builder.graph.push_property(alias)?;
            }
            projections.push(ProjectionItem {
                alias: item.alias.clone().unwrap_or(default_alias),
                target,
            });
        }

        tracing::debug!(
            "Query graph built: {} nodes, {} relations, {} projections",
            builder.graph.nodes().len(),
            builder.graph.relations().len(),
            projections.len()
        );

        Ok(BuiltQuery {
            graph: builder.graph,
            constraints: builder.constraints,
            projections,
            distinct: query.distinct,
            skip: query.skip,
            limit: query.limit,
        })
    }

    fn push_pattern(&mut self, pattern: &PatternPart, scope: Scope) -> Result<(), QueryGraphError> {
        let mut left = self.graph.push_node(&pattern.start, scope)?;
        for link in &pattern.chain {
            let right = self.graph.push_node(&link.node, scope)?;
            self.graph
                .push_relation(&link.relationship, left, right, scope)?;
            left = right;
        }
        Ok(())
    }

    /// Attach each conjunct to the single element it reads, or keep it at
    /// the query level.
    fn push_where(&mut self, expression: &Expression) -> Result<(), QueryGraphError> {
        let constraint = self.resolve(expression)?;
        for conjunct in constraint.into_conjuncts() {
            match conjunct.single_element() {
                Some(ElementRef::Node(index)) => self.graph.add_node_constraint(index, conjunct)?,
                Some(ElementRef::Relation(index)) => {
                    self.graph.add_relation_constraint(index, conjunct)?
                }
                None => self.constraints.push(conjunct),
            }
        }
        Ok(())
    }

    fn resolve(&mut self, expression: &Expression) -> Result<Constraint, QueryGraphError> {
        let constraint = match expression {
            Expression::And { operands } => Constraint::And(self.resolve_all(operands)?),
            Expression::Or { operands } => Constraint::Or(self.resolve_all(operands)?),
            Expression::Not { operand } => Constraint::Not(Box::new(self.resolve(operand)?)),
            Expression::Comparison {
                left,
                operator,
                right,
            } => Constraint::Comparison {
                left: self.resolve_operand(left)?,
                operator: *operator,
                right: self.resolve_operand(right)?,
            },
            Expression::Pattern { pattern } => {
                let scope = Scope::where_clause(self.where_patterns);
                self.where_patterns += 1;
                self.push_pattern(pattern, scope)?;
                Constraint::Exists(scope)
            }
        };
        Ok(constraint)
    }

    fn resolve_all(&mut self, expressions: &[Expression]) -> Result<Vec<Constraint>, QueryGraphError> {
        expressions.iter().map(|e| self.resolve(e)).collect()
    }

    fn resolve_operand(&self, operand: &Operand) -> Result<ResolvedOperand, QueryGraphError> {
        match operand {
            Operand::Property { variable, key } => Ok(ResolvedOperand::Property {
                element: self.resolve_element(variable)?,
                key: key.clone(),
            }),
            Operand::Literal { value } => Ok(ResolvedOperand::Literal(value.clone())),
        }
    }

    fn resolve_element(&self, variable: &str) -> Result<ElementRef, QueryGraphError> {
        match self.graph.find_variable(variable)? {
            VariableBinding::Node(index) => Ok(ElementRef::Node(index)),
            VariableBinding::Relation(index) => Ok(ElementRef::Relation(index)),
            VariableBinding::Property => Err(QueryGraphError::TypeMismatch {
                name: variable.to_string(),
                found: VariableType::Property,
            }),
        }
    }
}
