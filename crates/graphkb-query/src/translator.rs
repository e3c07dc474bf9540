//! Translate query graphs into SQL over the assets/relations tables

use crate::ast::{ComparisonOperator, CypherQuery, Literal};
use crate::builder::{BuiltQuery, ProjectionTarget, QueryGraphBuilder};
use crate::constraint::{Constraint, ElementRef, ResolvedOperand};
use crate::error::QueryError;
use crate::query_graph::{QueryNode, QueryRelation, RelationDirection};
use crate::scope::{PatternContext, Scope, ScopeSet};
use serde::{Deserialize, Serialize};

/// Kind of value a result column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionType {
    Node,
    Relation,
    Property,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub alias: String,
    pub expression_type: ExpressionType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlTranslation {
    pub query: String,
    pub projections: Vec<Projection>,
}

pub trait QueryTranslator: Send + Sync {
    fn translate(&self, query: &CypherQuery) -> Result<SqlTranslation, QueryError>;
}

/// String literal rules of the target database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlDialect {
    /// SQLite and standard SQL: only `'` is special inside a literal.
    #[default]
    Sqlite,
    /// MySQL and MariaDB: `\` also escapes inside a literal.
    MySql,
}

impl SqlDialect {
    pub fn quote(self, value: &str) -> String {
        match self {
            SqlDialect::Sqlite => format!("'{}'", value.replace('\'', "''")),
            SqlDialect::MySql => format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''")),
        }
    }

    /// `LIMIT` value meaning no limit, for queries that only skip rows.
    fn unbounded_limit(self) -> &'static str {
        match self {
            SqlDialect::Sqlite => "-1",
            SqlDialect::MySql => "18446744073709551615",
        }
    }
}

/// Renders queries against two tables:
/// `assets(id, value, type)` and `relations(id, from_id, to_id, type)`.
///
/// Every `LIKE` carries an explicit `ESCAPE` clause so wildcards in the
/// matched text stay literal whatever the dialect.
#[derive(Debug, Clone)]
pub struct SqlTranslator {
    assets_table: String,
    relations_table: String,
    dialect: SqlDialect,
}

impl Default for SqlTranslator {
    fn default() -> Self {
        SqlTranslator::with_tables("assets", "relations")
    }
}

fn node_alias(index: usize) -> String {
    format!("a{}", index)
}

fn relation_alias(index: usize) -> String {
    format!("r{}", index)
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn is_outer(scopes: &ScopeSet) -> bool {
    scopes.has_context(PatternContext::Match)
}

impl SqlTranslator {
    pub fn new() -> Self {
        SqlTranslator::default()
    }

    pub fn with_tables(assets_table: &str, relations_table: &str) -> Self {
        SqlTranslator {
            assets_table: assets_table.to_string(),
            relations_table: relations_table.to_string(),
            dialect: SqlDialect::default(),
        }
    }

    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    fn quote(&self, value: &str) -> String {
        self.dialect.quote(value)
    }

    fn render_literal(&self, literal: &Literal) -> String {
        match literal {
            Literal::Null => "NULL".to_string(),
            Literal::Boolean(true) => "TRUE".to_string(),
            Literal::Boolean(false) => "FALSE".to_string(),
            Literal::Integer(value) => value.to_string(),
            Literal::String(value) => self.quote(value),
        }
    }

    fn labels_condition(&self, column: &str, labels: &[String]) -> String {
        let quoted: Vec<String> = labels.iter().map(|l| self.quote(l)).collect();
        format!("{} IN ({})", column, quoted.join(", "))
    }

    /// Render an already built query graph.
    pub fn render(&self, built: &BuiltQuery) -> Result<SqlTranslation, QueryError> {
        if built.projections.is_empty() {
            return Err(QueryError::Translation("query returns nothing".to_string()));
        }

        let graph = &built.graph;
        let nodes: Vec<&QueryNode> = graph.nodes().iter().filter(|n| is_outer(&n.scopes)).collect();
        let relations: Vec<&QueryRelation> = graph
            .relations()
            .iter()
            .filter(|r| is_outer(&r.scopes))
            .collect();
        if nodes.is_empty() {
            return Err(QueryError::Translation("query matches no node".to_string()));
        }

        let mut columns = Vec::new();
        let mut projections = Vec::new();
        for item in &built.projections {
            let (column, expression_type) = match &item.target {
                ProjectionTarget::Node(index) => {
                    self.ensure_outer(built, ElementRef::Node(*index))?;
                    let alias = node_alias(*index);
                    (
                        format!("{a}.id, {a}.value, {a}.type", a = alias),
                        ExpressionType::Node,
                    )
                }
                ProjectionTarget::Relation(index) => {
                    self.ensure_outer(built, ElementRef::Relation(*index))?;
                    let alias = relation_alias(*index);
                    (
                        format!("{r}.id, {r}.from_id, {r}.to_id, {r}.type", r = alias),
                        ExpressionType::Relation,
                    )
                }
                ProjectionTarget::Property { element, key } => {
                    self.ensure_outer(built, *element)?;
                    (self.column(*element, key)?, ExpressionType::Property)
                }
            };
            columns.push(column);
            projections.push(Projection {
                alias: item.alias.clone(),
                expression_type,
            });
        }

        let mut tables = Vec::new();
        let mut conditions = Vec::new();
        for node in &nodes {
            tables.push(format!("{} {}", self.assets_table, node_alias(node.id)));
            self.node_conditions(node, built, &mut conditions)?;
        }
        for relation in &relations {
            tables.push(format!("{} {}", self.relations_table, relation_alias(relation.id)));
            self.relation_conditions(relation, built, &mut conditions)?;
        }
        for constraint in &built.constraints {
            conditions.push(self.render_constraint(constraint, built)?);
        }

        let mut query = String::from("SELECT ");
        if built.distinct {
            query.push_str("DISTINCT ");
        }
        query.push_str(&columns.join(", "));
        query.push_str(" FROM ");
        query.push_str(&tables.join(", "));
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        match (built.limit, built.skip) {
            (Some(limit), _) => query.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(_)) => query.push_str(&format!(" LIMIT {}", self.dialect.unbounded_limit())),
            (None, None) => {}
        }
        if let Some(skip) = built.skip {
            query.push_str(&format!(" OFFSET {}", skip));
        }

        tracing::debug!("Translated query: {}", query);
        Ok(SqlTranslation { query, projections })
    }

    fn ensure_outer(&self, built: &BuiltQuery, element: ElementRef) -> Result<(), QueryError> {
        let (outer, alias) = match element {
            ElementRef::Node(index) => (is_outer(&built.graph.node(index)?.scopes), node_alias(index)),
            ElementRef::Relation(index) => (
                is_outer(&built.graph.relation(index)?.scopes),
                relation_alias(index),
            ),
        };
        if outer {
            Ok(())
        } else {
            Err(QueryError::Translation(format!(
                "{} is only bound inside a pattern predicate",
                alias
            )))
        }
    }

    fn column(&self, element: ElementRef, key: &str) -> Result<String, QueryError> {
        match (element, key) {
            (ElementRef::Node(index), "key" | "value") => Ok(format!("{}.value", node_alias(index))),
            (ElementRef::Node(index), "type" | "id") => Ok(format!("{}.{}", node_alias(index), key)),
            (ElementRef::Relation(index), "type" | "id") => {
                Ok(format!("{}.{}", relation_alias(index), key))
            }
            (ElementRef::Node(_), _) => Err(QueryError::Translation(format!(
                "unknown asset property '{}'",
                key
            ))),
            (ElementRef::Relation(_), _) => Err(QueryError::Translation(format!(
                "unknown relation property '{}'",
                key
            ))),
        }
    }

    fn node_conditions(
        &self,
        node: &QueryNode,
        built: &BuiltQuery,
        conditions: &mut Vec<String>,
    ) -> Result<(), QueryError> {
        let alias = node_alias(node.id);
        if let Some(labels) = node.labels.as_deref().filter(|l| !l.is_empty()) {
            conditions.push(self.labels_condition(&format!("{}.type", alias), labels));
        }
        for constraint in &node.constraints {
            conditions.push(self.render_constraint(constraint, built)?);
        }
        Ok(())
    }

    fn relation_conditions(
        &self,
        relation: &QueryRelation,
        built: &BuiltQuery,
        conditions: &mut Vec<String>,
    ) -> Result<(), QueryError> {
        let r = relation_alias(relation.id);
        if !relation.labels.is_empty() {
            conditions.push(self.labels_condition(&format!("{}.type", r), &relation.labels));
        }

        let left = node_alias(relation.left_idx);
        let right = node_alias(relation.right_idx);
        let forward = format!("{r}.from_id = {l}.id AND {r}.to_id = {rt}.id", r = r, l = left, rt = right);
        let backward = format!("{r}.from_id = {rt}.id AND {r}.to_id = {l}.id", r = r, l = left, rt = right);
        let endpoints = match relation.direction {
            RelationDirection::Right => forward,
            RelationDirection::Left => backward,
            RelationDirection::Either => format!("(({}) OR ({}))", forward, backward),
            // The matched row is the forward one; a row of the same type must link back.
            RelationDirection::Both => format!(
                "{forward} AND EXISTS (SELECT 1 FROM {table} {r}b WHERE {r}b.from_id = {rt}.id AND {r}b.to_id = {l}.id AND {r}b.type = {r}.type)",
                forward = forward,
                table = self.relations_table,
                r = r,
                l = left,
                rt = right
            ),
        };
        conditions.push(endpoints);

        for constraint in &relation.constraints {
            conditions.push(self.render_constraint(constraint, built)?);
        }
        Ok(())
    }

    fn render_operand(&self, operand: &ResolvedOperand) -> Result<String, QueryError> {
        match operand {
            ResolvedOperand::Property { element, key } => self.column(*element, key),
            ResolvedOperand::Literal(literal) => Ok(self.render_literal(literal)),
        }
    }

    fn render_constraint(&self, constraint: &Constraint, built: &BuiltQuery) -> Result<String, QueryError> {
        match constraint {
            Constraint::Comparison {
                left,
                operator,
                right,
            } => self.render_comparison(left, *operator, right),
            Constraint::And(operands) if operands.is_empty() => Ok("1 = 1".to_string()),
            Constraint::Or(operands) if operands.is_empty() => Ok("1 = 0".to_string()),
            Constraint::And(operands) => {
                let parts = self.render_all(operands, built)?;
                Ok(format!("({})", parts.join(" AND ")))
            }
            Constraint::Or(operands) => {
                let parts = self.render_all(operands, built)?;
                Ok(format!("({})", parts.join(" OR ")))
            }
            Constraint::Not(operand) => Ok(format!("NOT ({})", self.render_constraint(operand, built)?)),
            Constraint::Exists(scope) => self.render_exists(scope, built),
        }
    }

    fn render_all(&self, constraints: &[Constraint], built: &BuiltQuery) -> Result<Vec<String>, QueryError> {
        constraints
            .iter()
            .map(|c| self.render_constraint(c, built))
            .collect()
    }

    fn render_comparison(
        &self,
        left: &ResolvedOperand,
        operator: ComparisonOperator,
        right: &ResolvedOperand,
    ) -> Result<String, QueryError> {
        let null = ResolvedOperand::Literal(Literal::Null);
        let lhs = self.render_operand(left)?;
        match operator {
            ComparisonOperator::Eq | ComparisonOperator::Ne if *right == null || *left == null => {
                let operand = if *right == null { lhs } else { self.render_operand(right)? };
                let test = if operator == ComparisonOperator::Eq { "IS NULL" } else { "IS NOT NULL" };
                Ok(format!("{} {}", operand, test))
            }
            ComparisonOperator::StartsWith | ComparisonOperator::EndsWith | ComparisonOperator::Contains => {
                let ResolvedOperand::Literal(Literal::String(value)) = right else {
                    return Err(QueryError::Translation(
                        "string matching needs a string literal on the right".to_string(),
                    ));
                };
                let value = escape_like(value);
                let pattern = match operator {
                    ComparisonOperator::StartsWith => format!("{}%", value),
                    ComparisonOperator::EndsWith => format!("%{}", value),
                    _ => format!("%{}%", value),
                };
                Ok(format!("{} LIKE {} ESCAPE {}", lhs, self.quote(&pattern), self.quote("\\")))
            }
            _ => {
                let symbol = match operator {
                    ComparisonOperator::Eq => "=",
                    ComparisonOperator::Ne => "<>",
                    ComparisonOperator::Lt => "<",
                    ComparisonOperator::Le => "<=",
                    ComparisonOperator::Gt => ">",
                    _ => ">=",
                };
                Ok(format!("{} {} {}", lhs, symbol, self.render_operand(right)?))
            }
        }
    }

    /// Correlated subquery over the elements a WHERE pattern introduced.
    fn render_exists(&self, scope: &Scope, built: &BuiltQuery) -> Result<String, QueryError> {
        let graph = &built.graph;
        let nodes: Vec<&QueryNode> = graph
            .nodes()
            .iter()
            .filter(|n| n.scopes.contains(scope) && !is_outer(&n.scopes))
            .collect();
        let relations: Vec<&QueryRelation> = graph
            .relations()
            .iter()
            .filter(|r| r.scopes.contains(scope) && !is_outer(&r.scopes))
            .collect();
        if nodes.is_empty() && relations.is_empty() {
            return Ok("1 = 1".to_string());
        }

        let mut tables = Vec::new();
        let mut conditions = Vec::new();
        for node in &nodes {
            tables.push(format!("{} {}", self.assets_table, node_alias(node.id)));
            self.node_conditions(node, built, &mut conditions)?;
        }
        for relation in &relations {
            tables.push(format!("{} {}", self.relations_table, relation_alias(relation.id)));
            self.relation_conditions(relation, built, &mut conditions)?;
        }

        let mut sql = format!("EXISTS (SELECT 1 FROM {}", tables.join(", "));
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push(')');
        Ok(sql)
    }
}

impl QueryTranslator for SqlTranslator {
    fn translate(&self, query: &CypherQuery) -> Result<SqlTranslation, QueryError> {
        let built = QueryGraphBuilder::build(query)?;
        self.render(&built)
    }
}
