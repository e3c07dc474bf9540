//! Parsed query tree handed over by the query parser

use serde::{Deserialize, Serialize};

/// A read query: MATCH clauses with optional WHERE filters, then RETURN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CypherQuery {
    #[serde(default)]
    pub match_clauses: Vec<MatchClause>,
    #[serde(default)]
    pub returns: Vec<ReturnItem>,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchClause {
    pub patterns: Vec<PatternPart>,
    #[serde(default, rename = "where")]
    pub where_clause: Option<Expression>,
}

/// `(a)-[r]->(b)-[s]-(c)`: a start node followed by relationship/node links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternPart {
    pub start: NodePattern,
    #[serde(default)]
    pub chain: Vec<PatternLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternLink {
    pub relationship: RelationshipPattern,
    pub node: NodePattern,
}

/// `(n:ip:host)`. `labels` is `None` when the pattern carries no label at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePattern {
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

/// `<-[r:linked]-`, `-->`, `--`, `<-->`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipPattern {
    #[serde(default)]
    pub left_arrow: bool,
    #[serde(default)]
    pub right_arrow: bool,
    #[serde(default)]
    pub detail: Option<RelationshipDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDetail {
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    And { operands: Vec<Expression> },
    Or { operands: Vec<Expression> },
    Not { operand: Box<Expression> },
    Comparison {
        left: Operand,
        operator: ComparisonOperator,
        right: Operand,
    },
    /// A pattern used as a predicate: true when at least one match exists.
    Pattern { pattern: PatternPart },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operand {
    Property { variable: String, key: String },
    Literal { value: Literal },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    StartsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub expression: ReturnExpression,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReturnExpression {
    Variable { name: String },
    Property { variable: String, key: String },
}

impl NodePattern {
    /// Anonymous node without labels: `()`.
    pub fn anonymous() -> Self {
        NodePattern::default()
    }

    /// Named node without labels: `(n)`.
    pub fn named(variable: &str) -> Self {
        NodePattern {
            variable: Some(variable.to_string()),
            labels: None,
        }
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = Some(labels.iter().map(|l| l.to_string()).collect());
        self
    }
}

impl RelationshipPattern {
    pub fn new(left_arrow: bool, right_arrow: bool) -> Self {
        RelationshipPattern {
            left_arrow,
            right_arrow,
            detail: None,
        }
    }

    /// `-->`
    pub fn right() -> Self {
        RelationshipPattern::new(false, true)
    }

    /// `<--`
    pub fn left() -> Self {
        RelationshipPattern::new(true, false)
    }

    /// `--`
    pub fn undirected() -> Self {
        RelationshipPattern::new(false, false)
    }

    pub fn named(mut self, variable: &str) -> Self {
        self.detail
            .get_or_insert_with(RelationshipDetail::default)
            .variable = Some(variable.to_string());
        self
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.detail
            .get_or_insert_with(RelationshipDetail::default)
            .labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn variable(&self) -> Option<&str> {
        self.detail.as_ref().and_then(|d| d.variable.as_deref())
    }

    pub fn labels(&self) -> &[String] {
        self.detail.as_ref().map_or(&[], |d| d.labels.as_slice())
    }
}

impl PatternPart {
    pub fn node(start: NodePattern) -> Self {
        PatternPart {
            start,
            chain: Vec::new(),
        }
    }

    /// Append `relationship` then `node` to the chain.
    pub fn link(mut self, relationship: RelationshipPattern, node: NodePattern) -> Self {
        self.chain.push(PatternLink { relationship, node });
        self
    }
}

impl Operand {
    pub fn property(variable: &str, key: &str) -> Self {
        Operand::Property {
            variable: variable.to_string(),
            key: key.to_string(),
        }
    }

    pub fn string(value: &str) -> Self {
        Operand::Literal {
            value: Literal::String(value.to_string()),
        }
    }
}

impl Expression {
    pub fn compare(left: Operand, operator: ComparisonOperator, right: Operand) -> Self {
        Expression::Comparison {
            left,
            operator,
            right,
        }
    }
}

impl ReturnItem {
    pub fn variable(name: &str) -> Self {
        ReturnItem {
            expression: ReturnExpression::Variable {
                name: name.to_string(),
            },
            alias: None,
        }
    }

    pub fn property(variable: &str, key: &str) -> Self {
        ReturnItem {
            expression: ReturnExpression::Property {
                variable: variable.to_string(),
                key: key.to_string(),
            },
            alias: None,
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }
}
