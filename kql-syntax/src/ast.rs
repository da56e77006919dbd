use jiff::Timestamp;
use serde::Serialize;
use std::fmt;

/// Byte span of a node inside the query text.
///
/// Locations are diagnostic metadata only: two locations always compare
/// equal, so structural comparisons of nodes and trees ignore where the
/// nodes came from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Location {
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Location {
    pub fn new(start: usize, end: usize, source: Option<String>) -> Self {
        Self { start, end, source }
    }

    /// Zero-width location used for connectors the normalizer inserts.
    pub fn implicit(at: usize) -> Self {
        Self {
            start: at,
            end: at,
            source: None,
        }
    }
}

impl PartialEq for Location {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for Location {}

/// A parsed query: the flat node sequence plus the span of the whole input.
///
/// `loc.source` holds the original query text, which string-rewriting
/// compilers read back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ast {
    pub nodes: Vec<Node>,
    pub loc: Location,
}

impl Ast {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn source(&self) -> Option<&str> {
        self.loc.source.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    String(StringNode),
    Boolean(BooleanNode),
    DateTime(DateTimeNode),
    Operator(OperatorNode),
    Group(GroupNode),
}

/// Free text (`key` empty) or a text property restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringNode {
    pub key: String,
    pub value: String,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BooleanNode {
    pub key: String,
    pub value: bool,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateTimeNode {
    pub key: String,
    pub operator: CompareOp,
    pub value: Timestamp,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorNode {
    pub value: BoolOp,
    pub loc: Location,
}

/// Parenthesized sub-sequence. A non-empty `key` makes it a keyed group
/// whose children inherit the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupNode {
    pub key: String,
    pub nodes: Vec<Node>,
    pub loc: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BoolOp {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "NOT")]
    Not,
}

impl BoolOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
            BoolOp::Not => "NOT",
        }
    }

    /// AND and OR connect two operands; NOT only prefixes one.
    pub fn is_binary(self) -> bool {
        matches!(self, BoolOp::And | BoolOp::Or)
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Restriction operator between a property name and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompareOp {
    #[serde(rename = ":")]
    Colon,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Colon => ":",
            CompareOp::Equal => "=",
            CompareOp::Less => "<",
            CompareOp::LessOrEqual => "<=",
            CompareOp::Greater => ">",
            CompareOp::GreaterOrEqual => ">=",
        }
    }

    /// `:` and `=` match a value; the others compare against it.
    pub fn is_match(self) -> bool {
        matches!(self, CompareOp::Colon | CompareOp::Equal)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Node {
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Node::String(StringNode {
            key: key.into(),
            value: value.into(),
            loc: Location::default(),
        })
    }

    pub fn boolean(key: impl Into<String>, value: bool) -> Self {
        Node::Boolean(BooleanNode {
            key: key.into(),
            value,
            loc: Location::default(),
        })
    }

    pub fn date_time(key: impl Into<String>, operator: CompareOp, value: Timestamp) -> Self {
        Node::DateTime(DateTimeNode {
            key: key.into(),
            operator,
            value,
            loc: Location::default(),
        })
    }

    pub fn operator(value: BoolOp) -> Self {
        Node::Operator(OperatorNode {
            value,
            loc: Location::default(),
        })
    }

    pub fn group(key: impl Into<String>, nodes: Vec<Node>) -> Self {
        Node::Group(GroupNode {
            key: key.into(),
            nodes,
            loc: Location::default(),
        })
    }

    /// Property name the node restricts, empty for free text and operators.
    pub fn key(&self) -> &str {
        match self {
            Node::String(node) => &node.key,
            Node::Boolean(node) => &node.key,
            Node::DateTime(node) => &node.key,
            Node::Group(node) => &node.key,
            Node::Operator(_) => "",
        }
    }

    pub fn loc(&self) -> &Location {
        match self {
            Node::String(node) => &node.loc,
            Node::Boolean(node) => &node.loc,
            Node::DateTime(node) => &node.loc,
            Node::Operator(node) => &node.loc,
            Node::Group(node) => &node.loc,
        }
    }

    pub fn as_operator(&self) -> Option<BoolOp> {
        match self {
            Node::Operator(node) => Some(node.value),
            _ => None,
        }
    }

    pub fn is_operator(&self, op: BoolOp) -> bool {
        self.as_operator() == Some(op)
    }

    /// Short name of the node variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::String(_) => "StringNode",
            Node::Boolean(_) => "BooleanNode",
            Node::DateTime(_) => "DateTimeNode",
            Node::Operator(_) => "OperatorNode",
            Node::Group(_) => "GroupNode",
        }
    }

    /// Value rendered for diagnostics.
    pub fn value_text(&self) -> String {
        match self {
            Node::String(node) => node.value.clone(),
            Node::Boolean(node) => node.value.to_string(),
            Node::DateTime(node) => format!("{}{}", node.operator, node.value),
            Node::Operator(node) => node.value.to_string(),
            Node::Group(node) => format!("({} nodes)", node.nodes.len()),
        }
    }
}
