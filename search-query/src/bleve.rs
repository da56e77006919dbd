//! Structural compiler: lowers the normalized node sequence into a typed
//! query tree, then renders it as query-string text.

use crate::{
    CompileError, Compiler,
    fields::{FieldMapping, media_types},
};
use jiff::Timestamp;
use kql_syntax::{Ast, BoolOp, CompareOp, DateTimeNode, Node};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BleveQuery {
    Conjunction(Vec<BleveQuery>),
    Disjunction(Vec<BleveQuery>),
    /// Boolean query with a single `must_not` clause.
    MustNot(Box<BleveQuery>),
    QueryString(String),
    DateRange(DateRange),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub field: String,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub inclusive_start: bool,
    pub inclusive_end: bool,
}

impl BleveQuery {
    pub fn query_string(text: impl Into<String>) -> Self {
        BleveQuery::QueryString(text.into())
    }

    fn needs_parens(&self) -> bool {
        match self {
            BleveQuery::Conjunction(parts) | BleveQuery::Disjunction(parts) => parts.len() > 1,
            BleveQuery::DateRange(range) => range.start.is_some() && range.end.is_some(),
            BleveQuery::MustNot(_) | BleveQuery::QueryString(_) => false,
        }
    }

    fn conjunction(parts: Vec<BleveQuery>) -> Option<Self> {
        Self::flatten(parts, BleveQuery::Conjunction, |query| match query {
            BleveQuery::Conjunction(inner) => Ok(inner),
            other => Err(other),
        })
    }

    fn disjunction(parts: Vec<BleveQuery>) -> Option<Self> {
        Self::flatten(parts, BleveQuery::Disjunction, |query| match query {
            BleveQuery::Disjunction(inner) => Ok(inner),
            other => Err(other),
        })
    }

    /// Merges same-kind children into their parent; a single part is
    /// returned unwrapped.
    fn flatten(
        parts: Vec<BleveQuery>,
        wrap: fn(Vec<BleveQuery>) -> BleveQuery,
        unwrap_same: fn(BleveQuery) -> Result<Vec<BleveQuery>, BleveQuery>,
    ) -> Option<Self> {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match unwrap_same(part) {
                Ok(inner) => flat.extend(inner),
                Err(other) => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(wrap(flat)),
        }
    }
}

impl fmt::Display for BleveQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BleveQuery::QueryString(text) => f.write_str(text),
            BleveQuery::Conjunction(parts) => write_joined(f, parts, " AND "),
            BleveQuery::Disjunction(parts) => write_joined(f, parts, " OR "),
            BleveQuery::MustNot(inner) => {
                f.write_str("NOT ")?;
                write_operand(f, inner)
            }
            BleveQuery::DateRange(range) => fmt::Display::fmt(range, f),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            let op = if self.inclusive_start { ">=" } else { ">" };
            write!(f, "{}:{op}\"{start}\"", self.field)?;
            if self.end.is_some() {
                f.write_str(" AND ")?;
            }
        }
        if let Some(end) = self.end {
            let op = if self.inclusive_end { "<=" } else { "<" };
            write!(f, "{}:{op}\"{end}\"", self.field)?;
        }
        Ok(())
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[BleveQuery], separator: &str) -> fmt::Result {
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            f.write_str(separator)?;
        }
        if parts.len() > 1 {
            write_operand(f, part)?;
        } else {
            fmt::Display::fmt(part, f)?;
        }
    }
    Ok(())
}

fn write_operand(f: &mut fmt::Formatter<'_>, query: &BleveQuery) -> fmt::Result {
    if query.needs_parens() {
        write!(f, "({query})")
    } else {
        fmt::Display::fmt(query, f)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BleveCompiler {
    fields: FieldMapping,
}

impl BleveCompiler {
    pub fn new(fields: FieldMapping) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> FieldMapping {
        self.fields
    }

    /// Builds the query tree. The root is always a conjunction or a
    /// disjunction; a lone leaf is wrapped in a one-element conjunction.
    pub fn lower(&self, ast: &Ast) -> Result<BleveQuery, CompileError> {
        let query = self
            .lower_nodes(&ast.nodes, "")
            .ok_or(CompileError::EmptyQuery)?;
        Ok(match query {
            root @ (BleveQuery::Conjunction(_) | BleveQuery::Disjunction(_)) => root,
            leaf => BleveQuery::Conjunction(vec![leaf]),
        })
    }

    // AND binds tighter than OR: the sequence is split at every OR and each
    // slice becomes one conjunction.
    fn lower_nodes(&self, nodes: &[Node], inherited_key: &str) -> Option<BleveQuery> {
        let mut disjuncts: Vec<Vec<BleveQuery>> = vec![Vec::new()];
        let mut negate = false;
        let mut idx = 0;
        while idx < nodes.len() {
            let node = &nodes[idx];
            idx += 1;
            match node.as_operator() {
                Some(BoolOp::Or) => disjuncts.push(Vec::new()),
                Some(BoolOp::And) => {}
                Some(BoolOp::Not) => negate = !negate,
                None => {
                    let lowered = match range_pair(&nodes[idx - 1..]) {
                        Some((lower, upper)) => {
                            idx += 2;
                            Some(self.closed_range(lower, upper, inherited_key))
                        }
                        None => self.lower_operand(node, inherited_key),
                    };
                    if let (Some(query), Some(current)) = (lowered, disjuncts.last_mut()) {
                        current.push(if negate {
                            BleveQuery::MustNot(Box::new(query))
                        } else {
                            query
                        });
                    }
                    negate = false;
                }
            }
        }
        let conjunctions = disjuncts
            .into_iter()
            .filter_map(BleveQuery::conjunction)
            .collect();
        BleveQuery::disjunction(conjunctions)
    }

    fn closed_range(
        &self,
        lower: &DateTimeNode,
        upper: &DateTimeNode,
        inherited_key: &str,
    ) -> BleveQuery {
        let key = if lower.key.is_empty() {
            inherited_key
        } else {
            lower.key.as_str()
        };
        BleveQuery::DateRange(DateRange {
            field: self.fields.field(key).into_owned(),
            start: Some(lower.value),
            end: Some(upper.value),
            inclusive_start: true,
            inclusive_end: true,
        })
    }

    fn lower_operand(&self, node: &Node, inherited_key: &str) -> Option<BleveQuery> {
        let key_of = |key: &str| -> String {
            if key.is_empty() {
                inherited_key.to_string()
            } else {
                key.to_string()
            }
        };
        match node {
            Node::String(term) => Some(self.text_query(&key_of(&term.key), &term.value)),
            Node::Boolean(term) => {
                let field = self.fields.field(&key_of(&term.key)).into_owned();
                Some(BleveQuery::QueryString(format!(
                    "{field}:{}",
                    self.fields.bool_value(term.value)
                )))
            }
            Node::DateTime(term) => self.date_query(term, &key_of(&term.key)),
            Node::Group(group) => {
                let key = if group.key.is_empty() {
                    inherited_key
                } else {
                    group.key.as_str()
                };
                self.lower_nodes(&group.nodes, key)
            }
            Node::Operator(_) => None,
        }
    }

    fn text_query(&self, key: &str, value: &str) -> BleveQuery {
        if self.fields == FieldMapping::Index && key.eq_ignore_ascii_case("mediatype") {
            if let Some(types) = media_types(value) {
                let field = self.fields.field(key);
                let parts = types
                    .iter()
                    .map(|mime| BleveQuery::QueryString(format!("{field}:{mime}")))
                    .collect();
                if let Some(query) = BleveQuery::disjunction(parts) {
                    return query;
                }
            }
        }
        let field = self.fields.field(key);
        let value = self.fields.text_value(&field, value);
        if field.is_empty() {
            BleveQuery::QueryString(value)
        } else {
            BleveQuery::QueryString(format!("{field}:{value}"))
        }
    }

    fn date_query(&self, term: &DateTimeNode, key: &str) -> Option<BleveQuery> {
        let field = self.fields.field(key).into_owned();
        let value = Some(term.value);
        let (start, end, inclusive_start, inclusive_end) = match term.operator {
            CompareOp::Greater => (value, None, false, false),
            CompareOp::GreaterOrEqual => (value, None, true, false),
            CompareOp::Less => (None, value, false, false),
            CompareOp::LessOrEqual => (None, value, false, true),
            CompareOp::Colon | CompareOp::Equal => {
                debug!(field = %field, value = %term.value, "exact date match is not indexable, term skipped");
                return None;
            }
        };
        Some(BleveQuery::DateRange(DateRange {
            field,
            start,
            end,
            inclusive_start,
            inclusive_end,
        }))
    }
}

/// `>= AND <=` bounds the parser expanded from one relative range: same
/// key, same source span. They lower to one two-sided range so a negation
/// covers both bounds.
fn range_pair(nodes: &[Node]) -> Option<(&DateTimeNode, &DateTimeNode)> {
    let [Node::DateTime(lower), Node::Operator(op), Node::DateTime(upper), ..] = nodes else {
        return None;
    };
    let same_span = lower.loc.start < lower.loc.end
        && lower.loc.start == upper.loc.start
        && lower.loc.end == upper.loc.end;
    (op.value == BoolOp::And
        && lower.operator == CompareOp::GreaterOrEqual
        && upper.operator == CompareOp::LessOrEqual
        && lower.key == upper.key
        && same_span)
        .then_some((lower, upper))
}

impl Compiler for BleveCompiler {
    fn name(&self) -> &'static str {
        "bleve"
    }

    fn compile_to(&self, ast: &Ast, out: &mut dyn fmt::Write) -> Result<(), CompileError> {
        let query = self.lower(ast)?;
        debug!(fields = %self.fields, query = %query, "lowered query");
        write!(out, "{query}")?;
        Ok(())
    }
}
