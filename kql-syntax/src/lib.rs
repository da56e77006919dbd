//! # KQL syntax
//!
//! `kql-syntax` reads Keyword Query Language text (free text, property
//! restrictions, boolean operators, groups and dates) into a flat [`Ast`],
//! then makes the implicit connections between terms explicit and checks the
//! structural rules. Search back-ends consume the resulting tree.
//!
//! ## Example
//! ```
//! use kql_syntax::{build_query, BoolOp, FixedClock, Node};
//! use jiff::{civil::date, tz::TimeZone};
//!
//! let now = date(2023, 9, 6).at(12, 0, 0, 0).to_zoned(TimeZone::UTC).unwrap();
//! let ast = build_query("tag:a tag:b name:c", &FixedClock(now)).unwrap();
//! assert_eq!(
//!     ast.nodes,
//!     vec![
//!         Node::text("tag", "a"),
//!         // same property: implicit OR
//!         Node::operator(BoolOp::Or),
//!         Node::text("tag", "b"),
//!         Node::operator(BoolOp::And),
//!         Node::text("name", "c"),
//!     ]
//! );
//! ```

mod ast;
mod clock;
mod date;
mod error;
mod normalize;
mod parser;
mod validate;

pub use ast::{
    Ast, BoolOp, BooleanNode, CompareOp, DateTimeNode, GroupNode, Location, Node, OperatorNode,
    StringNode,
};
pub use clock::{Clock, FixedClock, SystemClock, TimeZoneClock};
pub use date::{DateContext, RelativeRange, resolve_relative_range};
pub use error::{Error, ErrorKind, ParseError, Result};
pub use normalize::{normalize_nodes, normalize_query};
pub use parser::parse_query;
pub use validate::validate_query;

/// Parses, normalizes and validates `input` in one go.
pub fn build_query(input: &str, clock: &dyn Clock) -> Result<Ast> {
    let ast = normalize_query(parse_query(input, clock)?)?;
    validate_query(&ast)?;
    Ok(ast)
}
