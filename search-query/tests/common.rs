#![allow(dead_code)]
//! Shared helpers for `search-query` integration tests.

use jiff::{civil::date, tz::TimeZone};
use kql_syntax::{Ast, FixedClock, build_query};
use search_query::*;

pub fn ast(query: &str) -> Ast {
    let now = date(2023, 9, 6).at(12, 0, 0, 0).to_zoned(TimeZone::UTC).unwrap();
    build_query(query, &FixedClock(now)).unwrap()
}

pub fn verbatim(query: &str) -> String {
    BleveCompiler::new(FieldMapping::Verbatim)
        .compile(&ast(query))
        .unwrap()
}

pub fn index(query: &str) -> String {
    BleveCompiler::new(FieldMapping::Index)
        .compile(&ast(query))
        .unwrap()
}

pub fn lower_index(query: &str) -> BleveQuery {
    BleveCompiler::new(FieldMapping::Index)
        .lower(&ast(query))
        .unwrap()
}

pub fn qs(text: &str) -> BleveQuery {
    BleveQuery::query_string(text)
}

pub fn conj(parts: Vec<BleveQuery>) -> BleveQuery {
    BleveQuery::Conjunction(parts)
}

pub fn disj(parts: Vec<BleveQuery>) -> BleveQuery {
    BleveQuery::Disjunction(parts)
}

pub fn must_not(inner: BleveQuery) -> BleveQuery {
    BleveQuery::MustNot(Box::new(inner))
}

pub fn document_types() -> Vec<BleveQuery> {
    media_types("document")
        .unwrap()
        .iter()
        .map(|mime| qs(&format!("MimeType:{mime}")))
        .collect()
}
