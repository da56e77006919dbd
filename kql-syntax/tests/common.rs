#![allow(dead_code)]
//! Shared helpers for `kql-syntax` integration tests.

use jiff::{Timestamp, Zoned, civil::date, tz::TimeZone};
use kql_syntax::*;

pub fn now_utc(y: i16, m: i8, d: i8) -> Zoned {
    date(y, m, d).at(12, 0, 0, 0).to_zoned(TimeZone::UTC).unwrap()
}

pub fn clock() -> FixedClock {
    FixedClock(now_utc(2023, 9, 6))
}

pub fn build_ok(input: &str) -> Vec<Node> {
    build_query(input, &clock()).unwrap().nodes
}

pub fn build_at(input: &str, now: Zoned) -> Vec<Node> {
    build_query(input, &FixedClock(now)).unwrap().nodes
}

pub fn build_err(input: &str) -> Error {
    build_query(input, &clock()).unwrap_err()
}

pub fn parse_raw(input: &str) -> Vec<Node> {
    parse_query(input, &clock()).unwrap().nodes
}

pub fn word(value: &str) -> Node {
    Node::text("", value)
}

pub fn text(key: &str, value: &str) -> Node {
    Node::text(key, value)
}

pub fn boolean(key: &str, value: bool) -> Node {
    Node::boolean(key, value)
}

pub fn group(key: &str, nodes: Vec<Node>) -> Node {
    Node::group(key, nodes)
}

pub fn and() -> Node {
    Node::operator(BoolOp::And)
}

pub fn or() -> Node {
    Node::operator(BoolOp::Or)
}

pub fn not() -> Node {
    Node::operator(BoolOp::Not)
}

pub fn date_time(key: &str, op: CompareOp, value: Timestamp) -> Node {
    Node::date_time(key, op, value)
}

pub fn ts(raw: &str) -> Timestamp {
    raw.parse().unwrap()
}

pub fn day_start(y: i16, m: i8, d: i8) -> Timestamp {
    date(y, m, d).at(0, 0, 0, 0).to_zoned(TimeZone::UTC).unwrap().timestamp()
}

pub fn day_end(y: i16, m: i8, d: i8) -> Timestamp {
    date(y, m, d)
        .at(23, 59, 59, 999_999_999)
        .to_zoned(TimeZone::UTC)
        .unwrap()
        .timestamp()
}

/// The `>= from AND <= to` expansion of a relative date range.
pub fn range(key: &str, from: Timestamp, to: Timestamp) -> Vec<Node> {
    vec![
        date_time(key, CompareOp::GreaterOrEqual, from),
        and(),
        date_time(key, CompareOp::LessOrEqual, to),
    ]
}
