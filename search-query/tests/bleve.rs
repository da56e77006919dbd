mod common;
use common::*;
use jiff::Timestamp;
use kql_syntax::{Ast, Location, Node, BoolOp};
use search_query::*;

#[test]
fn verbatim_keys_are_emitted_as_written() {
    assert_eq!(verbatim("tag:foo"), "tag:foo");
    assert_eq!(verbatim("tag:foo AND tag:bar"), "tag:foo AND tag:bar");
    assert_eq!(verbatim("tag:foo tag:bar"), "tag:foo OR tag:bar");
    assert_eq!(verbatim("cat dog"), "cat AND dog");
}

#[test]
fn single_restrictions_compile_to_themselves() {
    for key in ["tag", "name", "content"] {
        let query = format!("{key}:value");
        assert_eq!(verbatim(&query), query);
    }
}

#[test]
fn verbatim_values_are_escaped() {
    assert_eq!(verbatim(r#"name:"a (b)""#), r"name:a\ \(b\)");
    assert_eq!(verbatim(r#"name:"moby di*""#), r"name:moby\ di*");
}

#[test]
fn and_binds_tighter_than_or() {
    assert_eq!(
        verbatim(r#"name:"moby di*" OR tag:bestseller AND tag:book"#),
        r"name:moby\ di* OR (tag:bestseller AND tag:book)"
    );
    assert_eq!(
        verbatim(r#"(name:"moby di*" OR tag:bestseller) AND tag:book AND NOT tag:read"#),
        r"(name:moby\ di* OR tag:bestseller) AND tag:book AND NOT tag:read"
    );
}

#[test]
fn negated_groups_keep_their_parens() {
    assert_eq!(verbatim("cat -(dog OR fox)"), "cat AND NOT (dog OR fox)");
    assert_eq!(verbatim("NOT cat"), "NOT cat");
}

#[test]
fn booleans_and_dates_render() {
    assert_eq!(verbatim("IsHubSite:false"), "IsHubSite:false");
    assert_eq!(
        verbatim("Mtime>=2023-09-05T08:42:11.23554+02:00 name:x"),
        r#"Mtime:>="2023-09-05T06:42:11.23554Z" AND name:x"#
    );
    assert_eq!(
        verbatim("Mtime:today"),
        r#"Mtime:>="2023-09-06T00:00:00Z" AND Mtime:<="2023-09-06T23:59:59.999999999Z""#
    );
}

#[test]
fn negation_covers_both_bounds_of_a_relative_range() {
    assert_eq!(
        verbatim("NOT Mtime:today"),
        r#"NOT (Mtime:>="2023-09-06T00:00:00Z" AND Mtime:<="2023-09-06T23:59:59.999999999Z")"#
    );
    assert_eq!(
        lower_index(r#"cat -Mtime:"last week""#),
        conj(vec![
            qs("Name:cat"),
            must_not(BleveQuery::DateRange(DateRange {
                field: "Mtime".into(),
                start: Some("2023-08-28T00:00:00Z".parse().unwrap()),
                end: Some("2023-09-03T23:59:59.999999999Z".parse().unwrap()),
                inclusive_start: true,
                inclusive_end: true,
            })),
        ])
    );
}

#[test]
fn explicit_bounds_stay_separate() {
    assert_eq!(
        verbatim("NOT Mtime>=2023-09-05 AND Mtime<=2023-09-06"),
        r#"NOT Mtime:>="2023-09-05T00:00:00Z" AND Mtime:<="2023-09-06T00:00:00Z""#
    );
}

#[test]
fn free_text_searches_the_name_field() {
    assert_eq!(lower_index("federated"), conj(vec![qs("Name:federated")]));
    assert_eq!(
        lower_index(r#""John Smith""#),
        conj(vec![qs(r"Name:john\ smith")])
    );
}

#[test]
fn tags_map_to_the_tags_field() {
    assert_eq!(
        lower_index("tag:bestseller AND tag:book"),
        conj(vec![qs("Tags:bestseller"), qs("Tags:book")])
    );
}

#[test]
fn precedence_in_the_query_tree() {
    assert_eq!(
        lower_index("a AND b OR c"),
        disj(vec![conj(vec![qs("Name:a"), qs("Name:b")]), qs("Name:c")])
    );
    assert_eq!(
        lower_index("a OR b AND c"),
        disj(vec![qs("Name:a"), conj(vec![qs("Name:b"), qs("Name:c")])])
    );
    assert_eq!(
        lower_index("(a OR b OR c) AND d"),
        conj(vec![
            disj(vec![qs("Name:a"), qs("Name:b"), qs("Name:c")]),
            qs("Name:d"),
        ])
    );
}

#[test]
fn negation_becomes_must_not() {
    assert_eq!(
        lower_index(r#"(name:"moby di*" OR tag:bestseller) AND tag:book AND NOT tag:read"#),
        conj(vec![
            disj(vec![qs(r"Name:moby\ di*"), qs("Tags:bestseller")]),
            qs("Tags:book"),
            must_not(qs("Tags:read")),
        ])
    );
    assert_eq!(
        lower_index("NOT tag:physik"),
        conj(vec![must_not(qs("Tags:physik"))])
    );
}

#[test]
fn keyed_group_children_inherit_the_key() {
    assert_eq!(
        lower_index(r#"author:("John Smith" Jane)"#),
        conj(vec![qs(r"author:john\ smith"), qs("author:jane")])
    );
    assert_eq!(
        lower_index(r#"author:("John Smith" Jane) AND tag:bestseller"#),
        conj(vec![
            qs(r"author:john\ smith"),
            qs("author:jane"),
            qs("Tags:bestseller"),
        ])
    );
}

#[test]
fn identifiers_are_not_rewritten() {
    let id = "b27d3bf1-b254-459f-92e8-bdba668d6d3f$d0648459-25fb-4ed8-8684-bc62c7dca29c!d0648459-25fb-4ed8-8684-bc62c7dca29c";
    let query = format!("id:{id} mtime>=2023-09-05T12:40:59.14741+02:00");
    assert_eq!(
        lower_index(&query),
        conj(vec![
            qs(&format!("ID:{id}")),
            BleveQuery::DateRange(DateRange {
                field: "Mtime".into(),
                start: Some("2023-09-05T12:40:59.14741+02:00".parse().unwrap()),
                end: None,
                inclusive_start: true,
                inclusive_end: false,
            }),
        ])
    );
}

#[test]
fn hidden_values_keep_their_case() {
    let tree = Ast {
        nodes: vec![
            Node::text("", "John Smith"),
            Node::operator(BoolOp::And),
            Node::text("Hidden", "T"),
            Node::operator(BoolOp::And),
            Node::text("hidden", "T"),
        ],
        loc: Location::default(),
    };
    let lowered = BleveCompiler::new(FieldMapping::Index).lower(&tree).unwrap();
    assert_eq!(
        lowered,
        conj(vec![qs(r"Name:john\ smith"), qs("Hidden:T"), qs("Hidden:T")])
    );
    assert_eq!(lower_index("Hidden:true"), conj(vec![qs("Hidden:T")]));
}

#[test]
fn date_comparisons_become_ranges() {
    let value: Timestamp = "2023-09-05T08:42:11.23554+02:00".parse().unwrap();
    let range = |start, end, inclusive_start, inclusive_end| {
        BleveQuery::DateRange(DateRange {
            field: "Mtime".into(),
            start,
            end,
            inclusive_start,
            inclusive_end,
        })
    };
    let raw = "2023-09-05T08:42:11.23554+02:00";
    let query = format!(
        r#"mtime:"{raw}" AND mtime>{raw} AND mtime>={raw} AND mtime<{raw} AND mtime<={raw}"#
    );
    assert_eq!(
        lower_index(&query),
        conj(vec![
            range(Some(value), None, false, false),
            range(Some(value), None, true, false),
            range(None, Some(value), false, false),
            range(None, Some(value), false, true),
        ])
    );
}

#[test]
fn media_types_expand() {
    assert_eq!(lower_index("mediatype:document"), disj(document_types()));
    assert_eq!(
        lower_index("mediatype:document AND *tdd*"),
        conj(vec![disj(document_types()), qs("Name:*tdd*")])
    );

    let mut expected = document_types();
    expected.push(conj(vec![qs("MimeType:application/pdf"), qs("Name:*tdd*")]));
    assert_eq!(
        lower_index("mediatype:document OR mediatype:pdf AND *tdd*"),
        disj(expected)
    );

    let mut either = document_types();
    either.push(qs("MimeType:application/pdf"));
    assert_eq!(
        lower_index("(mediatype:document OR mediatype:pdf) AND *tdd*"),
        conj(vec![disj(either), qs("Name:*tdd*")])
    );
}

#[test]
fn unknown_media_type_is_a_plain_restriction() {
    assert_eq!(index("mediatype:image/png"), r"MimeType:image\/png");
}

#[test]
fn empty_and_unindexable_queries_fail_closed() {
    let compiler = BleveCompiler::default();
    assert!(matches!(
        compiler.compile(&ast("")),
        Err(CompileError::EmptyQuery)
    ));
    assert!(matches!(
        compiler.compile(&ast("Mtime:2023-09-05")),
        Err(CompileError::EmptyQuery)
    ));
}

#[test]
fn compile_to_streams_into_a_writer() {
    let mut out = String::from("q=");
    BleveCompiler::default()
        .compile_to(&ast("tag:foo"), &mut out)
        .unwrap();
    assert_eq!(out, "q=tag:foo");
}
