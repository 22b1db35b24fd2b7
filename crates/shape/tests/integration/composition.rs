//! Integration test: nested combinators and error key paths

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nebula_shape::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn id() -> Union<String> {
    let rendered = integer().pipe(string(), |n| Ok::<_, String>(n.to_string()));
    string().or(rendered)
}

fn record() -> Tuple<(StringNode, ListOf<IntegerNode>, Union<String>)> {
    tuple((string().min_length(1), integer().min(0).max(100).list(), id()))
}

#[test]
fn test_record_parses() {
    let parsed = record().parse(&json!(["ada", [10, 20], 7])).unwrap();
    assert_eq!(
        parsed.into_value(),
        Some(("ada".to_owned(), vec![10, 20], "7".to_owned()))
    );
}

#[test]
fn test_record_error_paths() {
    let report = record().try_parse(&json!(["", [10, 101, -1], true])).unwrap();
    let keys: Vec<_> = report.errors().keys().cloned().collect();
    assert_eq!(
        keys,
        [
            "[0].min_length",
            "[1][1].max",
            "[1][2].min",
            "[2].@0.type",
            "[2].@1.type",
        ]
    );
    assert_eq!(
        report.error("[2].@1.type"),
        Some("expected integer, received boolean")
    );
}

#[test]
fn test_record_strict_reports_first_path() {
    let err = record().parse(&json!(["", [101], true])).unwrap_err();
    assert_eq!(err.key().as_deref(), Some("[0].min_length"));

    let err = record().parse(&json!(["a", [], true])).unwrap_err();
    assert_eq!(err.key().as_deref(), Some("[2].union"));
}

#[test]
fn test_tuple_arity_is_checked_before_children() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let counted = string().refine("counted", move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        true
    });
    let node = counted.and(integer());

    let report = node.try_parse(&json!(["a"])).unwrap();
    assert_eq!(
        report.error("arity"),
        Some("expected 2 elements, received 1")
    );
    assert_eq!(report.errors().len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert!(node.parse(&json!(["a", 1])).is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_nested_tuples_compose_positions() {
    let inner = integer().and(integer()).and(integer().min(10));
    let node = string().and(inner);
    let report = node.try_parse(&json!(["x", [1, 2, 3]])).unwrap();
    assert_eq!(report.error("[1][2].min"), Some("must be at least 10"));
}

#[test]
fn test_nullable_items_in_list() {
    let node = integer().nullable().list();
    let parsed = node.parse(&json!([1, null, 3])).unwrap();
    assert_eq!(parsed.into_value(), Some(vec![Some(1), None, Some(3)]));
}

#[test]
fn test_nullable_default_skips_inner_checks() {
    let node = string()
        .min_length(5)
        .nullable_or("n/a".to_owned())
        .and(integer());
    let parsed = node.parse(&json!([null, 1])).unwrap();
    assert_eq!(parsed.into_value(), Some((Some("n/a".to_owned()), 1)));

    // The same default is rejected when it arrives as input.
    let err = node.parse(&json!(["n/a", 1])).unwrap_err();
    assert_eq!(err.key().as_deref(), Some("[0].min_length"));
}

#[test]
fn test_list_of_pipes_reports_transform_position() {
    let node = string().pipe(integer(), |s| s.parse::<i64>()).list();

    let report = node.try_parse(&json!(["1", "x", "3"])).unwrap();
    assert_eq!(
        report.error("[1].transform"),
        Some("cannot convert string to integer: invalid digit found in string")
    );
    assert_eq!(report.value(), None);

    let err = node.parse(&json!(["1", "x"])).unwrap_err();
    assert!(matches!(err, ParseError::Transform { .. }));
    assert_eq!(
        err.to_string(),
        "[1].transform: cannot convert string to integer: invalid digit found in string"
    );
}

#[test]
fn test_chained_pipes() {
    let node = string()
        .trim()
        .pipe(integer(), |s| s.parse::<i64>())
        .pipe(boolean(), |n| Ok::<_, String>(n != 0));
    assert_eq!(node.parse(&json!(" 0 ")).unwrap().into_value(), Some(false));
    assert_eq!(node.parse(&json!("12")).unwrap().into_value(), Some(true));
}

#[test]
fn test_pipe_untransformed_on_first_stage_failure() {
    let node = string().max_length(2).pipe(integer(), |s| s.parse::<i64>());
    let report = node.try_parse(&json!("1234")).unwrap();
    assert_eq!(
        report.error("max_length"),
        Some("must be at most 2 characters")
    );
    assert_eq!(report.untransformed(), Some(&json!("1234")));
    assert_eq!(report.value(), None);
}

#[test]
fn test_union_order_decides_winner() {
    let upper = string().transform(|s| s.to_uppercase());
    let plain = string();

    let first = upper.clone().or(plain.clone());
    let second = plain.or(upper);
    assert_eq!(
        first.parse(&json!("ab")).unwrap().into_value().as_deref(),
        Some("AB")
    );
    assert_eq!(
        second.parse(&json!("ab")).unwrap().into_value().as_deref(),
        Some("ab")
    );
}

#[test]
fn test_union_inside_list() {
    let node = id().list().max_items(3);
    let parsed = node.parse(&json!(["a", 2, "c"])).unwrap();
    assert_eq!(
        parsed.into_value(),
        Some(vec!["a".to_owned(), "2".to_owned(), "c".to_owned()])
    );

    let report = node.try_parse(&json!(["a", 2, null, 4])).unwrap();
    assert!(report.error("max_items").is_some());
    assert!(report.error("[2].@0.type").is_some());
    assert!(report.error("[2].@1.type").is_some());
}

#[test]
fn test_list_of_any_values() {
    let node = any_value().list().min_items(1);
    let input = json!([1, "two", {"three": 3}, null]);
    let parsed = node.parse(&input).unwrap();
    assert_eq!(parsed.into_value().map(Value::Array), Some(input));
}

#[test]
fn test_composite_refinements_on_outputs() {
    let range = integer()
        .and(integer())
        .refine("start must not exceed end", |(start, end)| start <= end);
    let ranges = range
        .list()
        .refine("must not be empty", |items| !items.is_empty());

    assert!(ranges.parse(&json!([[1, 2], [3, 3]])).is_ok());
    let report = ranges.try_parse(&json!([[1, 2], [5, 3]])).unwrap();
    assert_eq!(
        report.error("[1].refine"),
        Some("start must not exceed end")
    );

    let err = ranges.parse(&json!([])).unwrap_err();
    assert_eq!(err, ParseError::validation("refine", "must not be empty"));
}
