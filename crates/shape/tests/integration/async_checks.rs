//! Integration test: async checks and the sync/async split

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nebula_shape::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn available_username() -> StringNode {
    string()
        .min_length(3)
        .refine_async("username is taken", |name| async move { name != "admin" })
}

#[tokio::test]
async fn test_async_checks_are_awaited() {
    let node = available_username();
    assert!(node.parse_async(&json!("alice")).await.is_ok());

    let err = node.parse_async(&json!("admin")).await.unwrap_err();
    assert_eq!(err, ParseError::validation("refine", "username is taken"));
}

#[tokio::test]
async fn test_async_tolerant_collects_sync_and_async_failures() {
    let node = integer()
        .refine_async("must be even", |n| async move { n % 2 == 0 })
        .min(10);
    let report = node.try_parse_async(&json!(3)).await.unwrap();
    let keys: Vec<_> = report.errors().keys().cloned().collect();
    assert_eq!(keys, ["refine", "min"]);
    assert_eq!(report.into_value(), Some(3));
}

#[test]
fn test_sync_entry_points_reject_async_nodes() {
    let node = available_username().list().nullable();
    assert!(node.requires_async());

    let err = node.parse(&json!(["alice"])).unwrap_err();
    assert!(err.is_configuration());

    let fault = node.try_parse(&json!(["alice"])).unwrap_err();
    assert_eq!(fault.kind, "nullable");

    // Rejected up front, even for input that would never reach the check.
    assert!(node.try_parse(&Value::Null).is_err());
    assert!(node.parse(&json!(42)).unwrap_err().is_configuration());
}

#[test]
fn test_async_requirement_propagates_through_every_combinator() {
    let remote = integer().refine_async("unknown id", |_| async { true });

    assert!(remote.clone().nullable().requires_async());
    assert!(remote.clone().list().requires_async());
    assert!(remote.clone().and(string()).requires_async());
    assert!(string().and(remote.clone()).requires_async());
    let rendered = remote
        .clone()
        .pipe(string(), |n| Ok::<_, String>(n.to_string()));
    assert!(string().or(rendered).requires_async());
    let parsed = string().pipe(remote.clone(), |s| s.parse::<i64>());
    assert!(parsed.requires_async());

    assert!(!integer().list().nullable().requires_async());
    let tags = string().list().refine_async("x", |_| async { true });
    assert!(tags.requires_async());
}

#[tokio::test]
async fn test_async_list_reports_positions() {
    let node = integer()
        .refine_async("must be even", |n| async move { n % 2 == 0 })
        .list();
    let report = node.try_parse_async(&json!([2, 3, 4, 5])).await.unwrap();
    let keys: Vec<_> = report.errors().keys().cloned().collect();
    assert_eq!(keys, ["[1].refine", "[3].refine"]);

    let err = node.parse_async(&json!([2, 3, 5])).await.unwrap_err();
    assert_eq!(err.key().as_deref(), Some("[1].refine"));
}

#[tokio::test]
async fn test_async_strict_stops_at_first_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let node = integer()
        .refine("must be positive", |n| *n > 0)
        .refine_async("counted", move |_| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

    assert!(node.parse_async(&json!(-1)).await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert!(node.parse_async(&json!(1)).await.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_async_union_and_pipe() {
    let lookup = string().pipe(
        integer().refine_async("must be positive", |n| async move { n > 0 }),
        |s| s.parse::<i64>(),
    );
    let node = integer().or(lookup);

    assert_eq!(
        node.parse_async(&json!("5")).await.unwrap().into_value(),
        Some(5)
    );
    assert_eq!(
        node.parse_async(&json!(-5)).await.unwrap().into_value(),
        Some(-5)
    );

    let report = node.try_parse_async(&json!("-5")).await.unwrap();
    assert_eq!(
        report.error("@0.type"),
        Some("expected integer, received string")
    );
    assert_eq!(report.error("@1.refine"), Some("must be positive"));
}

#[tokio::test]
async fn test_async_tuple() {
    let node = available_username().and(integer().min(18));
    let report = node.try_parse_async(&json!(["admin", 12])).await.unwrap();
    assert_eq!(report.error("[0].refine"), Some("username is taken"));
    assert_eq!(report.error("[1].min"), Some("must be at least 18"));
}

#[tokio::test]
async fn test_async_panic_counts_as_failure() {
    let node = integer().with_async_check("remote", "service unavailable", |n: i64| async move {
        if n > 0 {
            panic!("connection reset");
        }
        true
    });
    let report = node.try_parse_async(&json!(1)).await.unwrap();
    assert_eq!(report.error("remote"), Some("service unavailable"));
    assert!(node.try_parse_async(&json!(0)).await.unwrap().is_success());
}

#[tokio::test]
async fn test_sync_nodes_work_through_async_entry_points() {
    let node = integer().min(1).nullable_or(1).list();
    let parsed = node.parse_async(&json!([null, 2])).await.unwrap();
    assert_eq!(parsed.into_value(), Some(vec![Some(1), Some(2)]));

    let err = node.parse_async(&json!([0])).await.unwrap_err();
    assert_eq!(err.key().as_deref(), Some("[0].min"));
}

#[tokio::test]
async fn test_nullable_agrees_across_entry_points() {
    let node = integer()
        .min(0)
        .nullable_or(-1)
        .refine("must be even", |n| n.is_none_or(|n| n % 2 == 0));

    // `null` yields the default, skipping checks that would reject it.
    let strict = node.parse(&Value::Null).unwrap();
    let strict_async = node.parse_async(&Value::Null).await.unwrap();
    let tolerant = node.try_parse(&Value::Null).unwrap();
    let tolerant_async = node.try_parse_async(&Value::Null).await.unwrap();
    for report in [&strict, &strict_async, &tolerant, &tolerant_async] {
        assert_eq!(report.value(), Some(&Some(-1)));
        assert!(report.errors().is_empty());
    }

    // Non-null input runs the inner node, then the nullable's own checks.
    let input = json!(3);
    let err = node.parse(&input).unwrap_err();
    let err_async = node.parse_async(&input).await.unwrap_err();
    assert_eq!(err, ParseError::validation("refine", "must be even"));
    assert_eq!(err_async, err);

    let tolerant = node.try_parse(&input).unwrap();
    let tolerant_async = node.try_parse_async(&input).await.unwrap();
    for report in [&tolerant, &tolerant_async] {
        let keys: Vec<_> = report.errors().keys().cloned().collect();
        assert_eq!(keys, ["refine"]);
        assert_eq!(report.value(), Some(&Some(3)));
    }

    let input = json!(-3);
    let tolerant = node.try_parse(&input).unwrap();
    let tolerant_async = node.try_parse_async(&input).await.unwrap();
    assert_eq!(tolerant.errors(), tolerant_async.errors());
    let keys: Vec<_> = tolerant_async.errors().keys().cloned().collect();
    assert_eq!(keys, ["min", "refine"]);
    assert_eq!(tolerant_async.value(), Some(&Some(-3)));
}
