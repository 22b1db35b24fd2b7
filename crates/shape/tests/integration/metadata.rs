//! Integration test: metadata registry and node handles

use std::sync::Arc;
use std::thread;

use nebula_shape::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn titled(title: &str) -> MetadataEntry {
    MetadataEntry::new().with_title(title)
}

fn title_of(entry: Option<Arc<MetadataEntry>>) -> Option<String> {
    entry.and_then(|m| m.title.clone())
}

#[test]
fn test_parse_result_carries_metadata() {
    let registry = Arc::new(MetadataRegistry::new());
    let node = integer().meta_in(&registry, titled("Port"));

    let parsed = node.parse(&json!(80)).unwrap();
    assert_eq!(
        parsed.metadata().and_then(|m| m.title.as_deref()),
        Some("Port")
    );

    let report = node.try_parse(&json!("80")).unwrap();
    assert_eq!(
        report.metadata().and_then(|m| m.title.as_deref()),
        Some("Port")
    );
}

#[test]
fn test_meta_again_overwrites_the_same_key() {
    let registry = Arc::new(MetadataRegistry::new());
    let first = integer().meta_in(&registry, titled("Old"));
    let second = first.clone().meta_in(&registry, titled("New"));

    assert_eq!(registry.len(), 1);
    assert_eq!(
        first.core().meta.as_ref().map(|m| m.key()),
        second.core().meta.as_ref().map(|m| m.key())
    );
    assert_eq!(
        first.metadata().and_then(|m| m.title.clone()).as_deref(),
        Some("New")
    );
}

#[test]
fn test_same_kind_builders_keep_the_key() {
    let registry = Arc::new(MetadataRegistry::new());
    let node = string().meta_in(&registry, titled("Name")).min_length(1).trim();
    assert_eq!(
        node.metadata().and_then(|m| m.title.clone()).as_deref(),
        Some("Name")
    );
}

#[test]
fn test_wrapping_builders_carry_the_key() {
    let registry = Arc::new(MetadataRegistry::new());
    let element = string().meta_in(&registry, titled("Tag"));
    let key = element.core().meta.as_ref().map(|m| m.key().clone());

    let wrapped = element.clone().list();
    assert_eq!(wrapped.core().meta.as_ref().map(|m| m.key().clone()), key);
    assert_eq!(title_of(wrapped.metadata()).as_deref(), Some("Tag"));
    assert_eq!(
        title_of(wrapped.element().metadata()).as_deref(),
        Some("Tag")
    );

    assert_eq!(
        title_of(element.clone().nullable().metadata()).as_deref(),
        Some("Tag")
    );
    assert_eq!(
        title_of(element.clone().nullable_or("-".to_owned()).metadata()).as_deref(),
        Some("Tag")
    );
    assert_eq!(
        title_of(element.clone().and(integer()).metadata()).as_deref(),
        Some("Tag")
    );
    assert_eq!(
        title_of(element.clone().or(string()).metadata()).as_deref(),
        Some("Tag")
    );
    assert_eq!(
        title_of(list(element.clone()).metadata()).as_deref(),
        Some("Tag")
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_meta_on_a_wrapper_updates_the_shared_entry() {
    let registry = Arc::new(MetadataRegistry::new());
    let element = string().meta_in(&registry, titled("Tag"));
    let tags = element.clone().list().meta_in(&registry, titled("Tags"));

    assert_eq!(registry.len(), 1);
    assert_eq!(title_of(tags.metadata()).as_deref(), Some("Tags"));
    assert_eq!(title_of(element.metadata()).as_deref(), Some("Tags"));
}

#[test]
fn test_unannotated_nodes_stay_unannotated_when_wrapped() {
    assert!(string().list().nullable().metadata().is_none());
    let pair = integer().and(string()).or(integer().and(string()));
    assert!(pair.metadata().is_none());
}

#[test]
fn test_bind_meta_resolves_lazily() {
    let registry = Arc::new(MetadataRegistry::new());
    let node = string().bind_meta(&registry, "user.email");
    assert!(node.metadata().is_none());

    registry.insert(MetaKey::new("user.email"), titled("Email"));
    assert_eq!(
        node.metadata().and_then(|m| m.title.clone()).as_deref(),
        Some("Email")
    );
}

#[test]
fn test_global_registry_is_used_by_meta() {
    let node = boolean().meta(titled("Enabled").with_example(true));
    let key = node.core().meta.as_ref().map(|m| m.key().clone()).unwrap();
    let entry = MetadataRegistry::global().get(key.as_str()).unwrap();
    assert_eq!(entry.examples, vec![json!(true)]);
}

#[test]
fn test_concurrent_meta_calls() {
    let registry = Arc::new(MetadataRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let node = integer().meta_in(&registry, titled(&format!("field {i}")));
                node.metadata().and_then(|m| m.title.clone())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(format!("field {i}")));
    }
    assert_eq!(registry.len(), 8);
}
