//! Integration test: schema projection of composed nodes

use std::sync::Arc;

use nebula_shape::prelude::*;
use nebula_shape::schema::DRAFT_2020_12;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_projection_of_nested_node() {
    let registry = Arc::new(MetadataRegistry::new());
    let node = tuple((
        string()
            .min_length(1)
            .meta_in(&registry, MetadataEntry::new().with_title("Name")),
        integer().min(0).nullable_or(0),
    ))
    .meta_in(&registry, MetadataEntry::new().with_description("A named counter"));

    assert_eq!(
        node.to_schema(),
        json!({
            "$schema": DRAFT_2020_12,
            "type": "array",
            "prefixItems": [
                {"type": "string", "minLength": 1, "title": "Name"},
                {"anyOf": [{"type": "integer", "minimum": 0}, {"type": "null"}], "default": 0}
            ],
            "minItems": 2,
            "maxItems": 2,
            "description": "A named counter"
        })
    );
}

#[test]
fn test_unmapped_checks_are_listed() {
    let node = string()
        .max_length(8)
        .refine("must be lowercase", |s| s.chars().all(char::is_lowercase))
        .refine_async("must be unique", |_| async { true });

    let schema = SchemaProjector::default().node(&node);
    assert_eq!(
        schema,
        json!({
            "type": "string",
            "maxLength": 8,
            "x-checks": [
                {"name": "refine", "message": "must be lowercase"},
                {"name": "refine", "message": "must be unique", "async": true}
            ]
        })
    );
}

#[test]
fn test_projection_config() {
    let registry = Arc::new(MetadataRegistry::new());
    let node = integer()
        .refine("must be even", |n| n % 2 == 0)
        .meta_in(&registry, MetadataEntry::new().with_title("Even"));

    let config: ProjectionConfig = serde_json::from_value(json!({
        "dialect": null,
        "include_checks": false,
        "include_metadata": false
    }))
    .unwrap();
    let projector = SchemaProjector::new(config);
    assert_eq!(projector.project(&node), json!({"type": "integer"}));
}

#[test]
fn test_union_and_pipe_projection() {
    let rendered = integer().pipe(string(), |n| Ok::<_, String>(n.to_string()));
    let node = string().or(rendered);
    assert_eq!(
        SchemaProjector::default().node(&node),
        json!({
            "anyOf": [
                {"type": "string"},
                {"type": "integer", "x-output": {"type": "string"}}
            ]
        })
    );
}

#[test]
fn test_any_value_metadata_projection() {
    let registry = Arc::new(MetadataRegistry::new());
    let node = any_value().meta_in(
        &registry,
        MetadataEntry::new()
            .with_description("Opaque payload")
            .deprecated()
            .with_extra("x-owner", "billing"),
    );
    assert_eq!(
        SchemaProjector::default().node(&node),
        json!({"description": "Opaque payload", "deprecated": true, "x-owner": "billing"})
    );
}

#[test]
fn test_schema_text_rendering() {
    let text = string().list().to_schema_text(2).unwrap();
    let reparsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(reparsed, string().list().to_schema());
    assert!(text.starts_with("{\n  \""));
    assert!(text.contains("\n    \"type\": \"string\""));
}
