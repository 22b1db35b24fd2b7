//! Schema projection.
//!
//! [`SchemaProjector`] walks a composed node and produces a JSON Schema
//! (2020-12 flavoured) document. Each node contributes its own fragment via
//! [`TypeNode::describe`]; the projector then merges in
//!
//! 1. constraints recovered from the node's checks, on a check-name basis
//!    (`min_length` becomes `minLength`, and so on), with anything it cannot
//!    map listed under `x-checks`;
//! 2. the node's registered [`MetadataEntry`](crate::metadata::MetadataEntry).
//!
//! Projection is pure and terminates on every node graph the combinators can
//! build, since no node can reference itself.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value, json};

use crate::foundation::{Operation, OperationPipeline, TypeNode};

/// JSON Schema 2020-12 dialect URI.
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Options controlling projection.
///
/// Deserializable so it can live in an application's config file; missing
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// `$schema` URI written at the document root; `None` omits it.
    pub dialect: Option<String>,
    /// List checks that have no JSON Schema keyword under `x-checks`.
    pub include_checks: bool,
    /// Merge registered metadata entries.
    pub include_metadata: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            dialect: Some(DRAFT_2020_12.to_owned()),
            include_checks: true,
            include_metadata: true,
        }
    }
}

// ============================================================================
// PROJECTOR
// ============================================================================

/// Recursive node-to-schema mapper.
#[derive(Debug, Clone, Default)]
pub struct SchemaProjector {
    config: ProjectionConfig,
}

impl SchemaProjector {
    /// Creates a projector with the given options.
    #[must_use]
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    /// The active options.
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Projects `node` as a document root.
    pub fn project<N: TypeNode>(&self, node: &N) -> Value {
        let mut doc = self.node(node);
        if let (Some(dialect), Value::Object(map)) = (&self.config.dialect, &mut doc) {
            map.insert("$schema".to_owned(), Value::String(dialect.clone()));
        }
        doc
    }

    /// Projects `node` as a nested fragment. Composite nodes call this for
    /// each child.
    pub fn node<N: TypeNode>(&self, node: &N) -> Value {
        let mut doc = node.describe(self);
        let pipeline = &node.core().pipeline;
        match doc.pointer_mut(node.constrained_schema()) {
            Some(target) => self.merge_constraints(target, pipeline),
            None => self.merge_constraints(&mut doc, pipeline),
        }
        if self.config.include_metadata {
            if let Some(entry) = node.metadata() {
                merge_object(&mut doc, entry.to_object());
            }
        }
        doc
    }

    /// Projects `node` as a root and pretty-prints it.
    pub fn render<N: TypeNode>(
        &self,
        node: &N,
        indent: usize,
    ) -> Result<String, serde_json::Error> {
        render_text(&self.project(node), indent)
    }

    fn merge_constraints<S>(&self, doc: &mut Value, pipeline: &OperationPipeline<S>) {
        let mut unmapped = Vec::new();
        let mut keywords = Map::new();
        for op in pipeline.operations() {
            match op {
                Operation::Check(check) => match (keyword_for(check.name()), check.param()) {
                    (Some(keyword), Some(param)) => {
                        keywords.insert(keyword.to_owned(), param.clone());
                    }
                    _ => unmapped.push(json!({
                        "name": check.name(),
                        "message": check.message(),
                    })),
                },
                Operation::AsyncCheck(check) => unmapped.push(json!({
                    "name": check.name(),
                    "message": check.message(),
                    "async": true,
                })),
                Operation::Transformation(_) => {}
            }
        }
        merge_object(doc, keywords);
        if self.config.include_checks && !unmapped.is_empty() {
            merge_object(
                doc,
                Map::from_iter([("x-checks".to_owned(), Value::Array(unmapped))]),
            );
        }
    }
}

/// JSON Schema keyword for a well-known check name.
#[must_use]
pub fn keyword_for(check: &str) -> Option<&'static str> {
    Some(match check {
        "min_length" => "minLength",
        "max_length" => "maxLength",
        "pattern" => "pattern",
        "min" => "minimum",
        "max" => "maximum",
        "min_items" => "minItems",
        "max_items" => "maxItems",
        _ => return None,
    })
}

/// Pretty-prints a document with `indent` spaces per level.
pub fn render_text(doc: &Value, indent: usize) -> Result<String, serde_json::Error> {
    let indent = vec![b' '; indent];
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(&indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    doc.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

pub(crate) fn merge_object(doc: &mut Value, fields: Map<String, Value>) {
    if fields.is_empty() {
        return;
    }
    match doc {
        Value::Object(map) => map.extend(fields),
        other => {
            // Non-object fragments (e.g. `true`) are wrapped so the fields
            // have somewhere to go.
            let inner = std::mem::take(other);
            let mut map = Map::from_iter([("allOf".to_owned(), json!([inner]))]);
            map.extend(fields);
            *other = Value::Object(map);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
