//! UNION combinator - ordered alternation over nodes with a common output
//!
//! Alternatives are tried in insertion order and the first one that
//! succeeds wins. When every alternative fails, tolerant mode reports each
//! alternative's failures under an `@i` prefix; strict mode reports a single
//! `union` failure summarising them.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use crate::foundation::{Mode, NodeCore, Outcome, ParseError, TypeNode, UNION_CHECK, alternative};
use crate::schema::SchemaProjector;

/// Type-erased alternative producing `O`.
#[async_trait]
trait Alternative<O>: Send + Sync {
    fn kind(&self) -> &'static str;

    fn requires_async(&self) -> bool;

    fn evaluate(&self, value: &Value, mode: Mode) -> Result<Outcome<O>, ParseError>;

    async fn evaluate_async(&self, value: &Value, mode: Mode) -> Result<Outcome<O>, ParseError>;

    fn schema(&self, projector: &SchemaProjector) -> Value;
}

/// A node whose output converts into the union's output.
struct Converted<N>(N);

#[async_trait]
impl<N, O> Alternative<O> for Converted<N>
where
    N: TypeNode,
    N::Output: Into<O>,
    O: Send + 'static,
{
    fn kind(&self) -> &'static str {
        self.0.kind()
    }

    fn requires_async(&self) -> bool {
        self.0.requires_async()
    }

    fn evaluate(&self, value: &Value, mode: Mode) -> Result<Outcome<O>, ParseError> {
        Ok(self.0.evaluate(value, mode)?.map(Into::into))
    }

    async fn evaluate_async(&self, value: &Value, mode: Mode) -> Result<Outcome<O>, ParseError> {
        Ok(self.0.evaluate_async(value, mode).await?.map(Into::into))
    }

    fn schema(&self, projector: &SchemaProjector) -> Value {
        projector.node(&self.0)
    }
}

/// Ordered alternation.
///
/// # Examples
///
/// ```rust,ignore
/// let id = Union::<String>::new()
///     .or(string())
///     .or(integer().pipe(string(), |n| Ok::<_, String>(n.to_string())));
/// ```
pub struct Union<O> {
    alternatives: Vec<Arc<dyn Alternative<O>>>,
    core: NodeCore<O>,
}

impl<O> Union<O>
where
    O: Clone + Serialize + Send + Sync + 'static,
{
    /// A union with no alternatives. It rejects every input until one is
    /// added.
    #[must_use]
    pub fn new() -> Self {
        Self {
            alternatives: Vec::new(),
            core: NodeCore::new(),
        }
    }

    /// Appends an alternative.
    #[must_use = "builder methods must be chained or built"]
    pub fn or<N>(mut self, node: N) -> Self
    where
        N: TypeNode,
        N::Output: Into<O>,
    {
        self.alternatives.push(Arc::new(Converted(node)));
        self
    }

    /// Number of alternatives.
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    /// Returns `true` when no alternative has been added.
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Files one alternative's attempt. Returns the value if it matched.
    fn consider(
        failures: &mut Outcome<O>,
        index: usize,
        attempt: Result<Outcome<O>, ParseError>,
    ) -> Result<Option<O>, ParseError> {
        let segment = alternative(index);
        match attempt {
            Ok(outcome) if outcome.is_success() => Ok(outcome.value),
            Ok(outcome) => {
                failures.absorb(&segment, outcome);
                Ok(None)
            }
            Err(e) if e.is_configuration() => Err(e),
            Err(e) => {
                let e = e.at(&segment);
                failures.record(e.key().unwrap_or_default(), e.message());
                Ok(None)
            }
        }
    }

    fn matched(&self, index: usize) {
        if let Some(alt) = self.alternatives.get(index) {
            tracing::trace!(index, kind = alt.kind(), "union alternative matched");
        }
    }

    fn exhausted(&self, failures: Outcome<O>, mode: Mode) -> Result<Outcome<O>, ParseError> {
        tracing::trace!(
            alternatives = self.alternatives.len(),
            "no union alternative matched"
        );
        if self.alternatives.is_empty() {
            return Outcome::reject(
                mode,
                ParseError::validation(UNION_CHECK, "union has no alternatives"),
            );
        }
        match mode {
            Mode::Tolerant => Ok(failures),
            Mode::Strict => {
                let detail = failures
                    .errors
                    .iter()
                    .map(|(check, message)| format!("{check}: {message}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(ParseError::validation(
                    UNION_CHECK,
                    format!("no alternative matched ({detail})"),
                ))
            }
        }
    }
}

impl<O> Default for Union<O>
where
    O: Clone + Serialize + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Clone for Union<O> {
    fn clone(&self) -> Self {
        Self {
            alternatives: self.alternatives.clone(),
            core: self.core.clone(),
        }
    }
}

impl<O> fmt::Debug for Union<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<_> = self.alternatives.iter().map(|alt| alt.kind()).collect();
        f.debug_struct("Union")
            .field("alternatives", &kinds)
            .field("pipeline", &self.core.pipeline)
            .finish()
    }
}

#[async_trait]
impl<O> TypeNode for Union<O>
where
    O: Clone + Serialize + Send + Sync + 'static,
{
    type Output = O;
    type Subject = O;

    fn kind(&self) -> &'static str {
        "union"
    }

    fn core(&self) -> &NodeCore<O> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore<O> {
        &mut self.core
    }

    fn requires_async(&self) -> bool {
        self.core.pipeline.is_async() || self.alternatives.iter().any(|alt| alt.requires_async())
    }

    fn evaluate(&self, value: &Value, mode: Mode) -> Result<Outcome<O>, ParseError> {
        let mut failures = Outcome::empty();
        for (index, alt) in self.alternatives.iter().enumerate() {
            let attempt = alt.evaluate(value, mode);
            if let Some(matched) = Self::consider(&mut failures, index, attempt)? {
                self.matched(index);
                return self.core.pipeline.run(matched, mode, self.kind());
            }
        }
        self.exhausted(failures, mode)
    }

    async fn evaluate_async(&self, value: &Value, mode: Mode) -> Result<Outcome<O>, ParseError> {
        let mut failures = Outcome::empty();
        for (index, alt) in self.alternatives.iter().enumerate() {
            let attempt = alt.evaluate_async(value, mode).await;
            if let Some(matched) = Self::consider(&mut failures, index, attempt)? {
                self.matched(index);
                return self.core.pipeline.run_async(matched, mode).await;
            }
        }
        self.exhausted(failures, mode)
    }

    fn describe(&self, projector: &SchemaProjector) -> Value {
        let branches: Vec<Value> = self
            .alternatives
            .iter()
            .map(|alt| alt.schema(projector))
            .collect();
        json!({"anyOf": branches})
    }
}
