//! NULLABLE combinator - accepts `null` in addition to the inner node

use std::fmt;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::foundation::{Mode, NodeCore, Outcome, ParseError, TypeNode, TypeNodeExt};
use crate::schema::SchemaProjector;

/// Wraps a node so that `null` is accepted.
///
/// `null` short-circuits: it yields the configured default (or `None`)
/// without consulting the inner node or this node's own operations. Any
/// other input is parsed by the inner node, then this node's operations run
/// on `Some(value)`.
pub struct Nullable<N: TypeNode> {
    inner: N,
    default: Option<N::Output>,
    core: NodeCore<Option<N::Output>>,
}

impl<N: TypeNode> Nullable<N> {
    /// Creates a nullable wrapper producing `None` for `null`.
    pub fn new(inner: N) -> Self {
        Self {
            inner,
            default: None,
            core: NodeCore::new(),
        }
    }

    /// Value produced for `null` input instead of `None`.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_default(mut self, default: N::Output) -> Self {
        self.default = Some(default);
        self
    }

    /// The wrapped node.
    pub fn inner(&self) -> &N {
        &self.inner
    }

    /// The value produced for `null`, if one was set.
    pub fn default_value(&self) -> Option<&N::Output> {
        self.default.as_ref()
    }

    fn lift(inner: Outcome<N::Output>) -> Outcome<Option<N::Output>> {
        inner.map(Some)
    }
}

impl<N: TypeNode> Clone for Nullable<N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            default: self.default.clone(),
            core: self.core.clone(),
        }
    }
}

impl<N: TypeNode + fmt::Debug> fmt::Debug for Nullable<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nullable")
            .field("inner", &self.inner)
            .field("has_default", &self.default.is_some())
            .field("pipeline", &self.core.pipeline)
            .finish()
    }
}

#[async_trait]
impl<N: TypeNode> TypeNode for Nullable<N> {
    type Output = Option<N::Output>;
    type Subject = Option<N::Output>;

    fn kind(&self) -> &'static str {
        "nullable"
    }

    fn core(&self) -> &NodeCore<Self::Subject> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore<Self::Subject> {
        &mut self.core
    }

    fn requires_async(&self) -> bool {
        self.core.pipeline.is_async() || self.inner.requires_async()
    }

    fn evaluate(&self, value: &Value, mode: Mode) -> Result<Outcome<Self::Output>, ParseError> {
        if value.is_null() {
            return Ok(Outcome::success(self.default.clone()));
        }
        let mut outcome = Self::lift(self.inner.evaluate(value, mode)?);
        if let Some(parsed) = outcome.value.take() {
            let own = self.core.pipeline.run(parsed, mode, self.kind())?;
            outcome.value = outcome.absorb("", own);
        }
        Ok(outcome)
    }

    async fn evaluate_async(
        &self,
        value: &Value,
        mode: Mode,
    ) -> Result<Outcome<Self::Output>, ParseError> {
        if value.is_null() {
            return Ok(Outcome::success(self.default.clone()));
        }
        let mut outcome = Self::lift(self.inner.evaluate_async(value, mode).await?);
        if let Some(parsed) = outcome.value.take() {
            let own = self.core.pipeline.run_async(parsed, mode).await?;
            outcome.value = outcome.absorb("", own);
        }
        Ok(outcome)
    }

    fn describe(&self, projector: &SchemaProjector) -> Value {
        let mut doc = json!({"anyOf": [projector.node(&self.inner), {"type": "null"}]});
        if let (Some(default), Value::Object(map)) = (&self.default, &mut doc) {
            if let Ok(default) = serde_json::to_value(default) {
                map.insert("default".to_owned(), default);
            }
        }
        doc
    }
}

/// Wraps `inner` so it accepts `null`, same as [`TypeNodeExt::nullable`].
pub fn nullable<N: TypeNode>(inner: N) -> Nullable<N> {
    inner.nullable()
}
