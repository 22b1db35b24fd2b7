//! LIST combinator - parses every item of a JSON array with one node
//!
//! Failures are reported per position: a failing item at index 2 produces
//! keys such as `[2].min_length`.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::foundation::{
    Check, Mode, NodeCore, Outcome, ParseError, TypeNode, TypeNodeExt, position,
};
use crate::schema::SchemaProjector;

/// Homogeneous sequence of `N`.
///
/// The list's own operations (`min_items`, `max_items`, `refine`, ...) run on
/// the raw items before any element is parsed. In tolerant mode a failing
/// list-level check does not stop element validation.
pub struct ListOf<N: TypeNode> {
    element: N,
    core: NodeCore<Vec<Value>>,
}

impl<N: TypeNode> ListOf<N> {
    /// Creates a list of `element` with no list-level checks.
    pub fn new(element: N) -> Self {
        Self {
            element,
            core: NodeCore::new(),
        }
    }

    /// The element node.
    pub fn element(&self) -> &N {
        &self.element
    }

    /// At least `min` items.
    pub fn min_items(self, min: usize) -> Self {
        self.with_operation(
            Check::new(
                "min_items",
                format!("must contain at least {min} items"),
                move |items: &Vec<Value>| items.len() >= min,
            )
            .with_param(min),
        )
    }

    /// At most `max` items.
    pub fn max_items(self, max: usize) -> Self {
        self.with_operation(
            Check::new(
                "max_items",
                format!("must contain at most {max} items"),
                move |items: &Vec<Value>| items.len() <= max,
            )
            .with_param(max),
        )
    }
}

/// Collects per-item outcomes into the list outcome.
struct Collector<O> {
    parsed: Vec<O>,
    complete: bool,
}

impl<O> Collector<O> {
    fn with_capacity(len: usize) -> Self {
        Self {
            parsed: Vec::with_capacity(len),
            complete: true,
        }
    }

    fn push(&mut self, outcome: &mut Outcome<Vec<O>>, index: usize, item: Outcome<O>) {
        match outcome.absorb(&position(index), item) {
            Some(value) => self.parsed.push(value),
            None => self.complete = false,
        }
    }

    fn finish(self, mut outcome: Outcome<Vec<O>>) -> Outcome<Vec<O>> {
        if self.complete {
            outcome.value = Some(self.parsed);
        }
        outcome
    }
}

impl<N: TypeNode> Clone for ListOf<N> {
    fn clone(&self) -> Self {
        Self {
            element: self.element.clone(),
            core: self.core.clone(),
        }
    }
}

impl<N: TypeNode + fmt::Debug> fmt::Debug for ListOf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListOf")
            .field("element", &self.element)
            .field("pipeline", &self.core.pipeline)
            .finish()
    }
}

#[async_trait]
impl<N: TypeNode> TypeNode for ListOf<N> {
    type Output = Vec<N::Output>;
    type Subject = Vec<Value>;

    fn kind(&self) -> &'static str {
        "list"
    }

    fn core(&self) -> &NodeCore<Vec<Value>> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore<Vec<Value>> {
        &mut self.core
    }

    fn requires_async(&self) -> bool {
        self.core.pipeline.is_async() || self.element.requires_async()
    }

    fn evaluate(&self, value: &Value, mode: Mode) -> Result<Outcome<Self::Output>, ParseError> {
        let Some(items) = value.as_array() else {
            return Outcome::reject(mode, ParseError::type_mismatch("array", value));
        };
        let mut outcome = Outcome::empty();
        let checked;
        let items = if self.core.pipeline.is_empty() {
            items.as_slice()
        } else {
            let own = self.core.pipeline.run(items.clone(), mode, self.kind())?;
            checked = outcome.absorb("", own).unwrap_or_default();
            checked.as_slice()
        };

        let mut collector = Collector::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let parsed = self
                .element
                .evaluate(item, mode)
                .map_err(|e| e.at(&position(index)))?;
            collector.push(&mut outcome, index, parsed);
        }
        Ok(collector.finish(outcome))
    }

    async fn evaluate_async(
        &self,
        value: &Value,
        mode: Mode,
    ) -> Result<Outcome<Self::Output>, ParseError> {
        let Some(items) = value.as_array() else {
            return Outcome::reject(mode, ParseError::type_mismatch("array", value));
        };
        let mut outcome = Outcome::empty();
        let checked;
        let items = if self.core.pipeline.is_empty() {
            items.as_slice()
        } else {
            let own = self.core.pipeline.run_async(items.clone(), mode).await?;
            checked = outcome.absorb("", own).unwrap_or_default();
            checked.as_slice()
        };

        let mut collector = Collector::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let parsed = self
                .element
                .evaluate_async(item, mode)
                .await
                .map_err(|e| e.at(&position(index)))?;
            collector.push(&mut outcome, index, parsed);
        }
        Ok(collector.finish(outcome))
    }

    fn describe(&self, projector: &SchemaProjector) -> Value {
        json!({"type": "array", "items": projector.node(&self.element)})
    }
}

/// Wraps `element` in a list, same as [`TypeNodeExt::list`].
pub fn list<N: TypeNode>(element: N) -> ListOf<N> {
    element.list()
}
