//! PIPE combinator - two-stage parse with a type-changing conversion
//!
//! The input node parses the raw value; the conversion maps its output to a
//! new value; the output node parses that value. When the first stage fails
//! or the conversion faults, the result carries the input stage's value
//! (serialized) as [`untransformed`](crate::foundation::ParseResult::untransformed).

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::foundation::{Mode, NodeCore, Outcome, ParseError, TypeNode};
use crate::schema::{SchemaProjector, merge_object};

type Convert<I> = Arc<dyn Fn(I) -> Result<Value, String> + Send + Sync>;

/// Result of the first stage plus conversion.
enum Bridge<O> {
    /// Converted value, ready for the output node.
    Converted(Value),
    /// Stop here with this outcome.
    Halted(Outcome<O>),
}

/// Parses as `A`, converts, then parses as `B`.
pub struct Pipe<A: TypeNode, B: TypeNode> {
    input: A,
    output: B,
    convert: Convert<A::Output>,
    core: NodeCore<B::Output>,
}

impl<A: TypeNode, B: TypeNode> Pipe<A, B> {
    /// Builds a pipe. `func` may fail with any displayable error; a panic
    /// or a result that does not serialize is treated the same way.
    pub fn new<F, R, E>(input: A, output: B, func: F) -> Self
    where
        F: Fn(A::Output) -> Result<R, E> + Send + Sync + 'static,
        R: Serialize + 'static,
        E: fmt::Display + 'static,
    {
        let convert = move |value: A::Output| -> Result<Value, String> {
            match panic::catch_unwind(AssertUnwindSafe(|| func(value))) {
                Ok(Ok(converted)) => serde_json::to_value(converted).map_err(|e| e.to_string()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err("conversion panicked".to_owned()),
            }
        };
        Self {
            input,
            output,
            convert: Arc::new(convert),
            core: NodeCore::new(),
        }
    }

    /// The first-stage node.
    pub fn input(&self) -> &A {
        &self.input
    }

    /// The second-stage node.
    pub fn output(&self) -> &B {
        &self.output
    }

    fn bridge(
        &self,
        first: Outcome<A::Output>,
        mode: Mode,
    ) -> Result<Bridge<B::Output>, ParseError> {
        let Outcome {
            value,
            errors,
            untransformed,
        } = first;
        let Some(intermediate) = value else {
            return Ok(Bridge::Halted(Outcome {
                value: None,
                errors,
                untransformed,
            }));
        };
        let snapshot = serde_json::to_value(&intermediate).ok();
        if !errors.is_empty() {
            return Ok(Bridge::Halted(Outcome {
                value: None,
                errors,
                untransformed: snapshot,
            }));
        }
        match (self.convert)(intermediate) {
            Ok(converted) => Ok(Bridge::Converted(converted)),
            Err(message) => {
                tracing::debug!(
                    from = self.input.kind(),
                    to = self.output.kind(),
                    %message,
                    "pipe conversion failed"
                );
                let fault = ParseError::transform(self.input.kind(), self.output.kind(), message);
                let mut halted = Outcome::reject(mode, fault)?;
                halted.untransformed = snapshot;
                Ok(Bridge::Halted(halted))
            }
        }
    }
}

impl<A: TypeNode, B: TypeNode> Clone for Pipe<A, B> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            output: self.output.clone(),
            convert: Arc::clone(&self.convert),
            core: self.core.clone(),
        }
    }
}

impl<A: TypeNode + fmt::Debug, B: TypeNode + fmt::Debug> fmt::Debug for Pipe<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("pipeline", &self.core.pipeline)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<A: TypeNode, B: TypeNode> TypeNode for Pipe<A, B> {
    type Output = B::Output;
    type Subject = B::Output;

    fn kind(&self) -> &'static str {
        "pipe"
    }

    fn core(&self) -> &NodeCore<B::Output> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore<B::Output> {
        &mut self.core
    }

    fn requires_async(&self) -> bool {
        self.core.pipeline.is_async() || self.input.requires_async() || self.output.requires_async()
    }

    fn evaluate(&self, value: &Value, mode: Mode) -> Result<Outcome<B::Output>, ParseError> {
        let first = self.input.evaluate(value, mode)?;
        let converted = match self.bridge(first, mode)? {
            Bridge::Converted(converted) => converted,
            Bridge::Halted(outcome) => return Ok(outcome),
        };
        let mut outcome = self.output.evaluate(&converted, mode)?;
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
    ) -> Result<Outcome<B::Output>, ParseError> {
        let first = self.input.evaluate_async(value, mode).await?;
        let converted = match self.bridge(first, mode)? {
            Bridge::Converted(converted) => converted,
            Bridge::Halted(outcome) => return Ok(outcome),
        };
        let mut outcome = self.output.evaluate_async(&converted, mode).await?;
        if let Some(parsed) = outcome.value.take() {
            let own = self.core.pipeline.run_async(parsed, mode).await?;
            outcome.value = outcome.absorb("", own);
        }
        Ok(outcome)
    }

    fn constrained_schema(&self) -> &'static str {
        "/x-output"
    }

    fn describe(&self, projector: &SchemaProjector) -> Value {
        let mut doc = projector.node(&self.input);
        let output = projector.node(&self.output);
        let stage = serde_json::Map::from_iter([("x-output".to_owned(), output)]);
        merge_object(&mut doc, stage);
        doc
    }
}
