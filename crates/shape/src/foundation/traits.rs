//! Core traits for the parsing system
//!
//! [`TypeNode`] is the contract every validator implements: four parse entry
//! points (strict/tolerant × sync/async) and schema projection, all built on
//! two node-specific hooks, [`TypeNode::evaluate`] and
//! [`TypeNode::evaluate_async`].
//!
//! [`TypeNodeExt`] is implemented for every node and provides the builder
//! surface. Each builder consumes the node and returns a new one; the
//! operation pipeline and child nodes are shared, not copied.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::error::{ConfigurationFault, ParseError};
use super::operation::{AsyncCheck, Check, Operation, Transformation};
use super::pipeline::OperationPipeline;
use super::result::{Mode, Outcome, ParseResult};
use crate::combinators::{ListOf, Nullable, Pipe, Tuple, Union};
use crate::metadata::{MetaKey, MetaRef, MetadataEntry, MetadataRegistry};
use crate::schema::SchemaProjector;

// ============================================================================
// NODE CORE
// ============================================================================

/// State every node carries besides its children: its own operation
/// pipeline and its metadata handle.
#[derive(Debug)]
pub struct NodeCore<S> {
    /// Operations run by this node.
    pub pipeline: OperationPipeline<S>,
    /// Metadata handle, `None` until `.meta(...)` is called.
    pub meta: Option<MetaRef>,
}

impl<S> NodeCore<S> {
    /// Empty pipeline, no metadata.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipeline: OperationPipeline::new(),
            meta: None,
        }
    }
}

impl<S> Default for NodeCore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for NodeCore<S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            meta: self.meta.clone(),
        }
    }
}

// ============================================================================
// TYPE NODE
// ============================================================================

/// A validator producing values of type [`Output`](Self::Output) from
/// untyped JSON input.
///
/// Implementors supply [`evaluate`](Self::evaluate),
/// [`evaluate_async`](Self::evaluate_async) and
/// [`describe`](Self::describe); the entry points are provided.
///
/// [`Subject`](Self::Subject) is the type the node's own pipeline operates
/// on. For most nodes it is the output type; [`ListOf`] runs its pipeline on
/// the raw item sequence before any element is parsed.
#[async_trait]
pub trait TypeNode: Clone + Send + Sync + 'static {
    /// The produced value type.
    type Output: Clone + Serialize + Send + Sync + 'static;

    /// The value type seen by this node's own operations.
    type Subject: Clone + Send + Sync + 'static;

    /// Short kind name (`"string"`, `"list"`, ...).
    fn kind(&self) -> &'static str;

    /// The node's pipeline and metadata handle.
    fn core(&self) -> &NodeCore<Self::Subject>;

    /// Mutable access used by builders on an owned node.
    fn core_mut(&mut self) -> &mut NodeCore<Self::Subject>;

    /// Returns `true` if this node or any child carries an async check.
    fn requires_async(&self) -> bool {
        self.core().pipeline.is_async()
    }

    /// Parses without suspending.
    ///
    /// In [`Mode::Tolerant`] the only `Err` is a configuration fault; every
    /// other failure lands in the outcome's error map.
    fn evaluate(&self, value: &Value, mode: Mode) -> Result<Outcome<Self::Output>, ParseError>;

    /// Parses, awaiting async checks in place.
    async fn evaluate_async(
        &self,
        value: &Value,
        mode: Mode,
    ) -> Result<Outcome<Self::Output>, ParseError>;

    /// Node-specific schema fragment, before constraints and metadata are
    /// merged in.
    fn describe(&self, projector: &SchemaProjector) -> Value;

    /// JSON pointer, within [`describe`](Self::describe)'s fragment, to the
    /// schema this node's own checks constrain. The whole fragment by
    /// default.
    fn constrained_schema(&self) -> &'static str {
        ""
    }

    /// Metadata currently registered for this node.
    fn metadata(&self) -> Option<Arc<MetadataEntry>> {
        self.core().meta.as_ref().and_then(MetaRef::entry)
    }

    /// Strict, synchronous parse.
    fn parse(&self, value: &Value) -> Result<ParseResult<Self::Output>, ParseError> {
        ensure_sync(self)?;
        let outcome = strict(self.evaluate(value, Mode::Strict)?)?;
        Ok(ParseResult::from_outcome(outcome, self.metadata()))
    }

    /// Tolerant, synchronous parse.
    fn try_parse(&self, value: &Value) -> Result<ParseResult<Self::Output>, ConfigurationFault> {
        ensure_sync(self)?;
        let outcome = tolerant(self.evaluate(value, Mode::Tolerant))?;
        Ok(ParseResult::from_outcome(outcome, self.metadata()))
    }

    /// Strict parse that may suspend on async checks.
    async fn parse_async(&self, value: &Value) -> Result<ParseResult<Self::Output>, ParseError> {
        let outcome = strict(self.evaluate_async(value, Mode::Strict).await?)?;
        Ok(ParseResult::from_outcome(outcome, self.metadata()))
    }

    /// Tolerant parse that may suspend on async checks.
    async fn try_parse_async(
        &self,
        value: &Value,
    ) -> Result<ParseResult<Self::Output>, ConfigurationFault> {
        let outcome = tolerant(self.evaluate_async(value, Mode::Tolerant).await)?;
        Ok(ParseResult::from_outcome(outcome, self.metadata()))
    }

    /// Projects the node into a schema document using the default
    /// [`ProjectionConfig`](crate::schema::ProjectionConfig).
    fn to_schema(&self) -> Value {
        SchemaProjector::default().project(self)
    }

    /// Projects and pretty-prints with `indent` spaces per level.
    fn to_schema_text(&self, indent: usize) -> Result<String, serde_json::Error> {
        SchemaProjector::default().render(self, indent)
    }
}

fn ensure_sync<N: TypeNode>(node: &N) -> Result<(), ConfigurationFault> {
    if node.requires_async() {
        tracing::debug!(kind = node.kind(), "sync entry point rejected async node");
        return Err(ConfigurationFault::new(node.kind()));
    }
    Ok(())
}

fn strict<T>(outcome: Outcome<T>) -> Result<Outcome<T>, ParseError> {
    match outcome.errors.first() {
        None => Ok(outcome),
        Some((check, message)) => Err(ParseError::validation(check.clone(), message.clone())),
    }
}

fn tolerant<T>(
    evaluated: Result<Outcome<T>, ParseError>,
) -> Result<Outcome<T>, ConfigurationFault> {
    evaluated.or_else(Outcome::from_error)
}

// ============================================================================
// BUILDER EXTENSION TRAIT
// ============================================================================

/// Builder methods available on every [`TypeNode`].
///
/// # Examples
///
/// ```rust,ignore
/// use nebula_shape::prelude::*;
///
/// let username = string()
///     .transform(|s| s.trim().to_owned())
///     .min_length(3)
///     .refine("must be lowercase", |s| s.chars().all(char::is_lowercase));
///
/// let tags = username.clone().list().min_items(1);
/// let pair = string().and(integer());
/// let id = string().or(integer().pipe(string(), |n| Ok::<_, String>(n.to_string())));
/// ```
pub trait TypeNodeExt: TypeNode {
    /// Appends one operation.
    fn with_operation(mut self, op: impl Into<Operation<Self::Subject>>) -> Self {
        let core = self.core_mut();
        core.pipeline = core.pipeline.push(op);
        self
    }

    /// Appends a named check.
    fn with_check<F>(
        self,
        name: impl Into<std::borrow::Cow<'static, str>>,
        message: impl Into<std::borrow::Cow<'static, str>>,
        predicate: F,
    ) -> Self
    where
        F: Fn(&Self::Subject) -> bool + Send + Sync + 'static,
    {
        self.with_operation(Check::new(name, message, predicate))
    }

    /// Appends a named async check. The node then requires an async entry
    /// point.
    fn with_async_check<F, Fut>(
        self,
        name: impl Into<std::borrow::Cow<'static, str>>,
        message: impl Into<std::borrow::Cow<'static, str>>,
        predicate: F,
    ) -> Self
    where
        F: Fn(Self::Subject) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.with_operation(AsyncCheck::new(name, message, predicate))
    }

    /// Appends a transformation.
    fn with_transformation<F>(self, func: F) -> Self
    where
        F: Fn(Self::Subject) -> Self::Subject + Send + Sync + 'static,
    {
        self.with_operation(Transformation::new(func))
    }

    /// Appends a check named `refine`.
    fn refine<F>(self, message: impl Into<std::borrow::Cow<'static, str>>, predicate: F) -> Self
    where
        F: Fn(&Self::Subject) -> bool + Send + Sync + 'static,
    {
        self.with_check("refine", message, predicate)
    }

    /// Appends an async check named `refine`.
    fn refine_async<F, Fut>(
        self,
        message: impl Into<std::borrow::Cow<'static, str>>,
        predicate: F,
    ) -> Self
    where
        F: Fn(Self::Subject) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.with_async_check("refine", message, predicate)
    }

    /// Alias of [`with_transformation`](Self::with_transformation).
    fn transform<F>(self, func: F) -> Self
    where
        F: Fn(Self::Subject) -> Self::Subject + Send + Sync + 'static,
    {
        self.with_transformation(func)
    }

    /// Parses as `Self`, converts with `func`, then parses the converted
    /// value as `output`.
    fn pipe<N, F, R, E>(self, output: N, func: F) -> Pipe<Self, N>
    where
        N: TypeNode,
        F: Fn(Self::Output) -> Result<R, E> + Send + Sync + 'static,
        R: Serialize + 'static,
        E: std::fmt::Display + 'static,
    {
        Pipe::new(self, output, func)
    }

    /// Accepts `null`, producing `None`.
    fn nullable(self) -> Nullable<Self> {
        let meta = self.core().meta.clone();
        with_meta(Nullable::new(self), meta)
    }

    /// Accepts `null`, producing `Some(default)`.
    fn nullable_or(self, default: Self::Output) -> Nullable<Self> {
        self.nullable().with_default(default)
    }

    /// Homogeneous sequence of `Self`.
    fn list(self) -> ListOf<Self> {
        let meta = self.core().meta.clone();
        with_meta(ListOf::new(self), meta)
    }

    /// Fixed-arity tuple `(Self, N)`.
    fn and<N: TypeNode>(self, other: N) -> Tuple<(Self, N)> {
        let meta = self.core().meta.clone();
        with_meta(Tuple::new((self, other)), meta)
    }

    /// Ordered alternation; the first matching alternative wins.
    fn or<N>(self, other: N) -> Union<Self::Output>
    where
        N: TypeNode,
        N::Output: Into<Self::Output>,
    {
        let meta = self.core().meta.clone();
        with_meta(Union::<Self::Output>::new().or(self).or(other), meta)
    }

    /// Attaches metadata in the global registry.
    fn meta(self, entry: MetadataEntry) -> Self {
        self.meta_in(MetadataRegistry::global(), entry)
    }

    /// Attaches metadata in `registry`.
    ///
    /// Reuses the node's key when it already has one (overwriting that
    /// entry), otherwise generates a fresh key.
    fn meta_in(mut self, registry: &Arc<MetadataRegistry>, entry: MetadataEntry) -> Self {
        let key = self
            .core()
            .meta
            .as_ref()
            .map_or_else(MetaKey::generate, |meta| meta.key().clone());
        registry.insert(key.clone(), entry);
        self.core_mut().meta = Some(MetaRef::new(Arc::clone(registry), key));
        self
    }

    /// Binds the node to an existing (or future) entry under a user key.
    fn bind_meta(mut self, registry: &Arc<MetadataRegistry>, key: impl Into<MetaKey>) -> Self {
        self.core_mut().meta = Some(MetaRef::new(Arc::clone(registry), key.into()));
        self
    }
}

impl<N: TypeNode> TypeNodeExt for N {}

/// Hands a node's metadata key on to the node wrapping it.
fn with_meta<W: TypeNode>(mut wrapper: W, meta: Option<MetaRef>) -> W {
    wrapper.core_mut().meta = meta;
    wrapper
}
