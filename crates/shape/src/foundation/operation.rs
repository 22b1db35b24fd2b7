//! Operations: the primitive units of work bound to a node.
//!
//! An [`Operation`] is one of:
//!
//! - [`Check`]: named synchronous predicate,
//! - [`AsyncCheck`]: named predicate that suspends,
//! - [`Transformation`]: value-to-value function.
//!
//! All three are immutable once built and cheap to clone (the callable is
//! behind an `Arc`).

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
type AsyncPredicate<T> = Arc<dyn Fn(T) -> BoxFuture<'static, bool> + Send + Sync>;
type TransformFn<T> = Arc<dyn Fn(T) -> T + Send + Sync>;

// ============================================================================
// CHECK
// ============================================================================

/// A named boolean predicate.
///
/// A predicate that panics is treated as returning `false`.
pub struct Check<T> {
    name: Cow<'static, str>,
    message: Cow<'static, str>,
    param: Option<Value>,
    predicate: Predicate<T>,
}

impl<T> Check<T> {
    /// Creates a check from a name, an error message and a predicate.
    pub fn new<F>(
        name: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
        predicate: F,
    ) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            message: message.into(),
            param: None,
            predicate: Arc::new(predicate),
        }
    }

    /// Attaches the constraint parameter used by schema projection.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_param(mut self, param: impl Into<Value>) -> Self {
        self.param = Some(param.into());
        self
    }

    /// The check's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The message reported on failure.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The constraint parameter, if any.
    pub fn param(&self) -> Option<&Value> {
        self.param.as_ref()
    }

    /// Evaluates the predicate, mapping a panic to `false`.
    pub fn test(&self, value: &T) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.predicate)(value))) {
            Ok(passed) => passed,
            Err(_) => {
                tracing::warn!(check = %self.name, "predicate panicked; treating as failure");
                false
            }
        }
    }
}

impl<T> Clone for Check<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            message: self.message.clone(),
            param: self.param.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> fmt::Debug for Check<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("param", &self.param)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ASYNC CHECK
// ============================================================================

/// A named boolean predicate that suspends.
///
/// The predicate receives an owned copy of the current value so the returned
/// future can be `'static`. A panic, either while building the future or
/// while polling it, is treated as `false`.
pub struct AsyncCheck<T> {
    name: Cow<'static, str>,
    message: Cow<'static, str>,
    predicate: AsyncPredicate<T>,
}

impl<T> AsyncCheck<T> {
    /// Creates an async check from a name, an error message and a predicate
    /// returning a future.
    pub fn new<F, Fut>(
        name: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
        predicate: F,
    ) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self {
            name: name.into(),
            message: message.into(),
            predicate: Arc::new(move |value| predicate(value).boxed()),
        }
    }

    /// The check's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The message reported on failure.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Evaluates the predicate, mapping a panic to `false`.
    pub async fn test(&self, value: T) -> bool {
        let future = match panic::catch_unwind(AssertUnwindSafe(|| (self.predicate)(value))) {
            Ok(future) => future,
            Err(_) => return self.panicked(),
        };
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(passed) => passed,
            Err(_) => self.panicked(),
        }
    }

    fn panicked(&self) -> bool {
        tracing::warn!(check = %self.name, "async predicate panicked; treating as failure");
        false
    }
}

impl<T> Clone for AsyncCheck<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            message: self.message.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> fmt::Debug for AsyncCheck<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncCheck")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TRANSFORMATION
// ============================================================================

/// A pure value-to-value function.
pub struct Transformation<T> {
    func: TransformFn<T>,
}

impl<T> Transformation<T> {
    /// Wraps a function.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Applies the function.
    pub fn apply(&self, value: T) -> T {
        (self.func)(value)
    }
}

impl<T> Clone for Transformation<T> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
        }
    }
}

impl<T> fmt::Debug for Transformation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformation").finish_non_exhaustive()
    }
}

// ============================================================================
// OPERATION
// ============================================================================

/// One step of an [`OperationPipeline`](super::OperationPipeline).
pub enum Operation<T> {
    /// Synchronous named predicate.
    Check(Check<T>),
    /// Suspending named predicate.
    AsyncCheck(AsyncCheck<T>),
    /// Value-to-value function.
    Transformation(Transformation<T>),
}

impl<T> Operation<T> {
    /// Returns `true` for [`Operation::AsyncCheck`].
    pub fn is_async(&self) -> bool {
        matches!(self, Self::AsyncCheck(_))
    }

    /// Name of the check, `None` for transformations.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Check(check) => Some(check.name()),
            Self::AsyncCheck(check) => Some(check.name()),
            Self::Transformation(_) => None,
        }
    }
}

impl<T> Clone for Operation<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Check(check) => Self::Check(check.clone()),
            Self::AsyncCheck(check) => Self::AsyncCheck(check.clone()),
            Self::Transformation(transform) => Self::Transformation(transform.clone()),
        }
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Check(check) => check.fmt(f),
            Self::AsyncCheck(check) => check.fmt(f),
            Self::Transformation(transform) => transform.fmt(f),
        }
    }
}

impl<T> From<Check<T>> for Operation<T> {
    fn from(check: Check<T>) -> Self {
        Self::Check(check)
    }
}

impl<T> From<AsyncCheck<T>> for Operation<T> {
    fn from(check: AsyncCheck<T>) -> Self {
        Self::AsyncCheck(check)
    }
}

impl<T> From<Transformation<T>> for Operation<T> {
    fn from(transform: Transformation<T>) -> Self {
        Self::Transformation(transform)
    }
}

// ============================================================================
// TESTS
// ============================================================================
