//! The ordered, immutable operation sequence bound to one node.
//!
//! Appending never mutates: [`OperationPipeline::push`] returns a new
//! pipeline whose tail links back to the old one, so every builder call
//! shares the operations it did not touch.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use super::error::{ConfigurationFault, ParseError};
use super::operation::Operation;
use super::result::{Mode, Outcome};

struct Link<T> {
    prev: Option<Arc<Link<T>>>,
    op: Operation<T>,
}

/// Persistent (snoc-list) sequence of [`Operation`]s.
pub struct OperationPipeline<T> {
    tail: Option<Arc<Link<T>>>,
    len: usize,
    async_count: usize,
}

impl<T> OperationPipeline<T> {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tail: None,
            len: 0,
            async_count: 0,
        }
    }

    /// Returns a new pipeline with `op` appended.
    #[must_use]
    pub fn push(&self, op: impl Into<Operation<T>>) -> Self {
        let op = op.into();
        let async_count = self.async_count + usize::from(op.is_async());
        Self {
            tail: Some(Arc::new(Link {
                prev: self.tail.clone(),
                op,
            })),
            len: self.len + 1,
            async_count,
        }
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no operation has been appended.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if any operation is an async check.
    pub fn is_async(&self) -> bool {
        self.async_count > 0
    }

    /// Operations in insertion order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation<T>> {
        let mut ops: SmallVec<[&Operation<T>; 8]> = SmallVec::with_capacity(self.len);
        let mut cursor = self.tail.as_deref();
        while let Some(link) = cursor {
            ops.push(&link.op);
            cursor = link.prev.as_deref();
        }
        ops.into_iter().rev()
    }

    /// Returns `true` when both pipelines share the same underlying storage.
    pub fn shares_storage(&self, other: &Self) -> bool {
        match (&self.tail, &other.tail) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Runs the pipeline without suspending.
    ///
    /// In [`Mode::Strict`] the first failing check aborts with a
    /// [`ParseError::Validation`]. In [`Mode::Tolerant`] failures are
    /// recorded and traversal continues with the unmodified value, so later
    /// transformations still run. Any async check is a configuration fault
    /// in both modes.
    pub fn run(&self, value: T, mode: Mode, kind: &'static str) -> Result<Outcome<T>, ParseError> {
        let mut current = value;
        let mut outcome = Outcome::empty();
        for op in self.operations() {
            match op {
                Operation::Check(check) => {
                    if !check.test(&current) {
                        fail(&mut outcome, mode, check.name(), check.message())?;
                    }
                }
                Operation::AsyncCheck(_) => {
                    return Err(ConfigurationFault::new(kind).into());
                }
                Operation::Transformation(transform) => {
                    current = transform.apply(current);
                }
            }
        }
        Ok(outcome.with_value(current))
    }
}

impl<T: Clone + Send + Sync> OperationPipeline<T> {
    /// Runs the pipeline, awaiting async checks in place.
    pub async fn run_async(&self, value: T, mode: Mode) -> Result<Outcome<T>, ParseError> {
        let mut current = value;
        let mut outcome = Outcome::empty();
        for op in self.operations() {
            match op {
                Operation::Check(check) => {
                    if !check.test(&current) {
                        fail(&mut outcome, mode, check.name(), check.message())?;
                    }
                }
                Operation::AsyncCheck(check) => {
                    if !check.test(current.clone()).await {
                        fail(&mut outcome, mode, check.name(), check.message())?;
                    }
                }
                Operation::Transformation(transform) => {
                    current = transform.apply(current);
                }
            }
        }
        Ok(outcome.with_value(current))
    }
}

fn fail<T>(
    outcome: &mut Outcome<T>,
    mode: Mode,
    name: &str,
    message: &str,
) -> Result<(), ParseError> {
    tracing::trace!(check = name, ?mode, "check failed");
    match mode {
        Mode::Strict => Err(ParseError::validation(name, message)),
        Mode::Tolerant => {
            outcome.record(name, message);
            Ok(())
        }
    }
}

impl<T> Default for OperationPipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for OperationPipeline<T> {
    fn clone(&self) -> Self {
        Self {
            tail: self.tail.clone(),
            len: self.len,
            async_count: self.async_count,
        }
    }
}

impl<T> fmt::Debug for OperationPipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.operations()).finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
