//! Parse outcomes.
//!
//! [`Outcome`] is the internal currency passed between nodes while a parse
//! call walks the composed structure; [`ParseResult`] is what the four entry
//! points hand back to the caller.

use std::sync::Arc;

use serde_json::Value;

use super::error::{ConfigurationFault, ErrorMap, ParseError, qualify};
use crate::metadata::MetadataEntry;

/// Failure-reporting mode of a parse call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Abort on the first failure.
    Strict,
    /// Record every failure and keep going.
    Tolerant,
}

// ============================================================================
// OUTCOME
// ============================================================================

/// Intermediate result of evaluating one node.
///
/// `value` is `None` only when the node could not produce its output type at
/// all (type mismatch, arity mismatch, failed child). In that case `errors`
/// is never empty.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    /// Produced value.
    pub value: Option<T>,
    /// Accumulated failures.
    pub errors: ErrorMap,
    /// JSON form of the value held before a type-changing stage failed.
    pub untransformed: Option<Value>,
}

impl<T> Outcome<T> {
    /// No value, no errors. Only useful as an accumulator.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            value: None,
            errors: ErrorMap::new(),
            untransformed: None,
        }
    }

    /// A clean outcome carrying `value`.
    pub fn success(value: T) -> Self {
        Self::empty().with_value(value)
    }

    /// A valueless outcome with a single failure.
    pub fn failure(check: impl Into<String>, message: impl Into<String>) -> Self {
        let mut outcome = Self::empty();
        outcome.record(check, message);
        outcome
    }

    /// Converts a strict-mode fault into a tolerant-mode outcome.
    ///
    /// Configuration faults stay fatal.
    pub fn from_error(error: ParseError) -> Result<Self, ConfigurationFault> {
        match error {
            ParseError::Configuration(fault) => Err(fault),
            other => {
                let key = other.key().unwrap_or_default();
                Ok(Self::failure(key, other.message()))
            }
        }
    }

    /// Fails with `error` according to `mode`: strict returns it, tolerant
    /// records it.
    pub fn reject(mode: Mode, error: ParseError) -> Result<Self, ParseError> {
        match mode {
            Mode::Strict => Err(error),
            Mode::Tolerant => Self::from_error(error).map_err(ParseError::from),
        }
    }

    /// Sets the value.
    #[must_use]
    pub fn with_value(mut self, value: T) -> Self {
        self.value = Some(value);
        self
    }

    /// Records one failure (last write wins).
    pub fn record(&mut self, check: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(check.into(), message.into());
    }

    /// Returns `true` when no failure was recorded.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Merges a child's failures under `segment` and returns its value.
    pub fn absorb<U>(&mut self, segment: &str, child: Outcome<U>) -> Option<U> {
        for (key, message) in child.errors {
            self.errors.insert(qualify(segment, &key), message);
        }
        child.value
    }

    /// Maps the value, keeping the failures.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: self.value.map(f),
            errors: self.errors,
            untransformed: self.untransformed,
        }
    }

    /// Drops the value, keeping the failures.
    pub fn discard<U>(self) -> Outcome<U> {
        Outcome {
            value: None,
            errors: self.errors,
            untransformed: self.untransformed,
        }
    }
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// PARSE RESULT
// ============================================================================

/// Outcome of a parse entry point.
///
/// Produced by the strict entry points only on success, so `is_success()`
/// is always `true` there. The tolerant entry points report failures
/// through [`errors`](Self::errors).
#[derive(Debug, Clone)]
pub struct ParseResult<O> {
    value: Option<O>,
    success: bool,
    errors: ErrorMap,
    metadata: Option<Arc<MetadataEntry>>,
    untransformed: Option<Value>,
}

impl<O> ParseResult<O> {
    pub(crate) fn from_outcome(outcome: Outcome<O>, metadata: Option<Arc<MetadataEntry>>) -> Self {
        Self {
            success: outcome.errors.is_empty(),
            value: outcome.value,
            errors: outcome.errors,
            metadata,
            untransformed: outcome.untransformed,
        }
    }

    /// The parsed value.
    ///
    /// Present whenever the node produced its output type, even if some
    /// check on it failed in tolerant mode.
    pub fn value(&self) -> Option<&O> {
        self.value.as_ref()
    }

    /// Consumes the result, returning the parsed value.
    pub fn into_value(self) -> Option<O> {
        self.value
    }

    /// Returns `true` when no failure was recorded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Check name to message, empty on success.
    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    /// Message recorded for one check name.
    pub fn error(&self, check: &str) -> Option<&str> {
        self.errors.get(check).map(String::as_str)
    }

    /// Metadata registered for the parsing node.
    pub fn metadata(&self) -> Option<&MetadataEntry> {
        self.metadata.as_deref()
    }

    /// JSON form of the value held before a pipe failed to produce its
    /// output type.
    pub fn untransformed(&self) -> Option<&Value> {
        self.untransformed.as_ref()
    }
}

// ============================================================================
// TESTS
// ============================================================================
