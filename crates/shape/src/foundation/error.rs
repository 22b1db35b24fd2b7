//! Error types for parse failures
//!
//! Three failure kinds exist:
//!
//! - **Validation**: a named check rejected the value.
//! - **Configuration**: a synchronous entry point was used on a node that
//!   needs asynchronous evaluation. Fatal in every mode.
//! - **Transform**: a [`Pipe`](crate::combinators::Pipe) transform could not
//!   convert between its two stages.
//!
//! Strict entry points surface the first of these as a [`ParseError`].
//! Tolerant entry points turn validation and transform failures into entries
//! of an [`ErrorMap`] and only surface [`ConfigurationFault`].

use indexmap::IndexMap;
use serde_json::Value;

// ============================================================================
// ERROR MAP
// ============================================================================

/// Check name (possibly path-qualified) to error message.
///
/// Insertion ordered. When two failures share a name the later message
/// overwrites the earlier one.
pub type ErrorMap = IndexMap<String, String>;

/// Error-map key used for base type mismatches.
pub const TYPE_CHECK: &str = "type";

/// Error-map key used for tuple arity mismatches.
pub const ARITY_CHECK: &str = "arity";

/// Error-map key used for pipe transform faults.
pub const TRANSFORM_CHECK: &str = "transform";

/// Error-map key used when no union alternative matched.
pub const UNION_CHECK: &str = "union";

/// Joins a path segment and a (possibly already qualified) key.
///
/// Positional segments look like `[2]`, union alternatives like `@0`.
///
/// ```rust,ignore
/// assert_eq!(qualify("[0]", "min_length"), "[0].min_length");
/// assert_eq!(qualify("[1]", "[2].min"), "[1][2].min");
/// ```
#[must_use]
pub fn qualify(segment: &str, key: &str) -> String {
    if segment.is_empty() {
        key.to_owned()
    } else if key.is_empty() {
        segment.to_owned()
    } else if key.starts_with('[') {
        format!("{segment}{key}")
    } else {
        format!("{segment}.{key}")
    }
}

/// Segment for a list item or tuple position.
#[must_use]
pub fn position(index: usize) -> String {
    format!("[{index}]")
}

/// Segment for a union alternative.
#[must_use]
pub fn alternative(index: usize) -> String {
    format!("@{index}")
}

/// Human-readable JSON kind of an untyped input.
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// CONFIGURATION FAULT
// ============================================================================

/// A synchronous entry point was invoked on a node that carries an
/// asynchronous check somewhere in its structure.
///
/// Raised before any operation runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{kind}` node contains asynchronous checks; use parse_async or try_parse_async")]
pub struct ConfigurationFault {
    /// Kind of the node the entry point was called on.
    pub kind: &'static str,
}

impl ConfigurationFault {
    /// Creates a fault for a node of the given kind.
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self { kind }
    }
}

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Fault surfaced by the strict entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A named check returned `false` (or panicked).
    #[error("{check}: {message}")]
    Validation {
        /// Path-qualified check name.
        check: String,
        /// The check's error message.
        message: String,
    },

    /// Sync entry point used on an async node.
    #[error(transparent)]
    Configuration(#[from] ConfigurationFault),

    /// A pipe transform failed between its input and output stage.
    #[error("{}: cannot convert {from} to {to}: {message}", qualify(.path, TRANSFORM_CHECK))]
    Transform {
        /// Path prefix of the pipe inside the enclosing structure.
        path: String,
        /// Kind of the input stage.
        from: String,
        /// Kind of the output stage.
        to: String,
        /// Error reported by the transform.
        message: String,
    },
}

impl ParseError {
    /// Creates a validation failure.
    pub fn validation(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            check: check.into(),
            message: message.into(),
        }
    }

    /// Creates a type-mismatch failure.
    pub fn type_mismatch(expected: &str, actual: &Value) -> Self {
        Self::validation(TYPE_CHECK, type_mismatch_message(expected, actual))
    }

    /// Creates a transform fault at the root path.
    pub fn transform(
        from: impl Into<String>,
        to: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transform {
            path: String::new(),
            from: from.into(),
            to: to.into(),
            message: message.into(),
        }
    }

    /// Prefixes the failure with a path segment.
    ///
    /// Configuration faults are not positional and pass through unchanged.
    #[must_use]
    pub fn at(self, segment: &str) -> Self {
        match self {
            Self::Validation { check, message } => Self::Validation {
                check: qualify(segment, &check),
                message,
            },
            Self::Transform {
                path,
                from,
                to,
                message,
            } => Self::Transform {
                path: qualify(segment, &path),
                from,
                to,
                message,
            },
            other @ Self::Configuration(_) => other,
        }
    }

    /// Error-map key this failure would occupy in tolerant mode.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        match self {
            Self::Validation { check, .. } => Some(check.clone()),
            Self::Transform { path, .. } => Some(qualify(path, TRANSFORM_CHECK)),
            Self::Configuration(_) => None,
        }
    }

    /// Error-map message for this failure.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Transform {
                from, to, message, ..
            } => transform_message(from, to, message),
            Self::Configuration(fault) => fault.to_string(),
        }
    }

    /// Returns `true` for configuration faults.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub(crate) fn type_mismatch_message(expected: &str, actual: &Value) -> String {
    format!("expected {expected}, received {}", json_kind(actual))
}

pub(crate) fn transform_message(from: &str, to: &str, message: &str) -> String {
    format!("cannot convert {from} to {to}: {message}")
}

// ============================================================================
// TESTS
// ============================================================================
