//! Leaf nodes: coerce one JSON value into a primitive Rust type.
//!
//! A leaf is a [`Leaf<K>`] where `K` is a [`Primitive`] kind. Coercion is
//! strict: an integer leaf rejects `"12"` and `12.5`, a number leaf accepts
//! `12`. Coercion failure is reported under the `type` check.
//!
//! The refinements defined here (`min_length`, `min`, ...) are ordinary
//! named checks; they only differ from `.refine(...)` in carrying a
//! parameter that schema projection can map to a JSON Schema keyword.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

use crate::foundation::{Check, Mode, NodeCore, Outcome, ParseError, TypeNode, TypeNodeExt};
use crate::schema::SchemaProjector;

// ============================================================================
// PRIMITIVE KINDS
// ============================================================================

/// A primitive kind a leaf can coerce into.
pub trait Primitive: Send + Sync + 'static {
    /// Rust type produced by the coercion.
    type Output: Clone + Serialize + Send + Sync + 'static;

    /// Kind name used in messages and `kind()`.
    const NAME: &'static str;

    /// Converts the untyped value, or `None` if it has the wrong shape.
    fn coerce(value: &Value) -> Option<Self::Output>;

    /// Base schema fragment.
    fn schema() -> Value;
}

/// JSON string → `String`.
#[derive(Debug, Clone, Copy)]
pub struct Text;

/// JSON integer → `i64`.
#[derive(Debug, Clone, Copy)]
pub struct Integer;

/// JSON number → `f64`.
#[derive(Debug, Clone, Copy)]
pub struct Number;

/// JSON boolean → `bool`.
#[derive(Debug, Clone, Copy)]
pub struct Boolean;

/// Any JSON value, passed through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Anything;

impl Primitive for Text {
    type Output = String;
    const NAME: &'static str = "string";

    fn coerce(value: &Value) -> Option<String> {
        value.as_str().map(str::to_owned)
    }

    fn schema() -> Value {
        json!({"type": "string"})
    }
}

impl Primitive for Integer {
    type Output = i64;
    const NAME: &'static str = "integer";

    fn coerce(value: &Value) -> Option<i64> {
        value.as_i64()
    }

    fn schema() -> Value {
        json!({"type": "integer"})
    }
}

impl Primitive for Number {
    type Output = f64;
    const NAME: &'static str = "number";

    fn coerce(value: &Value) -> Option<f64> {
        value.as_f64()
    }

    fn schema() -> Value {
        json!({"type": "number"})
    }
}

impl Primitive for Boolean {
    type Output = bool;
    const NAME: &'static str = "boolean";

    fn coerce(value: &Value) -> Option<bool> {
        value.as_bool()
    }

    fn schema() -> Value {
        json!({"type": "boolean"})
    }
}

impl Primitive for Anything {
    type Output = Value;
    const NAME: &'static str = "any";

    fn coerce(value: &Value) -> Option<Value> {
        Some(value.clone())
    }

    fn schema() -> Value {
        json!({})
    }
}

// ============================================================================
// LEAF NODE
// ============================================================================

/// A node over a single primitive kind.
pub struct Leaf<K: Primitive> {
    core: NodeCore<K::Output>,
    kind: PhantomData<fn() -> K>,
}

/// String leaf.
pub type StringNode = Leaf<Text>;
/// Integer leaf.
pub type IntegerNode = Leaf<Integer>;
/// Floating-point leaf.
pub type NumberNode = Leaf<Number>;
/// Boolean leaf.
pub type BooleanNode = Leaf<Boolean>;
/// Pass-through leaf.
pub type AnyNode = Leaf<Anything>;

impl<K: Primitive> Leaf<K> {
    /// A leaf with an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: NodeCore::new(),
            kind: PhantomData,
        }
    }
}

impl<K: Primitive> Default for Leaf<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Primitive> Clone for Leaf<K> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            kind: PhantomData,
        }
    }
}

impl<K: Primitive> fmt::Debug for Leaf<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("kind", &K::NAME)
            .field("pipeline", &self.core.pipeline)
            .finish()
    }
}

#[async_trait]
impl<K: Primitive> TypeNode for Leaf<K> {
    type Output = K::Output;
    type Subject = K::Output;

    fn kind(&self) -> &'static str {
        K::NAME
    }

    fn core(&self) -> &NodeCore<K::Output> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore<K::Output> {
        &mut self.core
    }

    fn evaluate(&self, value: &Value, mode: Mode) -> Result<Outcome<K::Output>, ParseError> {
        match K::coerce(value) {
            Some(coerced) => self.core.pipeline.run(coerced, mode, K::NAME),
            None => Outcome::reject(mode, ParseError::type_mismatch(K::NAME, value)),
        }
    }

    async fn evaluate_async(
        &self,
        value: &Value,
        mode: Mode,
    ) -> Result<Outcome<K::Output>, ParseError> {
        match K::coerce(value) {
            Some(coerced) => self.core.pipeline.run_async(coerced, mode).await,
            None => Outcome::reject(mode, ParseError::type_mismatch(K::NAME, value)),
        }
    }

    fn describe(&self, _projector: &SchemaProjector) -> Value {
        K::schema()
    }
}

// ============================================================================
// FACTORIES
// ============================================================================

/// A string leaf.
#[must_use]
pub fn string() -> StringNode {
    Leaf::new()
}

/// An integer leaf.
#[must_use]
pub fn integer() -> IntegerNode {
    Leaf::new()
}

/// A floating-point leaf.
#[must_use]
pub fn number() -> NumberNode {
    Leaf::new()
}

/// A boolean leaf.
#[must_use]
pub fn boolean() -> BooleanNode {
    Leaf::new()
}

/// A leaf accepting any JSON value.
#[must_use]
pub fn any_value() -> AnyNode {
    Leaf::new()
}

// ============================================================================
// REFINEMENTS
// ============================================================================

impl Leaf<Text> {
    /// At least `min` characters.
    pub fn min_length(self, min: usize) -> Self {
        self.with_operation(
            Check::new(
                "min_length",
                format!("must be at least {min} characters"),
                move |s: &String| s.chars().count() >= min,
            )
            .with_param(min),
        )
    }

    /// At most `max` characters.
    pub fn max_length(self, max: usize) -> Self {
        self.with_operation(
            Check::new(
                "max_length",
                format!("must be at most {max} characters"),
                move |s: &String| s.chars().count() <= max,
            )
            .with_param(max),
        )
    }

    /// Matches `regex` somewhere in the string.
    pub fn pattern(self, regex: Regex) -> Self {
        let source = regex.as_str().to_owned();
        self.with_operation(
            Check::new("pattern", format!("must match /{source}/"), move |s: &String| {
                regex.is_match(s)
            })
            .with_param(source),
        )
    }

    /// Strips leading and trailing whitespace.
    pub fn trim(self) -> Self {
        self.with_transformation(|s: String| s.trim().to_owned())
    }
}

macro_rules! numeric_bounds {
    ($kind:ty, $num:ty) => {
        impl Leaf<$kind> {
            /// Inclusive lower bound.
            pub fn min(self, min: $num) -> Self {
                self.with_operation(
                    Check::new("min", format!("must be at least {min}"), move |n: &$num| {
                        *n >= min
                    })
                    .with_param(min),
                )
            }

            /// Inclusive upper bound.
            pub fn max(self, max: $num) -> Self {
                self.with_operation(
                    Check::new("max", format!("must be at most {max}"), move |n: &$num| {
                        *n <= max
                    })
                    .with_param(max),
                )
            }
        }
    };
}

numeric_bounds!(Integer, i64);
numeric_bounds!(Number, f64);

// ============================================================================
// TESTS
// ============================================================================
