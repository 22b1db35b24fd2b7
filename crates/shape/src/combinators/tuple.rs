//! TUPLE combinator - fixed-arity positional sequence
//!
//! Arity is checked before any element node runs. Element failures are
//! prefixed with their position (`[1].min`); nested tuples compose the
//! prefixes (`[1][2].min`).

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use crate::foundation::{
    ARITY_CHECK, AsyncCheck, Check, Mode, NodeCore, Operation, Outcome, ParseError, Transformation,
    TypeNode, position,
};
use crate::schema::SchemaProjector;

// ============================================================================
// ELEMENTS
// ============================================================================

/// A Rust tuple of nodes, one per position.
///
/// Implemented for tuples of one to six [`TypeNode`]s.
#[async_trait]
pub trait Elements: Clone + Send + Sync + 'static {
    /// Tuple of the element outputs.
    type Output: Clone + Serialize + Send + Sync + 'static;

    /// Number of positions.
    const ARITY: usize;

    fn requires_async(&self) -> bool;

    /// Parses `items` position by position. A slice that does not hold
    /// exactly [`ARITY`](Self::ARITY) values is an `arity` failure.
    fn evaluate(&self, items: &[Value], mode: Mode) -> Result<Outcome<Self::Output>, ParseError>;

    async fn evaluate_async(
        &self,
        items: &[Value],
        mode: Mode,
    ) -> Result<Outcome<Self::Output>, ParseError>;

    /// Schema fragment of each position.
    fn schemas(&self, projector: &SchemaProjector) -> Vec<Value>;
}

macro_rules! impl_elements {
    ($arity:expr; $($node:ident $var:ident $idx:tt),+) => {
        #[async_trait]
        impl<$($node: TypeNode),+> Elements for ($($node,)+) {
            type Output = ($(<$node as TypeNode>::Output,)+);
            const ARITY: usize = $arity;

            fn requires_async(&self) -> bool {
                false $(|| self.$idx.requires_async())+
            }

            fn evaluate(
                &self,
                items: &[Value],
                mode: Mode,
            ) -> Result<Outcome<Self::Output>, ParseError> {
                if items.len() != $arity {
                    return Outcome::reject(mode, arity_mismatch($arity, items.len()));
                }
                let mut outcome = Outcome::empty();
                $(
                    let segment = position($idx);
                    let parsed = self
                        .$idx
                        .evaluate(&items[$idx], mode)
                        .map_err(|e| e.at(&segment))?;
                    let $var = outcome.absorb(&segment, parsed);
                )+
                if let ($(Some($var),)+) = ($($var,)+) {
                    outcome.value = Some(($($var,)+));
                }
                Ok(outcome)
            }

            async fn evaluate_async(
                &self,
                items: &[Value],
                mode: Mode,
            ) -> Result<Outcome<Self::Output>, ParseError> {
                if items.len() != $arity {
                    return Outcome::reject(mode, arity_mismatch($arity, items.len()));
                }
                let mut outcome = Outcome::empty();
                $(
                    let segment = position($idx);
                    let parsed = self
                        .$idx
                        .evaluate_async(&items[$idx], mode)
                        .await
                        .map_err(|e| e.at(&segment))?;
                    let $var = outcome.absorb(&segment, parsed);
                )+
                if let ($(Some($var),)+) = ($($var,)+) {
                    outcome.value = Some(($($var,)+));
                }
                Ok(outcome)
            }

            fn schemas(&self, projector: &SchemaProjector) -> Vec<Value> {
                vec![$(projector.node(&self.$idx)),+]
            }
        }
    };
}

fn arity_mismatch(expected: usize, received: usize) -> ParseError {
    let message = format!("expected {expected} elements, received {received}");
    ParseError::validation(ARITY_CHECK, message)
}

impl_elements!(1; A a 0);
impl_elements!(2; A a 0, B b 1);
impl_elements!(3; A a 0, B b 1, C c 2);
impl_elements!(4; A a 0, B b 1, C c 2, D d 3);
impl_elements!(5; A a 0, B b 1, C c 2, D d 3, E e 4);
impl_elements!(6; A a 0, B b 1, C c 2, D d 3, E e 4, F f 5);

// ============================================================================
// TUPLE
// ============================================================================

/// Fixed-arity sequence.
///
/// Built with [`tuple`] or by chaining `.and(...)`:
///
/// ```rust,ignore
/// let point = number().and(number()).and(string());
/// let parsed = point.parse(&json!([1.0, 2.5, "m"]))?;
/// assert_eq!(parsed.into_value(), Some((1.0, 2.5, "m".to_owned())));
/// ```
pub struct Tuple<E: Elements> {
    elements: E,
    core: NodeCore<E::Output>,
}

impl<E: Elements> Tuple<E> {
    /// Creates a tuple node over `elements`.
    pub fn new(elements: E) -> Self {
        Self {
            elements,
            core: NodeCore::new(),
        }
    }

    /// The position nodes.
    pub fn elements(&self) -> &E {
        &self.elements
    }

    /// Consumes the tuple, returning the position nodes.
    pub fn into_elements(self) -> E {
        self.elements
    }

    /// Number of positions.
    pub fn arity(&self) -> usize {
        E::ARITY
    }

    fn shape(value: &Value) -> Result<&[Value], ParseError> {
        let items = value
            .as_array()
            .ok_or_else(|| ParseError::type_mismatch("array", value))?;
        if items.len() != E::ARITY {
            return Err(arity_mismatch(E::ARITY, items.len()));
        }
        Ok(items.as_slice())
    }
}

// ============================================================================
// EXTENSION
// ============================================================================

/// A tuple value that is a shorter tuple `P` plus one trailing element.
trait Extends<P>: Sized + Send + 'static {
    type Last: Send + 'static;

    fn prefix(&self) -> P;

    fn split(self) -> (P, Self::Last);

    fn join(prefix: P, last: Self::Last) -> Self;
}

/// Re-targets an operation written for the prefix `P` at the extended value
/// `U`. The trailing element passes through untouched.
fn widen<P, U>(op: &Operation<P>) -> Operation<U>
where
    P: Clone + Send + Sync + 'static,
    U: Extends<P> + Sync,
{
    match op {
        Operation::Check(check) => {
            let inner = check.clone();
            let widened = Check::new(
                check.name().to_owned(),
                check.message().to_owned(),
                move |value: &U| inner.test(&value.prefix()),
            );
            match check.param() {
                Some(param) => widened.with_param(param.clone()).into(),
                None => widened.into(),
            }
        }
        Operation::AsyncCheck(check) => {
            let inner = check.clone();
            AsyncCheck::new(
                check.name().to_owned(),
                check.message().to_owned(),
                move |value: U| {
                    let inner = inner.clone();
                    async move { inner.test(value.split().0).await }
                },
            )
            .into()
        }
        Operation::Transformation(transform) => {
            let inner = transform.clone();
            Transformation::new(move |value: U| {
                let (prefix, last) = value.split();
                U::join(inner.apply(prefix), last)
            })
            .into()
        }
    }
}

macro_rules! impl_and {
    ($($node:ident $var:ident),+ => $next:ident $last:ident) => {
        impl<$($node,)+ $next> Extends<($($node,)+)> for ($($node,)+ $next)
        where
            $($node: Clone + Send + 'static,)+
            $next: Send + 'static,
        {
            type Last = $next;

            fn prefix(&self) -> ($($node,)+) {
                let ($($var,)+ _) = self;
                ($($var.clone(),)+)
            }

            fn split(self) -> (($($node,)+), $next) {
                let ($($var,)+ $last) = self;
                (($($var,)+), $last)
            }

            fn join(($($var,)+): ($($node,)+), $last: $next) -> Self {
                ($($var,)+ $last)
            }
        }

        impl<$($node: TypeNode),+> Tuple<($($node,)+)> {
            /// Extends the tuple by one position.
            ///
            /// Operations already attached keep running, in order, on the
            /// leading positions; the metadata key is kept.
            pub fn and<$next: TypeNode>(self, next: $next) -> Tuple<($($node,)+ $next)> {
                let Tuple { elements: ($($var,)+), core } = self;
                let mut extended = Tuple::new(($($var,)+ next));
                for op in core.pipeline.operations() {
                    let op = widen::<
                        ($(<$node as TypeNode>::Output,)+),
                        ($(<$node as TypeNode>::Output,)+ <$next as TypeNode>::Output),
                    >(op);
                    extended.core.pipeline = extended.core.pipeline.push(op);
                }
                extended.core.meta = core.meta;
                extended
            }
        }
    };
}

impl_and!(A a => B b);
impl_and!(A a, B b => C c);
impl_and!(A a, B b, C c => D d);
impl_and!(A a, B b, C c, D d => E e);
impl_and!(A a, B b, C c, D d, E e => F f);

impl<E: Elements> Clone for Tuple<E> {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            core: self.core.clone(),
        }
    }
}

impl<E: Elements + fmt::Debug> fmt::Debug for Tuple<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tuple")
            .field("elements", &self.elements)
            .field("pipeline", &self.core.pipeline)
            .finish()
    }
}

#[async_trait]
impl<E: Elements> TypeNode for Tuple<E> {
    type Output = E::Output;
    type Subject = E::Output;

    fn kind(&self) -> &'static str {
        "tuple"
    }

    fn core(&self) -> &NodeCore<E::Output> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore<E::Output> {
        &mut self.core
    }

    fn requires_async(&self) -> bool {
        self.core.pipeline.is_async() || self.elements.requires_async()
    }

    fn evaluate(&self, value: &Value, mode: Mode) -> Result<Outcome<E::Output>, ParseError> {
        let items = match Self::shape(value) {
            Ok(items) => items,
            Err(error) => return Outcome::reject(mode, error),
        };
        let mut outcome = self.elements.evaluate(items, mode)?;
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
    ) -> Result<Outcome<E::Output>, ParseError> {
        let items = match Self::shape(value) {
            Ok(items) => items,
            Err(error) => return Outcome::reject(mode, error),
        };
        let mut outcome = self.elements.evaluate_async(items, mode).await?;
        if let Some(parsed) = outcome.value.take() {
            let own = self.core.pipeline.run_async(parsed, mode).await?;
            outcome.value = outcome.absorb("", own);
        }
        Ok(outcome)
    }

    fn describe(&self, projector: &SchemaProjector) -> Value {
        json!({
            "type": "array",
            "prefixItems": self.elements.schemas(projector),
            "minItems": E::ARITY,
            "maxItems": E::ARITY
        })
    }
}

/// Builds a tuple node from a Rust tuple of nodes.
pub fn tuple<E: Elements>(elements: E) -> Tuple<E> {
    Tuple::new(elements)
}
