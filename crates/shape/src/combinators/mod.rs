//! Combinators for composing nodes
//!
//! Every combinator is itself a [`TypeNode`](crate::foundation::TypeNode):
//! it carries its own operation pipeline and metadata handle, and can be
//! wrapped again.
//!
//! # Available Combinators
//!
//! - [`Nullable`] - accept `null`, optionally substituting a default
//! - [`ListOf`] - homogeneous sequence with positional error keys
//! - [`Tuple`] - fixed-arity positional sequence (one to six elements)
//! - [`Union`] - ordered alternation, first match wins
//! - [`Pipe`] - two-stage parse with a type-changing conversion
//!
//! # Error keys
//!
//! Composite nodes qualify child failures so that they can be traced back to
//! the failing position:
//!
//! | Source | Key |
//! |---|---|
//! | list item 2 | `[2].min_length` |
//! | tuple position 1 of position 0 | `[0][1].type` |
//! | union alternative 0 | `@0.type` |
//! | pipe conversion | `transform` |

pub mod list;
pub mod nullable;
pub mod pipe;
pub mod tuple;
pub mod union;

pub use list::{ListOf, list};
pub use nullable::{Nullable, nullable};
pub use pipe::Pipe;
pub use tuple::{Elements, Tuple, tuple};
pub use union::Union;
