//! # nebula-shape
//!
//! Composable runtime type nodes for untyped JSON input: typed parsing,
//! validation with named checks, and JSON Schema projection.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nebula_shape::prelude::*;
//! use serde_json::json;
//!
//! let port = integer().min(1).max(65_535);
//! let endpoint = string().trim().min_length(1).and(port.nullable_or(443));
//!
//! let parsed = endpoint.parse(&json!(["example.org ", null]))?;
//! assert_eq!(parsed.into_value(), Some(("example.org".to_owned(), Some(443))));
//!
//! let report = endpoint.try_parse(&json!(["", 0]))?;
//! assert_eq!(report.error("[0].min_length"), Some("must be at least 1 characters"));
//! assert_eq!(report.error("[1].min"), Some("must be at least 1"));
//! ```
//!
//! ## Building Blocks
//!
//! - **Leaves**: [`string`](nodes::string), [`integer`](nodes::integer),
//!   [`number`](nodes::number), [`boolean`](nodes::boolean),
//!   [`any_value`](nodes::any_value)
//! - **Combinators**: [`Nullable`](combinators::Nullable),
//!   [`ListOf`](combinators::ListOf), [`Tuple`](combinators::Tuple),
//!   [`Union`](combinators::Union), [`Pipe`](combinators::Pipe)
//! - **Operations**: checks, async checks and transformations, appended with
//!   the builders on [`TypeNodeExt`](foundation::TypeNodeExt)
//! - **Metadata**: [`MetadataRegistry`](metadata::MetadataRegistry), keyed
//!   documentation merged into projected schemas
//! - **Schema**: [`SchemaProjector`](schema::SchemaProjector)

// Nested combinators (Pipe<Tuple<(A, Nullable<B>)>, ListOf<C>>) produce
// complex types that are inherent to the typed node architecture.
#![allow(clippy::type_complexity)]

pub mod combinators;
pub mod foundation;
pub mod metadata;
pub mod nodes;
pub mod prelude;
pub mod schema;
