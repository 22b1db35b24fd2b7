//! Prelude module for convenient imports.
//!
//! Provides a single `use nebula_shape::prelude::*;` import that brings in
//! the node factories, combinators, traits and result types.
//!
//! # Examples
//!
//! ```rust,ignore
//! use nebula_shape::prelude::*;
//!
//! let tags = string().min_length(1).list().max_items(10);
//! let id = string().or(integer().pipe(string(), |n| Ok::<_, String>(n.to_string())));
//! ```

// ============================================================================
// FOUNDATION: Core traits, results, errors
// ============================================================================

pub use crate::foundation::{
    AsyncCheck, Check, ConfigurationFault, ErrorMap, Mode, Operation, ParseError, ParseResult,
    Transformation, TypeNode, TypeNodeExt,
};

// ============================================================================
// NODES: Leaf factories
// ============================================================================

pub use crate::nodes::{
    AnyNode, BooleanNode, IntegerNode, NumberNode, StringNode, any_value, boolean, integer, number,
    string,
};

// ============================================================================
// COMBINATORS: Composite nodes
// ============================================================================

pub use crate::combinators::{ListOf, Nullable, Pipe, Tuple, Union, list, nullable, tuple};

// ============================================================================
// METADATA & SCHEMA
// ============================================================================

pub use crate::metadata::{MetaKey, MetadataEntry, MetadataRegistry};
pub use crate::schema::{ProjectionConfig, SchemaProjector};
