//! Core parsing types and traits
//!
//! This module contains the building blocks every node is made of:
//!
//! - **Operations**: [`Check`], [`AsyncCheck`], [`Transformation`]
//! - **Pipeline**: [`OperationPipeline`], the persistent ordered sequence
//!   of operations bound to one node
//! - **Traits**: [`TypeNode`], [`TypeNodeExt`]
//! - **Results**: [`Outcome`], [`ParseResult`], [`Mode`]
//! - **Errors**: [`ParseError`], [`ConfigurationFault`], [`ErrorMap`]
//!
//! # Entry points
//!
//! | | sync | async |
//! |---|---|---|
//! | strict (fail-fast) | [`parse`](TypeNode::parse) | [`parse_async`](TypeNode::parse_async) |
//! | tolerant (collect-all) | [`try_parse`](TypeNode::try_parse) | [`try_parse_async`](TypeNode::try_parse_async) |
//!
//! The sync entry points refuse any node whose structure contains an async
//! check, before doing any work.
//!
//! # Examples
//!
//! ```rust,ignore
//! use nebula_shape::prelude::*;
//! use serde_json::json;
//!
//! let node = string().min_length(3);
//! assert!(node.parse(&json!("alice")).is_ok());
//!
//! let report = node.try_parse(&json!("al"))?;
//! assert!(!report.is_success());
//! assert!(report.error("min_length").is_some());
//! ```

pub mod error;
pub mod operation;
pub mod pipeline;
pub mod result;
pub mod traits;

pub use error::{
    ARITY_CHECK, ConfigurationFault, ErrorMap, ParseError, TRANSFORM_CHECK, TYPE_CHECK, UNION_CHECK,
    alternative, json_kind, position, qualify,
};
pub use operation::{AsyncCheck, Check, Operation, Transformation};
pub use pipeline::OperationPipeline;
pub use result::{Mode, Outcome, ParseResult};
pub use traits::{NodeCore, TypeNode, TypeNodeExt};
