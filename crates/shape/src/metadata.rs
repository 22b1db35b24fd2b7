//! Descriptive metadata attached to nodes.
//!
//! A node does not hold its metadata directly. It holds a [`MetaRef`]: a key
//! plus the [`MetadataRegistry`] the key lives in. Builder calls that keep
//! the node's kind propagate the reference, so all descendants of a node
//! annotated with `.meta(...)` see the same entry.
//!
//! The registry is an explicit, shareable store. [`MetadataRegistry::global`]
//! exists for callers that do not want to thread one through.
//!
//! # Examples
//!
//! ```rust,ignore
//! use nebula_shape::prelude::*;
//!
//! let registry = Arc::new(MetadataRegistry::new());
//! let email = string()
//!     .meta_in(&registry, MetadataEntry::new().with_title("Email"))
//!     .min_length(3);
//!
//! assert_eq!(email.metadata().unwrap().title.as_deref(), Some("Email"));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// KEY
// ============================================================================

/// Registry key: user supplied or a generated UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetaKey(Arc<str>);

impl MetaKey {
    /// Wraps a user-supplied key.
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Generates a fresh, globally unique key.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string().into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MetaKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MetaKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for MetaKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

// ============================================================================
// ENTRY
// ============================================================================

/// Free-form descriptive record merged into projected schemas.
///
/// Unknown fields deserialize into [`extra`](Self::extra) and serialize back
/// at the top level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Short title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Example values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,

    /// Marks the described shape as deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,

    /// Any other annotation.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MetadataEntry {
    /// Creates an empty entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an example value.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_example(mut self, example: impl Into<Value>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Marks the entry deprecated.
    #[must_use = "builder methods must be chained or built"]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Adds an arbitrary annotation.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The entry as a JSON object.
    #[must_use]
    pub fn to_object(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Concurrent key to [`MetadataEntry`] store.
///
/// Entries are inserted or overwritten, never removed. Writers to the same
/// key serialize on that key's shard; distinct keys do not contend.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: DashMap<MetaKey, Arc<MetadataEntry>>,
}

impl MetadataRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The lazily created process-wide registry.
    pub fn global() -> &'static Arc<Self> {
        static GLOBAL: OnceLock<Arc<MetadataRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Self::new()))
    }

    /// Stores `entry` under `key`, returning the entry it replaced.
    pub fn insert(&self, key: MetaKey, entry: MetadataEntry) -> Option<Arc<MetadataEntry>> {
        tracing::debug!(key = %key, "storing metadata entry");
        self.entries.insert(key, Arc::new(entry))
    }

    /// Looks up the entry stored under `key`.
    pub fn get(&self, key: &str) -> Option<Arc<MetadataEntry>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns `true` if `key` has an entry.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// REFERENCE
// ============================================================================

/// A node's handle on its metadata: the key and the registry holding it.
#[derive(Debug, Clone)]
pub struct MetaRef {
    registry: Arc<MetadataRegistry>,
    key: MetaKey,
}

impl MetaRef {
    /// Binds `key` in `registry`.
    pub fn new(registry: Arc<MetadataRegistry>, key: MetaKey) -> Self {
        Self { registry, key }
    }

    /// The bound key.
    pub fn key(&self) -> &MetaKey {
        &self.key
    }

    /// The registry the key lives in.
    pub fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.registry
    }

    /// Current entry for the key, if one was stored.
    pub fn entry(&self) -> Option<Arc<MetadataEntry>> {
        self.registry.get(self.key.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================
