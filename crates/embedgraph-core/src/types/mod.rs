//! # Core Type Definitions
//!
//! This module contains all core types for the embedgraph store:
//! - Node identity (`NodeKey`) and the stored `Node`
//! - Index bucket identity (`FieldToken`)
//! - Payload values (`Scalar`, `Value`, `Record`)
//! - Error types (`GraphError`)
//!
//! ## Structured Keys
//!
//! Composite keys and field tokens are pairs compared field by field, never
//! concatenated strings, so a `:` inside a namespace, id, field name or value
//! cannot make two distinct keys collide. The `namespace:id` and
//! `field:value` forms exist only through `Display`.

mod value;

pub use value::{Record, Scalar, Value};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// NODE KEY
// =============================================================================

/// Global identity of a node: the `(namespace, id)` pair.
///
/// `id` is unique only within its namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    namespace: String,
    id: String,
}

impl NodeKey {
    /// Create a new composite key.
    #[must_use]
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.id)
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A stored entity: its composite key plus its record payload.
///
/// A `Node` value is a snapshot. Stores hand out clones; the store itself
/// stays the only owner of the live entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    key: NodeKey,
    payload: Record,
}

impl Node {
    /// Create a node that is not yet stored anywhere.
    #[must_use]
    pub fn new(key: NodeKey, payload: Record) -> Self {
        Self { key, payload }
    }

    #[must_use]
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        self.key.namespace()
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.key.id()
    }

    #[must_use]
    pub fn payload(&self) -> &Record {
        &self.payload
    }
}

// =============================================================================
// FIELD TOKEN
// =============================================================================

/// Identity of one field-index bucket within a namespace: `field = value`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldToken {
    field: String,
    value: Scalar,
}

impl FieldToken {
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn value(&self) -> &Scalar {
        &self.value
    }
}

impl fmt::Display for FieldToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.value)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the store.
///
/// Only two operations can fail: upsert (payload shape) and edge creation
/// (endpoint existence). Neither writes any state when it fails. Lookups,
/// deletes, searches and traversals are total.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Upsert was given a payload that is not a structured record.
    #[error("payload is not a record (got {kind})")]
    NotARecord {
        /// Kind of the rejected value.
        kind: &'static str,
    },

    /// Edge creation referenced a source node that does not exist.
    #[error("edge source node not found: {0}")]
    FromNotFound(NodeKey),

    /// Edge creation referenced a target node that does not exist.
    #[error("edge target node not found: {0}")]
    ToNotFound(NodeKey),
}

// =============================================================================
// TESTS
// =============================================================================
