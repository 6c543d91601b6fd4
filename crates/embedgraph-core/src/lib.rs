//! # embedgraph-core
//!
//! An embedded, in-memory entity/relationship store.
//!
//! Three structures cooperate:
//! - **Node store**: owns every node, keyed by `(namespace, id)`. It is the
//!   only source of truth for existence.
//! - **Field index**: derived from node mutations; maps
//!   `(namespace, field, value)` to the keys of nodes carrying that value,
//!   and answers equality searches by intersecting buckets.
//! - **Edge store**: directed, named relations between node keys, validated
//!   against the node store when created.
//!
//! ```
//! use embedgraph_core::{Filter, Graph, GraphStore, Record};
//!
//! let mut graph = Graph::new();
//! let alice = graph
//!     .upsert("Employee", "1", Record::new("Employee").with("Title", "Manager"))
//!     .expect("record payload");
//! let bob = graph
//!     .upsert("Employee", "2", Record::new("Employee").with("Title", "Engineer"))
//!     .expect("record payload");
//! graph.add_edge("manages", alice.key(), bob.key()).expect("both exist");
//!
//! let managers = graph.search("Employee", &Filter::new().eq("Title", "Manager"));
//! assert_eq!(managers, vec![alice.clone()]);
//! assert_eq!(graph.traverse(alice.key(), "manages"), vec![bob]);
//! ```
//!
//! ## Constraints
//!
//! - No async, no I/O, no persistence
//! - Deterministic iteration (`BTreeMap` everywhere)
//! - `Graph` is single-threaded; `SharedGraph` adds one store-wide lock

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
mod edges;
pub mod graph;
pub mod index;
pub mod mutation;
mod nodes;
pub mod primitives;
pub mod query;
pub mod shared;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{FieldToken, GraphError, Node, NodeKey, Record, Scalar, Value};

// =============================================================================
// RE-EXPORTS: Store
// =============================================================================

pub use config::{GraphConfig, NamespaceConfig};
pub use graph::{CompactionReport, Graph, GraphStore};
pub use index::{FieldIndex, IndexStats};
pub use mutation::{Applied, Mutation, MutationEngine};
pub use query::{Filter, Query, QueryResult, QueryType};
pub use shared::SharedGraph;
pub use system::GraphMetrics;
