//! # Mutation Engine
//!
//! Write operations as data.
//!
//! Each `Mutation` maps to exactly one `GraphStore` call. A batch is applied
//! in order and is not atomic: mutations before a failing one stay applied.

use crate::graph::{CompactionReport, GraphStore};
use crate::{GraphError, Node, NodeKey, Value};
use serde::Serialize;

/// A single write against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Upsert {
        namespace: String,
        id: String,
        payload: Value,
    },
    Delete {
        namespace: String,
        id: String,
    },
    AddEdge {
        relation: String,
        from: NodeKey,
        to: NodeKey,
    },
    DeleteEdge {
        relation: String,
        from: NodeKey,
        to: NodeKey,
    },
    Compact,
}

/// What a successful mutation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Applied {
    /// The stored node (upsert).
    Node(Node),
    /// Nothing to report (delete, edge changes).
    Done,
    /// What compaction dropped.
    Compacted(CompactionReport),
}

/// Applies `Mutation`s to any `GraphStore`.
pub struct MutationEngine;

impl MutationEngine {
    /// Apply one mutation.
    pub fn apply<G: GraphStore>(graph: &mut G, mutation: &Mutation) -> Result<Applied, GraphError> {
        match mutation {
            Mutation::Upsert {
                namespace,
                id,
                payload,
            } => graph
                .upsert(namespace, id, payload.clone())
                .map(Applied::Node),
            Mutation::Delete { namespace, id } => {
                graph.delete(namespace, id);
                Ok(Applied::Done)
            }
            Mutation::AddEdge { relation, from, to } => {
                graph.add_edge(relation, from, to).map(|()| Applied::Done)
            }
            Mutation::DeleteEdge { relation, from, to } => {
                graph.delete_edge(relation, from, to);
                Ok(Applied::Done)
            }
            Mutation::Compact => Ok(Applied::Compacted(graph.compact())),
        }
    }

    /// Apply mutations in order, stopping at the first failure.
    ///
    /// Returns how many were applied before the failure.
    pub fn apply_all<G: GraphStore>(
        graph: &mut G,
        mutations: &[Mutation],
    ) -> Result<usize, (usize, GraphError)> {
        for (applied, mutation) in mutations.iter().enumerate() {
            Self::apply(graph, mutation).map_err(|err| (applied, err))?;
        }
        Ok(mutations.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
