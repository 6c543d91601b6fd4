//! # Graph Metrics
//!
//! Size and soft-delete statistics for a store.
//!
//! Retracted index entries and soft-deleted edges keep their slots until the
//! next `compact`; the metrics expose how many such slots are waiting.

use crate::Graph;
use crate::index::IndexStats;
use serde::Serialize;

/// A snapshot of store statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphMetrics {
    /// Total number of nodes.
    pub node_count: usize,
    /// Namespaces holding at least one node.
    pub namespace_count: usize,
    /// Relation names with at least one slot (present or soft-deleted).
    pub relation_count: usize,
    /// Edges flagged present.
    pub edge_count: usize,
    /// Edges flagged absent, reclaimable by `compact`.
    pub deleted_edge_count: usize,
    /// Field-index statistics.
    pub index: IndexStats,
}

impl GraphMetrics {
    /// Compute metrics from a graph.
    #[must_use]
    pub fn from_graph(graph: &Graph) -> Self {
        let (edge_count, deleted_edge_count) = graph.edge_counts();
        Self {
            node_count: graph.node_count(),
            namespace_count: graph.namespace_count(),
            relation_count: graph.relations().count(),
            edge_count,
            deleted_edge_count,
            index: graph.index().stats(),
        }
    }

    /// Slots held by soft-deleted entries.
    #[must_use]
    pub fn reclaimable(&self) -> usize {
        self.deleted_edge_count
            .saturating_add(self.index.retracted_entries)
    }
}

// =============================================================================
// TESTS
// =============================================================================
