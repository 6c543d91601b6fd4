//! # Graph Store
//!
//! The in-memory store combining the node store, the field index and the
//! edge store behind the `GraphStore` trait.
//!
//! Every node mutation updates the field index inside the same call, so a
//! caller can never observe a node whose index entries lag behind it. Edge
//! mutations read the node store for validation and never write to it.
//!
//! All maps are `BTreeMap`s, so result order is deterministic (key order).
//! Callers should still not depend on it; only set membership is part of
//! the contract.

use crate::config::GraphConfig;
use crate::edges::EdgeStore;
use crate::index::FieldIndex;
use crate::nodes::NodeStore;
use crate::primitives::MAX_TRAVERSAL_DEPTH;
use crate::query::Filter;
use crate::system::GraphMetrics;
use crate::{GraphError, Node, NodeKey, Value};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// The operations of an embedgraph store.
///
/// Only `upsert` and `add_edge` can fail; everything else treats "nothing
/// there" as an ordinary empty, `false` or no-op result.
pub trait GraphStore {
    /// Insert or replace the node at `(namespace, id)`.
    ///
    /// An empty `namespace` defaults to the record's type name. When a node
    /// already exists with a different payload, its index entries are
    /// retracted before the new payload is indexed. Returns the stored node.
    fn upsert(
        &mut self,
        namespace: &str,
        id: &str,
        payload: impl Into<Value>,
    ) -> Result<Node, GraphError>;

    /// Lookup a node.
    fn get(&self, namespace: &str, id: &str) -> Option<Node>;

    /// Remove a node and retract its index entries. No-op if absent.
    /// Edges touching the node are kept; traversals skip them.
    fn delete(&mut self, namespace: &str, id: &str);

    /// Nodes of `namespace` matching every `field = value` pair of `filter`.
    fn search(&self, namespace: &str, filter: &Filter) -> Vec<Node>;

    /// Record `from -[relation]-> to`. Both endpoints must exist now.
    fn add_edge(&mut self, relation: &str, from: &NodeKey, to: &NodeKey)
    -> Result<(), GraphError>;

    /// Soft-delete an edge. No-op if it was never recorded.
    fn delete_edge(&mut self, relation: &str, from: &NodeKey, to: &NodeKey);

    /// Whether the edge is recorded and not deleted.
    fn exists(&self, relation: &str, from: &NodeKey, to: &NodeKey) -> bool;

    /// Direct targets of `from` under `relation`. Dangling targets are skipped.
    fn traverse(&self, from: &NodeKey, relation: &str) -> Vec<Node>;

    /// Breadth-first targets of `from` under `relation` up to `depth` hops.
    ///
    /// Each node is returned once, the start node never. Depth is clamped to
    /// `MAX_TRAVERSAL_DEPTH`. Dangling targets are skipped and not expanded.
    fn traverse_depth(&self, from: &NodeKey, relation: &str, depth: usize) -> Vec<Node>;

    /// Nodes with a present `relation` edge pointing at `to`.
    fn sources(&self, to: &NodeKey, relation: &str) -> Vec<Node>;

    /// Physically drop soft-deleted index entries and edges.
    fn compact(&mut self) -> CompactionReport;

    /// Size and soft-delete statistics.
    fn metrics(&self) -> GraphMetrics;
}

/// What a `compact` call dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompactionReport {
    /// Retracted field-index entries removed.
    pub index_entries: usize,
    /// Soft-deleted edges removed.
    pub edges: usize,
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The in-memory store.
///
/// Not synchronized: wrap it in `SharedGraph` to use it from several threads.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    config: GraphConfig,
    nodes: NodeStore,
    index: FieldIndex,
    edges: EdgeStore,
}

impl Graph {
    /// Create an empty store that indexes every scalar field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given index configuration.
    #[must_use]
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Read-only view of the field index.
    #[must_use]
    pub fn index(&self) -> &FieldIndex {
        &self.index
    }

    /// Nodes of one namespace, in id order.
    pub fn nodes<'a>(&'a self, namespace: &str) -> impl Iterator<Item = &'a Node> {
        self.nodes.in_namespace(namespace)
    }

    /// Namespaces holding at least one node.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.nodes.namespaces()
    }

    /// Relation names ever used, including fully soft-deleted ones until
    /// the next `compact`.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.edges.relations()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn namespace_count(&self) -> usize {
        self.nodes.namespace_count()
    }

    /// `(present, soft-deleted)` edge counts.
    #[must_use]
    pub fn edge_counts(&self) -> (usize, usize) {
        self.edges.counts()
    }

    fn resolve_all<'a>(&self, keys: impl IntoIterator<Item = &'a NodeKey>) -> Vec<Node> {
        keys.into_iter()
            .filter_map(|key| self.nodes.resolve(key))
            .cloned()
            .collect()
    }
}

impl GraphStore for Graph {
    fn upsert(
        &mut self,
        namespace: &str,
        id: &str,
        payload: impl Into<Value>,
    ) -> Result<Node, GraphError> {
        let record = match payload.into() {
            Value::Record(record) => record,
            other => {
                tracing::debug!(namespace, id, kind = other.kind(), "upsert rejected");
                return Err(GraphError::NotARecord { kind: other.kind() });
            }
        };

        let namespace = if namespace.is_empty() {
            record.type_name()
        } else {
            namespace
        };
        let key = NodeKey::new(namespace, id);

        if let Some(previous) = self.nodes.resolve(&key)
            && previous.payload() != &record
        {
            tracing::debug!(node = %key, "payload changed, retracting index entries");
            self.index.remove(previous, &self.config);
        }

        let node = Node::new(key, record);
        self.index.add(&node, &self.config);
        self.nodes.insert(node.clone());
        Ok(node)
    }

    fn get(&self, namespace: &str, id: &str) -> Option<Node> {
        self.nodes.get(namespace, id).cloned()
    }

    fn delete(&mut self, namespace: &str, id: &str) {
        if let Some(node) = self.nodes.remove(namespace, id) {
            tracing::debug!(node = %node.key(), "node deleted");
            self.index.remove(&node, &self.config);
        }
    }

    fn search(&self, namespace: &str, filter: &Filter) -> Vec<Node> {
        self.index
            .candidates(namespace, filter)
            .into_iter()
            .filter_map(|key| self.nodes.resolve(key))
            .filter(|node| filter.matches(node.payload()))
            .cloned()
            .collect()
    }

    fn add_edge(
        &mut self,
        relation: &str,
        from: &NodeKey,
        to: &NodeKey,
    ) -> Result<(), GraphError> {
        if !self.nodes.contains(from) {
            tracing::debug!(relation, %from, "edge rejected: source missing");
            return Err(GraphError::FromNotFound(from.clone()));
        }
        if !self.nodes.contains(to) {
            tracing::debug!(relation, %to, "edge rejected: target missing");
            return Err(GraphError::ToNotFound(to.clone()));
        }
        self.edges.insert(relation, from, to);
        Ok(())
    }

    fn delete_edge(&mut self, relation: &str, from: &NodeKey, to: &NodeKey) {
        self.edges.remove(relation, from, to);
    }

    fn exists(&self, relation: &str, from: &NodeKey, to: &NodeKey) -> bool {
        self.edges.contains(relation, from, to)
    }

    fn traverse(&self, from: &NodeKey, relation: &str) -> Vec<Node> {
        self.resolve_all(self.edges.targets(relation, from))
    }

    fn traverse_depth(&self, from: &NodeKey, relation: &str, depth: usize) -> Vec<Node> {
        let depth = depth.min(MAX_TRAVERSAL_DEPTH);
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        let mut found = Vec::new();

        visited.insert(from);
        queue.push_back((from, 0usize));

        while let Some((current, current_depth)) = queue.pop_front() {
            if current_depth >= depth {
                continue;
            }
            for next in self.edges.targets(relation, current) {
                if !visited.insert(next) {
                    continue;
                }
                if let Some(node) = self.nodes.resolve(next) {
                    found.push(node.clone());
                    queue.push_back((next, current_depth.saturating_add(1)));
                }
            }
        }

        found
    }

    fn sources(&self, to: &NodeKey, relation: &str) -> Vec<Node> {
        self.resolve_all(self.edges.sources(relation, to))
    }

    fn compact(&mut self) -> CompactionReport {
        let report = CompactionReport {
            index_entries: self.index.compact(),
            edges: self.edges.compact(),
        };
        tracing::debug!(
            index_entries = report.index_entries,
            edges = report.edges,
            "compacted"
        );
        report
    }

    fn metrics(&self) -> GraphMetrics {
        GraphMetrics::from_graph(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldToken, Record};

    fn employee(title: &str, manager: bool) -> Record {
        Record::new("Employee")
            .with("Title", title)
            .with("IsManager", manager)
    }

    fn ids(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(Node::id).collect()
    }

    #[test]
    fn upsert_and_get() {
        let mut graph = Graph::new();
        let node = graph
            .upsert("Employee", "123", employee("Senior Manager", true))
            .expect("upsert");

        assert_eq!(graph.get("Employee", "123"), Some(node));
        assert_eq!(graph.get("Employee", "999"), None);
    }

    #[test]
    fn upsert_rejects_non_record_payload() {
        let mut graph = Graph::new();
        let result = graph.upsert("Fool", "1", 1);

        assert_eq!(result, Err(GraphError::NotARecord { kind: "int" }));
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.index().stats().tokens, 0);
    }

    #[test]
    fn empty_namespace_defaults_to_type_name() {
        let mut graph = Graph::new();
        let node = graph
            .upsert("", "1", Record::new("embedgraph.Employee"))
            .expect("upsert");

        assert_eq!(node.namespace(), "embedgraph.Employee");
        assert_eq!(graph.namespaces().collect::<Vec<_>>(), vec!["embedgraph.Employee"]);
        assert_eq!(graph.get("embedgraph.Employee", "1"), Some(node));
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut graph = Graph::new();
        let first = graph
            .upsert("Employee", "123", employee("Senior Manager", true))
            .expect("first");
        let second = graph
            .upsert("Employee", "123", employee("Senior Manager", true))
            .expect("second");

        assert_eq!(first, second);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.index().stats().retracted_entries, 0);
    }

    #[test]
    fn update_retracts_stale_index_entries() {
        let mut graph = Graph::new();
        graph
            .upsert("Employee", "234", employee("Senior Engineer", false))
            .expect("insert");
        let updated = graph
            .upsert("Employee", "234", employee("Manager", true))
            .expect("update");

        let found = graph.search("Employee", &Filter::new().eq("Title", "Manager"));
        assert_eq!(found, vec![updated]);
        assert!(
            graph
                .search("Employee", &Filter::new().eq("Title", "Senior Engineer"))
                .is_empty()
        );
        assert_eq!(
            graph.index().entry(
                "Employee",
                &FieldToken::new("Title", "Senior Engineer"),
                &NodeKey::new("Employee", "234")
            ),
            Some(false)
        );
    }

    #[test]
    fn update_keeps_unchanged_fields_searchable() {
        let mut graph = Graph::new();
        graph
            .upsert("Employee", "1", employee("Engineer", true))
            .expect("insert");
        graph
            .upsert("Employee", "1", employee("Manager", true))
            .expect("update");

        let found = graph.search("Employee", &Filter::new().eq("IsManager", true));
        assert_eq!(ids(&found), vec!["1"]);
    }

    #[test]
    fn delete_is_idempotent_and_retracts_index() {
        let mut graph = Graph::new();
        graph
            .upsert("Employee", "123", employee("Senior Manager", true))
            .expect("upsert");

        graph.delete("Employee", "123");
        graph.delete("Employee", "123");

        assert_eq!(graph.get("Employee", "123"), None);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.index().stats().live_entries, 0);
    }

    #[test]
    fn search_requires_every_filter() {
        let mut graph = Graph::new();
        let record = |title: &str, dept: &str| {
            Record::new("Employee")
                .with("Title", title)
                .with("Dept", dept)
        };
        graph.upsert("Employee", "1", record("Manager", "A")).expect("a");
        graph.upsert("Employee", "2", record("Manager", "B")).expect("b");

        let title = Filter::new().eq("Title", "Manager");
        assert_eq!(ids(&graph.search("Employee", &title)), vec!["1", "2"]);

        let title_dept = Filter::new().eq("Title", "Manager").eq("Dept", "A");
        assert_eq!(ids(&graph.search("Employee", &title_dept)), vec!["1"]);

        let missing = Filter::new().eq("Title", "Manager").eq("Dept", "Z");
        assert!(graph.search("Employee", &missing).is_empty());
    }

    #[test]
    fn search_empty_filter_or_unknown_namespace() {
        let mut graph = Graph::new();
        graph
            .upsert("Employee", "1", employee("Manager", true))
            .expect("upsert");

        assert!(graph.search("Employee", &Filter::new()).is_empty());
        assert!(
            graph
                .search("Team", &Filter::new().eq("Title", "Manager"))
                .is_empty()
        );
    }

    #[test]
    fn search_matches_unsigned_and_signed_alike() {
        use crate::Scalar;

        let mut graph = Graph::new();
        graph
            .upsert("Counter", "1", Record::new("Counter").with("n", 5u64))
            .expect("upsert");
        graph
            .upsert("Counter", "2", Record::new("Counter").with("n", Scalar::UInt(6)))
            .expect("upsert");

        for filter in [
            Filter::new().eq("n", Scalar::UInt(5)),
            Filter::new().eq("n", 5u64),
            Filter::new().eq("n", 5i64),
        ] {
            assert_eq!(ids(&graph.search("Counter", &filter)), vec!["1"]);
        }
        assert_eq!(
            ids(&graph.search("Counter", &Filter::new().eq("n", 6))),
            vec!["2"]
        );
    }

    #[test]
    fn search_is_scoped_to_namespace() {
        let mut graph = Graph::new();
        graph
            .upsert("Employee", "1", employee("Manager", true))
            .expect("employee");
        graph
            .upsert("Contractor", "1", employee("Manager", true))
            .expect("contractor");

        let found = graph.search("Contractor", &Filter::new().eq("Title", "Manager"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].namespace(), "Contractor");
    }

    #[test]
    fn add_edge_validates_endpoints() {
        let mut graph = Graph::new();
        let a = NodeKey::new("Employee", "123");
        let b = NodeKey::new("Employee", "456");

        assert_eq!(
            graph.add_edge("manage", &a, &b),
            Err(GraphError::FromNotFound(a.clone()))
        );

        graph
            .upsert("Employee", "123", employee("Senior Manager", true))
            .expect("upsert");
        assert_eq!(
            graph.add_edge("manage", &a, &b),
            Err(GraphError::ToNotFound(b.clone()))
        );
        assert_eq!(graph.edge_counts(), (0, 0));
        assert_eq!(graph.relations().count(), 0);
    }

    #[test]
    fn edge_soft_delete_round_trip() {
        let mut graph = Graph::new();
        let a = graph
            .upsert("Employee", "123", employee("Senior Manager", true))
            .expect("a");
        let b = graph
            .upsert("Employee", "456", employee("Senior Engineer", false))
            .expect("b");

        graph.add_edge("manage", a.key(), b.key()).expect("edge");
        assert!(graph.exists("manage", a.key(), b.key()));
        assert!(!graph.exists("manage", b.key(), a.key()));

        graph.delete_edge("manage", a.key(), b.key());
        graph.delete_edge("manage", a.key(), b.key());
        assert!(!graph.exists("manage", a.key(), b.key()));
        assert!(graph.get("Employee", "123").is_some());
        assert!(graph.get("Employee", "456").is_some());

        graph.add_edge("manage", a.key(), b.key()).expect("re-add");
        assert!(graph.exists("manage", a.key(), b.key()));
    }

    #[test]
    fn traverse_skips_dangling_targets() {
        let mut graph = Graph::new();
        let a = graph
            .upsert("Employee", "1", employee("Manager", true))
            .expect("a");
        let b = graph
            .upsert("Employee", "2", employee("Engineer", false))
            .expect("b");
        graph.add_edge("manage", a.key(), b.key()).expect("edge");

        assert_eq!(graph.traverse(a.key(), "manage"), vec![b.clone()]);

        graph.delete("Employee", "2");
        assert!(graph.traverse(a.key(), "manage").is_empty());
        assert!(graph.exists("manage", a.key(), b.key()));
    }

    #[test]
    fn traverse_depth_walks_breadth_first() {
        let mut graph = Graph::new();
        let keys: Vec<NodeKey> = ["1", "2", "3", "4"]
            .iter()
            .map(|id| {
                graph
                    .upsert("Employee", id, employee("Engineer", false))
                    .expect("upsert")
                    .key()
                    .clone()
            })
            .collect();
        graph.add_edge("reports", &keys[0], &keys[1]).expect("edge");
        graph.add_edge("reports", &keys[1], &keys[2]).expect("edge");
        graph.add_edge("reports", &keys[2], &keys[3]).expect("edge");
        graph.add_edge("reports", &keys[3], &keys[0]).expect("cycle");

        assert_eq!(ids(&graph.traverse_depth(&keys[0], "reports", 2)), vec!["2", "3"]);
        assert_eq!(
            ids(&graph.traverse_depth(&keys[0], "reports", 50)),
            vec!["2", "3", "4"]
        );
        assert!(graph.traverse_depth(&keys[0], "reports", 0).is_empty());
    }

    #[test]
    fn sources_follow_edges_backwards() {
        let mut graph = Graph::new();
        let a = graph.upsert("Employee", "1", employee("Manager", true)).expect("a");
        let b = graph.upsert("Employee", "2", employee("Manager", true)).expect("b");
        let c = graph.upsert("Employee", "3", employee("Engineer", false)).expect("c");
        graph.add_edge("manage", a.key(), c.key()).expect("edge");
        graph.add_edge("manage", b.key(), c.key()).expect("edge");
        graph.delete_edge("manage", b.key(), c.key());

        assert_eq!(graph.sources(c.key(), "manage"), vec![a]);
    }

    #[test]
    fn compact_preserves_query_results() {
        let mut graph = Graph::new();
        let a = graph.upsert("Employee", "1", employee("Manager", true)).expect("a");
        let b = graph.upsert("Employee", "2", employee("Engineer", false)).expect("b");
        graph.add_edge("manage", a.key(), b.key()).expect("edge");
        graph.add_edge("mentor", a.key(), b.key()).expect("edge");
        graph.delete_edge("mentor", a.key(), b.key());
        graph.upsert("Employee", "2", employee("Manager", false)).expect("update");

        let filter = Filter::new().eq("Title", "Manager");
        let before = graph.search("Employee", &filter);

        let report = graph.compact();
        assert_eq!(report, CompactionReport { index_entries: 1, edges: 1 });
        assert_eq!(graph.search("Employee", &filter), before);
        assert!(graph.exists("manage", a.key(), b.key()));
        assert_eq!(graph.relations().collect::<Vec<_>>(), vec!["manage"]);
        assert_eq!(graph.compact(), CompactionReport::default());
    }

    #[test]
    fn nodes_lists_one_namespace() {
        let mut graph = Graph::new();
        graph.upsert("Employee", "2", employee("Manager", true)).expect("a");
        graph.upsert("Employee", "1", employee("Manager", true)).expect("b");
        graph.upsert("Team", "1", Record::new("Team")).expect("c");

        let listed: Vec<_> = graph.nodes("Employee").map(Node::id).collect();
        assert_eq!(listed, vec!["1", "2"]);
        assert_eq!(graph.namespace_count(), 2);
    }

    #[test]
    fn restricted_index_still_stores_payload() {
        let config = GraphConfig::new().index_only("Employee", ["Title"]);
        let mut graph = Graph::with_config(config);
        graph
            .upsert("Employee", "1", employee("Manager", true))
            .expect("upsert");

        assert_eq!(
            ids(&graph.search("Employee", &Filter::new().eq("Title", "Manager"))),
            vec!["1"]
        );
        assert!(
            graph
                .search("Employee", &Filter::new().eq("IsManager", true))
                .is_empty()
        );
        let stored = graph.get("Employee", "1").expect("stored");
        assert!(stored.payload().get("IsManager").is_some());
    }
}
