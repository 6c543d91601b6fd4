//! # Shared Graph
//!
//! A cloneable, thread-safe handle to one `Graph`.
//!
//! The whole store sits behind a single `RwLock`, so a node upsert and its
//! index refresh are one critical section: readers see either the old node
//! with its old index entries or the new node with its new ones.
//!
//! A panic while the write lock is held poisons it. Operations here recover
//! the guard instead of failing, which keeps lookups total; every store
//! operation finishes its index update before returning, so a poisoned lock
//! can only follow a panic outside the store's own code paths.

use crate::graph::{CompactionReport, Graph, GraphStore};
use crate::query::Filter;
use crate::system::GraphMetrics;
use crate::{GraphError, Node, NodeKey, Value};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared handle; clones refer to the same store.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<Graph>>,
}

impl SharedGraph {
    /// Wrap an existing graph.
    #[must_use]
    pub fn new(graph: Graph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Graph> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Graph> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with shared access. Several reads may run concurrently.
    pub fn with_read<R>(&self, f: impl FnOnce(&Graph) -> R) -> R {
        f(&self.read())
    }

    /// Run `f` with exclusive access, e.g. to apply several mutations
    /// without readers observing the intermediate states.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> R {
        f(&mut self.write())
    }
}

impl From<Graph> for SharedGraph {
    fn from(graph: Graph) -> Self {
        Self::new(graph)
    }
}

impl GraphStore for SharedGraph {
    fn upsert(
        &mut self,
        namespace: &str,
        id: &str,
        payload: impl Into<Value>,
    ) -> Result<Node, GraphError> {
        self.write().upsert(namespace, id, payload)
    }

    fn get(&self, namespace: &str, id: &str) -> Option<Node> {
        self.read().get(namespace, id)
    }

    fn delete(&mut self, namespace: &str, id: &str) {
        self.write().delete(namespace, id);
    }

    fn search(&self, namespace: &str, filter: &Filter) -> Vec<Node> {
        self.read().search(namespace, filter)
    }

    fn add_edge(
        &mut self,
        relation: &str,
        from: &NodeKey,
        to: &NodeKey,
    ) -> Result<(), GraphError> {
        self.write().add_edge(relation, from, to)
    }

    fn delete_edge(&mut self, relation: &str, from: &NodeKey, to: &NodeKey) {
        self.write().delete_edge(relation, from, to);
    }

    fn exists(&self, relation: &str, from: &NodeKey, to: &NodeKey) -> bool {
        self.read().exists(relation, from, to)
    }

    fn traverse(&self, from: &NodeKey, relation: &str) -> Vec<Node> {
        self.read().traverse(from, relation)
    }

    fn traverse_depth(&self, from: &NodeKey, relation: &str, depth: usize) -> Vec<Node> {
        self.read().traverse_depth(from, relation, depth)
    }

    fn sources(&self, to: &NodeKey, relation: &str) -> Vec<Node> {
        self.read().sources(to, relation)
    }

    fn compact(&mut self) -> CompactionReport {
        self.write().compact()
    }

    fn metrics(&self) -> GraphMetrics {
        self.read().metrics()
    }
}

// =============================================================================
// TESTS
// =============================================================================
