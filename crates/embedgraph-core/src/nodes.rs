//! # Node Store
//!
//! Owns every node payload, grouped by namespace then id.
//! This is the source of truth for node existence: the field index and the
//! edge store only hold `NodeKey`s and resolve them here.

use crate::{Node, NodeKey};
use std::collections::BTreeMap;

/// Node storage: namespace -> id -> Node.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeStore {
    namespaces: BTreeMap<String, BTreeMap<String, Node>>,
}

impl NodeStore {
    pub(crate) fn get(&self, namespace: &str, id: &str) -> Option<&Node> {
        self.namespaces.get(namespace)?.get(id)
    }

    /// Resolve a composite key. Always a fresh lookup.
    pub(crate) fn resolve(&self, key: &NodeKey) -> Option<&Node> {
        self.get(key.namespace(), key.id())
    }

    pub(crate) fn contains(&self, key: &NodeKey) -> bool {
        self.resolve(key).is_some()
    }

    /// Store `node`, replacing and returning any node at the same key.
    pub(crate) fn insert(&mut self, node: Node) -> Option<Node> {
        self.namespaces
            .entry(node.namespace().to_owned())
            .or_default()
            .insert(node.id().to_owned(), node)
    }

    /// Remove and return the node. Empty namespaces are dropped.
    pub(crate) fn remove(&mut self, namespace: &str, id: &str) -> Option<Node> {
        let ids = self.namespaces.get_mut(namespace)?;
        let removed = ids.remove(id);
        if ids.is_empty() {
            self.namespaces.remove(namespace);
        }
        removed
    }

    /// Nodes of one namespace, in id order.
    pub(crate) fn in_namespace<'a>(&'a self, namespace: &str) -> impl Iterator<Item = &'a Node> {
        self.namespaces
            .get(namespace)
            .into_iter()
            .flat_map(BTreeMap::values)
    }

    pub(crate) fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    pub(crate) fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }
}
