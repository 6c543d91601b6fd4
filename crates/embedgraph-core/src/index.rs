//! # Field Index
//!
//! Secondary index over scalar payload fields:
//! `namespace -> FieldToken(field, value) -> NodeKey -> present`.
//!
//! The index is derived state. It is only mutated by the node store's
//! upsert and delete paths, through `add` and `remove`, and it never decides
//! whether a node exists: search results are always re-resolved against the
//! node store.
//!
//! Entries are soft-deleted. `remove` flags an entry absent and keeps the
//! slot; `compact` is the only operation that physically drops entries.
//!
//! ## Invariant
//!
//! For every live node `N` and every indexed scalar field `F = v` of `N`,
//! `(N.namespace, F:v)` contains `N.key` flagged present. Stale values are
//! flagged absent before a changed payload is re-added.

use crate::config::GraphConfig;
use crate::query::Filter;
use crate::{FieldToken, Node, NodeKey};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A bucket: every node key ever indexed under one token, with its flag.
type Bucket = BTreeMap<NodeKey, bool>;

/// The field index. Obtain one through `Graph::index` for inspection.
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    namespaces: BTreeMap<String, BTreeMap<FieldToken, Bucket>>,
}

/// Entry counts of the field index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Distinct `(namespace, field, value)` buckets.
    pub tokens: usize,
    /// Entries flagged present.
    pub live_entries: usize,
    /// Entries flagged absent and still occupying a slot.
    pub retracted_entries: usize,
}

/// Tokens a node contributes to the index under `config`.
fn tokens<'a>(node: &'a Node, config: &'a GraphConfig) -> impl Iterator<Item = FieldToken> + 'a {
    node.payload()
        .scalar_fields()
        .filter(|(field, _)| config.is_indexed(node.namespace(), field))
        .map(|(field, value)| FieldToken::new(field, value.clone()))
}

impl FieldIndex {
    /// Index every scalar field of `node`, flagged present.
    pub(crate) fn add(&mut self, node: &Node, config: &GraphConfig) {
        let buckets = self
            .namespaces
            .entry(node.namespace().to_owned())
            .or_default();
        for token in tokens(node, config) {
            tracing::trace!(node = %node.key(), %token, "index add");
            buckets
                .entry(token)
                .or_default()
                .insert(node.key().clone(), true);
        }
    }

    /// Flag every entry `node` contributed as absent.
    ///
    /// Slots that were never created are left alone.
    pub(crate) fn remove(&mut self, node: &Node, config: &GraphConfig) {
        let Some(buckets) = self.namespaces.get_mut(node.namespace()) else {
            return;
        };
        for token in tokens(node, config) {
            if let Some(present) = buckets
                .get_mut(&token)
                .and_then(|bucket| bucket.get_mut(node.key()))
            {
                tracing::trace!(node = %node.key(), %token, "index retract");
                *present = false;
            }
        }
    }

    /// Keys flagged present in every bucket named by `filter`.
    ///
    /// Empty when the namespace was never indexed, when the filter is empty,
    /// or when any filter token has no bucket at all. Otherwise the first
    /// bucket seeds the candidate set and each following bucket prunes keys
    /// it does not hold as present.
    pub(crate) fn candidates(&self, namespace: &str, filter: &Filter) -> BTreeSet<&NodeKey> {
        let Some(buckets) = self.namespaces.get(namespace) else {
            return BTreeSet::new();
        };

        let mut selected = Vec::with_capacity(filter.len());
        for token in filter.tokens() {
            match buckets.get(&token) {
                Some(bucket) => selected.push(bucket),
                None => return BTreeSet::new(),
            }
        }

        let Some((first, rest)) = selected.split_first() else {
            return BTreeSet::new();
        };

        let mut keys: BTreeSet<&NodeKey> = first
            .iter()
            .filter(|(_, present)| **present)
            .map(|(key, _)| key)
            .collect();

        for bucket in rest {
            if keys.is_empty() {
                break;
            }
            keys.retain(|key| bucket.get(*key).copied().unwrap_or(false));
        }

        keys
    }

    /// Raw flag for one entry: `Some(true)` present, `Some(false)` retracted,
    /// `None` if the slot was never created.
    #[must_use]
    pub fn entry(&self, namespace: &str, token: &FieldToken, key: &NodeKey) -> Option<bool> {
        self.namespaces
            .get(namespace)?
            .get(token)?
            .get(key)
            .copied()
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats::default();
        for bucket in self.namespaces.values().flat_map(BTreeMap::values) {
            stats.tokens += 1;
            for present in bucket.values() {
                if *present {
                    stats.live_entries += 1;
                } else {
                    stats.retracted_entries += 1;
                }
            }
        }
        stats
    }

    /// Drop retracted entries, then empty buckets and namespaces.
    /// Returns the number of entries dropped.
    pub(crate) fn compact(&mut self) -> usize {
        let mut dropped = 0;
        for buckets in self.namespaces.values_mut() {
            for bucket in buckets.values_mut() {
                let before = bucket.len();
                bucket.retain(|_, present| *present);
                dropped += before - bucket.len();
            }
            buckets.retain(|_, bucket| !bucket.is_empty());
        }
        self.namespaces.retain(|_, buckets| !buckets.is_empty());
        dropped
    }
}

// =============================================================================
// TESTS
// =============================================================================
