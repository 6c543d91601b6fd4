//! # Edge Store
//!
//! Directed, named relations: `relation -> from -> to -> present`.
//!
//! Each `(relation, from, to)` triple is either absent (the default) or
//! present. Deleting flips the flag and keeps the slot, so the triple can be
//! toggled back and forth indefinitely. Endpoint validation is the caller's
//! job (`Graph::add_edge`); this module only records arcs.

use crate::NodeKey;
use std::collections::BTreeMap;

type Targets = BTreeMap<NodeKey, bool>;

#[derive(Debug, Clone, Default)]
pub(crate) struct EdgeStore {
    relations: BTreeMap<String, BTreeMap<NodeKey, Targets>>,
}

impl EdgeStore {
    /// Mark the triple present, creating intermediate levels lazily.
    pub(crate) fn insert(&mut self, relation: &str, from: &NodeKey, to: &NodeKey) {
        self.relations
            .entry(relation.to_owned())
            .or_default()
            .entry(from.clone())
            .or_default()
            .insert(to.clone(), true);
    }

    /// Mark the triple absent. A triple that was never recorded is already
    /// absent and no slot is created for it.
    pub(crate) fn remove(&mut self, relation: &str, from: &NodeKey, to: &NodeKey) {
        if let Some(present) = self
            .relations
            .get_mut(relation)
            .and_then(|sources| sources.get_mut(from))
            .and_then(|targets| targets.get_mut(to))
        {
            *present = false;
        }
    }

    pub(crate) fn contains(&self, relation: &str, from: &NodeKey, to: &NodeKey) -> bool {
        self.relations
            .get(relation)
            .and_then(|sources| sources.get(from))
            .and_then(|targets| targets.get(to))
            .copied()
            .unwrap_or(false)
    }

    /// Present targets of `from` under `relation`, in key order.
    pub(crate) fn targets<'a>(
        &'a self,
        relation: &str,
        from: &NodeKey,
    ) -> impl Iterator<Item = &'a NodeKey> {
        self.relations
            .get(relation)
            .and_then(|sources| sources.get(from))
            .into_iter()
            .flat_map(|targets| targets.iter())
            .filter(|(_, present)| **present)
            .map(|(to, _)| to)
    }

    /// Present sources pointing at `to` under `relation`, in key order.
    pub(crate) fn sources<'a>(
        &'a self,
        relation: &str,
        to: &'a NodeKey,
    ) -> impl Iterator<Item = &'a NodeKey> {
        self.relations
            .get(relation)
            .into_iter()
            .flat_map(|sources| sources.iter())
            .filter(move |(_, targets)| targets.get(to).copied().unwrap_or(false))
            .map(|(from, _)| from)
    }

    pub(crate) fn relations(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }

    /// `(present, retracted)` triple counts.
    pub(crate) fn counts(&self) -> (usize, usize) {
        self.relations
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .fold((0, 0), |(live, dead), present| {
                if *present {
                    (live + 1, dead)
                } else {
                    (live, dead + 1)
                }
            })
    }

    /// Drop retracted triples and any level left empty.
    /// Returns the number of triples dropped.
    pub(crate) fn compact(&mut self) -> usize {
        let mut dropped = 0;
        for sources in self.relations.values_mut() {
            for targets in sources.values_mut() {
                let before = targets.len();
                targets.retain(|_, present| *present);
                dropped += before - targets.len();
            }
            sources.retain(|_, targets| !targets.is_empty());
        }
        self.relations.retain(|_, sources| !sources.is_empty());
        dropped
    }
}
