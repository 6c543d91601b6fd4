//! # Store Configuration
//!
//! Per-namespace index policy, fixed when the store is created.
//!
//! By default every scalar field of every payload is indexed. A namespace can
//! instead name the exact set of fields it wants indexed; filters on other
//! fields of that namespace then match nothing, the same as a filter on a
//! field no node carries.
//!
//! ```toml
//! [namespaces.Employee]
//! index = ["Title", "IsManager"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Store-wide configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    /// Namespace name -> settings. Namespaces not listed use the defaults.
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceConfig>,
}

/// Settings for one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceConfig {
    /// Fields to index. `None` indexes every scalar field.
    #[serde(default)]
    pub index: Option<BTreeSet<String>>,
}

impl GraphConfig {
    /// Create the default configuration (index everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict indexing of `namespace` to the given fields.
    #[must_use]
    pub fn index_only<I, S>(mut self, namespace: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces.entry(namespace.into()).or_default().index =
            Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `field` of nodes in `namespace` goes into the field index.
    #[must_use]
    pub fn is_indexed(&self, namespace: &str, field: &str) -> bool {
        self.namespaces
            .get(namespace)
            .and_then(|ns| ns.index.as_ref())
            .is_none_or(|fields| fields.contains(field))
    }
}
