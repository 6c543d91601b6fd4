//! # Query Module
//!
//! Structured read operations over a `GraphStore`.
//!
//! - `Filter`: an AND of exact `field = value` matches for `search`
//! - `QueryType` / `Query`: read operations as data, so a host program can
//!   build them from its own input and run them through `Query::execute`

use crate::graph::GraphStore;
use crate::system::GraphMetrics;
use crate::{FieldToken, Node, NodeKey, Record, Scalar};
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// FILTER
// =============================================================================

/// Exact-match filter: every `field = value` pair must hold.
///
/// There is no OR, NOT, range or partial match. Setting the same field
/// twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    fields: BTreeMap<String, Scalar>,
}

impl Filter {
    /// Create an empty filter. An empty filter matches nothing in `search`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// One index token per condition.
    pub fn tokens(&self) -> impl Iterator<Item = FieldToken> + '_ {
        self.fields
            .iter()
            .map(|(field, value)| FieldToken::new(field.as_str(), value.clone()))
    }

    /// Whether `record` satisfies every condition.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.fields.iter().all(|(field, expected)| {
            record
                .get(field)
                .and_then(|value| value.as_scalar())
                .is_some_and(|actual| actual == expected)
        })
    }
}

impl<K: Into<String>, V: Into<Scalar>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |filter, (field, value)| filter.eq(field, value))
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// Read operations supported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryType {
    /// Lookup a node by namespace and id.
    Get { namespace: String, id: String },

    /// Equality search within one namespace.
    Search { namespace: String, filter: Filter },

    /// Whether an edge is present.
    Exists {
        relation: String,
        from: NodeKey,
        to: NodeKey,
    },

    /// Targets of `from`. `depth` 1 is a single hop.
    Traverse {
        from: NodeKey,
        relation: String,
        depth: usize,
    },

    /// Nodes with an edge pointing at `to`.
    Sources { to: NodeKey, relation: String },

    /// Store statistics.
    Metrics,
}

/// A structured read operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The type of query operation.
    pub query_type: QueryType,
}

/// The answer to a `Query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QueryResult {
    Node(Option<Node>),
    Nodes(Vec<Node>),
    Exists(bool),
    Metrics(GraphMetrics),
}

impl Query {
    #[must_use]
    pub fn new(query_type: QueryType) -> Self {
        Self { query_type }
    }

    /// Get helper.
    #[must_use]
    pub fn get(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(QueryType::Get {
            namespace: namespace.into(),
            id: id.into(),
        })
    }

    /// Search helper.
    #[must_use]
    pub fn search(namespace: impl Into<String>, filter: Filter) -> Self {
        Self::new(QueryType::Search {
            namespace: namespace.into(),
            filter,
        })
    }

    /// Single-hop traverse helper.
    #[must_use]
    pub fn traverse(from: NodeKey, relation: impl Into<String>) -> Self {
        Self::new(QueryType::Traverse {
            from,
            relation: relation.into(),
            depth: 1,
        })
    }

    /// Run the query. Queries never fail.
    pub fn execute<G: GraphStore>(&self, graph: &G) -> QueryResult {
        match &self.query_type {
            QueryType::Get { namespace, id } => QueryResult::Node(graph.get(namespace, id)),
            QueryType::Search { namespace, filter } => {
                QueryResult::Nodes(graph.search(namespace, filter))
            }
            QueryType::Exists { relation, from, to } => {
                QueryResult::Exists(graph.exists(relation, from, to))
            }
            QueryType::Traverse {
                from,
                relation,
                depth,
            } => QueryResult::Nodes(if *depth == 1 {
                graph.traverse(from, relation)
            } else {
                graph.traverse_depth(from, relation, *depth)
            }),
            QueryType::Sources { to, relation } => QueryResult::Nodes(graph.sources(to, relation)),
            QueryType::Metrics => QueryResult::Metrics(graph.metrics()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
