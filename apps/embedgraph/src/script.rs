//! # Scripts
//!
//! A script is a JSON array of steps, each an object tagged by `op`:
//!
//! ```json
//! [
//!   {"op": "upsert", "namespace": "Employee", "id": "123",
//!    "payload": {"$type": "embedgraph.Employee", "Title": "Senior Manager", "IsManager": true}},
//!   {"op": "add_edge", "relation": "manage",
//!    "from": {"namespace": "Employee", "id": "123"},
//!    "to": {"namespace": "Employee", "id": "456"}},
//!   {"op": "search", "namespace": "Employee", "filter": {"IsManager": true}}
//! ]
//! ```
//!
//! JSON objects in payloads become records named by their `$type` key
//! (empty when absent). Integers become `Int`, or `UInt` above `i64::MAX`;
//! other numbers become `Float`. Filter values must be scalars.
//!
//! Steps compile to core `Mutation`s and `Query`s. A run executes them in
//! order and report one outcome per step as it completes; a failing step does
//! not stop the run unless fail-fast is requested.

use crate::error::AppError;
use crate::input::{self, MAX_SCRIPT_FILE_SIZE};
use embedgraph_core::{
    Applied, Filter, GraphStore, Mutation, MutationEngine, NodeKey, Query, QueryResult, QueryType,
    Record, Scalar, Value,
};
use serde::de::{self, DeserializeSeed, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Maximum number of steps in one script.
pub const MAX_SCRIPT_STEPS: usize = 1_000_000;

/// Key naming the record type inside a JSON object.
pub const TYPE_KEY: &str = "$type";

// =============================================================================
// STEPS
// =============================================================================

/// One step of a script, as written.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Upsert {
        #[serde(default)]
        namespace: String,
        id: String,
        payload: serde_json::Value,
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
    Get {
        namespace: String,
        id: String,
    },
    Search {
        namespace: String,
        filter: BTreeMap<String, serde_json::Value>,
    },
    Exists {
        relation: String,
        from: NodeKey,
        to: NodeKey,
    },
    Traverse {
        from: NodeKey,
        relation: String,
        #[serde(default = "single_hop")]
        depth: usize,
    },
    Sources {
        to: NodeKey,
        relation: String,
    },
    Compact,
    Metrics,
}

const fn single_hop() -> usize {
    1
}

/// A compiled step: either a write or a read.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Mutate(Mutation),
    Read(Query),
}

impl Step {
    /// The `op` tag of this step.
    pub const fn op(&self) -> &'static str {
        match self {
            Self::Upsert { .. } => "upsert",
            Self::Delete { .. } => "delete",
            Self::AddEdge { .. } => "add_edge",
            Self::DeleteEdge { .. } => "delete_edge",
            Self::Get { .. } => "get",
            Self::Search { .. } => "search",
            Self::Exists { .. } => "exists",
            Self::Traverse { .. } => "traverse",
            Self::Sources { .. } => "sources",
            Self::Compact => "compact",
            Self::Metrics => "metrics",
        }
    }

    /// Convert JSON values to store values and build the core operation.
    pub fn compile(&self) -> Result<Action, String> {
        let action = match self.clone() {
            Self::Upsert {
                namespace,
                id,
                payload,
            } => Action::Mutate(Mutation::Upsert {
                namespace,
                id,
                payload: to_value(&payload)?,
            }),
            Self::Delete { namespace, id } => Action::Mutate(Mutation::Delete { namespace, id }),
            Self::AddEdge { relation, from, to } => {
                Action::Mutate(Mutation::AddEdge { relation, from, to })
            }
            Self::DeleteEdge { relation, from, to } => {
                Action::Mutate(Mutation::DeleteEdge { relation, from, to })
            }
            Self::Compact => Action::Mutate(Mutation::Compact),
            Self::Get { namespace, id } => Action::Read(Query::get(namespace, id)),
            Self::Search { namespace, filter } => {
                let filter = filter
                    .iter()
                    .map(|(field, json)| {
                        to_scalar(json)
                            .map(|value| (field.as_str(), value))
                            .ok_or_else(|| format!("filter field '{field}' is not a scalar"))
                    })
                    .collect::<Result<Filter, String>>()?;
                Action::Read(Query::search(namespace, filter))
            }
            Self::Exists { relation, from, to } => {
                Action::Read(Query::new(QueryType::Exists { relation, from, to }))
            }
            Self::Traverse {
                from,
                relation,
                depth,
            } => Action::Read(Query::new(QueryType::Traverse {
                from,
                relation,
                depth,
            })),
            Self::Sources { to, relation } => {
                Action::Read(Query::new(QueryType::Sources { to, relation }))
            }
            Self::Metrics => Action::Read(Query::new(QueryType::Metrics)),
        };
        Ok(action)
    }
}

// =============================================================================
// JSON -> VALUE
// =============================================================================

/// Convert a JSON scalar. Returns `None` for null, arrays and objects.
pub fn to_scalar(json: &serde_json::Value) -> Option<Scalar> {
    match json {
        serde_json::Value::Bool(b) => Some(Scalar::from(*b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Scalar::from)
            .or_else(|| n.as_u64().map(Scalar::from))
            .or_else(|| n.as_f64().map(Scalar::from)),
        serde_json::Value::String(s) => Some(Scalar::from(s.as_str())),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            None
        }
    }
}

/// Convert any JSON value. Objects become records.
pub fn to_value(json: &serde_json::Value) -> Result<Value, String> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Array(items) => items
            .iter()
            .map(to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        serde_json::Value::Object(map) => {
            let type_name = match map.get(TYPE_KEY) {
                None => "",
                Some(serde_json::Value::String(name)) => name.as_str(),
                Some(other) => return Err(format!("'{TYPE_KEY}' must be a string, got {other}")),
            };
            let mut record = Record::new(type_name);
            for (field, value) in map.iter().filter(|(field, _)| *field != TYPE_KEY) {
                record.set(field.as_str(), to_value(value)?);
            }
            Ok(Value::Record(record))
        }
        scalar => to_scalar(scalar)
            .map(Value::Scalar)
            .ok_or_else(|| format!("unsupported JSON value {scalar}")),
    }
}

// =============================================================================
// SCRIPT
// =============================================================================

/// What a step produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Applied(Applied),
    Query(QueryResult),
}

/// The recorded result of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Output>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A parsed script.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    steps: Vec<Step>,
}

/// Collects steps, refusing the array once it grows past `limit`.
struct StepsSeed {
    limit: usize,
}

impl<'de> DeserializeSeed<'de> for StepsSeed {
    type Value = Vec<Step>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for StepsSeed {
    type Value = Vec<Step>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an array of at most {} steps", self.limit)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut steps = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(self.limit));
        while let Some(step) = seq.next_element::<Step>()? {
            if steps.len() == self.limit {
                return Err(de::Error::custom(format!(
                    "script has more than {} steps",
                    self.limit
                )));
            }
            steps.push(step);
        }
        Ok(steps)
    }
}

impl Script {
    /// Parse a script from JSON text.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        Self::parse_with_limit(text, MAX_SCRIPT_STEPS)
    }

    /// Parse a script, stopping as soon as it exceeds `limit` steps.
    fn parse_with_limit(text: &str, limit: usize) -> Result<Self, AppError> {
        let mut deserializer = serde_json::Deserializer::from_str(text);
        let steps = StepsSeed { limit }.deserialize(&mut deserializer)?;
        deserializer.end()?;
        Ok(Self { steps })
    }

    /// Read and parse a script file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = input::read_to_string(path, MAX_SCRIPT_FILE_SIZE)?;
        Self::parse(&text)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Compile every step, failing on the first one that cannot be built.
    pub fn compile(&self) -> Result<Vec<Action>, AppError> {
        self.steps
            .iter()
            .enumerate()
            .map(|(step, s)| s.compile().map_err(|message| AppError::Script { step, message }))
            .collect()
    }

    /// Execute the script against `graph`, collecting the outcomes.
    pub fn run<G: GraphStore>(
        &self,
        graph: &mut G,
        fail_fast: bool,
    ) -> Result<Vec<StepOutcome>, AppError> {
        let mut outcomes = Vec::with_capacity(self.steps.len());
        self.run_with(graph, fail_fast, |outcome| {
            outcomes.push(outcome);
            Ok(())
        })?;
        Ok(outcomes)
    }

    /// Execute the script against `graph`, handing each outcome to `emit`
    /// as soon as its step has run.
    ///
    /// The whole script is compiled first, so a malformed step fails the run
    /// before anything is applied. A failing store step is emitted like any
    /// other; with `fail_fast` its error then ends the run.
    pub fn run_with<G, F>(
        &self,
        graph: &mut G,
        fail_fast: bool,
        mut emit: F,
    ) -> Result<(), AppError>
    where
        G: GraphStore,
        F: FnMut(StepOutcome) -> Result<(), AppError>,
    {
        let actions = self.compile()?;

        for (step, (source, action)) in self.steps.iter().zip(actions).enumerate() {
            let op = source.op();
            let result = match action {
                Action::Mutate(mutation) => {
                    MutationEngine::apply(graph, &mutation).map(Output::Applied)
                }
                Action::Read(query) => Ok(Output::Query(query.execute(graph))),
            };

            match result {
                Ok(output) => {
                    tracing::trace!(step, op, "step done");
                    emit(StepOutcome {
                        step,
                        op,
                        ok: true,
                        result: Some(output),
                        error: None,
                    })?;
                }
                Err(err) => {
                    emit(StepOutcome {
                        step,
                        op,
                        ok: false,
                        result: None,
                        error: Some(err.to_string()),
                    })?;
                    if fail_fast {
                        tracing::warn!(step, op, error = %err, "step failed, stopping");
                        return Err(err.into());
                    }
                    tracing::warn!(step, op, error = %err, "step failed");
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
