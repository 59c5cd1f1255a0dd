//! Shared test doubles for the ingest pipeline.

use async_trait::async_trait;
use matgraph::ingest::cypher;
use matgraph::{GraphSink, Params, SinkError, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// In-memory stand-in for the store.
///
/// Interprets the ingestor's statements with genuine upsert semantics —
/// MERGE-like create-if-absent, MATCH-like row dropping, undirected edge
/// identity — so idempotence and end-to-end shape are observable without
/// a running server.
pub struct MemoryGraph {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    constraint_declared: bool,
    nodes: BTreeSet<i64>,
    labels: BTreeSet<i64>,
    /// CONNECTED relationships keyed by unordered node pair, as the
    /// undirected MERGE produces them.
    edges: BTreeMap<(i64, i64), f64>,
    /// LABEL relationships keyed by (node, label).
    label_edges: BTreeSet<(i64, i64)>,
    embeddings: BTreeMap<i64, Vec<f64>>,
    /// Statements executed, in order.
    statements: Vec<String>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn constraint_declared(&self) -> bool {
        self.state.lock().unwrap().constraint_declared
    }

    pub fn node_ids(&self) -> Vec<i64> {
        self.state.lock().unwrap().nodes.iter().copied().collect()
    }

    pub fn edge_count(&self) -> usize {
        self.state.lock().unwrap().edges.len()
    }

    /// Weight of the CONNECTED relationship between two nodes, if any.
    /// Direction-insensitive, like the relationship itself.
    pub fn edge_weight(&self, a: i64, b: i64) -> Option<f64> {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.state.lock().unwrap().edges.get(&key).copied()
    }

    pub fn label_ids(&self) -> Vec<i64> {
        self.state.lock().unwrap().labels.iter().copied().collect()
    }

    pub fn label_edges(&self) -> Vec<(i64, i64)> {
        self.state.lock().unwrap().label_edges.iter().copied().collect()
    }

    pub fn embedding(&self, node: i64) -> Option<Vec<f64>> {
        self.state.lock().unwrap().embeddings.get(&node).cloned()
    }

    /// How many times a given statement was executed.
    pub fn runs_of(&self, statement: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .statements
            .iter()
            .filter(|s| s.as_str() == statement)
            .count()
    }
}

fn param<'a>(params: &'a Params, name: &str) -> Result<&'a Value, SinkError> {
    params
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .ok_or_else(|| SinkError::Query(format!("missing parameter ${}", name)))
}

fn records<'a>(params: &'a Params, name: &str) -> Result<&'a [Value], SinkError> {
    param(params, name)?
        .as_list()
        .ok_or_else(|| SinkError::Query(format!("${} is not a list", name)))
}

fn field(record: &Value, name: &str) -> Result<Value, SinkError> {
    record
        .as_map()
        .and_then(|m| m.get(name).cloned())
        .ok_or_else(|| SinkError::Query(format!("record is missing '{}'", name)))
}

fn int_field(record: &Value, name: &str) -> Result<i64, SinkError> {
    field(record, name)?
        .as_i64()
        .ok_or_else(|| SinkError::Query(format!("'{}' is not an integer", name)))
}

#[async_trait]
impl GraphSink for MemoryGraph {
    async fn run(&self, cypher_text: &str, params: Params) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(cypher_text.to_string());

        if cypher_text == cypher::UNIQUE_NODE_ID {
            // Idempotent by declaration.
            state.constraint_declared = true;
        } else if cypher_text == cypher::CREATE_NODES {
            let n = param(&params, "n")?
                .as_i64()
                .ok_or_else(|| SinkError::Query("$n is not an integer".to_string()))?;
            for id in 0..n {
                state.nodes.insert(id);
            }
        } else if cypher_text == cypher::UPSERT_EDGES {
            for record in records(&params, "triples")? {
                let node1 = int_field(record, "node1")?;
                let node2 = int_field(record, "node2")?;
                let weight = field(record, "weight")?
                    .as_f64()
                    .ok_or_else(|| SinkError::Query("'weight' is not numeric".to_string()))?;
                // MATCH drops rows whose endpoints don't exist.
                if !state.nodes.contains(&node1) || !state.nodes.contains(&node2) {
                    continue;
                }
                let key = if node1 <= node2 {
                    (node1, node2)
                } else {
                    (node2, node1)
                };
                state.edges.insert(key, weight);
            }
        } else if cypher_text == cypher::UPSERT_LABELS {
            for record in records(&params, "triples")? {
                let node = int_field(record, "node")?;
                let label = int_field(record, "label")?;
                if !state.nodes.contains(&node) {
                    continue;
                }
                state.labels.insert(label);
                state.label_edges.insert((node, label));
            }
        } else if cypher_text == cypher::SET_EMBEDDINGS {
            for record in records(&params, "pairs")? {
                let node = int_field(record, "node")?;
                let embedding = field(record, "embedding")?;
                let vector: Vec<f64> = embedding
                    .as_list()
                    .ok_or_else(|| SinkError::Query("'embedding' is not a list".to_string()))?
                    .iter()
                    .map(|v| {
                        v.as_f64()
                            .ok_or_else(|| SinkError::Query("non-numeric component".to_string()))
                    })
                    .collect::<Result<_, _>>()?;
                if !state.nodes.contains(&node) {
                    continue;
                }
                state.embeddings.insert(node, vector);
            }
        } else {
            return Err(SinkError::Query(format!(
                "unsupported statement: {}",
                cypher_text
            )));
        }
        Ok(())
    }
}
