//! Bolt implementation of [`GraphSink`] over neo4rs.

use super::{GraphSink, Params, SinkError, Value};
use async_trait::async_trait;
use neo4rs::{query, BoltType, Graph};
use std::collections::HashMap;

/// A [`GraphSink`] writing through a pooled Bolt connection.
///
/// Owns its `Graph` handle; dropping the sink releases the session on all
/// exit paths. Writes submitted through one sink are serialized by the
/// driver, which is all the sequential pipeline needs.
pub struct Neo4jSink {
    graph: Graph,
}

impl Neo4jSink {
    /// Connect to a Bolt endpoint, e.g. `bolt://localhost:7687`.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, SinkError> {
        let graph = Graph::new(uri, user, password)
            .await
            .map_err(classify)?;
        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphSink for Neo4jSink {
    async fn run(&self, cypher: &str, params: Params) -> Result<(), SinkError> {
        let mut q = query(cypher);
        for (name, value) in params {
            q = q.param(name, bolt(value));
        }
        self.graph.run(q).await.map_err(classify)
    }
}

/// Convert a parameter [`Value`] into the driver's wire type.
fn bolt(value: Value) -> BoltType {
    match value {
        Value::Int(i) => i.into(),
        Value::Float(f) => f.into(),
        Value::String(s) => s.into(),
        Value::List(items) => items
            .into_iter()
            .map(bolt)
            .collect::<Vec<BoltType>>()
            .into(),
        Value::Map(fields) => fields
            .into_iter()
            .map(|(k, v)| (k, bolt(v)))
            .collect::<HashMap<String, BoltType>>()
            .into(),
    }
}

/// Constraint conflicts get their own variant; everything else is a plain
/// query failure.
fn classify(err: neo4rs::Error) -> SinkError {
    let text = err.to_string();
    if text.contains("ConstraintValidation") {
        SinkError::ConstraintViolation(text)
    } else {
        SinkError::Query(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bolt_converts_nested_records() {
        let record = Value::record([
            ("node1", Value::Int(0)),
            ("weight", Value::Float(2.0)),
        ]);
        match bolt(Value::List(vec![record])) {
            BoltType::List(list) => {
                assert_eq!(list.len(), 1);
                assert!(matches!(list.value[0], BoltType::Map(_)));
            }
            other => panic!("expected a Bolt list, got {:?}", other),
        }
    }

    #[test]
    fn bolt_converts_scalars() {
        assert!(matches!(bolt(Value::Int(7)), BoltType::Integer(_)));
        assert!(matches!(bolt(Value::Float(1.5)), BoltType::Float(_)));
        assert!(matches!(bolt(Value::String("x".into())), BoltType::String(_)));
    }
}
