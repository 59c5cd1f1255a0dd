//! GraphSink trait and query parameter model
//!
//! The sink is the boundary through which the ingestor writes: it accepts
//! a Cypher statement plus a parameter bundle and executes it as one
//! transactional unit. Production is Bolt via [`Neo4jSink`]; tests
//! substitute in-memory doubles.

pub mod neo4j;

pub use neo4j::Neo4jSink;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from the query-execution boundary.
///
/// Never retried or downgraded here; any failure aborts the current batch
/// and propagates. The caller's recovery path is re-running the whole
/// idempotent pipeline.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A write conflicted with the uniqueness constraint in a way that is
    /// not a benign re-run. Should not occur under correct upsert usage.
    #[error("uniqueness constraint violated: {0}")]
    ConstraintViolation(String),

    /// Any other driver failure: connectivity, timeout, malformed query.
    #[error("query execution failed: {0}")]
    Query(String),
}

/// A Cypher parameter value.
///
/// Small closed model covering what the ingest statements need: scalars,
/// vectors, and UNWIND-able lists of records.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    /// Build a record (`Map`) from field name/value pairs.
    pub fn record<I>(fields: I) -> Value
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        Value::Map(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Named parameters for one statement execution.
pub type Params = Vec<(&'static str, Value)>;

/// The minimal capability the ingestor requires from the store: execute a
/// parameterized statement within a session, blocking until acknowledged.
///
/// Implementations must support UNWIND-style list-of-records input,
/// MERGE-style upsert, and schema-level uniqueness declarations.
#[async_trait]
pub trait GraphSink: Send + Sync {
    async fn run(&self, cypher: &str, params: Params) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_builds_a_map() {
        let record = Value::record([("node", Value::Int(3)), ("weight", Value::Float(1.5))]);
        let map = record.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["node"].as_i64(), Some(3));
        assert_eq!(map["weight"].as_f64(), Some(1.5));
    }

    #[test]
    fn accessors_reject_other_variants() {
        assert!(Value::Int(1).as_list().is_none());
        assert!(Value::List(vec![]).as_i64().is_none());
        assert!(Value::String("x".into()).as_map().is_none());
    }

    #[test]
    fn as_f64_widens_integers() {
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
    }
}
