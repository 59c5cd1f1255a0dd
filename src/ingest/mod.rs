//! Graph ingestor
//!
//! Orchestrates the full load against the sink: uniqueness constraint →
//! bulk node creation → batched edge upsert → batched label upsert →
//! batched embedding attach. Every phase runs to completion before the
//! next begins, every write is an upsert, and any failure aborts the run;
//! re-running the whole pipeline from the start is the recovery path.

pub mod batch;

use crate::embeddings::{EmbeddingError, EmbeddingSource};
use crate::matrix::{EncodingError, MatrixBundle, Triple};
use crate::sink::{GraphSink, SinkError, Value};
use batch::{BatchWriter, DEFAULT_BATCH_SIZE};
use thiserror::Error;
use tracing::{debug, info};

/// Umbrella error for an ingest run. Nothing is swallowed or downgraded:
/// the first failure terminates the run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("matrix error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

/// The Cypher statements the ingestor executes. Public so test doubles
/// can interpret them by identity.
pub mod cypher {
    /// Idempotent uniqueness declaration for `Node.id`.
    pub const UNIQUE_NODE_ID: &str =
        "CREATE CONSTRAINT IF NOT EXISTS FOR (n:Node) REQUIRE n.id IS UNIQUE";

    /// Bulk-create one `Node` per integer in `[0, $n)`.
    pub const CREATE_NODES: &str = "\
UNWIND range(0, $n - 1) AS id
MERGE (:Node {id: id})";

    /// Upsert one undirected weighted `CONNECTED` relationship per record.
    /// The undirected MERGE matches either direction before creating, so a
    /// symmetric matrix yields one relationship per unordered pair.
    pub const UPSERT_EDGES: &str = "\
UNWIND $triples AS triple
WITH triple.node1 AS node1, triple.node2 AS node2, triple.weight AS weight
MATCH (n1:Node {id: node1})
MATCH (n2:Node {id: node2})
MERGE (n1)-[connected:CONNECTED]-(n2)
SET connected.weight = weight";

    /// Upsert the `Label` node and its `LABEL` relationship per record.
    pub const UPSERT_LABELS: &str = "\
UNWIND $triples AS triple
WITH triple.node AS node, triple.label AS label
MATCH (n:Node {id: node})
MERGE (l:Label {id: label})
MERGE (n)-[:LABEL]-(l)";

    /// Set the `referenceEmbedding` vector per record.
    pub const SET_EMBEDDINGS: &str = "\
UNWIND $pairs AS pair
WITH pair.node AS node, pair.embedding AS embedding
MATCH (n:Node {id: node})
SET n.referenceEmbedding = embedding";
}

/// Orchestrates the load. Holds a borrowed sink rather than any
/// module-level driver state; the caller decides the session's lifetime.
pub struct GraphIngestor<'a> {
    sink: &'a dyn GraphSink,
    batch_size: usize,
}

impl<'a> GraphIngestor<'a> {
    pub fn new(sink: &'a dyn GraphSink) -> Self {
        Self {
            sink,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Declare that `id` on `Node` is unique. No-op on repeat.
    pub async fn ensure_unique_constraint(&self) -> Result<(), IngestError> {
        debug!("ensuring Node.id uniqueness constraint");
        self.sink.run(cypher::UNIQUE_NODE_ID, Vec::new()).await?;
        Ok(())
    }

    /// Create one `Node` per integer in `[0, n)` via upsert.
    pub async fn create_all_nodes(&self, n: usize) -> Result<(), IngestError> {
        info!(nodes = n, "creating graph nodes");
        self.sink
            .run(cypher::CREATE_NODES, vec![("n", Value::Int(n as i64))])
            .await?;
        Ok(())
    }

    /// Consume the adjacency triple sequence, upserting one weighted
    /// `CONNECTED` relationship per triple. Weights are overwritten, not
    /// accumulated.
    pub async fn upsert_edges(
        &self,
        triples: impl Iterator<Item = Triple>,
    ) -> Result<(), IngestError> {
        let mut writer = BatchWriter::new(self.batch_size);
        let mut total = 0usize;
        for triple in triples {
            total += 1;
            let record = Value::record([
                ("node1", Value::Int(triple.row as i64)),
                ("node2", Value::Int(triple.col as i64)),
                ("weight", Value::Float(triple.value)),
            ]);
            if let Some(full) = writer.push(record) {
                self.flush(cypher::UPSERT_EDGES, "triples", full).await?;
            }
        }
        if let Some(rest) = writer.finish() {
            self.flush(cypher::UPSERT_EDGES, "triples", rest).await?;
        }
        info!(edges = total, "edge upsert complete");
        Ok(())
    }

    /// Consume the label-matrix triple sequence, upserting the `Label`
    /// node and the `LABEL` relationship per triple. The value component
    /// carries binary membership in the source data and is dropped.
    pub async fn upsert_labels(
        &self,
        triples: impl Iterator<Item = Triple>,
    ) -> Result<(), IngestError> {
        let mut writer = BatchWriter::new(self.batch_size);
        let mut total = 0usize;
        for triple in triples {
            total += 1;
            let record = Value::record([
                ("node", Value::Int(triple.row as i64)),
                ("label", Value::Int(triple.col as i64)),
            ]);
            if let Some(full) = writer.push(record) {
                self.flush(cypher::UPSERT_LABELS, "triples", full).await?;
            }
        }
        if let Some(rest) = writer.finish() {
            self.flush(cypher::UPSERT_LABELS, "triples", rest).await?;
        }
        info!(labels = total, "label upsert complete");
        Ok(())
    }

    /// Attach each node's embedding vector as its `referenceEmbedding`
    /// property, looking vectors up by the id's string form. A missing
    /// vector aborts the whole phase.
    pub async fn attach_embeddings(
        &self,
        n: usize,
        source: &dyn EmbeddingSource,
    ) -> Result<(), IngestError> {
        let mut writer = BatchWriter::new(self.batch_size);
        for id in 0..n {
            let key = id.to_string();
            let vector = source
                .vector(&key)
                .ok_or(EmbeddingError::Lookup(key))?;
            let record = Value::record([
                ("node", Value::Int(id as i64)),
                (
                    "embedding",
                    Value::List(vector.iter().map(|&v| Value::Float(v)).collect()),
                ),
            ]);
            if let Some(full) = writer.push(record) {
                self.flush(cypher::SET_EMBEDDINGS, "pairs", full).await?;
            }
        }
        if let Some(rest) = writer.finish() {
            self.flush(cypher::SET_EMBEDDINGS, "pairs", rest).await?;
        }
        info!(nodes = n, "embedding attach complete");
        Ok(())
    }

    async fn flush(
        &self,
        statement: &str,
        key: &'static str,
        records: Vec<Value>,
    ) -> Result<(), SinkError> {
        debug!(records = records.len(), "flushing batch");
        self.sink
            .run(statement, vec![(key, Value::List(records))])
            .await
    }
}

/// The full control flow: constraint → nodes → edges → labels (when the
/// bundle carries a label matrix) → embeddings (when a source is given).
pub async fn ingest_bundle(
    sink: &dyn GraphSink,
    bundle: &MatrixBundle,
    embeddings: Option<&dyn EmbeddingSource>,
    batch_size: usize,
) -> Result<(), IngestError> {
    let ingestor = GraphIngestor::new(sink).with_batch_size(batch_size);
    let (n, _) = bundle.network.shape();

    ingestor.ensure_unique_constraint().await?;
    ingestor.create_all_nodes(n).await?;
    ingestor.upsert_edges(bundle.network.triples()).await?;
    if let Some(group) = &bundle.group {
        ingestor.upsert_labels(group.triples()).await?;
    }
    if let Some(source) = embeddings {
        ingestor.attach_embeddings(n, source).await?;
    }
    Ok(())
}
