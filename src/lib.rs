//! Matgraph: sparse-matrix to property-graph ingestor
//!
//! Materializes a graph stored as a sparse adjacency matrix into a Neo4j
//! labeled property graph: one `Node` per matrix row/column index, one
//! weighted `CONNECTED` relationship per nonzero entry, optional `Label`
//! nodes connected by `LABEL` relationships, and optional per-node
//! embedding vectors attached as a `referenceEmbedding` property.
//!
//! # Pipeline
//!
//! - [`matrix`] normalizes the four supported sparse encodings into a
//!   lazy stream of `(row, col, value)` triples
//! - [`ingest`] batches those triples into parameterized upserts against
//!   a [`sink::GraphSink`]
//! - [`embeddings`] supplies per-node vectors for the optional
//!   embedding-attach phase
//!
//! Every write is an upsert, so re-running the whole pipeline is always a
//! correct recovery from any failure.

pub mod embeddings;
pub mod ingest;
pub mod matrix;
pub mod sink;

pub use embeddings::{EmbeddingError, EmbeddingSource, WordVectors};
pub use ingest::{ingest_bundle, GraphIngestor, IngestError};
pub use matrix::{CooMatrix, EncodingError, MatrixBundle, SparseMatrix, Triple, Triples};
pub use sink::{GraphSink, Neo4jSink, Params, SinkError, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
