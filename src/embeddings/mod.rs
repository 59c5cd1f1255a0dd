//! Embedding lookup collaborator
//!
//! The embedding-attach phase looks vectors up by the node id's string
//! form. Production reads a word2vec-format text file ([`WordVectors`]);
//! tests substitute a plain map. Both sit behind the [`EmbeddingSource`]
//! trait so the ingestor never cares where vectors come from.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors from loading or querying embedding vectors.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to read embeddings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed embeddings file at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// A referenced node id has no vector. Fatal: aborts the whole
    /// embedding-attach phase, there is no best-effort mode.
    #[error("no embedding vector for node {0}")]
    Lookup(String),
}

/// Maps a node identifier string to a fixed-length numeric vector.
pub trait EmbeddingSource: Send + Sync {
    /// The vector for `key`, or `None` if the source has never seen it.
    fn vector(&self, key: &str) -> Option<&[f64]>;
}

impl EmbeddingSource for HashMap<String, Vec<f64>> {
    fn vector(&self, key: &str) -> Option<&[f64]> {
        self.get(key).map(Vec::as_slice)
    }
}

/// Word vectors parsed from the word2vec text format.
///
/// The file starts with a `<count> <dimension>` header line; every
/// following line is `<token> <v1> <v2> ...` with exactly `dimension`
/// components.
#[derive(Debug)]
pub struct WordVectors {
    vectors: HashMap<String, Vec<f64>>,
    dimension: usize,
}

impl WordVectors {
    /// Load a word2vec-format text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EmbeddingError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse word2vec-format text.
    pub fn parse(text: &str) -> Result<Self, EmbeddingError> {
        let mut lines = text.lines().enumerate();

        let (_, header) = lines.next().ok_or(EmbeddingError::Parse {
            line: 1,
            reason: "empty file, expected '<count> <dimension>' header".to_string(),
        })?;
        let mut header_fields = header.split_whitespace();
        let count = parse_header_field(header_fields.next(), "count")?;
        let dimension = parse_header_field(header_fields.next(), "dimension")?;
        if header_fields.next().is_some() {
            return Err(EmbeddingError::Parse {
                line: 1,
                reason: "header has more than two fields".to_string(),
            });
        }

        let mut vectors = HashMap::with_capacity(count);
        for (index, line) in lines {
            if line.is_empty() {
                continue;
            }
            let line_no = index + 1;
            let mut fields = line.split_whitespace();
            let token = fields.next().ok_or_else(|| EmbeddingError::Parse {
                line: line_no,
                reason: "blank vector line".to_string(),
            })?;
            let mut vector = Vec::with_capacity(dimension);
            for field in fields {
                let component = field.parse::<f64>().map_err(|e| EmbeddingError::Parse {
                    line: line_no,
                    reason: format!("bad vector component '{}': {}", field, e),
                })?;
                vector.push(component);
            }
            if vector.len() != dimension {
                return Err(EmbeddingError::Parse {
                    line: line_no,
                    reason: format!(
                        "vector has {} components, header declared {}",
                        vector.len(),
                        dimension
                    ),
                });
            }
            vectors.insert(token.to_string(), vector);
        }

        Ok(WordVectors { vectors, dimension })
    }

    /// Declared vector dimension from the header.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of tokens with a stored vector.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl EmbeddingSource for WordVectors {
    fn vector(&self, key: &str) -> Option<&[f64]> {
        self.vectors.get(key).map(Vec::as_slice)
    }
}

fn parse_header_field(field: Option<&str>, name: &str) -> Result<usize, EmbeddingError> {
    let field = field.ok_or_else(|| EmbeddingError::Parse {
        line: 1,
        reason: format!("header is missing the {} field", name),
    })?;
    field.parse::<usize>().map_err(|e| EmbeddingError::Parse {
        line: 1,
        reason: format!("bad {} '{}': {}", name, field, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "3 2\n0 0.5 -1.5\n1 2.0 3.0\n2 0.0 0.25\n";

    #[test]
    fn parses_header_and_vectors() {
        let vectors = WordVectors::parse(SAMPLE).unwrap();
        assert_eq!(vectors.dimension(), 2);
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors.vector("0"), Some([0.5, -1.5].as_slice()));
        assert_eq!(vectors.vector("2"), Some([0.0, 0.25].as_slice()));
    }

    #[test]
    fn lookup_miss_returns_none() {
        let vectors = WordVectors::parse(SAMPLE).unwrap();
        assert!(vectors.vector("99").is_none());
    }

    #[test]
    fn rejects_empty_file() {
        let err = WordVectors::parse("").unwrap_err();
        assert!(matches!(err, EmbeddingError::Parse { line: 1, .. }));
    }

    #[test]
    fn rejects_non_numeric_header() {
        let err = WordVectors::parse("three 2\n").unwrap_err();
        assert!(matches!(err, EmbeddingError::Parse { line: 1, .. }));
    }

    #[test]
    fn rejects_wrong_component_count() {
        let err = WordVectors::parse("1 3\n0 0.5 1.5\n").unwrap_err();
        match err {
            EmbeddingError::Parse { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("header declared 3"));
            }
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_non_numeric_component() {
        let err = WordVectors::parse("1 2\n0 0.5 oops\n").unwrap_err();
        assert!(matches!(err, EmbeddingError::Parse { line: 2, .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let vectors = WordVectors::load(file.path()).unwrap();
        assert_eq!(vectors.len(), 3);
    }

    #[test]
    fn load_propagates_io_errors() {
        let err = WordVectors::load("/nonexistent/vectors.txt").unwrap_err();
        assert!(matches!(err, EmbeddingError::Io(_)));
    }

    #[test]
    fn hashmap_is_a_source() {
        let mut map = HashMap::new();
        map.insert("7".to_string(), vec![1.0, 2.0]);
        let source: &dyn EmbeddingSource = &map;
        assert_eq!(source.vector("7"), Some([1.0, 2.0].as_slice()));
        assert!(source.vector("8").is_none());
    }
}
