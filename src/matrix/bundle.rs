//! Serialized matrix bundle
//!
//! The on-disk input is a JSON document carrying the adjacency matrix
//! under `"network"` and an optional label matrix under `"group"`. Each
//! matrix is tagged with its encoding and uses the conventional
//! `data`/`indices`/`indptr` array names for the compressed forms.

use super::{EncodingError, SparseMatrix};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Wire form of one matrix. Kept separate from [`SparseMatrix`] so that
/// deserialized arrays always pass through the validating constructors.
#[derive(Debug, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
enum MatrixRepr {
    Csr {
        shape: (usize, usize),
        data: Vec<f64>,
        indices: Vec<usize>,
        indptr: Vec<usize>,
    },
    Csc {
        shape: (usize, usize),
        data: Vec<f64>,
        indices: Vec<usize>,
        indptr: Vec<usize>,
    },
    Coo {
        shape: (usize, usize),
        row: Vec<usize>,
        col: Vec<usize>,
        data: Vec<f64>,
    },
    Dok {
        shape: (usize, usize),
        entries: Vec<(usize, usize, f64)>,
    },
}

impl TryFrom<MatrixRepr> for SparseMatrix {
    type Error = EncodingError;

    fn try_from(repr: MatrixRepr) -> Result<Self, EncodingError> {
        match repr {
            MatrixRepr::Csr {
                shape,
                data,
                indices,
                indptr,
            } => SparseMatrix::csr(shape, data, indices, indptr),
            MatrixRepr::Csc {
                shape,
                data,
                indices,
                indptr,
            } => SparseMatrix::csc(shape, data, indices, indptr),
            MatrixRepr::Coo {
                shape,
                row,
                col,
                data,
            } => SparseMatrix::coo(shape, row, col, data),
            MatrixRepr::Dok { shape, entries } => {
                let map: HashMap<(usize, usize), f64> = entries
                    .into_iter()
                    .map(|(r, c, v)| ((r, c), v))
                    .collect();
                SparseMatrix::dok(shape, map)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct BundleRepr {
    network: MatrixRepr,
    group: Option<MatrixRepr>,
}

/// The loaded input bundle: adjacency matrix plus optional label matrix.
#[derive(Debug, Clone)]
pub struct MatrixBundle {
    /// Adjacency matrix; rows/columns index the graph nodes.
    pub network: SparseMatrix,
    /// Label matrix; rows index graph nodes, columns index labels.
    pub group: Option<SparseMatrix>,
}

impl MatrixBundle {
    /// Load and validate a bundle from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EncodingError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate a bundle from JSON text.
    pub fn from_json(text: &str) -> Result<Self, EncodingError> {
        let repr: BundleRepr = serde_json::from_str(text)?;
        Ok(MatrixBundle {
            network: repr.network.try_into()?,
            group: match repr.group {
                Some(g) => Some(g.try_into()?),
                None => None,
            },
        })
    }
}
