//! Sparse matrix encodings and triple extraction
//!
//! A [`SparseMatrix`] is a tagged variant over the four supported on-disk
//! encodings (compressed-row, compressed-column, coordinate-list,
//! key-to-value dictionary). [`SparseMatrix::triples`] normalizes any of
//! them into a lazy, single-pass stream of `(row, col, value)` triples
//! covering every nonzero entry exactly once. Coordinate form is the
//! universal interchange encoding: anything that can produce coordinates
//! reaches the extractor through [`CooMatrix`].

mod bundle;

pub use bundle::MatrixBundle;

use std::collections::hash_map;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised when a matrix's internal indices are malformed.
///
/// All variants are fatal: a matrix that fails validation is rejected at
/// construction time and never reaches the extractor.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("offset array has length {got}, expected {expected}")]
    OffsetLength { got: usize, expected: usize },

    #[error("offset array decreases at position {0}")]
    OffsetOrder(usize),

    #[error("offset array ends at {got}, expected the stored entry count {expected}")]
    OffsetBound { got: usize, expected: usize },

    #[error("parallel arrays disagree in length: {0}")]
    ArrayLength(String),

    #[error("stored index ({row}, {col}) is outside matrix shape ({rows}, {cols})")]
    IndexOutOfShape {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("failed to read matrix bundle: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode matrix bundle: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One nonzero matrix entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triple {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

/// A sparse matrix in coordinate form: parallel row/column/value arrays.
///
/// This is the fallback interchange encoding. Any third-party sparse
/// representation that can enumerate its coordinates can be handed to the
/// extractor by building one of these and converting via `TryFrom`.
#[derive(Debug, Clone, PartialEq)]
pub struct CooMatrix {
    pub shape: (usize, usize),
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub values: Vec<f64>,
}

impl TryFrom<CooMatrix> for SparseMatrix {
    type Error = EncodingError;

    fn try_from(coo: CooMatrix) -> Result<Self, EncodingError> {
        SparseMatrix::coo(coo.shape, coo.rows, coo.cols, coo.values)
    }
}

/// An `n × m` numeric matrix where most entries are zero, in one of the
/// four supported encodings.
///
/// Construct through the validating constructors ([`SparseMatrix::csr`]
/// and friends), which reject malformed internal indices up front so the
/// extractor never has to.
#[derive(Debug, Clone, PartialEq)]
pub enum SparseMatrix {
    Csr {
        shape: (usize, usize),
        values: Vec<f64>,
        col_indices: Vec<usize>,
        row_offsets: Vec<usize>,
    },
    Csc {
        shape: (usize, usize),
        values: Vec<f64>,
        row_indices: Vec<usize>,
        col_offsets: Vec<usize>,
    },
    Coo {
        shape: (usize, usize),
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<f64>,
    },
    Dok {
        shape: (usize, usize),
        entries: HashMap<(usize, usize), f64>,
    },
}

/// Validate a compressed offset array: length `major + 1`, starting at 0,
/// non-decreasing, ending at the stored entry count.
fn check_offsets(offsets: &[usize], major: usize, stored: usize) -> Result<(), EncodingError> {
    if offsets.len() != major + 1 {
        return Err(EncodingError::OffsetLength {
            got: offsets.len(),
            expected: major + 1,
        });
    }
    if offsets[0] != 0 {
        return Err(EncodingError::OffsetOrder(0));
    }
    for i in 1..offsets.len() {
        if offsets[i] < offsets[i - 1] {
            return Err(EncodingError::OffsetOrder(i));
        }
    }
    let last = offsets[major];
    if last != stored {
        return Err(EncodingError::OffsetBound {
            got: last,
            expected: stored,
        });
    }
    Ok(())
}

fn check_in_shape(row: usize, col: usize, shape: (usize, usize)) -> Result<(), EncodingError> {
    if row >= shape.0 || col >= shape.1 {
        return Err(EncodingError::IndexOutOfShape {
            row,
            col,
            rows: shape.0,
            cols: shape.1,
        });
    }
    Ok(())
}

impl SparseMatrix {
    /// Compressed-row matrix from scipy-style `data`/`indices`/`indptr` arrays.
    pub fn csr(
        shape: (usize, usize),
        values: Vec<f64>,
        col_indices: Vec<usize>,
        row_offsets: Vec<usize>,
    ) -> Result<Self, EncodingError> {
        if values.len() != col_indices.len() {
            return Err(EncodingError::ArrayLength(format!(
                "{} values, {} column indices",
                values.len(),
                col_indices.len()
            )));
        }
        check_offsets(&row_offsets, shape.0, values.len())?;
        for (slot, &col) in col_indices.iter().enumerate() {
            // The owning row is implied by the offsets; only the stored
            // minor index can be out of range here.
            if col >= shape.1 {
                return Err(EncodingError::IndexOutOfShape {
                    row: row_of_slot(&row_offsets, slot),
                    col,
                    rows: shape.0,
                    cols: shape.1,
                });
            }
        }
        Ok(SparseMatrix::Csr {
            shape,
            values,
            col_indices,
            row_offsets,
        })
    }

    /// Compressed-column matrix, the transpose-symmetric twin of [`csr`](Self::csr).
    pub fn csc(
        shape: (usize, usize),
        values: Vec<f64>,
        row_indices: Vec<usize>,
        col_offsets: Vec<usize>,
    ) -> Result<Self, EncodingError> {
        if values.len() != row_indices.len() {
            return Err(EncodingError::ArrayLength(format!(
                "{} values, {} row indices",
                values.len(),
                row_indices.len()
            )));
        }
        check_offsets(&col_offsets, shape.1, values.len())?;
        for (slot, &row) in row_indices.iter().enumerate() {
            if row >= shape.0 {
                return Err(EncodingError::IndexOutOfShape {
                    row,
                    col: row_of_slot(&col_offsets, slot),
                    rows: shape.0,
                    cols: shape.1,
                });
            }
        }
        Ok(SparseMatrix::Csc {
            shape,
            values,
            row_indices,
            col_offsets,
        })
    }

    /// Coordinate-list matrix from parallel row/column/value arrays.
    pub fn coo(
        shape: (usize, usize),
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self, EncodingError> {
        if rows.len() != cols.len() || rows.len() != values.len() {
            return Err(EncodingError::ArrayLength(format!(
                "{} rows, {} cols, {} values",
                rows.len(),
                cols.len(),
                values.len()
            )));
        }
        for (&r, &c) in rows.iter().zip(cols.iter()) {
            check_in_shape(r, c, shape)?;
        }
        Ok(SparseMatrix::Coo {
            shape,
            rows,
            cols,
            values,
        })
    }

    /// Dictionary-of-keys matrix.
    pub fn dok(
        shape: (usize, usize),
        entries: HashMap<(usize, usize), f64>,
    ) -> Result<Self, EncodingError> {
        for &(r, c) in entries.keys() {
            check_in_shape(r, c, shape)?;
        }
        Ok(SparseMatrix::Dok { shape, entries })
    }

    /// `(rows, cols)` of the full matrix.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            SparseMatrix::Csr { shape, .. }
            | SparseMatrix::Csc { shape, .. }
            | SparseMatrix::Coo { shape, .. }
            | SparseMatrix::Dok { shape, .. } => *shape,
        }
    }

    /// Number of stored (nonzero) entries.
    pub fn nnz(&self) -> usize {
        match self {
            SparseMatrix::Csr { values, .. }
            | SparseMatrix::Csc { values, .. }
            | SparseMatrix::Coo { values, .. } => values.len(),
            SparseMatrix::Dok { entries, .. } => entries.len(),
        }
    }

    /// Lazy, single-pass iterator over every nonzero entry, exactly once.
    ///
    /// Enumeration order is encoding-dependent but stable for a given
    /// input: row-major for compressed-row, column-major for
    /// compressed-column, stored order for coordinate-list. The
    /// dictionary encoding iterates in the map's native (unordered)
    /// order; callers must not depend on it.
    pub fn triples(&self) -> Triples<'_> {
        let inner = match self {
            SparseMatrix::Csr {
                values,
                col_indices,
                row_offsets,
                ..
            } => Inner::Compressed {
                axis: Axis::Row,
                values,
                indices: col_indices,
                offsets: row_offsets,
                major: 0,
                slot: 0,
            },
            SparseMatrix::Csc {
                values,
                row_indices,
                col_offsets,
                ..
            } => Inner::Compressed {
                axis: Axis::Col,
                values,
                indices: row_indices,
                offsets: col_offsets,
                major: 0,
                slot: 0,
            },
            SparseMatrix::Coo {
                rows, cols, values, ..
            } => Inner::Coo {
                rows,
                cols,
                values,
                pos: 0,
            },
            SparseMatrix::Dok { entries, .. } => Inner::Dok(entries.iter()),
        };
        Triples { inner }
    }

    /// Copy of this matrix in coordinate form, in extraction order.
    pub fn to_coo(&self) -> CooMatrix {
        let mut rows = Vec::with_capacity(self.nnz());
        let mut cols = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());
        for t in self.triples() {
            rows.push(t.row);
            cols.push(t.col);
            values.push(t.value);
        }
        CooMatrix {
            shape: self.shape(),
            rows,
            cols,
            values,
        }
    }
}

/// Major index owning a stored slot, recovered from the offset array.
/// Only used for error reporting.
fn row_of_slot(offsets: &[usize], slot: usize) -> usize {
    offsets
        .windows(2)
        .position(|w| w[0] <= slot && slot < w[1])
        .unwrap_or(0)
}

#[derive(Clone, Copy)]
enum Axis {
    Row,
    Col,
}

/// Lazy iterator over the nonzero entries of a [`SparseMatrix`].
///
/// Finite and single-pass; never materializes the triple list.
pub struct Triples<'a> {
    inner: Inner<'a>,
}

enum Inner<'a> {
    Compressed {
        axis: Axis,
        values: &'a [f64],
        indices: &'a [usize],
        offsets: &'a [usize],
        major: usize,
        slot: usize,
    },
    Coo {
        rows: &'a [usize],
        cols: &'a [usize],
        values: &'a [f64],
        pos: usize,
    },
    Dok(hash_map::Iter<'a, (usize, usize), f64>),
}

impl Iterator for Triples<'_> {
    type Item = Triple;

    fn next(&mut self) -> Option<Triple> {
        match &mut self.inner {
            Inner::Compressed {
                axis,
                values,
                indices,
                offsets,
                major,
                slot,
            } => loop {
                if *major + 1 >= offsets.len() {
                    return None;
                }
                if *slot < offsets[*major + 1] {
                    let j = *slot;
                    *slot += 1;
                    let (row, col) = match axis {
                        Axis::Row => (*major, indices[j]),
                        Axis::Col => (indices[j], *major),
                    };
                    return Some(Triple {
                        row,
                        col,
                        value: values[j],
                    });
                }
                *major += 1;
            },
            Inner::Coo {
                rows,
                cols,
                values,
                pos,
            } => {
                if *pos >= values.len() {
                    return None;
                }
                let t = Triple {
                    row: rows[*pos],
                    col: cols[*pos],
                    value: values[*pos],
                };
                *pos += 1;
                Some(t)
            }
            Inner::Dok(iter) => iter.next().map(|(&(row, col), &value)| Triple {
                row,
                col,
                value,
            }),
        }
    }
}
