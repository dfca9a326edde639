// In: src/matrix/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Pairwise Matrix
// ====================================================================================
//
// Data Flow:
//
//   1. [MatrixBuilder::rows / ::build]   -> Receives `&[Item]`
//         |
//         `-> a. Encodes every item once (encoding errors are fatal, by item index)
//         |
//         `-> b. Fills a `SizeTable`: one compressed size per item, computed once
//         |
//   2. [RowIter]                          -> Yields rows in row-major order
//         |
//         `-> for each (row, col): compress `item[row] ++ item[col]` and combine it
//             with the two table entries via the configured formula
//         |
//   3. [DistanceMatrix]                   -> N x N cells, failures, and the settings
//                                            needed to reproduce the run
//
// The table and the row buffers live exactly as long as one build. Nothing is
// cached across builds.
// ====================================================================================

mod builder;
mod size_table;

pub use builder::{MatrixBuilder, RowIter};

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::config::{CompressorSettings, DistanceMetric, FailurePolicy};
use crate::error::NcdError;
use crate::types::TextEncoding;

//==================================================================================
// I. Row & Failure Records
//==================================================================================

/// A cell that could not be computed under the best-effort policy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CellFailure {
    pub row: usize,
    pub col: usize,
    pub message: String,
}

/// One row of the matrix as produced by [`RowIter`].
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub index: usize,
    /// `values[col]` is the distance from item `index` to item `col`; `None` marks a
    /// failed cell (best-effort policy only).
    pub values: Vec<Option<f64>>,
    pub failures: Vec<CellFailure>,
}

/// Everything needed to reproduce a matrix.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixSettings {
    /// `None` when the oracle does not describe itself (e.g., test fakes).
    pub compressor: Option<CompressorSettings>,
    pub metric: DistanceMetric,
    pub encoding: TextEncoding,
    pub failure_policy: FailurePolicy,
}

//==================================================================================
// II. The Distance Matrix
//==================================================================================

/// An `N x N` matrix where cell `(i, j)` is the distance from item `i` to item `j`.
///
/// The matrix is not symmetrized: compressing `a ++ b` and `b ++ a` can differ, and
/// both directions are kept as measured.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    cells: Array2<Option<f64>>,
    failures: Vec<CellFailure>,
    settings: MatrixSettings,
}

/// The serializable form of a [`DistanceMatrix`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatrixReport {
    pub version: String,
    pub settings: MatrixSettings,
    pub size: usize,
    pub rows: Vec<Vec<Option<f64>>>,
    pub failures: Vec<CellFailure>,
}

impl DistanceMatrix {
    /// Assembles a matrix from complete, row-major rows.
    pub(crate) fn from_rows(
        rows: Vec<MatrixRow>,
        settings: MatrixSettings,
    ) -> Result<Self, NcdError> {
        let n = rows.len();
        let mut values = Vec::with_capacity(n * n);
        let mut failures = Vec::new();
        for (expected, row) in rows.into_iter().enumerate() {
            if row.index != expected || row.values.len() != n {
                return Err(NcdError::InternalError(format!(
                    "row {} arrived as index {} with {} cells, expected {} cells",
                    expected,
                    row.index,
                    row.values.len(),
                    n
                )));
            }
            values.extend(row.values);
            failures.extend(row.failures);
        }
        let cells = Array2::from_shape_vec((n, n), values)
            .map_err(|e| NcdError::InternalError(e.to_string()))?;
        Ok(Self {
            cells,
            failures,
            settings,
        })
    }

    /// Number of items (rows, and columns).
    pub fn len(&self) -> usize {
        self.cells.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The distance from item `row` to item `col`. `None` if out of bounds or failed.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get((row, col)).copied().flatten()
    }

    pub fn row(&self, row: usize) -> Option<ArrayView1<'_, Option<f64>>> {
        (row < self.len()).then(|| self.cells.row(row))
    }

    /// Rows in order.
    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, Option<f64>>> + '_ {
        self.cells.rows().into_iter()
    }

    pub fn cells(&self) -> &Array2<Option<f64>> {
        &self.cells
    }

    pub fn failures(&self) -> &[CellFailure] {
        &self.failures
    }

    pub fn settings(&self) -> &MatrixSettings {
        &self.settings
    }

    /// True when every cell holds a value.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The matrix as plain numbers. Fails if any cell was recorded as failed.
    pub fn to_dense(&self) -> Result<Array2<f64>, NcdError> {
        if !self.is_complete() {
            return Err(NcdError::IncompleteMatrix {
                failed: self.failures.len(),
            });
        }
        let n = self.len();
        let values = self
            .cells
            .iter()
            .map(|cell| {
                cell.ok_or_else(|| NcdError::InternalError("unrecorded empty cell".to_string()))
            })
            .collect::<Result<Vec<f64>, NcdError>>()?;
        Array2::from_shape_vec((n, n), values).map_err(|e| NcdError::InternalError(e.to_string()))
    }

    pub fn report(&self) -> MatrixReport {
        MatrixReport {
            version: crate::VERSION.to_string(),
            settings: self.settings,
            size: self.len(),
            rows: self.rows().map(|row| row.to_vec()).collect(),
            failures: self.failures.clone(),
        }
    }
}
