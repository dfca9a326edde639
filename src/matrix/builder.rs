// In: src/matrix/builder.rs

use std::borrow::Cow;
use std::iter::FusedIterator;
use std::time::Instant;

use rayon::prelude::*;

use super::size_table::SizeTable;
use super::{CellFailure, DistanceMatrix, MatrixRow, MatrixSettings};
use crate::config::{DistanceMetric, FailurePolicy, NcdConfig};
use crate::error::NcdError;
use crate::ncd::{mcd_from_sizes, ncd_from_sizes};
use crate::traits::SizeOracle;
use crate::types::{Item, TextEncoding};

//==================================================================================
// 1. The Builder
//==================================================================================

/// Computes the full `N x N` distance matrix of an ordered item collection,
/// self-pairs included.
///
/// The builder itself holds only settings and a borrowed oracle; all per-build state
/// (encoded items, the size table, scratch buffers) lives in the [`RowIter`] it
/// creates.
pub struct MatrixBuilder<'o, O: SizeOracle + ?Sized> {
    oracle: &'o O,
    metric: DistanceMetric,
    encoding: TextEncoding,
    failure_policy: FailurePolicy,
    parallel: bool,
}

impl<'o, O: SizeOracle + ?Sized> MatrixBuilder<'o, O> {
    pub fn new(oracle: &'o O) -> Self {
        Self {
            oracle,
            metric: DistanceMetric::default(),
            encoding: TextEncoding::default(),
            failure_policy: FailurePolicy::default(),
            parallel: false,
        }
    }

    /// Takes metric, encoding, failure policy and parallelism from `config`.
    pub fn from_config(oracle: &'o O, config: &NcdConfig) -> Self {
        Self {
            oracle,
            metric: config.metric,
            encoding: config.encoding,
            failure_policy: config.failure_policy,
            parallel: config.parallel,
        }
    }

    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn settings(&self) -> MatrixSettings {
        MatrixSettings {
            compressor: self.oracle.settings(),
            metric: self.metric,
            encoding: self.encoding,
            failure_policy: self.failure_policy,
        }
    }

    /// Prepares a lazy, row-major stream of matrix rows.
    ///
    /// All items are encoded and measured before this returns, so encoding and
    /// single-item compression failures surface here, tagged with the item index.
    pub fn rows<'i>(&self, items: &'i [Item]) -> Result<RowIter<'o, 'i, O>, NcdError> {
        let encoded = items
            .iter()
            .enumerate()
            .map(|(index, item)| item.encode(self.encoding).map_err(|e| e.at_item(index)))
            .collect::<Result<Vec<Cow<'i, [u8]>>, NcdError>>()?;
        let table = SizeTable::compute(self.oracle, &encoded, self.metric, self.parallel)?;
        Ok(RowIter {
            oracle: self.oracle,
            metric: self.metric,
            failure_policy: self.failure_policy,
            parallel: self.parallel,
            encoded,
            table,
            next_row: 0,
            finished: false,
            concat_buf: Vec::new(),
            scratch: Vec::new(),
        })
    }

    /// Computes and materializes the whole matrix.
    ///
    /// Under [`FailurePolicy::FailFast`] the first failing cell in row-major order
    /// aborts the build; under [`FailurePolicy::BestEffort`] failing cells are left
    /// empty and listed in [`DistanceMatrix::failures`].
    pub fn build(&self, items: &[Item]) -> Result<DistanceMatrix, NcdError> {
        let start = Instant::now();
        let settings = self.settings();
        log::info!(
            "Building {n}x{n} {} matrix ({}, parallel: {})",
            self.metric,
            settings
                .compressor
                .map_or_else(|| "custom oracle".to_string(), |s| s.to_string()),
            self.parallel,
            n = items.len(),
        );

        let rows = self.rows(items)?.collect::<Result<Vec<MatrixRow>, NcdError>>()?;
        let matrix = DistanceMatrix::from_rows(rows, settings)?;

        let elapsed = start.elapsed();
        log::info!(
            "Matrix finished: {} cells, {} failed, in {:.2?}",
            matrix.len() * matrix.len(),
            matrix.failures().len(),
            elapsed
        );
        log_metric!(
            "event" = "build_matrix",
            "items" = items.len(),
            "failed_cells" = matrix.failures().len(),
            "elapsed_ms" = elapsed.as_millis()
        );
        Ok(matrix)
    }
}

//==================================================================================
// 2. Cell Computation
//==================================================================================

/// Read-only view shared by every worker computing cells of one build.
struct CellContext<'a, O: SizeOracle + ?Sized> {
    oracle: &'a O,
    metric: DistanceMetric,
    encoded: &'a [Cow<'a, [u8]>],
    table: &'a SizeTable,
}

impl<O: SizeOracle + ?Sized> CellContext<'_, O> {
    fn cell(
        &self,
        row: usize,
        col: usize,
        concat_buf: &mut Vec<u8>,
        scratch: &mut Vec<u8>,
    ) -> Result<f64, NcdError> {
        // For MCD the diagonal concatenation is exactly what the table measured.
        let size_ab = if row == col && self.metric == DistanceMetric::Mcd {
            self.table.get(row)
        } else {
            self.oracle.compressed_size_concat(
                &self.encoded[row],
                &self.encoded[col],
                concat_buf,
                scratch,
            )?
        };
        let (size_a, size_b) = (self.table.get(row), self.table.get(col));
        match self.metric {
            DistanceMetric::Ncd => ncd_from_sizes(size_a, size_b, size_ab),
            DistanceMetric::Mcd => mcd_from_sizes(size_a, size_b, size_ab),
        }
    }
}

//==================================================================================
// 3. The Row Stream
//==================================================================================

/// Yields matrix rows in order, one fully computed row per `next()`.
///
/// Under the fail-fast policy the first failure is yielded as
/// [`NcdError::PairFailed`] and the iterator ends.
pub struct RowIter<'o, 'i, O: SizeOracle + ?Sized> {
    oracle: &'o O,
    metric: DistanceMetric,
    failure_policy: FailurePolicy,
    parallel: bool,
    encoded: Vec<Cow<'i, [u8]>>,
    table: SizeTable,
    next_row: usize,
    finished: bool,
    concat_buf: Vec<u8>,
    scratch: Vec<u8>,
}

impl<O: SizeOracle + ?Sized> RowIter<'_, '_, O> {
    /// Total number of rows (and columns).
    pub fn dimension(&self) -> usize {
        self.encoded.len()
    }

    fn compute_row(&mut self, row: usize) -> Vec<Result<f64, NcdError>> {
        let n = self.table.len();
        let ctx = CellContext {
            oracle: self.oracle,
            metric: self.metric,
            encoded: &self.encoded,
            table: &self.table,
        };
        if self.parallel {
            // Completion order is irrelevant: `collect` places each cell by column.
            (0..n)
                .into_par_iter()
                .map_init(
                    || (Vec::new(), Vec::new()),
                    |(concat_buf, scratch), col| ctx.cell(row, col, concat_buf, scratch),
                )
                .collect()
        } else {
            let concat_buf = &mut self.concat_buf;
            let scratch = &mut self.scratch;
            (0..n)
                .map(|col| ctx.cell(row, col, concat_buf, scratch))
                .collect()
        }
    }
}

impl<O: SizeOracle + ?Sized> Iterator for RowIter<'_, '_, O> {
    type Item = Result<MatrixRow, NcdError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.next_row >= self.dimension() {
            return None;
        }
        let row = self.next_row;
        self.next_row += 1;

        let results = self.compute_row(row);
        let mut values = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (col, result) in results.into_iter().enumerate() {
            match result {
                Ok(value) => values.push(Some(value)),
                Err(err) => match self.failure_policy {
                    FailurePolicy::FailFast => {
                        self.finished = true;
                        return Some(Err(err.at_pair(row, col)));
                    }
                    FailurePolicy::BestEffort => {
                        log::warn!("Cell ({}, {}) left empty: {}", row, col, err);
                        failures.push(CellFailure {
                            row,
                            col,
                            message: err.to_string(),
                        });
                        values.push(None);
                    }
                },
            }
        }
        Some(Ok(MatrixRow {
            index: row,
            values,
            failures,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        let remaining = self.dimension().saturating_sub(self.next_row);
        (0, Some(remaining))
    }
}

impl<O: SizeOracle + ?Sized> FusedIterator for RowIter<'_, '_, O> {}
