//! The per-build memo of single-item compressed sizes.
//!
//! Every cell of row `i` needs the same size for item `i`, and every cell of column
//! `j` the same size for item `j`. Measuring each item once up front reduces a build
//! from `3 * N^2` compressions to `N + N^2`.
//!
//! Each slot is written exactly once, by whichever worker owns that index, so the
//! table needs no locking. It is owned by a single build and dropped with it.

use std::borrow::Cow;

use rayon::prelude::*;

use crate::config::DistanceMetric;
use crate::error::NcdError;
use crate::traits::SizeOracle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SizeTable {
    /// `C(x)` for NCD, `C(x ++ x)` for MCD.
    sizes: Vec<usize>,
}

impl SizeTable {
    pub(crate) fn compute<O: SizeOracle + ?Sized>(
        oracle: &O,
        encoded: &[Cow<'_, [u8]>],
        metric: DistanceMetric,
        parallel: bool,
    ) -> Result<Self, NcdError> {
        let measure = |index: usize,
                       bytes: &[u8],
                       concat_buf: &mut Vec<u8>,
                       scratch: &mut Vec<u8>|
         -> Result<usize, NcdError> {
            let size = match metric {
                DistanceMetric::Ncd => oracle.compressed_size_with(bytes, scratch),
                DistanceMetric::Mcd => {
                    oracle.compressed_size_concat(bytes, bytes, concat_buf, scratch)
                }
            }
            .map_err(|e| e.at_item(index))?;
            log::debug!(
                "item {}: {} raw bytes -> {} compressed bytes",
                index,
                bytes.len(),
                size
            );
            Ok(size)
        };

        let results: Vec<Result<usize, NcdError>> = if parallel {
            encoded
                .par_iter()
                .enumerate()
                .map_init(
                    || (Vec::new(), Vec::new()),
                    |(concat_buf, scratch), (index, bytes)| {
                        measure(index, &**bytes, concat_buf, scratch)
                    },
                )
                .collect()
        } else {
            let mut concat_buf = Vec::new();
            let mut scratch = Vec::new();
            encoded
                .iter()
                .enumerate()
                .map(|(index, bytes)| measure(index, &**bytes, &mut concat_buf, &mut scratch))
                .collect()
        };

        // Collected in index order, so the lowest failing index is the one reported.
        let sizes = results.into_iter().collect::<Result<Vec<usize>, NcdError>>()?;
        Ok(Self { sizes })
    }

    pub(crate) fn get(&self, index: usize) -> usize {
        self.sizes[index]
    }

    pub(crate) fn len(&self) -> usize {
        self.sizes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::CompressionOracle;

    fn encoded(items: &[&'static str]) -> Vec<Cow<'static, [u8]>> {
        items.iter().map(|s| Cow::Borrowed(s.as_bytes())).collect()
    }

    #[test]
    fn test_table_matches_direct_measurements() {
        let oracle = CompressionOracle::default();
        let items = encoded(&["alpha", "beta beta beta", ""]);
        let table = SizeTable::compute(&oracle, &items, DistanceMetric::Ncd, false).unwrap();
        assert_eq!(table.len(), 3);
        for (i, bytes) in items.iter().enumerate() {
            assert_eq!(table.get(i), oracle.compressed_size(bytes).unwrap());
        }
        assert_eq!(table.get(2), 0);
    }

    #[test]
    fn test_mcd_table_holds_self_concatenations() {
        let oracle = CompressionOracle::default();
        let items = encoded(&["gamma delta"]);
        let table = SizeTable::compute(&oracle, &items, DistanceMetric::Mcd, false).unwrap();
        assert_eq!(
            table.get(0),
            oracle.compressed_size(b"gamma deltagamma delta").unwrap()
        );
    }

    #[test]
    fn test_parallel_and_sequential_tables_agree() {
        let oracle = CompressionOracle::default();
        let owned: Vec<String> = (0..32)
            .map(|i| format!("item number {} {}", i, "x".repeat(i)))
            .collect();
        let items: Vec<Cow<'_, [u8]>> =
            owned.iter().map(|s| Cow::Borrowed(s.as_bytes())).collect();
        let sequential = SizeTable::compute(&oracle, &items, DistanceMetric::Ncd, false).unwrap();
        let parallel = SizeTable::compute(&oracle, &items, DistanceMetric::Ncd, true).unwrap();
        assert_eq!(sequential, parallel);
    }
}
