// In: src/search.rs

//! Threshold similarity search over a dataset of items.
//!
//! Distances are always taken as `distance(query, candidate)`, in that direction.

use rayon::prelude::*;
use serde::Serialize;

use crate::config::{DistanceMetric, NcdConfig};
use crate::error::NcdError;
use crate::ncd::NcdCalculator;
use crate::traits::SizeOracle;
use crate::types::{Item, TextEncoding};

/// A dataset entry within the similarity threshold of a query.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SimilarItem {
    pub index: usize,
    pub distance: f64,
}

/// Finds items close to a query.
///
/// [`SimilaritySearch::new`] measures with MCD, the ticket-similarity metric; a
/// config-built search uses the configured metric. A candidate matches when its
/// distance is at most the threshold.
pub struct SimilaritySearch<'o, O: SizeOracle + ?Sized> {
    calculator: NcdCalculator<'o, O>,
    metric: DistanceMetric,
    threshold: f64,
    parallel: bool,
}

impl<'o, O: SizeOracle + ?Sized> SimilaritySearch<'o, O> {
    pub fn new(oracle: &'o O, threshold: f64) -> Self {
        Self {
            calculator: NcdCalculator::new(oracle),
            metric: DistanceMetric::Mcd,
            threshold,
            parallel: false,
        }
    }

    pub fn from_config(oracle: &'o O, config: &NcdConfig) -> Self {
        Self {
            calculator: NcdCalculator::new(oracle).with_encoding(config.encoding),
            metric: config.metric,
            threshold: config.similarity_threshold,
            parallel: config.parallel,
        }
    }

    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.calculator = self.calculator.with_encoding(encoding);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True when the distance from `a` to `b` is at most the threshold.
    pub fn is_similar(&self, a: &Item, b: &Item) -> Result<bool, NcdError> {
        Ok(self.calculator.distance(self.metric, a, b)? <= self.threshold)
    }

    /// All candidates within the threshold, closest first. Ties keep dataset order.
    pub fn find_similar(
        &self,
        query: &Item,
        dataset: &[Item],
    ) -> Result<Vec<SimilarItem>, NcdError> {
        let mut hits: Vec<SimilarItem> = self
            .distances(query, dataset)?
            .into_iter()
            .enumerate()
            .filter(|&(_, distance)| distance <= self.threshold)
            .map(|(index, distance)| SimilarItem { index, distance })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        log::debug!(
            "{} of {} candidates within {}",
            hits.len(),
            dataset.len(),
            self.threshold
        );
        Ok(hits)
    }

    /// The closest candidate regardless of threshold; `None` for an empty dataset.
    /// The lowest index wins a tie.
    pub fn nearest(
        &self,
        query: &Item,
        dataset: &[Item],
    ) -> Result<Option<SimilarItem>, NcdError> {
        let nearest = self
            .distances(query, dataset)?
            .into_iter()
            .enumerate()
            .map(|(index, distance)| SimilarItem { index, distance })
            .fold(None, |best: Option<SimilarItem>, candidate| match best {
                Some(b) if b.distance <= candidate.distance => Some(b),
                _ => Some(candidate),
            });
        Ok(nearest)
    }

    fn distances(&self, query: &Item, dataset: &[Item]) -> Result<Vec<f64>, NcdError> {
        let measure = |(index, candidate): (usize, &Item)| {
            self.calculator
                .distance(self.metric, query, candidate)
                .map_err(|e| e.at_item(index))
        };
        // Collected in dataset order, so the lowest failing index is reported.
        let results: Vec<Result<f64, NcdError>> = if self.parallel {
            dataset.par_iter().enumerate().map(measure).collect()
        } else {
            dataset.iter().enumerate().map(measure).collect()
        };
        results.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NcdConfig;
    use crate::oracle::CompressionOracle;

    fn tickets() -> Vec<Item> {
        [
            "printer on floor three is jammed again, paper tray empty",
            "vpn login rejects my password after the update yesterday",
            "printer on floor three is jammed again, paper tray empty",
            "coffee machine in the kitchen leaks water on the floor",
        ]
        .into_iter()
        .map(Item::from)
        .collect()
    }

    /// Reports the input length as its size.
    struct LengthOracle;

    impl SizeOracle for LengthOracle {
        fn compressed_size_with(
            &self,
            data: &[u8],
            _scratch: &mut Vec<u8>,
        ) -> Result<usize, NcdError> {
            Ok(data.len())
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // Length sizes: NCD("aa", "bb") = (4 - 2) / 2 = 1.0.
        let (a, b) = (Item::from("aa"), Item::from("bb"));
        let at = SimilaritySearch::new(&LengthOracle, 1.0).metric(DistanceMetric::Ncd);
        assert!(at.is_similar(&a, &b).unwrap());
        let below = SimilaritySearch::new(&LengthOracle, 0.99).metric(DistanceMetric::Ncd);
        assert!(!below.is_similar(&a, &b).unwrap());
    }

    #[test]
    fn test_new_search_measures_with_mcd() {
        // Length sizes: C(aa) = 4, C(bbbbbb) = 6, C(ab) = 5 -> MCD = 1 / 6, NCD = 1.0.
        let (a, b) = (Item::from("aa"), Item::from("bbb"));
        let search = SimilaritySearch::new(&LengthOracle, 0.2);
        let hits = search.find_similar(&a, std::slice::from_ref(&b)).unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - 1.0 / 6.0).abs() < 1e-12, "got {}", hits[0].distance);
    }

    #[test]
    fn test_identical_items_are_similar() {
        let oracle = CompressionOracle::default();
        let search = SimilaritySearch::new(&oracle, 0.5);
        let data = tickets();
        assert!(search.is_similar(&data[0], &data[2]).unwrap());
        assert!(!search.is_similar(&data[0], &data[1]).unwrap());
    }

    #[test]
    fn test_find_similar_is_sorted_and_thresholded() {
        let oracle = CompressionOracle::default();
        let search = SimilaritySearch::new(&oracle, 0.5);
        let query = Item::from("printer on floor three is jammed again, paper tray empty");
        let hits = search.find_similar(&query, &tickets()).unwrap();

        let indices: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(hits[0].distance, hits[1].distance);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(hits.iter().all(|h| h.distance <= 0.5));
    }

    #[test]
    fn test_zero_threshold_keeps_only_exact_distance_zero() {
        let oracle = CompressionOracle::default();
        let search = SimilaritySearch::new(&oracle, 0.0).metric(DistanceMetric::Mcd);
        let data = tickets();
        let hits = search.find_similar(&data[1], &data).unwrap();
        assert_eq!(hits, vec![SimilarItem { index: 1, distance: 0.0 }]);
    }

    #[test]
    fn test_nearest_picks_closest_candidate() {
        let oracle = CompressionOracle::default();
        let search = SimilaritySearch::new(&oracle, 0.0).metric(DistanceMetric::Ncd);
        let query = Item::from("my vpn password stopped working after the update");
        let best = search.nearest(&query, &tickets()).unwrap().unwrap();
        assert_eq!(best.index, 1);
        assert!(search.nearest(&query, &[]).unwrap().is_none());
    }

    #[test]
    fn test_failing_candidate_is_named() {
        let oracle = CompressionOracle::default();
        let search = SimilaritySearch::new(&oracle, 0.5);
        let data = vec![Item::from("a"), Item::from(""), Item::from("")];
        let err = search.find_similar(&Item::from(""), &data).unwrap_err();
        assert!(matches!(err, NcdError::ItemFailed { index: 1, .. }), "got {:?}", err);
    }

    #[test]
    fn test_parallel_search_matches_sequential() {
        let oracle = CompressionOracle::default();
        let config = NcdConfig {
            parallel: true,
            similarity_threshold: 0.9,
            ..Default::default()
        };
        let data = tickets();
        let parallel = SimilaritySearch::from_config(&oracle, &config);
        let sequential = SimilaritySearch::from_config(&oracle, &config).parallel(false);
        assert_eq!(parallel.threshold(), 0.9);
        assert_eq!(
            parallel.find_similar(&data[3], &data).unwrap(),
            sequential.find_similar(&data[3], &data).unwrap()
        );
    }
}
