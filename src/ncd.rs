// In: src/ncd.rs

//! Compression distances between two items.
//!
//! ```text
//! NCD(x, y) = (C(xy) - min(C(x), C(y))) / max(C(x), C(y))
//! MCD(x, y) = max(|C(xy) - C(xx)|, |C(xy) - C(yy)|) / max(C(xx), C(yy))
//! ```
//!
//! `C` is the compressed size reported by a [`SizeOracle`] and `xy` is `x`
//! immediately followed by `y`. The concatenation order follows the call direction
//! and is never swapped, so `ncd(x, y)` and `ncd(y, x)` may legitimately differ.
//! A divisor of zero is reported as [`NcdError::DivisionByZero`]; it is never
//! turned into `0.0` or `NaN`.

use serde::Serialize;

use crate::config::DistanceMetric;
use crate::error::NcdError;
use crate::traits::SizeOracle;
use crate::types::{Item, TextEncoding};

//==================================================================================
// 1. Pure Formulas
//==================================================================================

/// Applies the NCD formula to three compressed sizes.
pub fn ncd_from_sizes(size_a: usize, size_b: usize, size_ab: usize) -> Result<f64, NcdError> {
    let min_size = size_a.min(size_b);
    let max_size = size_a.max(size_b);
    if max_size == 0 {
        return Err(NcdError::DivisionByZero { size_a, size_b });
    }
    Ok((size_ab as f64 - min_size as f64) / max_size as f64)
}

/// Applies the MCD formula to the self-concatenation sizes `C(xx)`, `C(yy)` and `C(xy)`.
pub fn mcd_from_sizes(size_aa: usize, size_bb: usize, size_ab: usize) -> Result<f64, NcdError> {
    let max_size = size_aa.max(size_bb);
    if max_size == 0 {
        return Err(NcdError::DivisionByZero {
            size_a: size_aa,
            size_b: size_bb,
        });
    }
    let ab = size_ab as f64;
    let numerator = (ab - size_aa as f64).abs().max((ab - size_bb as f64).abs());
    Ok(numerator / max_size as f64)
}

//==================================================================================
// 2. Audit Record
//==================================================================================

/// The three sizes behind a distance, kept for auditing and reproduction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NcdBreakdown {
    pub metric: DistanceMetric,
    /// `C(a)` for NCD, `C(aa)` for MCD.
    pub size_a: usize,
    /// `C(b)` for NCD, `C(bb)` for MCD.
    pub size_b: usize,
    pub size_ab: usize,
    pub value: f64,
}

//==================================================================================
// 3. The Calculator
//==================================================================================

/// Computes distances between items with a borrowed oracle.
pub struct NcdCalculator<'o, O: SizeOracle + ?Sized> {
    oracle: &'o O,
    encoding: TextEncoding,
}

// Implemented by hand so that `O` itself need not be `Clone`.
impl<O: SizeOracle + ?Sized> Clone for NcdCalculator<'_, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O: SizeOracle + ?Sized> Copy for NcdCalculator<'_, O> {}

impl<'o, O: SizeOracle + ?Sized> NcdCalculator<'o, O> {
    pub fn new(oracle: &'o O) -> Self {
        Self {
            oracle,
            encoding: TextEncoding::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn oracle(&self) -> &'o O {
        self.oracle
    }

    /// NCD of two items. Encoding failures propagate immediately.
    pub fn ncd(&self, a: &Item, b: &Item) -> Result<f64, NcdError> {
        self.breakdown(DistanceMetric::Ncd, a, b).map(|r| r.value)
    }

    /// MCD of two items.
    pub fn mcd(&self, a: &Item, b: &Item) -> Result<f64, NcdError> {
        self.breakdown(DistanceMetric::Mcd, a, b).map(|r| r.value)
    }

    /// Distance of two items under `metric`.
    pub fn distance(&self, metric: DistanceMetric, a: &Item, b: &Item) -> Result<f64, NcdError> {
        self.breakdown(metric, a, b).map(|r| r.value)
    }

    /// Distance of two items together with the sizes that produced it.
    pub fn breakdown(
        &self,
        metric: DistanceMetric,
        a: &Item,
        b: &Item,
    ) -> Result<NcdBreakdown, NcdError> {
        let a_bytes = a.encode(self.encoding)?;
        let b_bytes = b.encode(self.encoding)?;
        self.breakdown_bytes(metric, &a_bytes, &b_bytes)
    }

    /// NCD of two already encoded byte sequences.
    pub fn ncd_bytes(&self, a: &[u8], b: &[u8]) -> Result<f64, NcdError> {
        self.breakdown_bytes(DistanceMetric::Ncd, a, b)
            .map(|r| r.value)
    }

    pub fn breakdown_bytes(
        &self,
        metric: DistanceMetric,
        a: &[u8],
        b: &[u8],
    ) -> Result<NcdBreakdown, NcdError> {
        let mut concat_buf = Vec::with_capacity(a.len() + b.len());
        let mut scratch = Vec::new();
        let size_ab = self
            .oracle
            .compressed_size_concat(a, b, &mut concat_buf, &mut scratch)?;

        // Self-pairs (equal by value) only need one single-item measurement. For MCD
        // the self-concatenation of a self-pair is exactly `ab`.
        let self_pair = a == b;
        let (size_a, size_b) = match metric {
            DistanceMetric::Ncd => {
                let size_a = self.oracle.compressed_size_with(a, &mut scratch)?;
                let size_b = if self_pair {
                    size_a
                } else {
                    self.oracle.compressed_size_with(b, &mut scratch)?
                };
                (size_a, size_b)
            }
            DistanceMetric::Mcd => {
                if self_pair {
                    (size_ab, size_ab)
                } else {
                    let size_aa =
                        self.oracle
                            .compressed_size_concat(a, a, &mut concat_buf, &mut scratch)?;
                    let size_bb =
                        self.oracle
                            .compressed_size_concat(b, b, &mut concat_buf, &mut scratch)?;
                    (size_aa, size_bb)
                }
            }
        };

        let value = match metric {
            DistanceMetric::Ncd => ncd_from_sizes(size_a, size_b, size_ab)?,
            DistanceMetric::Mcd => mcd_from_sizes(size_a, size_b, size_ab)?,
        };
        Ok(NcdBreakdown {
            metric,
            size_a,
            size_b,
            size_ab,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompressionAlgorithm, NcdConfig};
    use crate::oracle::CompressionOracle;

    /// An oracle whose "compressed size" is the input length. Makes the formulas
    /// exactly predictable.
    struct IdentityOracle;

    impl SizeOracle for IdentityOracle {
        fn compressed_size_with(
            &self,
            data: &[u8],
            _scratch: &mut Vec<u8>,
        ) -> Result<usize, NcdError> {
            Ok(data.len())
        }
    }

    #[test]
    fn test_formula_on_known_sizes() {
        assert_eq!(ncd_from_sizes(10, 20, 25).unwrap(), 0.75);
        assert_eq!(ncd_from_sizes(20, 10, 25).unwrap(), 0.75);
        assert_eq!(mcd_from_sizes(12, 20, 26).unwrap(), 0.7);
    }

    #[test]
    fn test_formula_rejects_zero_divisor() {
        assert!(matches!(
            ncd_from_sizes(0, 0, 0),
            Err(NcdError::DivisionByZero {
                size_a: 0,
                size_b: 0
            })
        ));
        assert!(matches!(
            mcd_from_sizes(0, 0, 5),
            Err(NcdError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_identity_oracle_breakdown() {
        let calc = NcdCalculator::new(&IdentityOracle);
        let r = calc
            .breakdown(DistanceMetric::Ncd, &Item::from("abcd"), &Item::from("xy"))
            .unwrap();
        assert_eq!((r.size_a, r.size_b, r.size_ab), (4, 2, 6));
        assert_eq!(r.value, 1.0);
    }

    #[test]
    fn test_byte_api_matches_item_api() {
        let oracle = CompressionOracle::default();
        let calc = NcdCalculator::new(&oracle).with_encoding(TextEncoding::Latin1);
        assert_eq!(calc.encoding(), TextEncoding::Latin1);
        assert_eq!(calc.oracle().settings(), oracle.settings());

        let by_item = calc.ncd(&Item::from("café au lait"), &Item::from("café noir")).unwrap();
        let by_bytes = calc.ncd_bytes(b"caf\xe9 au lait", b"caf\xe9 noir").unwrap();
        assert_eq!(by_item.to_bits(), by_bytes.to_bits());
    }

    #[test]
    fn test_self_distance_is_small_and_non_negative() {
        let oracle = CompressionOracle::default();
        let calc = NcdCalculator::new(&oracle);
        let x = Item::from("Jupiter is the largest planet in the solar system.");
        let d = calc.ncd(&x, &x).unwrap();
        assert!(d >= 0.0, "got {}", d);
        assert!(d < 0.3, "expected near-zero self distance, got {}", d);
    }

    #[test]
    fn test_unrelated_texts_are_further_apart_than_self() {
        let oracle = CompressionOracle::default();
        let calc = NcdCalculator::new(&oracle);
        let x = Item::from("Jupiter is the largest planet in the solar system.");
        let y = Item::from("The recipe calls for two cups of flour and one egg.");
        let self_d = calc.ncd(&x, &x).unwrap();
        let cross = calc.ncd(&x, &y).unwrap();
        assert!(cross > self_d, "cross {} <= self {}", cross, self_d);
        assert!(cross > 0.3, "expected a non-trivial distance, got {}", cross);
    }

    #[test]
    fn test_two_empty_items_are_degenerate() {
        let oracle = CompressionOracle::default();
        let calc = NcdCalculator::new(&oracle);
        let empty = Item::from("");
        let err = calc.ncd(&empty, &empty).unwrap_err();
        assert!(matches!(err, NcdError::DivisionByZero { .. }), "got {:?}", err);
        assert!(calc.mcd(&empty, &empty).is_err());
    }

    #[test]
    fn test_empty_against_non_empty_succeeds_both_ways() {
        let oracle = CompressionOracle::default();
        let calc = NcdCalculator::new(&oracle);
        let empty = Item::from("");
        let a = Item::from("a");
        let forward = calc.ncd(&empty, &a).unwrap();
        let backward = calc.ncd(&a, &empty).unwrap();
        assert!(forward.is_finite() && forward >= 0.0);
        assert!(backward.is_finite() && backward >= 0.0);
        assert_eq!(forward, 1.0);
    }

    #[test]
    fn test_repeated_calls_are_bit_identical() {
        let oracle = CompressionOracle::from_config(&NcdConfig {
            algorithm: CompressionAlgorithm::Zstd,
            ..Default::default()
        })
        .unwrap();
        let calc = NcdCalculator::new(&oracle);
        let x = Item::from("alpha beta gamma delta alpha beta");
        let y = Item::from("gamma delta epsilon zeta");
        for (a, b) in [(&x, &y), (&y, &x)] {
            let first = calc.ncd(a, b).unwrap();
            let second = calc.ncd(a, b).unwrap();
            assert_eq!(first.to_bits(), second.to_bits());
        }
    }

    #[test]
    fn test_encoding_error_propagates() {
        let oracle = CompressionOracle::default();
        let calc = NcdCalculator::new(&oracle).with_encoding(TextEncoding::Ascii);
        let err = calc
            .ncd(&Item::from("plain"), &Item::from("naïve"))
            .unwrap_err();
        assert!(matches!(err, NcdError::Encoding { .. }), "got {:?}", err);
    }

    #[test]
    fn test_mcd_self_pair_is_zero() {
        let oracle = CompressionOracle::default();
        let calc = NcdCalculator::new(&oracle);
        let x = Item::from("some ticket text describing a printer failure");
        assert_eq!(calc.mcd(&x, &x).unwrap(), 0.0);
    }

    #[test]
    fn test_mcd_separates_unrelated_items() {
        let oracle = CompressionOracle::default();
        let calc = NcdCalculator::new(&oracle);
        let x = Item::from("printer on floor three is jammed again, paper tray empty");
        let y = Item::from("vpn login rejects my password after the update yesterday");
        let d = calc.mcd(&x, &y).unwrap();
        assert!(d > 0.0, "got {}", d);
    }
}
