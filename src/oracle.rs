// In: src/oracle.rs

//! The compression-size oracle.
//!
//! `CompressionOracle` wraps one lossless compressor at a fixed, validated level and
//! answers a single question: how many bytes does this input compress to? It is
//! immutable after construction, so one instance can be shared by every worker of a
//! parallel build.

use crate::config::{CompressorSettings, NcdConfig};
use crate::error::NcdError;
use crate::kernels;
use crate::traits::SizeOracle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOracle {
    settings: CompressorSettings,
}

impl CompressionOracle {
    /// Builds an oracle from a configuration. Invalid configurations fail here,
    /// before any pair computation begins.
    pub fn from_config(config: &NcdConfig) -> Result<Self, NcdError> {
        config.validate()?;
        let settings = config.compressor_settings();
        log::debug!("Compression oracle configured: {}", settings);
        Ok(Self { settings })
    }

    /// Builds an oracle from already resolved settings.
    pub fn new(settings: CompressorSettings) -> Result<Self, NcdError> {
        let config = NcdConfig {
            algorithm: settings.algorithm,
            level: settings.level,
            ..Default::default()
        };
        config.validate()?;
        // Resolve through the config so algorithms with levels always carry one.
        Ok(Self {
            settings: config.compressor_settings(),
        })
    }

    pub fn compressor_settings(&self) -> CompressorSettings {
        self.settings
    }
}

impl Default for CompressionOracle {
    fn default() -> Self {
        Self {
            settings: NcdConfig::default().compressor_settings(),
        }
    }
}

impl SizeOracle for CompressionOracle {
    fn compressed_size_with(
        &self,
        data: &[u8],
        scratch: &mut Vec<u8>,
    ) -> Result<usize, NcdError> {
        kernels::dispatch_compressed_len(&self.settings, data, scratch)
    }

    fn settings(&self) -> Option<CompressorSettings> {
        Some(self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressionAlgorithm;

    fn oracle_for(algorithm: CompressionAlgorithm) -> CompressionOracle {
        CompressionOracle::from_config(&NcdConfig {
            algorithm,
            ..Default::default()
        })
        .unwrap()
    }

    const ALL: [CompressionAlgorithm; 4] = [
        CompressionAlgorithm::Zlib,
        CompressionAlgorithm::Deflate,
        CompressionAlgorithm::Zstd,
        CompressionAlgorithm::Lz4,
    ];

    #[test]
    fn test_empty_input_is_zero_for_every_algorithm() {
        for algorithm in ALL {
            let oracle = oracle_for(algorithm);
            assert_eq!(oracle.compressed_size(b"").unwrap(), 0, "{}", algorithm);
        }
    }

    #[test]
    fn test_sizes_are_deterministic() {
        let data = b"The quick brown fox jumps over the lazy dog. The quick brown fox.";
        for algorithm in ALL {
            let oracle = oracle_for(algorithm);
            let first = oracle.compressed_size(data).unwrap();
            let second = oracle.compressed_size(data).unwrap();
            assert_eq!(first, second, "{}", algorithm);
            assert!(first > 0);
        }
    }

    #[test]
    fn test_concat_matches_compressing_the_joined_bytes() {
        let oracle = CompressionOracle::default();
        let a = b"first half of the input ";
        let b = b"second half of the input";
        let joined: Vec<u8> = a.iter().chain(b.iter()).copied().collect();

        let mut concat_buf = Vec::new();
        let mut scratch = Vec::new();
        let via_concat = oracle
            .compressed_size_concat(a, b, &mut concat_buf, &mut scratch)
            .unwrap();
        assert_eq!(via_concat, oracle.compressed_size(&joined).unwrap());
    }

    #[test]
    fn test_repetitive_data_compresses_better_than_noise_like_data() {
        let oracle = CompressionOracle::default();
        let repetitive = vec![b'a'; 512];
        let varied: Vec<u8> = (0..512u32).map(|i| (i * 37 % 251) as u8).collect();
        assert!(
            oracle.compressed_size(&repetitive).unwrap() < oracle.compressed_size(&varied).unwrap()
        );
    }

    #[test]
    fn test_new_resolves_missing_level_and_rejects_bad_ones() {
        let oracle = CompressionOracle::new(CompressorSettings {
            algorithm: CompressionAlgorithm::Zstd,
            level: None,
        })
        .unwrap();
        assert_eq!(oracle.compressor_settings().level, Some(3));

        let bad = CompressionOracle::new(CompressorSettings {
            algorithm: CompressionAlgorithm::Deflate,
            level: Some(11),
        });
        assert!(matches!(bad, Err(NcdError::Configuration(_))));
    }

    #[test]
    fn test_settings_are_reported() {
        let oracle = oracle_for(CompressionAlgorithm::Lz4);
        assert_eq!(
            oracle.settings(),
            Some(CompressorSettings {
                algorithm: CompressionAlgorithm::Lz4,
                level: None
            })
        );
    }
}
