// In: src/config.rs

//! The single source of truth for all ncd-matrix configuration.
//!
//! This module defines the unified `NcdConfig` struct, which is designed to be
//! created once at the application boundary (e.g., from CLI flags, a JSON file or
//! Python keyword arguments), validated, and then passed down by reference.
//!
//! Changing the compressor algorithm or level changes every distance the engine
//! produces, so the resolved choice is captured in `CompressorSettings` and
//! recorded next to every matrix.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NcdError;
use crate::types::TextEncoding;

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// The lossless compressor that stands in for Kolmogorov complexity.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CompressionAlgorithm {
    /// **Default:** DEFLATE with the zlib header and Adler-32 trailer.
    #[default]
    Zlib,
    /// Raw DEFLATE stream without any framing.
    Deflate,
    /// Zstandard frame.
    Zstd,
    /// LZ4 block format. Has no tunable level.
    Lz4,
}

/// Defines the trade-off between compression speed and compressed size.
///
/// Only consulted when no explicit `level` is configured.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressionProfile {
    /// Prioritizes speed over size.
    Fast,

    /// A balance between speed and size. This is the recommended default.
    #[default]
    Balanced,

    /// Prioritizes the smallest output. Tighter approximations of the ideal
    /// compressor at the cost of CPU time.
    HighCompression,
}

/// The distance formula applied to each pair.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// **Default:** `(C(xy) - min(C(x), C(y))) / max(C(x), C(y))`.
    #[default]
    Ncd,
    /// `max(|C(xy) - C(xx)|, |C(xy) - C(yy)|) / max(C(xx), C(yy))`.
    Mcd,
}

/// What the matrix builder does when a single pair fails.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// **Default:** abort the whole build and report the failing pair.
    #[default]
    FailFast,
    /// Leave the failing cell empty, record the failure, and keep going.
    BestEffort,
}

//==================================================================================
// II. String Parsing (CLI flags and FFI keyword arguments)
//==================================================================================

impl FromStr for CompressionAlgorithm {
    type Err = NcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zlib" => Ok(CompressionAlgorithm::Zlib),
            "deflate" => Ok(CompressionAlgorithm::Deflate),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            other => Err(NcdError::Configuration(format!(
                "Invalid algorithm '{}'. Must be 'zlib', 'deflate', 'zstd', or 'lz4'.",
                other
            ))),
        }
    }
}

impl FromStr for CompressionProfile {
    type Err = NcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(CompressionProfile::Fast),
            "balanced" => Ok(CompressionProfile::Balanced),
            "high_compression" => Ok(CompressionProfile::HighCompression),
            other => Err(NcdError::Configuration(format!(
                "Invalid profile '{}'. Must be 'fast', 'balanced', or 'high_compression'.",
                other
            ))),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = NcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ncd" => Ok(DistanceMetric::Ncd),
            "mcd" => Ok(DistanceMetric::Mcd),
            other => Err(NcdError::Configuration(format!(
                "Invalid metric '{}'. Must be 'ncd' or 'mcd'.",
                other
            ))),
        }
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionAlgorithm::Zlib => "zlib",
            CompressionAlgorithm::Deflate => "deflate",
            CompressionAlgorithm::Zstd => "zstd",
            CompressionAlgorithm::Lz4 => "lz4",
        };
        f.write_str(name)
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Ncd => f.write_str("ncd"),
            DistanceMetric::Mcd => f.write_str("mcd"),
        }
    }
}

//==================================================================================
// III. Resolved Compressor Settings
//==================================================================================

/// The fully resolved compressor choice. This is what gets recorded alongside
/// stored results so that a matrix can be reproduced.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressorSettings {
    pub algorithm: CompressionAlgorithm,
    /// `None` for algorithms without a tunable level (LZ4).
    pub level: Option<i32>,
}

impl fmt::Display for CompressorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Some(level) => write!(f, "{} (level {})", self.algorithm, level),
            None => write!(f, "{}", self.algorithm),
        }
    }
}

//==================================================================================
// IV. The Unified NcdConfig
//==================================================================================

/// The single, unified configuration for a distance computation run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct NcdConfig {
    #[serde(default)]
    pub algorithm: CompressionAlgorithm,

    /// Guides the level choice when `level` is `None`.
    #[serde(default)]
    pub profile: CompressionProfile,

    /// Explicit compression level. Overrides `profile`.
    #[serde(default)]
    pub level: Option<i32>,

    /// How text items are turned into bytes.
    #[serde(default)]
    pub encoding: TextEncoding,

    #[serde(default)]
    pub metric: DistanceMetric,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// If true, pair computations are spread across the rayon thread pool.
    /// Results are identical to a sequential run.
    #[serde(default)]
    pub parallel: bool,

    /// Cutoff used by the similarity search: distances at or below it are "similar".
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for NcdConfig {
    fn default() -> Self {
        Self {
            algorithm: CompressionAlgorithm::default(),
            profile: CompressionProfile::default(),
            level: None,
            encoding: TextEncoding::default(),
            metric: DistanceMetric::default(),
            failure_policy: FailurePolicy::default(),
            parallel: false,
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// Provides a sensible default for `similarity_threshold` for serde.
fn default_similarity_threshold() -> f64 {
    0.5
}

impl NcdConfig {
    /// Parses a JSON config document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, NcdError> {
        let config: NcdConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, NcdError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects unsupported algorithm/level combinations before any work starts.
    pub fn validate(&self) -> Result<(), NcdError> {
        match (self.algorithm, self.level) {
            (CompressionAlgorithm::Zlib | CompressionAlgorithm::Deflate, Some(level))
                if !(0..=9).contains(&level) =>
            {
                return Err(NcdError::Configuration(format!(
                    "{} level must be within 0..=9, got {}",
                    self.algorithm, level
                )));
            }
            (CompressionAlgorithm::Zstd, Some(level))
                if !zstd::compression_level_range().contains(&level) =>
            {
                let range = zstd::compression_level_range();
                return Err(NcdError::Configuration(format!(
                    "zstd level must be within {}..={}, got {}",
                    range.start(),
                    range.end(),
                    level
                )));
            }
            (CompressionAlgorithm::Lz4, Some(level)) => {
                return Err(NcdError::Configuration(format!(
                    "lz4 has no compression levels, but level {} was given",
                    level
                )));
            }
            _ => {}
        }

        if !self.similarity_threshold.is_finite() || self.similarity_threshold < 0.0 {
            return Err(NcdError::Configuration(format!(
                "similarity_threshold must be a finite, non-negative number, got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }

    /// The level actually handed to the compressor.
    pub fn resolved_level(&self) -> Option<i32> {
        if self.level.is_some() {
            return self.level;
        }
        match (self.algorithm, self.profile) {
            (CompressionAlgorithm::Lz4, _) => None,
            (CompressionAlgorithm::Zstd, CompressionProfile::Fast) => Some(1),
            (CompressionAlgorithm::Zstd, CompressionProfile::Balanced) => Some(3),
            (CompressionAlgorithm::Zstd, CompressionProfile::HighCompression) => Some(19),
            (_, CompressionProfile::Fast) => Some(1),
            (_, CompressionProfile::Balanced) => Some(6),
            (_, CompressionProfile::HighCompression) => Some(9),
        }
    }

    pub fn compressor_settings(&self) -> CompressorSettings {
        CompressorSettings {
            algorithm: self.algorithm,
            level: self.resolved_level(),
        }
    }
}
