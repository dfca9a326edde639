//! Compressor kernels.
//!
//! Each kernel measures the compressed length of a byte slice for one algorithm.
//! All of them share two conventions:
//!
//! * empty input measures as `0` (no frame is emitted for nothing), and
//! * the caller supplies a scratch buffer that the kernel may overwrite, so a hot
//!   loop performs no per-call output allocation.

pub mod deflate;
pub mod lz4;
pub mod zstd;

use crate::config::{CompressionAlgorithm, CompressorSettings};
use crate::error::NcdError;

/// Dispatches to the kernel selected by `settings`.
pub fn dispatch_compressed_len(
    settings: &CompressorSettings,
    input_bytes: &[u8],
    scratch: &mut Vec<u8>,
) -> Result<usize, NcdError> {
    let level = || {
        settings.level.ok_or_else(|| {
            NcdError::InternalError(format!("{} requires a resolved level", settings.algorithm))
        })
    };
    match settings.algorithm {
        CompressionAlgorithm::Zlib => deflate::zlib_compressed_len(input_bytes, level()?, scratch),
        CompressionAlgorithm::Deflate => {
            deflate::raw_compressed_len(input_bytes, level()?, scratch)
        }
        CompressionAlgorithm::Zstd => zstd::compressed_len(input_bytes, level()?, scratch),
        CompressionAlgorithm::Lz4 => lz4::compressed_len(input_bytes, scratch),
    }
}
